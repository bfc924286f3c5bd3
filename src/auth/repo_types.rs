use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;

pub type UserId = i32;

/// User record in the database.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub nickname: String,
    pub password_hash: String,        // argon2 PHC string
    pub refresh_token: String,        // current refresh token, empty when none
    pub password_reset_token: String, // pending reset token, empty when none
    pub created_at: OffsetDateTime,
}

/// Fields required to create a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub nickname: String,
    pub password_hash: String,
}

/// Public part of the user returned to the client.
#[derive(Debug, Clone, Serialize)]
pub struct PublicUser {
    pub id: UserId,
    pub email: String,
    pub nickname: String,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            nickname: user.nickname.clone(),
        }
    }
}
