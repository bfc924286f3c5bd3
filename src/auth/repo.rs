use async_trait::async_trait;
use sqlx::PgPool;

use crate::{
    auth::repo_types::{NewUser, User, UserId},
    error::Error,
    outcome::Outcome,
};

/// Persistence of user records.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Outcome<Option<User>>;
    async fn find_by_nickname(&self, nickname: &str) -> Outcome<Option<User>>;
    async fn find_by_id(&self, id: UserId) -> Outcome<Option<User>>;
    async fn create(&self, user: NewUser) -> Outcome<User>;
    /// Writes back the mutable fields of `user` (last write wins).
    async fn save(&self, user: &User) -> Outcome<()>;
}

const USER_COLUMNS: &str =
    "id, email, nickname, password_hash, refresh_token, password_reset_token, created_at";

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_email(&self, email: &str) -> Outcome<Option<User>> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.db)
        .await
        .map_err(|e| Error::database("find user by email", e))
    }

    async fn find_by_nickname(&self, nickname: &str) -> Outcome<Option<User>> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE nickname = $1"
        ))
        .bind(nickname)
        .fetch_optional(&self.db)
        .await
        .map_err(|e| Error::database("find user by nickname", e))
    }

    async fn find_by_id(&self, id: UserId) -> Outcome<Option<User>> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.db)
            .await
            .map_err(|e| Error::database("find user by id", e))
    }

    async fn create(&self, user: NewUser) -> Outcome<User> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (email, nickname, password_hash)
            VALUES ($1, $2, $3)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&user.email)
        .bind(&user.nickname)
        .bind(&user.password_hash)
        .fetch_one(&self.db)
        .await
        .map_err(|e| Error::database("create user", e))
    }

    async fn save(&self, user: &User) -> Outcome<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET email = $2, nickname = $3, password_hash = $4,
                refresh_token = $5, password_reset_token = $6
            WHERE id = $1
            "#,
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.nickname)
        .bind(&user.password_hash)
        .bind(&user.refresh_token)
        .bind(&user.password_reset_token)
        .execute(&self.db)
        .await
        .map_err(|e| Error::database("save user", e))?;
        Ok(())
    }
}
