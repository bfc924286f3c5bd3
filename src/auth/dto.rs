use serde::{Deserialize, Serialize};

use super::{claims::SignedToken, repo_types::PublicUser};

/// Request body for user registration.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub nickname: String,
    pub password: String,
}

/// Request body for login. `login` is an e-mail address or a nickname.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub login: String,
    pub password: String,
}

/// Request body for starting a password reset.
#[derive(Debug, Deserialize)]
pub struct PasswordResetRequest {
    pub login: String,
}

/// Request body for finishing a password reset with the mailed token.
#[derive(Debug, Deserialize)]
pub struct PasswordResetCompleteRequest {
    pub token: String,
    pub password: String,
}

/// Response returned after login, register or refresh. The refresh token
/// travels in a cookie, not in the body.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: SignedToken,
    pub user: PublicUser,
}
