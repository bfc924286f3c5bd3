use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use tracing::warn;

use super::repo_types::UserId;
use crate::{
    error::{Error, ErrorKind},
    state::AppState,
};

/// Validates the bearer access token and yields the caller's user id.
pub struct AuthUser(pub UserId);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = Error;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or_else(|| Error::new(ErrorKind::InvalidToken, "Missing Authorization header"))?;

        // Expect "Bearer <token>"
        let token = auth
            .strip_prefix("Bearer ")
            .or_else(|| auth.strip_prefix("bearer "))
            .ok_or_else(|| Error::new(ErrorKind::InvalidToken, "Invalid auth scheme"))?;

        state
            .access
            .authenticate(token.trim(), &state.bearer)
            .map(AuthUser)
            .map_err(|err| {
                warn!(kind = ?err.kind(), "bearer token rejected");
                err
            })
    }
}
