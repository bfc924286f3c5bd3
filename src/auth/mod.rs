use crate::state::AppState;
use axum::Router;

pub mod access;
pub mod claims;
pub mod cookies;
pub mod dto;
pub(crate) mod extractors;
pub mod handlers;
pub mod jwt;
pub mod password;
pub mod password_reset;
pub mod refresh;
pub mod repo;
pub mod repo_types;
pub mod secrets;
pub mod services;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::auth_routes())
        .merge(handlers::me_routes())
}
