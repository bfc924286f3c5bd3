pub mod dto;
pub mod guards;
pub mod handlers;
pub mod repo;
pub mod repo_types;
pub mod services;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::playlist_routes())
        .merge(handlers::collaborator_routes())
        .merge(handlers::song_routes())
        .merge(handlers::favorite_routes())
}
