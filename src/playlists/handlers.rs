use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use crate::{
    auth::{extractors::AuthUser, repo_types::UserId},
    error::Error,
    playlists::{
        dto::{CreatePlaylistRequest, EditPlaylistRequest},
        repo_types::{Playlist, PlaylistId, SongId},
        services::PlaylistService,
    },
    state::AppState,
};

pub fn playlist_routes() -> Router<AppState> {
    Router::new()
        .route("/playlists", post(create_playlist).get(list_playlists))
        .route(
            "/playlists/:id",
            get(get_playlist).patch(edit_playlist).delete(delete_playlist),
        )
}

pub fn collaborator_routes() -> Router<AppState> {
    Router::new().route(
        "/playlists/:id/collaborators/:collaborator_id",
        post(add_collaborator).delete(remove_collaborator),
    )
}

pub fn song_routes() -> Router<AppState> {
    Router::new().route(
        "/playlists/:id/songs/:song_id",
        post(add_song).delete(remove_song),
    )
}

pub fn favorite_routes() -> Router<AppState> {
    Router::new().route(
        "/playlists/:id/favorite",
        post(add_favorite).delete(remove_favorite),
    )
}

#[instrument(skip(playlists, body))]
pub async fn create_playlist(
    State(playlists): State<PlaylistService>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<CreatePlaylistRequest>,
) -> Result<(StatusCode, Json<Playlist>), Error> {
    let playlist = playlists.create(body, user_id).await?;
    Ok((StatusCode::CREATED, Json(playlist)))
}

/// Playlists the caller owns, collaborates on or favorited.
#[instrument(skip(playlists))]
pub async fn list_playlists(
    State(playlists): State<PlaylistService>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<Playlist>>, Error> {
    playlists.list_for_user(user_id).await.map(Json)
}

#[instrument(skip(playlists))]
pub async fn get_playlist(
    State(playlists): State<PlaylistService>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<PlaylistId>,
) -> Result<Json<Playlist>, Error> {
    playlists.get(id, user_id).await.map(Json)
}

#[instrument(skip(playlists, body))]
pub async fn edit_playlist(
    State(playlists): State<PlaylistService>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<PlaylistId>,
    Json(body): Json<EditPlaylistRequest>,
) -> Result<Json<Playlist>, Error> {
    playlists.edit(id, body, user_id).await.map(Json)
}

#[instrument(skip(playlists))]
pub async fn delete_playlist(
    State(playlists): State<PlaylistService>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<PlaylistId>,
) -> Result<StatusCode, Error> {
    playlists.delete(id, user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(playlists))]
pub async fn add_collaborator(
    State(playlists): State<PlaylistService>,
    AuthUser(user_id): AuthUser,
    Path((id, collaborator_id)): Path<(PlaylistId, UserId)>,
) -> Result<StatusCode, Error> {
    playlists
        .add_collaborator(id, collaborator_id, user_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(playlists))]
pub async fn remove_collaborator(
    State(playlists): State<PlaylistService>,
    AuthUser(user_id): AuthUser,
    Path((id, collaborator_id)): Path<(PlaylistId, UserId)>,
) -> Result<StatusCode, Error> {
    playlists
        .remove_collaborator(id, collaborator_id, user_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(playlists))]
pub async fn add_song(
    State(playlists): State<PlaylistService>,
    AuthUser(user_id): AuthUser,
    Path((id, song_id)): Path<(PlaylistId, SongId)>,
) -> Result<Json<Playlist>, Error> {
    playlists.add_song(id, song_id, user_id).await.map(Json)
}

#[instrument(skip(playlists))]
pub async fn remove_song(
    State(playlists): State<PlaylistService>,
    AuthUser(user_id): AuthUser,
    Path((id, song_id)): Path<(PlaylistId, SongId)>,
) -> Result<Json<Playlist>, Error> {
    playlists.remove_song(id, song_id, user_id).await.map(Json)
}

#[instrument(skip(playlists))]
pub async fn add_favorite(
    State(playlists): State<PlaylistService>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<PlaylistId>,
) -> Result<StatusCode, Error> {
    playlists.add_favorite(id, user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(playlists))]
pub async fn remove_favorite(
    State(playlists): State<PlaylistService>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<PlaylistId>,
) -> Result<StatusCode, Error> {
    playlists.remove_favorite(id, user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
