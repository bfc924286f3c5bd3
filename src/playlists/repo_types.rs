use serde::Serialize;
use sqlx::FromRow;

use crate::auth::repo_types::UserId;

pub type PlaylistId = i32;
pub type SongId = i32;

/// Playlist with its membership sets loaded.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct Playlist {
    pub id: PlaylistId,
    pub name: String,
    pub description: String,
    pub is_public: bool,
    pub owner_id: UserId,
    pub collaborator_ids: Vec<UserId>,
    pub song_ids: Vec<SongId>,
}

/// Fields of a playlist about to be inserted; it starts without songs or
/// collaborators.
#[derive(Debug, Clone)]
pub struct NewPlaylist {
    pub name: String,
    pub description: String,
    pub is_public: bool,
    pub owner_id: UserId,
}
