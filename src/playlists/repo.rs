use async_trait::async_trait;
use sqlx::PgPool;

use crate::{
    auth::repo_types::UserId,
    error::Error,
    outcome::Outcome,
    playlists::repo_types::{NewPlaylist, Playlist, PlaylistId, SongId},
};

/// Persistence of playlists and the memberships hanging off them.
#[async_trait]
pub trait PlaylistStore: Send + Sync {
    async fn find_by_id(&self, id: PlaylistId) -> Outcome<Option<Playlist>>;
    /// Playlists the user owns or collaborates on, plus public playlists they
    /// favorited. Each playlist appears once, ordered by id.
    async fn list_for_user(&self, user_id: UserId) -> Outcome<Vec<Playlist>>;
    async fn create(&self, playlist: NewPlaylist) -> Outcome<Playlist>;
    /// Writes name, description and visibility.
    async fn update(&self, playlist: &Playlist) -> Outcome<()>;
    async fn delete(&self, id: PlaylistId) -> Outcome<()>;
    async fn add_collaborator(&self, playlist_id: PlaylistId, user_id: UserId) -> Outcome<()>;
    async fn remove_collaborator(&self, playlist_id: PlaylistId, user_id: UserId) -> Outcome<()>;
    async fn add_song(&self, playlist_id: PlaylistId, song_id: SongId) -> Outcome<()>;
    async fn remove_song(&self, playlist_id: PlaylistId, song_id: SongId) -> Outcome<()>;
    async fn favorite_ids(&self, user_id: UserId) -> Outcome<Vec<PlaylistId>>;
    async fn add_favorite(&self, user_id: UserId, playlist_id: PlaylistId) -> Outcome<()>;
    async fn remove_favorite(&self, user_id: UserId, playlist_id: PlaylistId) -> Outcome<()>;
}

const PLAYLIST_SELECT: &str = r#"
    SELECT p.id, p.name, p.description, p.is_public, p.owner_id, p.song_ids,
           ARRAY(
               SELECT c.user_id FROM playlist_collaborators c
               WHERE c.playlist_id = p.id
               ORDER BY c.user_id
           ) AS collaborator_ids
    FROM playlists p
"#;

#[derive(Clone)]
pub struct PgPlaylistStore {
    db: PgPool,
}

impl PgPlaylistStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    async fn execute(&self, action: &'static str, sql: &str, a: i32, b: i32) -> Outcome<()> {
        sqlx::query(sql)
            .bind(a)
            .bind(b)
            .execute(&self.db)
            .await
            .map_err(|e| Error::database(action, e))?;
        Ok(())
    }
}

#[async_trait]
impl PlaylistStore for PgPlaylistStore {
    async fn find_by_id(&self, id: PlaylistId) -> Outcome<Option<Playlist>> {
        sqlx::query_as::<_, Playlist>(&format!("{PLAYLIST_SELECT} WHERE p.id = $1"))
            .bind(id)
            .fetch_optional(&self.db)
            .await
            .map_err(|e| Error::database("get playlist by id", e))
    }

    async fn list_for_user(&self, user_id: UserId) -> Outcome<Vec<Playlist>> {
        sqlx::query_as::<_, Playlist>(&format!(
            r#"
            {PLAYLIST_SELECT}
            WHERE p.owner_id = $1
               OR EXISTS (
                   SELECT 1 FROM playlist_collaborators c
                   WHERE c.playlist_id = p.id AND c.user_id = $1
               )
               OR (p.is_public AND EXISTS (
                   SELECT 1 FROM favorite_playlists f
                   WHERE f.playlist_id = p.id AND f.user_id = $1
               ))
            ORDER BY p.id
            "#
        ))
        .bind(user_id)
        .fetch_all(&self.db)
        .await
        .map_err(|e| Error::database("list user playlists", e))
    }

    async fn create(&self, playlist: NewPlaylist) -> Outcome<Playlist> {
        sqlx::query_as::<_, Playlist>(
            r#"
            INSERT INTO playlists (name, description, is_public, owner_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, description, is_public, owner_id, song_ids,
                      ARRAY[]::INTEGER[] AS collaborator_ids
            "#,
        )
        .bind(&playlist.name)
        .bind(&playlist.description)
        .bind(playlist.is_public)
        .bind(playlist.owner_id)
        .fetch_one(&self.db)
        .await
        .map_err(|e| Error::database("create playlist", e))
    }

    async fn update(&self, playlist: &Playlist) -> Outcome<()> {
        sqlx::query(
            "UPDATE playlists SET name = $2, description = $3, is_public = $4 WHERE id = $1",
        )
        .bind(playlist.id)
        .bind(&playlist.name)
        .bind(&playlist.description)
        .bind(playlist.is_public)
        .execute(&self.db)
        .await
        .map_err(|e| Error::database("edit playlist", e))?;
        Ok(())
    }

    async fn delete(&self, id: PlaylistId) -> Outcome<()> {
        sqlx::query("DELETE FROM playlists WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await
            .map_err(|e| Error::database("delete playlist", e))?;
        Ok(())
    }

    async fn add_collaborator(&self, playlist_id: PlaylistId, user_id: UserId) -> Outcome<()> {
        self.execute(
            "add collaborator",
            "INSERT INTO playlist_collaborators (playlist_id, user_id) VALUES ($1, $2)",
            playlist_id,
            user_id,
        )
        .await
    }

    async fn remove_collaborator(&self, playlist_id: PlaylistId, user_id: UserId) -> Outcome<()> {
        self.execute(
            "remove collaborator",
            "DELETE FROM playlist_collaborators WHERE playlist_id = $1 AND user_id = $2",
            playlist_id,
            user_id,
        )
        .await
    }

    async fn add_song(&self, playlist_id: PlaylistId, song_id: SongId) -> Outcome<()> {
        self.execute(
            "add song",
            "UPDATE playlists SET song_ids = array_append(song_ids, $2) WHERE id = $1",
            playlist_id,
            song_id,
        )
        .await
    }

    async fn remove_song(&self, playlist_id: PlaylistId, song_id: SongId) -> Outcome<()> {
        self.execute(
            "remove song",
            "UPDATE playlists SET song_ids = array_remove(song_ids, $2) WHERE id = $1",
            playlist_id,
            song_id,
        )
        .await
    }

    async fn favorite_ids(&self, user_id: UserId) -> Outcome<Vec<PlaylistId>> {
        sqlx::query_scalar::<_, PlaylistId>(
            "SELECT playlist_id FROM favorite_playlists WHERE user_id = $1 ORDER BY playlist_id",
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await
        .map_err(|e| Error::database("get favorite playlists", e))
    }

    async fn add_favorite(&self, user_id: UserId, playlist_id: PlaylistId) -> Outcome<()> {
        self.execute(
            "add playlist to favorites",
            "INSERT INTO favorite_playlists (user_id, playlist_id) VALUES ($1, $2)",
            user_id,
            playlist_id,
        )
        .await
    }

    async fn remove_favorite(&self, user_id: UserId, playlist_id: PlaylistId) -> Outcome<()> {
        self.execute(
            "remove playlist from favorites",
            "DELETE FROM favorite_playlists WHERE user_id = $1 AND playlist_id = $2",
            user_id,
            playlist_id,
        )
        .await
    }
}
