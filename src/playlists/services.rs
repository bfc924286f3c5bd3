use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{info, instrument};

use super::{
    dto::{CreatePlaylistRequest, EditPlaylistRequest},
    guards::{
        ensure_collaborator_absent, ensure_collaborator_present, ensure_favorited,
        ensure_not_favorited, ensure_public, ensure_song_absent, ensure_song_present,
        ensure_visible, verify_owner, verify_owner_or_collaborator,
    },
    repo::PlaylistStore,
    repo_types::{NewPlaylist, Playlist, PlaylistId, SongId},
};
use crate::{
    auth::{repo::UserStore, repo_types::UserId},
    error::Error,
    outcome::{FutureOutcomeExt, Outcome},
};

pub const MAX_NAME_LEN: usize = 50;
pub const MAX_DESCRIPTION_LEN: usize = 300;

/// Playlist lifecycle plus collaborator, song and favorite management for a
/// caller `user_id`.
#[derive(Clone)]
pub struct PlaylistService {
    playlists: Arc<dyn PlaylistStore>,
    users: Arc<dyn UserStore>,
}

impl PlaylistService {
    pub fn new(playlists: Arc<dyn PlaylistStore>, users: Arc<dyn UserStore>) -> Self {
        Self { playlists, users }
    }

    async fn load(&self, id: PlaylistId) -> Outcome<Playlist> {
        self.playlists
            .find_by_id(id)
            .await?
            .ok_or(Error::WRONG_PLAYLIST_ID)
    }

    async fn require_user(&self, id: UserId) -> Outcome<()> {
        self.users
            .find_by_id(id)
            .await?
            .map(|_| ())
            .ok_or(Error::WRONG_USER_ID)
    }

    async fn favorites_of(&self, user_id: UserId) -> Outcome<Vec<PlaylistId>> {
        self.require_user(user_id).await?;
        self.playlists.favorite_ids(user_id).await
    }

    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create(
        &self,
        request: CreatePlaylistRequest,
        user_id: UserId,
    ) -> Outcome<Playlist> {
        let name = request.name.trim().to_owned();
        let description = request.description.trim().to_owned();
        validate_details(&name, &description)?;
        self.require_user(user_id).await?;

        let playlist = self
            .playlists
            .create(NewPlaylist {
                name,
                description,
                is_public: request.is_public,
                owner_id: user_id,
            })
            .await?;
        info!(playlist_id = playlist.id, owner_id = user_id, "playlist created");
        Ok(playlist)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, playlist_id: PlaylistId, user_id: UserId) -> Outcome<Playlist> {
        self.load(playlist_id)
            .then_bind(|p| ensure_visible(p, user_id))
            .await
    }

    #[instrument(skip(self))]
    pub async fn list_for_user(&self, user_id: UserId) -> Outcome<Vec<Playlist>> {
        self.require_user(user_id).await?;
        self.playlists.list_for_user(user_id).await
    }

    /// Owner only. Returns the playlist as it is after the change.
    #[instrument(skip(self, request))]
    pub async fn edit(
        &self,
        playlist_id: PlaylistId,
        request: EditPlaylistRequest,
        user_id: UserId,
    ) -> Outcome<Playlist> {
        let mut playlist = self
            .load(playlist_id)
            .then_bind(|p| verify_owner(p, user_id))
            .await?;
        if let Some(name) = request.name {
            playlist.name = name.trim().to_owned();
        }
        if let Some(description) = request.description {
            playlist.description = description.trim().to_owned();
        }
        if let Some(is_public) = request.is_public {
            playlist.is_public = is_public;
        }
        validate_details(&playlist.name, &playlist.description)?;

        self.playlists.update(&playlist).await?;
        info!(playlist_id, "playlist edited");
        Ok(playlist)
    }

    /// Owner only.
    #[instrument(skip(self))]
    pub async fn delete(&self, playlist_id: PlaylistId, user_id: UserId) -> Outcome<()> {
        self.load(playlist_id)
            .then_bind(|p| verify_owner(p, user_id))
            .then_bind_async(|p| self.playlists.delete(p.id))
            .await?;
        info!(playlist_id, "playlist deleted");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn add_collaborator(
        &self,
        playlist_id: PlaylistId,
        collaborator_id: UserId,
        user_id: UserId,
    ) -> Outcome<()> {
        self.load(playlist_id)
            .then_bind(|p| verify_owner(p, user_id))
            .then_bind_async(|p| async move {
                self.require_user(collaborator_id).await.map(|_| p)
            })
            .then_bind(|p| ensure_collaborator_absent(p, collaborator_id))
            .then_bind_async(|p| self.playlists.add_collaborator(p.id, collaborator_id))
            .await?;
        info!(playlist_id, collaborator_id, "collaborator added");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn remove_collaborator(
        &self,
        playlist_id: PlaylistId,
        collaborator_id: UserId,
        user_id: UserId,
    ) -> Outcome<()> {
        self.load(playlist_id)
            .then_bind(|p| verify_owner(p, user_id))
            .then_bind_async(|p| async move {
                self.require_user(collaborator_id).await.map(|_| p)
            })
            .then_bind(|p| ensure_collaborator_present(p, collaborator_id))
            .then_bind_async(|p| self.playlists.remove_collaborator(p.id, collaborator_id))
            .await?;
        info!(playlist_id, collaborator_id, "collaborator removed");
        Ok(())
    }

    /// Returns the playlist as it is after the change.
    #[instrument(skip(self))]
    pub async fn add_song(
        &self,
        playlist_id: PlaylistId,
        song_id: SongId,
        user_id: UserId,
    ) -> Outcome<Playlist> {
        let mut playlist = self
            .load(playlist_id)
            .then_bind(|p| verify_owner_or_collaborator(p, user_id))
            .then_bind(|p| ensure_song_absent(p, song_id))
            .await?;
        self.playlists.add_song(playlist.id, song_id).await?;
        playlist.song_ids.push(song_id);
        Ok(playlist)
    }

    /// Returns the playlist as it is after the change.
    #[instrument(skip(self))]
    pub async fn remove_song(
        &self,
        playlist_id: PlaylistId,
        song_id: SongId,
        user_id: UserId,
    ) -> Outcome<Playlist> {
        let mut playlist = self
            .load(playlist_id)
            .then_bind(|p| verify_owner_or_collaborator(p, user_id))
            .then_bind(|p| ensure_song_present(p, song_id))
            .await?;
        self.playlists.remove_song(playlist.id, song_id).await?;
        playlist.song_ids.retain(|id| *id != song_id);
        Ok(playlist)
    }

    #[instrument(skip(self))]
    pub async fn add_favorite(&self, playlist_id: PlaylistId, user_id: UserId) -> Outcome<()> {
        let playlist = self.load(playlist_id).then_bind(ensure_public).await?;
        let favorites = self.favorites_of(user_id).await?;
        let playlist = ensure_not_favorited(playlist, &favorites)?;
        self.playlists.add_favorite(user_id, playlist.id).await
    }

    #[instrument(skip(self))]
    pub async fn remove_favorite(&self, playlist_id: PlaylistId, user_id: UserId) -> Outcome<()> {
        let playlist = self.load(playlist_id).then_bind(ensure_public).await?;
        let favorites = self.favorites_of(user_id).await?;
        let playlist = ensure_favorited(playlist, &favorites)?;
        self.playlists.remove_favorite(user_id, playlist.id).await
    }
}

/// Reports every invalid field at once.
fn validate_details(name: &str, description: &str) -> Outcome<()> {
    let mut fields = Map::new();
    let name_len = name.chars().count();
    if name_len == 0 || name_len > MAX_NAME_LEN {
        fields.insert(
            "name".into(),
            Value::from(format!("must be 1 to {MAX_NAME_LEN} characters")),
        );
    }
    if description.chars().count() > MAX_DESCRIPTION_LEN {
        fields.insert(
            "description".into(),
            Value::from(format!("must be at most {MAX_DESCRIPTION_LEN} characters")),
        );
    }
    if fields.is_empty() {
        Ok(())
    } else {
        Err(Error::validation(Value::Object(fields)))
    }
}
