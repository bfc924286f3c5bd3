//! Authorization and membership checks over an already loaded playlist.
//!
//! Every guard hands the playlist back on success so the checks chain with
//! `bind` without extra lookups.

use crate::{
    auth::repo_types::UserId,
    error::Error,
    outcome::Outcome,
    playlists::repo_types::{Playlist, PlaylistId, SongId},
};

pub fn verify_owner(playlist: Playlist, user_id: UserId) -> Outcome<Playlist> {
    if playlist.owner_id == user_id {
        Ok(playlist)
    } else {
        Err(Error::UNAUTHORIZED)
    }
}

pub fn verify_owner_or_collaborator(playlist: Playlist, user_id: UserId) -> Outcome<Playlist> {
    if playlist.owner_id == user_id || playlist.collaborator_ids.contains(&user_id) {
        Ok(playlist)
    } else {
        Err(Error::UNAUTHORIZED)
    }
}

/// Public playlists are readable by anyone signed in; private ones only by
/// their owner and collaborators.
pub fn ensure_visible(playlist: Playlist, user_id: UserId) -> Outcome<Playlist> {
    if playlist.is_public {
        Ok(playlist)
    } else {
        verify_owner_or_collaborator(playlist, user_id)
    }
}

pub fn ensure_collaborator_absent(playlist: Playlist, collaborator_id: UserId) -> Outcome<Playlist> {
    if playlist.collaborator_ids.contains(&collaborator_id) {
        Err(Error::USER_ALREADY_ADDED)
    } else {
        Ok(playlist)
    }
}

pub fn ensure_collaborator_present(playlist: Playlist, collaborator_id: UserId) -> Outcome<Playlist> {
    if playlist.collaborator_ids.contains(&collaborator_id) {
        Ok(playlist)
    } else {
        Err(Error::USER_NOT_ADDED)
    }
}

pub fn ensure_song_absent(playlist: Playlist, song_id: SongId) -> Outcome<Playlist> {
    if playlist.song_ids.contains(&song_id) {
        Err(Error::SONG_ALREADY_ADDED)
    } else {
        Ok(playlist)
    }
}

pub fn ensure_song_present(playlist: Playlist, song_id: SongId) -> Outcome<Playlist> {
    if playlist.song_ids.contains(&song_id) {
        Ok(playlist)
    } else {
        Err(Error::SONG_NOT_ADDED)
    }
}

/// `favorites` is the caller's set of favorite playlist ids.
pub fn ensure_not_favorited(playlist: Playlist, favorites: &[PlaylistId]) -> Outcome<Playlist> {
    if favorites.contains(&playlist.id) {
        Err(Error::ALREADY_FAVORITED)
    } else {
        Ok(playlist)
    }
}

pub fn ensure_favorited(playlist: Playlist, favorites: &[PlaylistId]) -> Outcome<Playlist> {
    if favorites.contains(&playlist.id) {
        Ok(playlist)
    } else {
        Err(Error::NOT_FAVORITED)
    }
}

pub fn ensure_public(playlist: Playlist) -> Outcome<Playlist> {
    if playlist.is_public {
        Ok(playlist)
    } else {
        Err(Error::PLAYLIST_NOT_PUBLIC)
    }
}
