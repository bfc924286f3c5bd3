use serde::Deserialize;

/// Request body for creating a playlist.
#[derive(Debug, Deserialize)]
pub struct CreatePlaylistRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub is_public: bool,
}

/// Partial update; absent fields keep their current value.
#[derive(Debug, Default, Deserialize)]
pub struct EditPlaylistRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_public: Option<bool>,
}
