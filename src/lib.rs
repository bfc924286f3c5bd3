pub mod app;
pub mod auth;
pub mod clock;
pub mod config;
pub mod email;
pub mod error;
pub mod outcome;
pub mod playlists;
pub mod state;

#[cfg(test)]
pub(crate) mod test_support;
