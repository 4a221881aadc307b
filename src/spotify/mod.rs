//! Spotify Web API collaborators: track search and playlist creation.

mod client;
pub mod models;
mod session;

pub use client::SpotifyClient;
pub use models::{CreatedPlaylist, Track};
pub use session::{Grant, SessionProvider};

use async_trait::async_trait;
use thiserror::Error;

/// Maximum number of track URIs the playlist backend accepts per add call.
pub const ADD_ITEMS_CHUNK_SIZE: usize = 100;

/// Errors that can occur when talking to the streaming backend.
#[derive(Debug, Error)]
pub enum SpotifyError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Not authenticated: {0}")]
    Unauthenticated(String),

    #[error("Request timeout")]
    Timeout,
}

/// Trait for track-search backends.
#[async_trait]
pub trait TrackSearch: Send + Sync {
    /// Search for tracks matching `query`, returning at most `limit` results
    /// in backend order. Malformed backend records are dropped, not
    /// propagated.
    async fn search_tracks(&self, query: &str, limit: usize) -> Result<Vec<Track>, SpotifyError>;
}

/// Trait for playlist-creation backends.
#[async_trait]
pub trait PlaylistService: Send + Sync {
    /// Create an empty playlist owned by the authenticated user.
    async fn create_playlist(
        &self,
        name: &str,
        description: &str,
        public: bool,
    ) -> Result<CreatedPlaylist, SpotifyError>;

    /// Append up to [`ADD_ITEMS_CHUNK_SIZE`] track URIs to a playlist,
    /// preserving order.
    async fn add_items(&self, playlist_id: &str, uris: &[String]) -> Result<(), SpotifyError>;
}
