//! Promptify Server Library
//!
//! Turns a free-text music request into a ranked, deduplicated set of tracks
//! and, optionally, a created Spotify playlist. This library exposes the
//! internal modules for testing and potential reuse.

pub mod config;
pub mod intent;
pub mod pipeline;
pub mod server;
pub mod spotify;

// Re-export commonly used types for convenience
pub use intent::{IntentError, IntentParser, OpenAiIntentParser, ParsedIntent};
pub use pipeline::{GeneratedPlaylist, PipelineError, PlaylistBuilder};
pub use server::{run_server, RequestsLoggingLevel};
pub use spotify::{PlaylistService, SpotifyClient, SpotifyError, Track, TrackSearch};
