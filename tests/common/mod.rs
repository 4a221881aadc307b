//! Common test infrastructure for the end-to-end tests.
//!
//! Tests should only import from this module, not from internal submodules.

mod mocks;
mod server;

// Public API - this is what tests import
#[allow(unused_imports)]
pub use mocks::{track, MockIntentParser, MockPlaylistService, MockTrackSearch};
#[allow(unused_imports)]
pub use server::{TestServer, TEST_PLAYLIST_LENGTH};
