//! Test server lifecycle management.
//!
//! Each test gets an isolated server on an ephemeral port, wired to mock
//! collaborators it can inspect afterwards.

use super::mocks::{MockIntentParser, MockPlaylistService, MockTrackSearch};
use promptify_server::pipeline::PlaylistBuilder;
use promptify_server::server::server::make_app;
use promptify_server::server::ServerConfig;
use std::sync::Arc;

pub const TEST_PLAYLIST_LENGTH: usize = 20;

/// Test server instance.
///
/// When dropped, the server task is aborted.
pub struct TestServer {
    /// Base URL for making requests (e.g., "http://127.0.0.1:12345").
    pub base_url: String,
    pub intent: Arc<MockIntentParser>,
    pub search: Arc<MockTrackSearch>,
    pub playlists: Arc<MockPlaylistService>,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    pub async fn spawn(
        intent: MockIntentParser,
        search: MockTrackSearch,
        playlists: MockPlaylistService,
    ) -> Self {
        let intent = Arc::new(intent);
        let search = Arc::new(search);
        let playlists = Arc::new(playlists);

        let pipeline = Arc::new(PlaylistBuilder::new(
            intent.clone(),
            search.clone(),
            playlists.clone(),
            TEST_PLAYLIST_LENGTH,
        ));
        let app = make_app(ServerConfig::default(), pipeline);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
            intent,
            search,
            playlists,
            handle,
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
