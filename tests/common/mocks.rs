//! Hand-written mock collaborators with call counters.

use async_trait::async_trait;
use promptify_server::intent::{IntentError, IntentParser, ParsedIntent};
use promptify_server::spotify::{
    CreatedPlaylist, PlaylistService, SpotifyError, Track, TrackSearch,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Minimal valid track fixture.
pub fn track(id: &str, popularity: u8) -> Track {
    Track {
        id: id.to_string(),
        name: format!("Track {}", id),
        artist: "Artist".to_string(),
        album: "Album".to_string(),
        uri: format!("spotify:track:{}", id),
        popularity,
        duration_ms: 180_000,
        external_url: format!("https://open.spotify.com/track/{}", id),
        preview_url: None,
    }
}

/// Intent parser returning canned queries, or an invalid-response error
/// when constructed with `None`.
pub struct MockIntentParser {
    queries: Option<Vec<String>>,
    pub calls: AtomicUsize,
}

impl MockIntentParser {
    pub fn returning(queries: &[&str]) -> Self {
        Self {
            queries: Some(queries.iter().map(|q| q.to_string()).collect()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            queries: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IntentParser for MockIntentParser {
    async fn parse_intent(&self, _transcript: &str) -> Result<ParsedIntent, IntentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.queries {
            Some(search_queries) => Ok(ParsedIntent {
                search_queries: search_queries.clone(),
            }),
            None => Err(IntentError::InvalidResponse(
                "missing required 'search_queries' field".to_string(),
            )),
        }
    }
}

/// Search backend with canned per-query responses; unknown queries return
/// no tracks. Records the queries it was asked, in order.
pub struct MockTrackSearch {
    responses: HashMap<String, Vec<Track>>,
    pub calls: AtomicUsize,
    pub queries_seen: Mutex<Vec<String>>,
}

impl MockTrackSearch {
    pub fn empty() -> Self {
        Self::with_responses(&[])
    }

    pub fn with_responses(responses: &[(&str, Vec<Track>)]) -> Self {
        Self {
            responses: responses
                .iter()
                .map(|(q, tracks)| (q.to_string(), tracks.clone()))
                .collect(),
            calls: AtomicUsize::new(0),
            queries_seen: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TrackSearch for MockTrackSearch {
    async fn search_tracks(&self, query: &str, limit: usize) -> Result<Vec<Track>, SpotifyError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.queries_seen.lock().unwrap().push(query.to_string());
        let tracks = self.responses.get(query).cloned().unwrap_or_default();
        Ok(tracks.into_iter().take(limit).collect())
    }
}

/// Playlist backend recording created playlists and submitted URI batches.
pub struct MockPlaylistService {
    fail: bool,
    pub create_calls: AtomicUsize,
    pub created_names: Mutex<Vec<String>>,
    pub batches: Mutex<Vec<Vec<String>>>,
}

impl MockPlaylistService {
    pub fn succeeding() -> Self {
        Self {
            fail: false,
            create_calls: AtomicUsize::new(0),
            created_names: Mutex::new(Vec::new()),
            batches: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::succeeding()
        }
    }

    pub fn create_call_count(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PlaylistService for MockPlaylistService {
    async fn create_playlist(
        &self,
        name: &str,
        _description: &str,
        _public: bool,
    ) -> Result<CreatedPlaylist, SpotifyError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(SpotifyError::Api {
                status: 403,
                message: "insufficient scope".to_string(),
            });
        }
        self.created_names.lock().unwrap().push(name.to_string());
        Ok(CreatedPlaylist {
            id: "test-playlist".to_string(),
            url: "https://open.spotify.com/playlist/test-playlist".to_string(),
        })
    }

    async fn add_items(&self, _playlist_id: &str, uris: &[String]) -> Result<(), SpotifyError> {
        self.batches.lock().unwrap().push(uris.to_vec());
        Ok(())
    }
}
