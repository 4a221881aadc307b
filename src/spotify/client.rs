//! HTTP client for the Spotify Web API.

use super::models::{tracks_from_items, CreatedPlaylist, Track};
use super::{PlaylistService, SessionProvider, SpotifyError, TrackSearch, ADD_ITEMS_CHUNK_SIZE};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, info};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Client for the Spotify Web API, implementing both the search and the
/// playlist-creation collaborator contracts.
///
/// Tokens come from the injected [`SessionProvider`]; the authenticated
/// user's id (needed for playlist creation) is fetched once and cached for
/// the life of the client.
pub struct SpotifyClient {
    http: Client,
    api_base_url: String,
    session: Arc<SessionProvider>,
    user_id: OnceCell<String>,
}

impl SpotifyClient {
    pub fn new(api_base_url: impl Into<String>, session: Arc<SessionProvider>) -> Self {
        Self {
            http: Client::new(),
            api_base_url: api_base_url.into(),
            session,
            user_id: OnceCell::new(),
        }
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, SpotifyError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(SpotifyError::Api {
            status: status.as_u16(),
            message: body,
        })
    }

    fn map_send_error(e: reqwest::Error) -> SpotifyError {
        if e.is_timeout() {
            SpotifyError::Timeout
        } else {
            SpotifyError::Connection(e.to_string())
        }
    }

    /// Id of the user the session is authenticated as.
    async fn current_user_id(&self) -> Result<&str, SpotifyError> {
        self.user_id
            .get_or_try_init(|| async {
                let token = self.session.bearer_token().await?;
                let url = format!("{}/me", self.api_base_url);
                let response = self
                    .http
                    .get(&url)
                    .bearer_auth(&token)
                    .timeout(REQUEST_TIMEOUT)
                    .send()
                    .await
                    .map_err(Self::map_send_error)?;

                let me: CurrentUser = Self::check_status(response)
                    .await?
                    .json()
                    .await
                    .map_err(|e| {
                        SpotifyError::InvalidResponse(format!(
                            "Failed to parse current user: {}",
                            e
                        ))
                    })?;

                info!(user_id = %me.id, "Resolved Spotify user");
                Ok(me.id)
            })
            .await
            .map(String::as_str)
    }
}

#[async_trait]
impl TrackSearch for SpotifyClient {
    async fn search_tracks(&self, query: &str, limit: usize) -> Result<Vec<Track>, SpotifyError> {
        let token = self.session.bearer_token().await?;
        let url = format!("{}/search", self.api_base_url);

        debug!(%query, limit, "Searching for tracks");

        let response = self
            .http
            .get(&url)
            .bearer_auth(&token)
            .query(&[
                ("q", query),
                ("type", "track"),
                ("limit", &limit.to_string()),
            ])
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(Self::map_send_error)?;

        let search: SearchResponse = Self::check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| {
                SpotifyError::InvalidResponse(format!("Failed to parse search response: {}", e))
            })?;

        let tracks = tracks_from_items(search.tracks.items);
        debug!(%query, found = tracks.len(), "Track search completed");
        Ok(tracks)
    }
}

#[async_trait]
impl PlaylistService for SpotifyClient {
    async fn create_playlist(
        &self,
        name: &str,
        description: &str,
        public: bool,
    ) -> Result<CreatedPlaylist, SpotifyError> {
        let user_id = self.current_user_id().await?.to_string();
        let token = self.session.bearer_token().await?;
        let url = format!("{}/users/{}/playlists", self.api_base_url, user_id);

        info!(%name, "Creating Spotify playlist");

        let response = self
            .http
            .post(&url)
            .bearer_auth(&token)
            .json(&json!({
                "name": name,
                "description": description,
                "public": public,
            }))
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(Self::map_send_error)?;

        let playlist: PlaylistResponse = Self::check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| {
                SpotifyError::InvalidResponse(format!("Failed to parse playlist response: {}", e))
            })?;

        Ok(CreatedPlaylist {
            id: playlist.id,
            url: playlist.external_urls.spotify,
        })
    }

    async fn add_items(&self, playlist_id: &str, uris: &[String]) -> Result<(), SpotifyError> {
        if uris.len() > ADD_ITEMS_CHUNK_SIZE {
            return Err(SpotifyError::InvalidRequest(format!(
                "at most {} uris per add_items call, got {}",
                ADD_ITEMS_CHUNK_SIZE,
                uris.len()
            )));
        }

        let token = self.session.bearer_token().await?;
        let url = format!("{}/playlists/{}/tracks", self.api_base_url, playlist_id);

        let response = self
            .http
            .post(&url)
            .bearer_auth(&token)
            .json(&json!({ "uris": uris }))
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(Self::map_send_error)?;

        Self::check_status(response).await?;
        Ok(())
    }
}

// Spotify API types

#[derive(Debug, Deserialize)]
struct SearchResponse {
    tracks: SearchTracks,
}

#[derive(Debug, Deserialize)]
struct SearchTracks {
    /// Items stay loosely typed here; strict validation happens per record
    /// so one malformed item doesn't sink the page.
    items: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct CurrentUser {
    id: String,
}

#[derive(Debug, Deserialize)]
struct PlaylistResponse {
    id: String,
    external_urls: PlaylistExternalUrls,
}

#[derive(Debug, Deserialize)]
struct PlaylistExternalUrls {
    spotify: String,
}
