//! Process-wide authenticated Spotify session.
//!
//! The token is acquired lazily on first use and cached until close to
//! expiry. The cache sits behind a `tokio::sync::Mutex` held across the
//! token request, so at most one acquisition is in flight at a time; the
//! common path is a cheap expiry check on the cached token.

use super::SpotifyError;
use reqwest::Client;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Tokens are treated as expired this long before their nominal expiry.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// OAuth grant used to obtain access tokens.
#[derive(Debug, Clone)]
pub enum Grant {
    /// App-only access, sufficient for track search.
    ClientCredentials,
    /// User-scoped access via a long-lived refresh token, required for
    /// playlist creation.
    RefreshToken(String),
}

struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

impl CachedToken {
    fn is_expired(&self) -> bool {
        Instant::now() + EXPIRY_MARGIN >= self.expires_at
    }
}

/// Injectable provider of bearer tokens for the Spotify Web API.
pub struct SessionProvider {
    http: Client,
    token_url: String,
    client_id: String,
    client_secret: String,
    grant: Grant,
    cached: Mutex<Option<CachedToken>>,
}

impl SessionProvider {
    pub fn new(
        token_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        grant: Grant,
    ) -> Self {
        Self {
            http: Client::new(),
            token_url: token_url.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            grant,
            cached: Mutex::new(None),
        }
    }

    /// Get a valid bearer token, authenticating if necessary.
    pub async fn bearer_token(&self) -> Result<String, SpotifyError> {
        let mut cached = self.cached.lock().await;

        if let Some(token) = cached.as_ref() {
            if !token.is_expired() {
                return Ok(token.access_token.clone());
            }
            debug!("Cached Spotify token expired, re-authenticating");
        }

        // Lock is held across the request: a single authentication attempt
        // is in flight at a time.
        let token = self.request_token().await?;
        let access_token = token.access_token.clone();
        *cached = Some(token);
        Ok(access_token)
    }

    /// Drop the cached token; the next call to [`bearer_token`] will
    /// re-authenticate.
    ///
    /// [`bearer_token`]: SessionProvider::bearer_token
    pub async fn invalidate(&self) {
        *self.cached.lock().await = None;
    }

    async fn request_token(&self) -> Result<CachedToken, SpotifyError> {
        let form: Vec<(&str, &str)> = match &self.grant {
            Grant::ClientCredentials => vec![("grant_type", "client_credentials")],
            Grant::RefreshToken(refresh_token) => vec![
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token.as_str()),
            ],
        };

        let response = self
            .http
            .post(&self.token_url)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&form)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SpotifyError::Timeout
                } else {
                    SpotifyError::Connection(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SpotifyError::Unauthenticated(format!(
                "token request failed with status {}: {}",
                status, body
            )));
        }

        let token: TokenResponse = response.json().await.map_err(|e| {
            SpotifyError::InvalidResponse(format!("Failed to parse token response: {}", e))
        })?;

        info!(grant = ?grant_name(&self.grant), "Authenticated with Spotify");

        Ok(CachedToken {
            access_token: token.access_token,
            expires_at: Instant::now() + Duration::from_secs(token.expires_in),
        })
    }
}

fn grant_name(grant: &Grant) -> &'static str {
    match grant {
        Grant::ClientCredentials => "client_credentials",
        Grant::RefreshToken(_) => "refresh_token",
    }
}

#[derive(serde::Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}
