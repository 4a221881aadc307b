mod file_config;

pub use file_config::{FileConfig, OpenAiConfig, SpotifyConfig};

use crate::server::RequestsLoggingLevel;
use anyhow::{bail, Result};
use clap::ValueEnum;

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_SPOTIFY_API_BASE_URL: &str = "https://api.spotify.com/v1";
pub const DEFAULT_SPOTIFY_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub frontend_dir_path: Option<String>,
    pub playlist_length: usize,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            port: 8000,
            logging_level: RequestsLoggingLevel::default(),
            frontend_dir_path: None,
            playlist_length: 20,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    // Core settings
    pub port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub frontend_dir_path: Option<String>,
    /// Maximum number of tracks in a generated playlist.
    pub playlist_length: usize,

    // Collaborator settings
    pub openai: OpenAiSettings,
    pub spotify: SpotifySettings,
}

#[derive(Debug, Clone)]
pub struct OpenAiSettings {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
}

#[derive(Debug, Clone)]
pub struct SpotifySettings {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: Option<String>,
    pub api_base_url: String,
    pub token_url: String,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present; secrets fall back to
    /// environment variables when the file does not carry them.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let port = file.port.unwrap_or(cli.port);

        let logging_level = file
            .logging_level
            .and_then(|s| parse_logging_level(&s))
            .unwrap_or_else(|| cli.logging_level.clone());

        let frontend_dir_path = file
            .frontend_dir_path
            .or_else(|| cli.frontend_dir_path.clone());

        let playlist_length = file.playlist_length.unwrap_or(cli.playlist_length);
        if playlist_length == 0 {
            bail!("playlist_length must be positive");
        }

        let openai_file = file.openai.unwrap_or_default();
        let api_key = required_secret(openai_file.api_key, "OPENAI_API_KEY")?;
        let openai = OpenAiSettings {
            api_key,
            base_url: openai_file
                .base_url
                .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
            model: openai_file
                .model
                .unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
        };

        let spotify_file = file.spotify.unwrap_or_default();
        let client_id = required_secret(spotify_file.client_id, "SPOTIFY_CLIENT_ID")?;
        let client_secret = required_secret(spotify_file.client_secret, "SPOTIFY_CLIENT_SECRET")?;
        let refresh_token = spotify_file
            .refresh_token
            .or_else(|| non_empty_env("SPOTIFY_REFRESH_TOKEN"));
        let spotify = SpotifySettings {
            client_id,
            client_secret,
            refresh_token,
            api_base_url: spotify_file
                .api_base_url
                .unwrap_or_else(|| DEFAULT_SPOTIFY_API_BASE_URL.to_string()),
            token_url: spotify_file
                .token_url
                .unwrap_or_else(|| DEFAULT_SPOTIFY_TOKEN_URL.to_string()),
        };

        Ok(Self {
            port,
            logging_level,
            frontend_dir_path,
            playlist_length,
            openai,
            spotify,
        })
    }
}

fn non_empty_env(var: &str) -> Option<String> {
    std::env::var(var).ok().filter(|v| !v.trim().is_empty())
}

fn required_secret(file_value: Option<String>, env_var: &str) -> Result<String> {
    match file_value
        .filter(|v| !v.trim().is_empty())
        .or_else(|| non_empty_env(env_var))
    {
        Some(value) => Ok(value),
        None => bail!("{} must be set in the config file or environment", env_var),
    }
}

/// Parses a logging level string into RequestsLoggingLevel.
/// Uses clap's ValueEnum trait for parsing.
fn parse_logging_level(s: &str) -> Option<RequestsLoggingLevel> {
    RequestsLoggingLevel::from_str(s, true).ok()
}
