use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, level_filters::LevelFilter, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use promptify_server::config::{AppConfig, CliConfig, FileConfig};
use promptify_server::pipeline::PlaylistBuilder;
use promptify_server::server::{run_server, RequestsLoggingLevel, ServerConfig};
use promptify_server::spotify::{Grant, SessionProvider, SpotifyClient};
use promptify_server::OpenAiIntentParser;

#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to a TOML config file. Secrets can also come from the
    /// OPENAI_API_KEY / SPOTIFY_* environment variables.
    #[clap(short, long)]
    pub config: Option<PathBuf>,

    /// The port to listen on.
    #[clap(short, long, default_value_t = 8000)]
    pub port: u16,

    /// The level of logging to perform on each request.
    #[clap(long, default_value = "path")]
    pub logging_level: RequestsLoggingLevel,

    /// Path to the frontend directory to be statically served.
    #[clap(long)]
    pub frontend_dir_path: Option<String>,

    /// Maximum number of tracks in a generated playlist.
    #[clap(long, default_value_t = 20)]
    pub playlist_length: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .unwrap();

    let file_config = cli_args
        .config
        .as_deref()
        .map(FileConfig::load)
        .transpose()?;

    let cli_config = CliConfig {
        port: cli_args.port,
        logging_level: cli_args.logging_level,
        frontend_dir_path: cli_args.frontend_dir_path,
        playlist_length: cli_args.playlist_length,
    };
    let config = AppConfig::resolve(&cli_config, file_config)?;

    let intent_parser = Arc::new(OpenAiIntentParser::new(
        config.openai.base_url.clone(),
        config.openai.model.clone(),
        config.openai.api_key.clone(),
    ));

    // App-only session for track search.
    let search_session = Arc::new(SessionProvider::new(
        config.spotify.token_url.clone(),
        config.spotify.client_id.clone(),
        config.spotify.client_secret.clone(),
        Grant::ClientCredentials,
    ));
    let search_client = Arc::new(SpotifyClient::new(
        config.spotify.api_base_url.clone(),
        search_session,
    ));

    // User-scoped session for playlist creation, when a refresh token is
    // configured. Without one, playlist creation degrades to tracks-only
    // results.
    let playlist_grant = match config.spotify.refresh_token.clone() {
        Some(refresh_token) => Grant::RefreshToken(refresh_token),
        None => {
            warn!("No Spotify refresh token configured; playlist creation will be unavailable");
            Grant::ClientCredentials
        }
    };
    let playlist_session = Arc::new(SessionProvider::new(
        config.spotify.token_url.clone(),
        config.spotify.client_id.clone(),
        config.spotify.client_secret.clone(),
        playlist_grant,
    ));
    let playlist_client = Arc::new(SpotifyClient::new(
        config.spotify.api_base_url.clone(),
        playlist_session,
    ));

    let pipeline = Arc::new(PlaylistBuilder::new(
        intent_parser,
        search_client,
        playlist_client,
        config.playlist_length,
    ));

    info!("Ready to serve at port {}!", config.port);
    run_server(
        ServerConfig {
            port: config.port,
            requests_logging_level: config.logging_level,
            frontend_dir_path: config.frontend_dir_path,
        },
        pipeline,
    )
    .await
}
