use anyhow::Result;
use std::{sync::Arc, time::Duration, time::Instant};

use crate::intent::ParsedIntent;
use crate::pipeline::{GeneratedPlaylist, PipelineError, PlaylistBuilder};
use tower_http::services::ServeDir;

use axum::{
    extract::State,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::{log_requests, state::*, ServerConfig};

#[derive(Serialize)]
struct ServerStats {
    pub uptime: String,
    pub hash: String,
    pub version: String,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

fn default_create_playlist() -> bool {
    true
}

#[derive(Deserialize, Debug)]
struct GeneratePlaylistBody {
    pub transcript: String,
    #[serde(default = "default_create_playlist")]
    pub create_playlist: bool,
}

#[derive(Deserialize, Debug)]
struct ParseIntentBody {
    pub transcript: String,
}

#[derive(Serialize)]
struct ParseIntentResponse {
    transcript: String,
    parsed_intent: ParsedIntent,
}

/// Structured error body: an HTTP-agnostic kind plus a human-readable
/// message, with the transcript (and intent, where available) attached for
/// caller diagnostics.
#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
    transcript: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    parsed_intent: Option<ParsedIntent>,
}

fn pipeline_error_response(err: PipelineError) -> Response {
    let status = match &err {
        PipelineError::EmptyInput { .. } => StatusCode::BAD_REQUEST,
        PipelineError::IntentParseFailed { .. } => StatusCode::BAD_GATEWAY,
        PipelineError::NoTracksFound { .. } => StatusCode::NOT_FOUND,
    };
    let body = ErrorBody {
        error: err.kind(),
        message: err.to_string(),
        transcript: err.transcript().to_string(),
        parsed_intent: err.parsed_intent().cloned(),
    };
    (status, Json(body)).into_response()
}

async fn home(State(state): State<ServerState>) -> impl IntoResponse {
    let stats = ServerStats {
        uptime: format_uptime(state.start_time.elapsed()),
        hash: state.hash.clone(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    };
    Json(stats)
}

async fn health(State(pipeline): State<GuardedPipeline>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "playlist_length": pipeline.playlist_length(),
    }))
}

async fn generate_playlist(
    State(pipeline): State<GuardedPipeline>,
    Json(body): Json<GeneratePlaylistBody>,
) -> Response {
    match pipeline
        .generate_playlist(&body.transcript, body.create_playlist)
        .await
    {
        Ok(playlist) => Json::<GeneratedPlaylist>(playlist).into_response(),
        Err(err) => pipeline_error_response(err),
    }
}

async fn parse_intent(
    State(pipeline): State<GuardedPipeline>,
    Json(body): Json<ParseIntentBody>,
) -> Response {
    if body.transcript.trim().is_empty() {
        return pipeline_error_response(PipelineError::EmptyInput {
            transcript: body.transcript,
        });
    }

    match pipeline.intent_parser().parse_intent(&body.transcript).await {
        Ok(parsed_intent) => Json(ParseIntentResponse {
            transcript: body.transcript,
            parsed_intent,
        })
        .into_response(),
        Err(err) => pipeline_error_response(PipelineError::IntentParseFailed {
            transcript: body.transcript,
            reason: err.to_string(),
        }),
    }
}

impl ServerState {
    fn new(config: ServerConfig, pipeline: Arc<PlaylistBuilder>) -> ServerState {
        ServerState {
            config,
            start_time: Instant::now(),
            pipeline,
            hash: env!("GIT_HASH").to_owned(),
        }
    }
}

pub fn make_app(config: ServerConfig, pipeline: Arc<PlaylistBuilder>) -> Router {
    let state = ServerState::new(config.clone(), pipeline);

    let api_routes: Router = Router::new()
        .route("/playlist", post(generate_playlist))
        .route("/intent", post(parse_intent))
        .with_state(state.clone());

    let home_router: Router = match config.frontend_dir_path {
        Some(frontend_path) => {
            let static_files_service =
                ServeDir::new(frontend_path).append_index_html_on_directories(true);
            Router::new().fallback_service(static_files_service)
        }
        None => Router::new()
            .route("/", get(home))
            .with_state(state.clone()),
    };

    home_router
        .route("/health", get(health).with_state(state.clone()))
        .nest("/v1", api_routes)
        .layer(middleware::from_fn_with_state(state, log_requests))
}

pub async fn run_server(config: ServerConfig, pipeline: Arc<PlaylistBuilder>) -> Result<()> {
    let port = config.port;
    let app = make_app(config, pipeline);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    Ok(axum::serve(listener, app).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intent::{IntentError, IntentParser};
    use crate::spotify::models::test_support::track;
    use crate::spotify::{
        CreatedPlaylist, PlaylistService, SpotifyError, Track, TrackSearch,
    };
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt; // for `oneshot`

    struct FixedParser(Result<Vec<&'static str>, ()>);

    #[async_trait]
    impl IntentParser for FixedParser {
        async fn parse_intent(&self, _transcript: &str) -> Result<ParsedIntent, IntentError> {
            match &self.0 {
                Ok(queries) => Ok(ParsedIntent {
                    search_queries: queries.iter().map(|q| q.to_string()).collect(),
                }),
                Err(()) => Err(IntentError::InvalidResponse(
                    "missing required 'search_queries' field".to_string(),
                )),
            }
        }
    }

    struct FixedSearch(Vec<Track>);

    #[async_trait]
    impl TrackSearch for FixedSearch {
        async fn search_tracks(
            &self,
            _query: &str,
            _limit: usize,
        ) -> Result<Vec<Track>, SpotifyError> {
            Ok(self.0.clone())
        }
    }

    struct FixedPlaylists;

    #[async_trait]
    impl PlaylistService for FixedPlaylists {
        async fn create_playlist(
            &self,
            _name: &str,
            _description: &str,
            _public: bool,
        ) -> Result<CreatedPlaylist, SpotifyError> {
            Ok(CreatedPlaylist {
                id: "pl1".to_string(),
                url: "https://open.spotify.com/playlist/pl1".to_string(),
            })
        }

        async fn add_items(&self, _id: &str, _uris: &[String]) -> Result<(), SpotifyError> {
            Ok(())
        }
    }

    fn test_app(parser: FixedParser, tracks: Vec<Track>) -> Router {
        let pipeline = Arc::new(PlaylistBuilder::new(
            Arc::new(parser),
            Arc::new(FixedSearch(tracks)),
            Arc::new(FixedPlaylists),
            20,
        ));
        make_app(ServerConfig::default(), pipeline)
    }

    fn json_request(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn empty_transcript_gets_bad_request() {
        let app = test_app(FixedParser(Ok(vec!["rock"])), vec![track("a", 50)]);

        let response = app
            .oneshot(json_request(
                "/v1/playlist",
                serde_json::json!({"transcript": "   "}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"], "empty_input");
        assert_eq!(body["transcript"], "   ");
    }

    #[tokio::test]
    async fn intent_parse_failure_gets_bad_gateway() {
        let app = test_app(FixedParser(Err(())), vec![track("a", 50)]);

        let response = app
            .oneshot(json_request(
                "/v1/playlist",
                serde_json::json!({"transcript": "play something"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body = body_json(response).await;
        assert_eq!(body["error"], "intent_parse_failed");
        assert_eq!(body["transcript"], "play something");
        assert!(body.get("parsed_intent").is_none());
    }

    #[tokio::test]
    async fn no_tracks_gets_not_found_with_intent() {
        let app = test_app(FixedParser(Ok(vec!["obscure"])), vec![]);

        let response = app
            .oneshot(json_request(
                "/v1/playlist",
                serde_json::json!({"transcript": "play something obscure"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert_eq!(body["error"], "no_tracks_found");
        assert_eq!(body["parsed_intent"]["search_queries"][0], "obscure");
    }

    #[tokio::test]
    async fn generate_playlist_succeeds() {
        let app = test_app(
            FixedParser(Ok(vec!["rock"])),
            vec![track("a", 80), track("b", 60)],
        );

        let response = app
            .oneshot(json_request(
                "/v1/playlist",
                serde_json::json!({"transcript": "rock please", "create_playlist": true}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["total_tracks"], 2);
        assert_eq!(
            body["playlist_url"],
            "https://open.spotify.com/playlist/pl1"
        );
        assert_eq!(body["curation_degraded"], false);
    }

    #[tokio::test]
    async fn parse_intent_route_returns_queries() {
        let app = test_app(FixedParser(Ok(vec!["genre:jazz"])), vec![]);

        let response = app
            .oneshot(json_request(
                "/v1/intent",
                serde_json::json!({"transcript": "some jazz"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["parsed_intent"]["search_queries"][0], "genre:jazz");
    }

    #[tokio::test]
    async fn health_reports_playlist_length() {
        let app = test_app(FixedParser(Ok(vec!["rock"])), vec![]);

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["playlist_length"], 20);
    }
}
