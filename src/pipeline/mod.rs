//! The playlist generation pipeline.
//!
//! Sequences intent parsing, track search aggregation, curation, and
//! playlist assembly into a single entry point with a structured failure
//! taxonomy. Stages 2-5 perform network calls; no local state is touched.

pub mod aggregator;
pub mod assembler;
pub mod curator;

pub use curator::{CurationOutcome, CurationResult};

use crate::intent::{IntentParser, ParsedIntent};
use crate::spotify::{PlaylistService, Track, TrackSearch};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// Terminal pipeline failures. Degradations (curation fallback, playlist
/// creation failure) are not errors; they surface as fields on the
/// [`GeneratedPlaylist`].
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("No transcript provided")]
    EmptyInput { transcript: String },

    #[error("Failed to parse user intent: {reason}")]
    IntentParseFailed { transcript: String, reason: String },

    #[error("No tracks found for the given criteria")]
    NoTracksFound {
        transcript: String,
        intent: ParsedIntent,
    },
}

impl PipelineError {
    /// HTTP-agnostic error kind, for structured error responses.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::EmptyInput { .. } => "empty_input",
            PipelineError::IntentParseFailed { .. } => "intent_parse_failed",
            PipelineError::NoTracksFound { .. } => "no_tracks_found",
        }
    }

    /// The original transcript, for caller diagnostics.
    pub fn transcript(&self) -> &str {
        match self {
            PipelineError::EmptyInput { transcript }
            | PipelineError::IntentParseFailed { transcript, .. }
            | PipelineError::NoTracksFound { transcript, .. } => transcript,
        }
    }

    /// The parsed intent, where the pipeline got far enough to have one.
    pub fn parsed_intent(&self) -> Option<&ParsedIntent> {
        match self {
            PipelineError::NoTracksFound { intent, .. } => Some(intent),
            _ => None,
        }
    }
}

/// The terminal artifact of one pipeline run. Created once per request,
/// never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedPlaylist {
    pub transcript: String,
    pub parsed_intent: ParsedIntent,
    pub tracks: Vec<Track>,
    pub playlist_url: Option<String>,
    pub generated_at: DateTime<Utc>,
    pub total_tracks: usize,
    /// True when curation fell back to unscored candidates.
    pub curation_degraded: bool,
}

/// Orchestrates the playlist generation pipeline. Sole entry point used by
/// the API layer.
pub struct PlaylistBuilder {
    intent_parser: Arc<dyn IntentParser>,
    track_search: Arc<dyn TrackSearch>,
    playlist_service: Arc<dyn PlaylistService>,
    playlist_length: usize,
}

impl PlaylistBuilder {
    pub fn new(
        intent_parser: Arc<dyn IntentParser>,
        track_search: Arc<dyn TrackSearch>,
        playlist_service: Arc<dyn PlaylistService>,
        playlist_length: usize,
    ) -> Self {
        Self {
            intent_parser,
            track_search,
            playlist_service,
            playlist_length,
        }
    }

    pub fn playlist_length(&self) -> usize {
        self.playlist_length
    }

    /// The intent parser, exposed for the diagnostic intent endpoint.
    pub fn intent_parser(&self) -> &dyn IntentParser {
        self.intent_parser.as_ref()
    }

    /// Generate a playlist from a transcript, short-circuiting on the first
    /// terminal failure. Curation and playlist creation degrade instead of
    /// failing: the contract is "always return the best achievable result".
    pub async fn generate_playlist(
        &self,
        transcript: &str,
        create_playlist: bool,
    ) -> Result<GeneratedPlaylist, PipelineError> {
        if transcript.trim().is_empty() {
            warn!("Empty transcript provided");
            return Err(PipelineError::EmptyInput {
                transcript: transcript.to_string(),
            });
        }

        info!("Step 1: Parsing user intent");
        let intent = self
            .intent_parser
            .parse_intent(transcript)
            .await
            .map_err(|err| PipelineError::IntentParseFailed {
                transcript: transcript.to_string(),
                reason: err.to_string(),
            })?;

        info!(queries = intent.search_queries.len(), "Step 2: Searching for tracks");
        let pool = aggregator::search_tracks_for_intent(
            self.track_search.as_ref(),
            &intent,
            self.playlist_length,
        )
        .await;

        if pool.is_empty() {
            warn!("No tracks found for any search query");
            return Err(PipelineError::NoTracksFound {
                transcript: transcript.to_string(),
                intent,
            });
        }

        info!(candidates = pool.len(), "Step 3: Curating playlist");
        let curated = curator::curate(pool, self.playlist_length);

        let mut playlist_url = None;
        if create_playlist && !curated.tracks.is_empty() {
            info!("Step 4: Creating Spotify playlist");
            match assembler::assemble(self.playlist_service.as_ref(), &curated.tracks, &intent)
                .await
            {
                Ok(url) => playlist_url = Some(url),
                Err(err) => {
                    // Degrades rather than failing: the caller still gets
                    // the ranked track list.
                    warn!(error = %err, "Playlist creation failed, returning tracks only");
                }
            }
        }

        let curation_degraded = curated.is_degraded();
        let total_tracks = curated.tracks.len();
        info!(total_tracks, "Playlist generation completed");

        Ok(GeneratedPlaylist {
            transcript: transcript.to_string(),
            parsed_intent: intent,
            tracks: curated.tracks,
            playlist_url,
            generated_at: Utc::now(),
            total_tracks,
            curation_degraded,
        })
    }
}
