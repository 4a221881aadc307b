//! Curation: dedup, score, rank, truncate, diversify.
//!
//! The densest stage of the pipeline. Scoring is intent-independent:
//! popularity only.

use crate::spotify::Track;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashSet;
use tracing::{debug, warn};

/// The first entries of a curated list are pinned in place as
/// highest-scored anchors; only the tail gets shuffled.
const PINNED_TRACKS: usize = 2;

/// Lists of this length or shorter are left unshuffled.
const SHUFFLE_THRESHOLD: usize = 5;

/// Outcome of a curation run. The pipeline never hard-fails here; a
/// degraded outcome is an explicit value rather than a swallowed error so
/// callers can tell "fully curated" from "fell back".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CurationOutcome {
    Curated { duplicates_removed: usize },
    Fallback { reason: String },
}

#[derive(Debug, Clone)]
pub struct CurationResult {
    pub tracks: Vec<Track>,
    pub outcome: CurationOutcome,
}

impl CurationResult {
    pub fn is_degraded(&self) -> bool {
        matches!(self.outcome, CurationOutcome::Fallback { .. })
    }
}

/// Score a track on a 0.0-1.0 scale. Popularity missing from the backend
/// record was already defaulted to 50 at the deserialization boundary, so
/// this is total.
pub fn track_score(track: &Track) -> f64 {
    f64::from(track.popularity) / 100.0
}

/// Curate a candidate pool into a final ordered list of at most
/// `max_length` tracks.
pub fn curate(tracks: Vec<Track>, max_length: usize) -> CurationResult {
    curate_with_rng(tracks, max_length, &mut rand::rng())
}

/// Same as [`curate`], with an injectable rng for deterministic tests.
pub fn curate_with_rng<R: Rng + ?Sized>(
    tracks: Vec<Track>,
    max_length: usize,
    rng: &mut R,
) -> CurationResult {
    match try_curate(&tracks, max_length, rng) {
        Ok((curated, duplicates_removed)) => {
            debug!(
                selected = curated.len(),
                candidates = tracks.len(),
                duplicates_removed,
                "Curated playlist"
            );
            CurationResult {
                tracks: curated,
                outcome: CurationOutcome::Curated { duplicates_removed },
            }
        }
        Err(reason) => {
            // Fallback preserves pipeline liveness: first max_length
            // candidates of the original input, unscored and unshuffled.
            warn!(%reason, "Curation failed, falling back to unscored candidates");
            CurationResult {
                tracks: tracks.into_iter().take(max_length).collect(),
                outcome: CurationOutcome::Fallback { reason },
            }
        }
    }
}

fn try_curate<R: Rng + ?Sized>(
    tracks: &[Track],
    max_length: usize,
    rng: &mut R,
) -> Result<(Vec<Track>, usize), String> {
    if max_length == 0 {
        return Err("curation invoked with zero max length".to_string());
    }

    let (mut unique, duplicates_removed) = dedup_by_id(tracks);

    // Stable sort: ties keep dedup (arrival) order.
    unique.sort_by(|a, b| track_score(b).total_cmp(&track_score(a)));

    unique.truncate(max_length);

    if unique.len() > SHUFFLE_THRESHOLD {
        unique[PINNED_TRACKS..].shuffle(rng);
    }

    Ok((unique, duplicates_removed))
}

/// Remove duplicate track ids, first occurrence wins, order preserved.
/// Returns the surviving tracks and the number removed.
fn dedup_by_id(tracks: &[Track]) -> (Vec<Track>, usize) {
    let mut seen = HashSet::new();
    let mut unique = Vec::with_capacity(tracks.len());
    for track in tracks {
        if seen.insert(track.id.clone()) {
            unique.push(track.clone());
        }
    }
    let removed = tracks.len() - unique.len();
    (unique, removed)
}
