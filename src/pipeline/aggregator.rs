//! Track search fan-out: one search per directive, merged into a single
//! candidate pool.

use crate::intent::ParsedIntent;
use crate::spotify::{Track, TrackSearch};
use tracing::{debug, warn};

/// Issue one search per query in the intent, in directive order, and merge
/// the results. Backend order is preserved within a query, query order
/// across queries.
///
/// A query that errors or returns nothing is skipped, not fatal; the
/// aggregate only fails upward (empty pool) when every query yields nothing.
pub async fn search_tracks_for_intent(
    search: &dyn TrackSearch,
    intent: &ParsedIntent,
    per_query_limit: usize,
) -> Vec<Track> {
    let mut pool = Vec::new();

    for query in &intent.search_queries {
        match search.search_tracks(query, per_query_limit).await {
            Ok(tracks) => {
                if tracks.is_empty() {
                    debug!(%query, "Query returned no tracks");
                } else {
                    debug!(%query, count = tracks.len(), "Query returned tracks");
                    pool.extend(tracks);
                }
            }
            Err(err) => {
                warn!(%query, error = %err, "Track search failed for query, skipping");
            }
        }
    }

    pool
}
