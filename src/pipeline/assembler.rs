//! Playlist assembly: derive a name and description from the intent and
//! submit the curated tracks to the playlist-creation backend.

use crate::intent::ParsedIntent;
use crate::spotify::{PlaylistService, SpotifyError, Track, ADD_ITEMS_CHUNK_SIZE};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::info;

pub const DEFAULT_PLAYLIST_NAME: &str = "Promptify DJ Playlist";
const NAME_SUFFIX: &str = " Vibes";
const ATTRIBUTION: &str = "Generated by Promptify DJ";
const DESCRIPTION_SEPARATOR: &str = " | ";

lazy_static! {
    /// A field-filter term: the filter keyword plus its quoted or bare value.
    static ref FIELD_FILTER: Regex =
        Regex::new(r#"(?:artist|track|genre|year):(?:"[^"]*"|\S+)"#).unwrap();
}

/// Derive a human-readable playlist name from the first search query:
/// field-filter terms and quote characters removed, remainder title-cased,
/// fixed suffix appended. Falls back to a default name when nothing is left.
pub fn derive_playlist_name(intent: &ParsedIntent) -> String {
    let Some(first_query) = intent.search_queries.first() else {
        return DEFAULT_PLAYLIST_NAME.to_string();
    };

    let stripped = FIELD_FILTER.replace_all(first_query, "");
    let cleaned = stripped.replace('"', "");

    let words: Vec<String> = cleaned.split_whitespace().map(title_case_word).collect();
    if words.is_empty() {
        DEFAULT_PLAYLIST_NAME.to_string()
    } else {
        format!("{}{}", words.join(" "), NAME_SUFFIX)
    }
}

/// Derive a playlist description: up to the first two queries, the track
/// count, and a fixed attribution, with a fixed separator.
pub fn derive_playlist_description(intent: &ParsedIntent, track_count: usize) -> String {
    let mut parts = Vec::new();

    if !intent.search_queries.is_empty() {
        let queries: Vec<&str> = intent
            .search_queries
            .iter()
            .take(2)
            .map(String::as_str)
            .collect();
        parts.push(format!("Queries: {}", queries.join(", ")));
    }

    parts.push(format!("{} tracks", track_count));
    parts.push(ATTRIBUTION.to_string());

    parts.join(DESCRIPTION_SEPARATOR)
}

fn title_case_word(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
    }
}

/// Create the external playlist and attach the curated tracks in order, in
/// backend-imposed chunks. Returns the playlist URL.
pub async fn assemble(
    service: &dyn PlaylistService,
    tracks: &[Track],
    intent: &ParsedIntent,
) -> Result<String, SpotifyError> {
    let name = derive_playlist_name(intent);
    let description = derive_playlist_description(intent, tracks.len());

    let uris: Vec<String> = tracks
        .iter()
        .filter(|t| !t.uri.is_empty())
        .map(|t| t.uri.clone())
        .collect();

    let playlist = service.create_playlist(&name, &description, true).await?;

    for chunk in uris.chunks(ADD_ITEMS_CHUNK_SIZE) {
        service.add_items(&playlist.id, chunk).await?;
    }

    info!(%name, tracks = uris.len(), url = %playlist.url, "Created playlist");
    Ok(playlist.url)
}
