//! Wire types for the Spotify Web API, plus the validated [`Track`] record
//! the rest of the pipeline works with.
//!
//! The search backend returns loosely-shaped objects; validation happens
//! here, at the collaborator boundary. A record missing a required field is
//! skipped and counted, never propagated.

use serde::{Deserialize, Serialize};
use tracing::warn;

/// A candidate track as used by the pipeline. Immutable once produced by the
/// search boundary; owned transiently by the aggregator and curator during
/// one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    /// Opaque backend-assigned id, unique per track.
    pub id: String,
    pub name: String,
    /// Primary artist name.
    pub artist: String,
    pub album: String,
    /// Playable URI, used for playlist assembly.
    pub uri: String,
    /// 0-100. Defaulted to 50 when the backend omits it.
    pub popularity: u8,
    pub duration_ms: u64,
    pub external_url: String,
    pub preview_url: Option<String>,
}

/// A freshly created external playlist.
#[derive(Debug, Clone)]
pub struct CreatedPlaylist {
    pub id: String,
    pub url: String,
}

fn default_popularity() -> u8 {
    50
}

/// Raw track object as returned by the search endpoint. Required fields are
/// enforced by deserialization; one malformed item must not sink the page,
/// so items are decoded individually (see [`tracks_from_items`]).
#[derive(Debug, Deserialize)]
pub(super) struct TrackObject {
    id: String,
    name: String,
    artists: Vec<ArtistObject>,
    album: AlbumObject,
    uri: String,
    #[serde(default = "default_popularity")]
    popularity: u8,
    duration_ms: u64,
    external_urls: ExternalUrls,
    #[serde(default)]
    preview_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ArtistObject {
    name: String,
}

#[derive(Debug, Deserialize)]
struct AlbumObject {
    name: String,
}

#[derive(Debug, Deserialize)]
struct ExternalUrls {
    spotify: String,
}

impl TryFrom<TrackObject> for Track {
    type Error = String;

    fn try_from(raw: TrackObject) -> Result<Self, Self::Error> {
        let artist = raw
            .artists
            .into_iter()
            .next()
            .map(|a| a.name)
            .ok_or_else(|| format!("track {} has no artists", raw.id))?;

        Ok(Track {
            id: raw.id,
            name: raw.name,
            artist,
            album: raw.album.name,
            uri: raw.uri,
            popularity: raw.popularity.min(100),
            duration_ms: raw.duration_ms,
            external_url: raw.external_urls.spotify,
            preview_url: raw.preview_url,
        })
    }
}

/// Decode raw search items into validated tracks, dropping malformed records.
/// Returns the surviving tracks in backend order.
pub(super) fn tracks_from_items(items: Vec<serde_json::Value>) -> Vec<Track> {
    let total = items.len();
    let tracks: Vec<Track> = items
        .into_iter()
        .filter_map(|item| {
            serde_json::from_value::<TrackObject>(item)
                .map_err(|e| e.to_string())
                .and_then(Track::try_from)
                .map_err(|reason| warn!("Skipping malformed track record: {}", reason))
                .ok()
        })
        .collect();

    let skipped = total - tracks.len();
    if skipped > 0 {
        warn!("Skipped {} malformed track records out of {}", skipped, total);
    }
    tracks
}


#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw_track(id: &str) -> serde_json::Value {
        json!({
            "id": id,
            "name": "Bohemian Rhapsody",
            "artists": [{"name": "Queen"}, {"name": "Someone Else"}],
            "album": {"name": "A Night at the Opera"},
            "uri": format!("spotify:track:{}", id),
            "popularity": 87,
            "duration_ms": 354947,
            "external_urls": {"spotify": format!("https://open.spotify.com/track/{}", id)},
            "preview_url": null
        })
    }

    #[test]
    fn decodes_valid_track() {
        let tracks = tracks_from_items(vec![raw_track("abc")]);
        assert_eq!(tracks.len(), 1);
        let track = &tracks[0];
        assert_eq!(track.id, "abc");
        assert_eq!(track.artist, "Queen");
        assert_eq!(track.album, "A Night at the Opera");
        assert_eq!(track.popularity, 87);
        assert!(track.preview_url.is_none());
    }

    #[test]
    fn drops_record_missing_required_field() {
        let mut broken = raw_track("broken");
        broken.as_object_mut().unwrap().remove("uri");

        let tracks = tracks_from_items(vec![raw_track("ok"), broken, raw_track("ok2")]);
        let ids: Vec<&str> = tracks.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["ok", "ok2"]);
    }

    #[test]
    fn drops_record_with_empty_artists() {
        let mut no_artists = raw_track("na");
        no_artists["artists"] = json!([]);

        let tracks = tracks_from_items(vec![no_artists]);
        assert!(tracks.is_empty());
    }

    #[test]
    fn defaults_missing_popularity_to_50() {
        let mut track = raw_track("pop");
        track.as_object_mut().unwrap().remove("popularity");

        let tracks = tracks_from_items(vec![track]);
        assert_eq!(tracks[0].popularity, 50);
    }

    #[test]
    fn clamps_out_of_range_popularity() {
        let mut track = raw_track("hot");
        track["popularity"] = json!(250);

        // 250 doesn't fit u8's 0-100 expectation but does fit u8; serde
        // accepts it and the conversion clamps.
        let tracks = tracks_from_items(vec![track]);
        assert_eq!(tracks[0].popularity, 100);
    }
}
