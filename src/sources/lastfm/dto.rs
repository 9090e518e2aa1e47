//! Last.fm API Data Transfer Objects
//!
//! These types match what the Last.fm 2.0 JSON API returns.
//! DO NOT use these types outside the lastfm module - convert to drafts.
//!
//! API Reference: https://www.last.fm/api
//!
//! Quirks handled here:
//! - Counts and page numbers arrive as strings (`"playcount": "1234"`)
//! - A list with a single entry may arrive as a bare object
//! - Errors come back with HTTP 200 and an `error`/`message` pair

use serde::{Deserialize, Serialize};

/// Either an application error or the expected payload.
///
/// The error variant is tried first: a successful payload never has an
/// `error` field.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Envelope<T> {
    Error(ApiError),
    Ok(T),
}

/// Error body (`{"error": 6, "message": "..."}`)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiError {
    pub error: i64,
    pub message: String,
}

/// A JSON list that collapses to a single object when it has one entry.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> From<OneOrMany<T>> for Vec<T> {
    fn from(value: OneOrMany<T>) -> Self {
        match value {
            OneOrMany::Many(items) => items,
            OneOrMany::One(item) => vec![item],
        }
    }
}

/// A number that may be encoded as a JSON string.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Count {
    Number(u64),
    Text(String),
}

impl Count {
    /// Textual form, left for validation to parse.
    pub fn into_text(self) -> String {
        match self {
            Count::Number(n) => n.to_string(),
            Count::Text(s) => s,
        }
    }
}

/// Image entry (`{"#text": "https://...", "size": "large"}`)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Image {
    #[serde(rename = "#text")]
    pub text: Option<String>,
    pub size: Option<String>,
}

/// Pagination attributes (`@attr`)
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageAttr {
    pub page: Option<Count>,
    pub per_page: Option<Count>,
    pub total_pages: Option<Count>,
    pub total: Option<Count>,
}

/// `tag.getTopArtists` response
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TopArtistsResponse {
    pub topartists: TopArtists,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TopArtists {
    pub artist: Option<OneOrMany<Artist>>,
    #[serde(rename = "@attr")]
    pub attr: Option<PageAttr>,
}

/// Chart artist
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Artist {
    pub name: Option<String>,
    /// MusicBrainz id (empty string when unknown)
    pub mbid: Option<String>,
    pub url: Option<String>,
    pub image: Option<OneOrMany<Image>>,
}

/// `artist.getTopTracks` response
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TopTracksResponse {
    pub toptracks: TopTracks,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TopTracks {
    pub track: Option<OneOrMany<Track>>,
    #[serde(rename = "@attr")]
    pub attr: Option<PageAttr>,
}

/// Chart track
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Track {
    pub name: Option<String>,
    pub mbid: Option<String>,
    pub url: Option<String>,
    pub duration: Option<Count>,
    pub playcount: Option<Count>,
    pub listeners: Option<Count>,
    pub artist: Option<TrackArtist>,
    pub image: Option<OneOrMany<Image>>,
}

/// Artist reference embedded in a track
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TrackArtist {
    pub name: Option<String>,
    pub mbid: Option<String>,
    pub url: Option<String>,
}

// ============================================================================
// CONTRACT TESTS
// These verify our DTOs match what the real API returns.
// ============================================================================
