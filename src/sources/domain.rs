//! Internal request and response types for the upstream sources.
//!
//! Request descriptors and response pages are deliberately separate types:
//! a request is built fresh for every call and never doubles as a holder
//! for the response.

use std::fmt;

use crate::model::{ArtistDraft, RecordingDraft, TrackDraft};

/// The upstream an API call goes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Source {
    /// Artist/track charts (Last.fm)
    LastFm,
    /// Recording credits (MusicBrainz)
    MusicBrainz,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::LastFm => f.write_str("last.fm"),
            Source::MusicBrainz => f.write_str("musicbrainz"),
        }
    }
}

/// `tag.getTopArtists`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopArtistsRequest {
    pub tag: String,
    pub limit: u32,
}

/// `artist.getTopTracks`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopTracksRequest {
    pub artist_id: String,
    /// 1-based page number
    pub page: u32,
    pub limit: u32,
}

/// Recording search scoped to one artist, with artist credits included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordingSearchRequest {
    pub artist_id: String,
    pub limit: u32,
    pub offset: u32,
}

/// One page of chart artists.
#[derive(Debug, Clone, Default)]
pub struct TopArtistsPage {
    pub artists: Vec<ArtistDraft>,
}

/// One page of an artist's top tracks.
#[derive(Debug, Clone, Default)]
pub struct TopTracksPage {
    pub tracks: Vec<TrackDraft>,
    pub page: u32,
    /// Page count reported by the upstream
    pub total_pages: u32,
}

/// One page of recording search results.
#[derive(Debug, Clone, Default)]
pub struct RecordingsPage {
    /// Total number of recordings matching the search
    pub count: u32,
    pub offset: u32,
    pub recordings: Vec<RecordingDraft>,
}

/// Errors from the upstream sources.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SourceError {
    /// Application-level error reported inside a response body
    #[error("{upstream} error {code}: {message}")]
    Api {
        upstream: Source,
        code: i64,
        message: String,
    },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Rate limited - try again later")]
    RateLimited,

    #[error("Failed to parse response: {0}")]
    Parse(String),
}

impl SourceError {
    /// Whether another attempt of the same request could succeed.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, SourceError::Parse(_))
    }
}
