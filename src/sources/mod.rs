//! Upstream metadata sources.
//!
//! Each source lives in its own module with the same layout:
//! - `dto`: wire types matching exactly what the API returns
//! - `adapter`: pure translation of DTOs into drafts
//! - `client`: the HTTP client
//!
//! # Architecture
//!
//! ```text
//! Scheduler → LastFmApi / MusicBrainzApi (traits) → Client → DTO → Adapter → Drafts
//! ```
//!
//! The crawler only talks to the traits in [`traits`], which lets tests
//! substitute scripted mocks for the real clients.

pub mod domain;
pub mod lastfm;
pub mod musicbrainz;
pub mod traits;

pub use domain::{
    RecordingSearchRequest, RecordingsPage, Source, SourceError, TopArtistsPage,
    TopArtistsRequest, TopTracksPage, TopTracksRequest,
};
pub use lastfm::LastFmClient;
pub use musicbrainz::MusicBrainzClient;
pub use traits::{LastFmApi, MusicBrainzApi};

/// Build a percent-encoded query string, keeping parameter order.
pub(crate) fn query_string(params: &[(&str, String)]) -> String {
    params
        .iter()
        .map(|(key, value)| format!("{}={}", key, urlencoding::encode(value)))
        .collect::<Vec<_>>()
        .join("&")
}
