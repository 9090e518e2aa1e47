//! MusicBrainz API integration
//!
//! Provides the credit data for discovered tracks: a recording search
//! scoped to one artist, with artist credits included.
//!
//! API docs: https://musicbrainz.org/doc/MusicBrainz_API

pub mod dto;
mod adapter;
mod client;
mod xml;

pub use client::MusicBrainzClient;

/// Largest `limit` the search endpoint honours
pub const MAX_SEARCH_LIMIT: u32 = 100;
