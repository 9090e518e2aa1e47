//! Trait definitions for the upstream API clients.
//!
//! These traits enable dependency injection and mocking for tests.
//! The crawler is generic over them; production code passes the real
//! clients, while tests substitute scripted implementations.
//!
//! # Example
//!
//! ```ignore
//! use rapgraff::sources::{LastFmApi, TopArtistsRequest};
//!
//! async fn chart<T: LastFmApi>(client: &T) -> Result<usize, SourceError> {
//!     let request = TopArtistsRequest { tag: "hip-hop".into(), limit: 5 };
//!     Ok(client.top_artists(&request).await?.artists.len())
//! }
//! ```

use async_trait::async_trait;

use super::domain::{
    RecordingSearchRequest, RecordingsPage, SourceError, TopArtistsPage, TopArtistsRequest,
    TopTracksPage, TopTracksRequest,
};

/// Chart source: top artists by tag and top tracks by artist.
#[async_trait]
pub trait LastFmApi: Send + Sync {
    /// Fetch the top artists for a tag.
    async fn top_artists(&self, request: &TopArtistsRequest)
    -> Result<TopArtistsPage, SourceError>;

    /// Fetch one page of an artist's top tracks.
    async fn top_tracks(&self, request: &TopTracksRequest) -> Result<TopTracksPage, SourceError>;
}

/// Credit source: recording search with artist credits.
#[async_trait]
pub trait MusicBrainzApi: Send + Sync {
    /// Search one page of the recordings credited to an artist.
    async fn search_recordings(
        &self,
        request: &RecordingSearchRequest,
    ) -> Result<RecordingsPage, SourceError>;
}

// Implement traits for real clients

#[async_trait]
impl LastFmApi for super::lastfm::LastFmClient {
    async fn top_artists(
        &self,
        request: &TopArtistsRequest,
    ) -> Result<TopArtistsPage, SourceError> {
        self.top_artists(request).await
    }

    async fn top_tracks(&self, request: &TopTracksRequest) -> Result<TopTracksPage, SourceError> {
        self.top_tracks(request).await
    }
}

#[async_trait]
impl MusicBrainzApi for super::musicbrainz::MusicBrainzClient {
    async fn search_recordings(
        &self,
        request: &RecordingSearchRequest,
    ) -> Result<RecordingsPage, SourceError> {
        self.search_recordings(request).await
    }
}

#[async_trait]
impl<T: LastFmApi + ?Sized> LastFmApi for std::sync::Arc<T> {
    async fn top_artists(
        &self,
        request: &TopArtistsRequest,
    ) -> Result<TopArtistsPage, SourceError> {
        (**self).top_artists(request).await
    }

    async fn top_tracks(&self, request: &TopTracksRequest) -> Result<TopTracksPage, SourceError> {
        (**self).top_tracks(request).await
    }
}

#[async_trait]
impl<T: MusicBrainzApi + ?Sized> MusicBrainzApi for std::sync::Arc<T> {
    async fn search_recordings(
        &self,
        request: &RecordingSearchRequest,
    ) -> Result<RecordingsPage, SourceError> {
        (**self).search_recordings(request).await
    }
}
