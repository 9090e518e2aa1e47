//! Adapter layer: Convert Last.fm DTOs to drafts
//!
//! This is the ONLY place where Last.fm DTO types are translated. Every
//! function here is pure; validation happens later on the drafts.

use super::dto;
use crate::model::{ArtistDraft, ImageDraft, TrackDraft};
use crate::sources::domain::{Source, SourceError, TopArtistsPage, TopTracksPage};

/// Unwrap the error envelope, surfacing application errors.
pub fn check<T>(envelope: dto::Envelope<T>) -> Result<T, SourceError> {
    match envelope {
        dto::Envelope::Ok(payload) => Ok(payload),
        dto::Envelope::Error(err) => Err(SourceError::Api {
            upstream: Source::LastFm,
            code: err.error,
            message: err.message,
        }),
    }
}

/// Convert a `tag.getTopArtists` response to a page of drafts
pub fn to_top_artists_page(response: dto::TopArtistsResponse) -> TopArtistsPage {
    let artists: Vec<dto::Artist> = response
        .topartists
        .artist
        .map(Vec::from)
        .unwrap_or_default();

    TopArtistsPage {
        artists: artists.into_iter().map(to_artist_draft).collect(),
    }
}

/// Convert an `artist.getTopTracks` response to a page of drafts
///
/// A missing or unreadable `totalPages` is treated as a single page, so
/// pagination always terminates.
pub fn to_top_tracks_page(response: dto::TopTracksResponse) -> TopTracksPage {
    let tracks: Vec<dto::Track> = response.toptracks.track.map(Vec::from).unwrap_or_default();
    let attr = response.toptracks.attr;

    let page = attr
        .as_ref()
        .and_then(|a| a.page.clone())
        .and_then(count_value)
        .unwrap_or(1);
    let total_pages = attr
        .and_then(|a| a.total_pages)
        .and_then(count_value)
        .unwrap_or(1);

    TopTracksPage {
        tracks: tracks.into_iter().map(to_track_draft).collect(),
        page,
        total_pages,
    }
}

/// Map a chart artist. The MusicBrainz id becomes the identity.
pub fn to_artist_draft(artist: dto::Artist) -> ArtistDraft {
    ArtistDraft {
        id: artist.mbid,
        name: artist.name,
        url: artist.url,
        images: artist.image.map(to_image_drafts),
    }
}

/// Map a chart track. The owner is the embedded artist's MusicBrainz id.
pub fn to_track_draft(track: dto::Track) -> TrackDraft {
    TrackDraft {
        id: track.mbid,
        name: track.name,
        url: track.url,
        artist_id: track.artist.and_then(|a| a.mbid).filter(|id| !id.is_empty()),
        duration: track.duration.map(dto::Count::into_text),
        playcount: track.playcount.map(dto::Count::into_text),
        listeners: track.listeners.map(dto::Count::into_text),
        images: track.image.map(to_image_drafts),
    }
}

fn to_image_drafts(images: dto::OneOrMany<dto::Image>) -> Vec<ImageDraft> {
    Vec::from(images)
        .into_iter()
        .map(|img| ImageDraft {
            url: img.text,
            size: img.size,
        })
        .collect()
}

fn count_value(count: dto::Count) -> Option<u32> {
    count.into_text().trim().parse().ok()
}
