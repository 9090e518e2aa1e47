//! Work items and the upstream calls they turn into.

use std::fmt;

use crate::sources::{
    RecordingSearchRequest, RecordingsPage, Source, TopArtistsPage, TopArtistsRequest,
    TopTracksPage, TopTracksRequest,
};

/// One unit of scheduled crawl work, tagged by stage.
///
/// Items are consumed exactly once; continuing a stage means enqueueing a
/// new item with the next page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkItem {
    /// Fetch the chart for the configured tag
    DiscoverTopArtists,

    /// Fetch one page of an artist's top tracks
    DiscoverTopTracks {
        artist_id: String,
        /// 1-based
        page: u32,
        /// Tracks wanted for this artist across all pages
        max_wanted: u32,
    },

    /// Fetch one page of credits for an artist's recordings
    EnrichCredits {
        artist_id: String,
        /// Tracks discovered for the artist; other recordings are ignored
        known_track_ids: Vec<String>,
        /// 1-based
        page: u32,
        /// Recordings already processed for this artist; where the next page starts
        offset: u32,
    },

    /// Flush everything and stop
    Terminate,
}

impl WorkItem {
    /// The upstream this item is served by; `None` for [`WorkItem::Terminate`].
    pub fn source(&self) -> Option<Source> {
        match self {
            WorkItem::DiscoverTopArtists | WorkItem::DiscoverTopTracks { .. } => {
                Some(Source::LastFm)
            }
            WorkItem::EnrichCredits { .. } => Some(Source::MusicBrainz),
            WorkItem::Terminate => None,
        }
    }

    /// Stage name, for logs.
    pub fn stage(&self) -> &'static str {
        match self {
            WorkItem::DiscoverTopArtists => "top_artists",
            WorkItem::DiscoverTopTracks { .. } => "top_tracks",
            WorkItem::EnrichCredits { .. } => "credits",
            WorkItem::Terminate => "terminate",
        }
    }
}

impl fmt::Display for WorkItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkItem::DiscoverTopArtists => write!(f, "top_artists"),
            WorkItem::DiscoverTopTracks {
                artist_id, page, ..
            } => write!(f, "top_tracks({artist_id}, page {page})"),
            WorkItem::EnrichCredits {
                artist_id,
                page,
                offset,
                ..
            } => write!(f, "credits({artist_id}, page {page}, offset {offset})"),
            WorkItem::Terminate => write!(f, "terminate"),
        }
    }
}

/// A concrete upstream call built from a work item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    TopArtists(TopArtistsRequest),
    TopTracks(TopTracksRequest),
    Recordings(RecordingSearchRequest),
}

impl Request {
    pub fn source(&self) -> Source {
        match self {
            Request::TopArtists(_) | Request::TopTracks(_) => Source::LastFm,
            Request::Recordings(_) => Source::MusicBrainz,
        }
    }

    /// The response an abandoned request is treated as: an empty final
    /// page, so its stage moves on instead of waiting forever.
    pub fn empty_response(&self) -> Response {
        match self {
            Request::TopArtists(_) => Response::TopArtists(TopArtistsPage::default()),
            Request::TopTracks(r) => Response::TopTracks(TopTracksPage {
                tracks: Vec::new(),
                page: r.page,
                total_pages: r.page,
            }),
            Request::Recordings(r) => Response::Recordings(RecordingsPage {
                count: r.offset,
                offset: r.offset,
                recordings: Vec::new(),
            }),
        }
    }
}

/// An upstream response, matching the [`Request`] it answers.
#[derive(Debug, Clone)]
pub enum Response {
    TopArtists(TopArtistsPage),
    TopTracks(TopTracksPage),
    Recordings(RecordingsPage),
}
