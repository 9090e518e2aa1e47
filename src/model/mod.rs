//! Core data models for the harvested metadata graph.
//!
//! Defines the primary entities: [`Artist`], [`Track`] and [`Credit`].
//! Entities are built from upstream drafts (see [`draft`]) by the
//! [`validation`] layer and collected into an in-memory [`EntityGraph`]
//! before being written to the document store.
//!
//! # Document Schema
//!
//! Entities serialize to store documents keyed by their external id:
//! - `Artist` documents hold track references as `[{"_id": ...}]`
//! - `Track` documents embed their credit list

pub mod draft;
pub mod graph;
pub mod validation;

use serde::{Deserialize, Serialize};

pub use draft::{ArtistDraft, CreditDraft, ImageDraft, RecordingDraft, TrackDraft};
pub use graph::{EntityGraph, EntityRef, TrackPlacement};
pub use validation::ValidationError;

/// Document kind stored under `klass`.
pub const ARTIST_KLASS: &str = "Artist";
/// Document kind stored under `klass`.
pub const TRACK_KLASS: &str = "Track";

/// An image descriptor as published by Last.fm.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    pub url: String,
    /// Size label (small, medium, large, extralarge, mega)
    pub size: String,
}

/// An artist discovered through the chart source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artist {
    /// MusicBrainz artist id (immutable once assigned)
    pub id: String,
    pub name: String,
    /// Canonical Last.fm page
    pub url: String,
    pub images: Vec<Image>,
    /// Owned track references, in discovery order, without duplicates
    pub tracks: Vec<String>,
}

impl Artist {
    /// Merge a newer sighting of the same artist into this one.
    ///
    /// Scalar attributes take the newer value; track references are unioned.
    pub fn merge(&mut self, other: Artist) {
        debug_assert_eq!(self.id, other.id);
        self.name = other.name;
        self.url = other.url;
        self.images = other.images;
        for track_id in other.tracks {
            self.add_track(track_id);
        }
    }

    /// Add a track reference. Returns `false` if it was already owned.
    pub fn add_track(&mut self, track_id: impl Into<String>) -> bool {
        let track_id = track_id.into();
        if self.tracks.contains(&track_id) {
            return false;
        }
        self.tracks.push(track_id);
        true
    }

    /// Drop a track reference. Returns `false` if it was not owned.
    pub fn remove_track(&mut self, track_id: &str) -> bool {
        let before = self.tracks.len();
        self.tracks.retain(|id| id != track_id);
        self.tracks.len() != before
    }

    /// Serialize to the store's document shape.
    pub fn to_document(&self) -> serde_json::Value {
        serde_json::json!({
            "_id": self.id,
            "klass": ARTIST_KLASS,
            "name": self.name,
            "url": self.url,
            "images": self.images,
            "tracks": self
                .tracks
                .iter()
                .map(|id| serde_json::json!({ "_id": id }))
                .collect::<Vec<_>>(),
            "updated_at": chrono::Utc::now().to_rfc3339(),
        })
    }
}

/// A contributor attribution attached to a track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credit {
    /// MusicBrainz id of the contributing artist (set key)
    pub artist_id: String,
    /// Official artist name
    pub name: String,
    /// Sort name (e.g., "Game, The")
    pub sort_name: String,
    /// How the artist is credited on this recording
    pub credited_name: String,
    /// Join phrase following this credit (e.g., " feat. ")
    pub join_phrase: String,
}

/// A track discovered through the chart source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    /// MusicBrainz recording id
    pub id: String,
    pub name: String,
    pub url: String,
    /// Owning artist id
    pub artist: String,
    /// Duration in seconds; `None` when the source doesn't know it
    pub duration: Option<u64>,
    pub playcount: u64,
    pub listeners: u64,
    pub images: Vec<Image>,
    pub credits: Vec<Credit>,
}

impl Track {
    /// Merge a newer sighting of the same track, keeping accumulated credits.
    pub fn merge(&mut self, other: Track) {
        debug_assert_eq!(self.id, other.id);
        self.name = other.name;
        self.url = other.url;
        self.artist = other.artist;
        self.duration = other.duration.or(self.duration);
        self.playcount = other.playcount;
        self.listeners = other.listeners;
        self.images = other.images;
        for credit in other.credits {
            self.merge_credit(credit);
        }
    }

    /// Union a credit into the credit set, keyed by contributing artist id.
    ///
    /// A known contributor is updated in place (keeping its position);
    /// an unknown one is appended. Returns `true` if anything changed.
    pub fn merge_credit(&mut self, credit: Credit) -> bool {
        match self
            .credits
            .iter_mut()
            .find(|c| c.artist_id == credit.artist_id)
        {
            Some(existing) if *existing == credit => false,
            Some(existing) => {
                *existing = credit;
                true
            }
            None => {
                self.credits.push(credit);
                true
            }
        }
    }

    /// Merge a whole credit list. Returns the number of credits that changed.
    pub fn merge_credits(&mut self, credits: impl IntoIterator<Item = Credit>) -> usize {
        credits
            .into_iter()
            .map(|c| self.merge_credit(c))
            .filter(|changed| *changed)
            .count()
    }

    /// Serialize to the store's document shape.
    pub fn to_document(&self) -> serde_json::Value {
        serde_json::json!({
            "_id": self.id,
            "klass": TRACK_KLASS,
            "name": self.name,
            "url": self.url,
            "artist": self.artist,
            "duration": self.duration,
            "playcount": self.playcount,
            "listeners": self.listeners,
            "images": self.images,
            "credits": self.credits,
            "updated_at": chrono::Utc::now().to_rfc3339(),
        })
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn artist(id: &str) -> Artist {
        Artist {
            id: id.to_string(),
            name: format!("Artist {id}"),
            url: format!("https://www.last.fm/music/{id}"),
            images: vec![],
            tracks: vec![],
        }
    }

    pub fn track(id: &str, artist: &str) -> Track {
        Track {
            id: id.to_string(),
            name: format!("Track {id}"),
            url: format!("https://www.last.fm/music/{artist}/_/{id}"),
            artist: artist.to_string(),
            duration: Some(200),
            playcount: 1000,
            listeners: 100,
            images: vec![],
            credits: vec![],
        }
    }

    pub fn credit(artist_id: &str, join_phrase: &str) -> Credit {
        Credit {
            artist_id: artist_id.to_string(),
            name: format!("Name {artist_id}"),
            sort_name: format!("Sort {artist_id}"),
            credited_name: format!("Credited {artist_id}"),
            join_phrase: join_phrase.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::{artist, credit, track};
    use super::*;

    #[test]
    fn test_credit_merge_is_idempotent() {
        let mut t = track("t1", "a1");
        let payload = vec![credit("a1", " feat. "), credit("a2", "")];

        assert_eq!(t.merge_credits(payload.clone()), 2);
        let once = t.credits.clone();
        assert_eq!(t.merge_credits(payload), 0);

        assert_eq!(t.credits, once);
    }

    #[test]
    fn test_changed_join_phrase_updates_in_place() {
        let mut t = track("t1", "a1");
        t.merge_credits(vec![credit("a1", " & "), credit("a2", "")]);
        t.merge_credits(vec![credit("a1", " feat. ")]);

        assert_eq!(t.credits.len(), 2);
        assert_eq!(t.credits[0].artist_id, "a1");
        assert_eq!(t.credits[0].join_phrase, " feat. ");
    }

    #[test]
    fn test_track_merge_keeps_credits() {
        let mut t = track("t1", "a1");
        t.merge_credit(credit("a9", ""));

        let mut newer = track("t1", "a1");
        newer.playcount = 5000;
        newer.duration = None;
        t.merge(newer);

        assert_eq!(t.playcount, 5000);
        assert_eq!(t.duration, Some(200));
        assert_eq!(t.credits.len(), 1);
    }

    #[test]
    fn test_artist_merge_unions_tracks() {
        let mut a = artist("a1");
        a.add_track("t1");
        let mut newer = artist("a1");
        newer.name = "Renamed".to_string();
        newer.tracks = vec!["t1".to_string(), "t2".to_string()];

        a.merge(newer);

        assert_eq!(a.name, "Renamed");
        assert_eq!(a.tracks, vec!["t1", "t2"]);
        assert!(!a.add_track("t2"));
    }

    #[test]
    fn test_artist_document_shape() {
        let mut a = artist("a1");
        a.add_track("t1");
        let doc = a.to_document();

        assert_eq!(doc["_id"], "a1");
        assert_eq!(doc["klass"], ARTIST_KLASS);
        assert_eq!(doc["tracks"][0]["_id"], "t1");
        assert!(doc.get("_rev").is_none());
    }

    #[test]
    fn test_track_document_unknown_duration_is_null() {
        let mut t = track("t1", "a1");
        t.duration = None;
        let doc = t.to_document();

        assert_eq!(doc["klass"], TRACK_KLASS);
        assert!(doc["duration"].is_null());
        assert_eq!(doc["artist"], "a1");
    }
}
