//! In-memory entity graph owned by the crawler.
//!
//! Artists are the authoritative containers of their track references;
//! tracks are also kept in their own map since they persist independently.

use std::collections::{BTreeMap, HashMap};

use super::{Artist, Credit, Track};

/// A reference to an entity that changed and needs writing to the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EntityRef {
    Artist(String),
    Track(String),
}

/// Where an upserted track ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackPlacement {
    /// The owning artist is unknown; nothing was recorded
    Unowned,
    Attached,
    /// The track changed owner; `previous` no longer references it
    Moved { previous: String },
}

/// The harvested artists and tracks.
#[derive(Debug, Default)]
pub struct EntityGraph {
    // BTreeMap keeps the flush order stable across runs
    artists: BTreeMap<String, Artist>,
    tracks: HashMap<String, Track>,
}

impl EntityGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or merge an artist. Returns `true` if the artist was new.
    pub fn upsert_artist(&mut self, artist: Artist) -> bool {
        match self.artists.get_mut(&artist.id) {
            Some(existing) => {
                existing.merge(artist);
                false
            }
            None => {
                self.artists.insert(artist.id.clone(), artist);
                true
            }
        }
    }

    /// Insert or merge a track and attach it to its owning artist.
    ///
    /// A track is owned by exactly one artist: seen under a new owner, it is
    /// detached from the previous one. Nothing is recorded if the owning
    /// artist is unknown.
    pub fn upsert_track(&mut self, track: Track) -> TrackPlacement {
        let Some(owner) = self.artists.get_mut(&track.artist) else {
            return TrackPlacement::Unowned;
        };
        owner.add_track(track.id.clone());

        let track_id = track.id.clone();
        let previous = match self.tracks.get_mut(&track_id) {
            Some(existing) => {
                let previous = (existing.artist != track.artist).then(|| existing.artist.clone());
                existing.merge(track);
                previous
            }
            None => {
                self.tracks.insert(track_id.clone(), track);
                None
            }
        };

        match previous {
            Some(previous) => {
                if let Some(old_owner) = self.artists.get_mut(&previous) {
                    old_owner.remove_track(&track_id);
                }
                TrackPlacement::Moved { previous }
            }
            None => TrackPlacement::Attached,
        }
    }

    /// Merge credits into a known track. Returns the number of changed credits,
    /// or `None` if the track is unknown.
    pub fn merge_credits(
        &mut self,
        track_id: &str,
        credits: impl IntoIterator<Item = Credit>,
    ) -> Option<usize> {
        self.tracks
            .get_mut(track_id)
            .map(|track| track.merge_credits(credits))
    }

    pub fn artist(&self, id: &str) -> Option<&Artist> {
        self.artists.get(id)
    }

    pub fn track(&self, id: &str) -> Option<&Track> {
        self.tracks.get(id)
    }

    /// Track ids owned by an artist, in discovery order.
    pub fn track_ids(&self, artist_id: &str) -> Vec<String> {
        self.artists
            .get(artist_id)
            .map(|a| a.tracks.clone())
            .unwrap_or_default()
    }

    /// Tracks owned by an artist that are present in the graph.
    pub fn tracks_of<'a>(&'a self, artist: &'a Artist) -> impl Iterator<Item = &'a Track> + 'a {
        artist.tracks.iter().filter_map(|id| self.tracks.get(id))
    }

    pub fn artists(&self) -> impl Iterator<Item = &Artist> {
        self.artists.values()
    }

    pub fn artist_count(&self) -> usize {
        self.artists.len()
    }

    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }
}
