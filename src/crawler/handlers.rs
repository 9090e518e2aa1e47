//! Stage handlers: turn an upstream page into graph updates and follow-up work.
//!
//! Handlers are synchronous and side-effect free apart from the
//! [`CrawlState`] they are given; the scheduler performs the store writes
//! for the entities a [`Transition`] reports as touched.

use std::collections::HashSet;

use crate::model::{EntityGraph, EntityRef, TrackPlacement, validation};
use crate::sources::{RecordingsPage, TopArtistsPage, TopTracksPage};

use super::work::WorkItem;

/// Everything the crawl has learned so far.
#[derive(Debug, Default)]
pub struct CrawlState {
    pub graph: EntityGraph,
    /// Distinct valid artists found on the chart
    pub discovered: usize,
    /// Artists whose credit enrichment has finished
    pub completed: usize,
    /// Set once a Terminate item has been enqueued
    pub terminate_scheduled: bool,
    /// Records dropped by validation
    pub rejected: usize,
}

impl CrawlState {
    pub fn new() -> Self {
        Self::default()
    }

    fn schedule_terminate(&mut self, transition: &mut Transition) {
        if !self.terminate_scheduled {
            self.terminate_scheduled = true;
            transition.follow_ups.push(WorkItem::Terminate);
        }
    }
}

/// The outcome of handling one response.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Transition {
    /// Items to append to the queue, in order
    pub follow_ups: Vec<WorkItem>,
    /// Entities that changed and should be written
    pub touched: Vec<EntityRef>,
}

impl Transition {
    fn touch(&mut self, entity: EntityRef) {
        if !self.touched.contains(&entity) {
            self.touched.push(entity);
        }
    }
}

/// One handler per work-item stage.
pub trait StageHandlers: Send {
    /// A page of chart artists arrived.
    fn top_artists(&self, page: TopArtistsPage, state: &mut CrawlState) -> Transition;

    /// A page of an artist's top tracks arrived.
    fn top_tracks(
        &self,
        artist_id: &str,
        page_no: u32,
        max_wanted: u32,
        page: TopTracksPage,
        state: &mut CrawlState,
    ) -> Transition;

    /// A page of an artist's recording credits arrived. `offset` is the
    /// number of recordings processed before this page.
    fn credits(
        &self,
        artist_id: &str,
        known_track_ids: &[String],
        page_no: u32,
        offset: u32,
        page: RecordingsPage,
        state: &mut CrawlState,
    ) -> Transition;
}

/// The standard artist → tracks → credits workflow.
#[derive(Debug, Clone)]
pub struct CrawlHandlers {
    /// Tracks wanted per artist
    pub track_limit: u32,
    /// Last.fm top-tracks page size
    pub tracks_page_size: u32,
}

impl StageHandlers for CrawlHandlers {
    fn top_artists(&self, page: TopArtistsPage, state: &mut CrawlState) -> Transition {
        let mut transition = Transition::default();

        for draft in page.artists {
            let artist = match validation::artist(draft) {
                Ok(artist) => artist,
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping chart artist");
                    state.rejected += 1;
                    continue;
                }
            };

            let id = artist.id.clone();
            if state.graph.upsert_artist(artist) {
                state.discovered += 1;
                transition.follow_ups.push(WorkItem::DiscoverTopTracks {
                    artist_id: id.clone(),
                    page: 1,
                    max_wanted: self.track_limit,
                });
            }
            transition.touch(EntityRef::Artist(id));
        }

        tracing::info!(artists = state.discovered, "Discovered chart artists");

        if state.discovered == 0 {
            tracing::warn!("No valid artists on the chart");
            state.schedule_terminate(&mut transition);
        }
        transition
    }

    fn top_tracks(
        &self,
        artist_id: &str,
        page_no: u32,
        max_wanted: u32,
        page: TopTracksPage,
        state: &mut CrawlState,
    ) -> Transition {
        let mut transition = Transition::default();
        let page_no = page_no.max(1);
        let seen_before = u64::from(page_no - 1) * u64::from(self.tracks_page_size);
        let received = page.tracks.len() as u64;

        for (position, mut draft) in page.tracks.into_iter().enumerate() {
            // Ranked positions beyond what we want are ignored
            if seen_before + position as u64 >= u64::from(max_wanted) {
                break;
            }
            if draft.artist_id.is_none() {
                draft.artist_id = Some(artist_id.to_string());
            }

            let track = match validation::track(draft) {
                Ok(track) => track,
                Err(e) => {
                    tracing::warn!(artist = artist_id, error = %e, "Skipping track");
                    state.rejected += 1;
                    continue;
                }
            };

            let (track_id, owner) = (track.id.clone(), track.artist.clone());
            match state.graph.upsert_track(track) {
                TrackPlacement::Unowned => {
                    tracing::warn!(
                        track = %track_id,
                        owner = %owner,
                        "Track owner unknown, skipping"
                    );
                    state.rejected += 1;
                    continue;
                }
                TrackPlacement::Moved { previous } => {
                    tracing::debug!(
                        track = %track_id,
                        from = %previous,
                        to = %owner,
                        "Track changed owner"
                    );
                    transition.touch(EntityRef::Artist(previous));
                }
                TrackPlacement::Attached => {}
            }
            transition.touch(EntityRef::Track(track_id));
            transition.touch(EntityRef::Artist(owner));
        }

        let more_wanted = seen_before + received < u64::from(max_wanted);
        if more_wanted && page_no < page.total_pages && received > 0 {
            transition.follow_ups.push(WorkItem::DiscoverTopTracks {
                artist_id: artist_id.to_string(),
                page: page_no + 1,
                max_wanted,
            });
        } else {
            let known_track_ids = state.graph.track_ids(artist_id);
            tracing::info!(
                artist = artist_id,
                tracks = known_track_ids.len(),
                "Top tracks complete"
            );
            transition.follow_ups.push(WorkItem::EnrichCredits {
                artist_id: artist_id.to_string(),
                known_track_ids,
                page: 1,
                offset: 0,
            });
        }
        transition
    }

    fn credits(
        &self,
        artist_id: &str,
        known_track_ids: &[String],
        page_no: u32,
        offset: u32,
        page: RecordingsPage,
        state: &mut CrawlState,
    ) -> Transition {
        let mut transition = Transition::default();
        let known: HashSet<&str> = known_track_ids.iter().map(String::as_str).collect();
        let received = page.recordings.len() as u64;

        for recording in page.recordings {
            if !known.contains(recording.id.as_str()) {
                continue;
            }

            let credits: Vec<_> = recording
                .credits
                .into_iter()
                .filter_map(|draft| match validation::credit(draft) {
                    Ok(credit) => Some(credit),
                    Err(e) => {
                        tracing::debug!(recording = %recording.id, error = %e, "Skipping credit");
                        None
                    }
                })
                .collect();

            let changed = state.graph.merge_credits(&recording.id, credits);
            if changed.is_some_and(|n| n > 0) {
                transition.touch(EntityRef::Track(recording.id));
            }
        }

        // The upstream may return fewer records than asked for; the next page
        // starts right after the last one processed
        let processed = u64::from(offset) + received;
        if processed < u64::from(page.count) && received > 0 {
            transition.follow_ups.push(WorkItem::EnrichCredits {
                artist_id: artist_id.to_string(),
                known_track_ids: known_track_ids.to_vec(),
                page: page_no + 1,
                offset: processed as u32,
            });
        } else {
            state.completed += 1;
            tracing::info!(
                artist = artist_id,
                completed = state.completed,
                discovered = state.discovered,
                "Credits complete"
            );
            if state.completed >= state.discovered {
                state.schedule_terminate(&mut transition);
            }
        }
        transition
    }
}
