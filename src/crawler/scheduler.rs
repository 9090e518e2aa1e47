//! The crawl loop.
//!
//! One request is in flight at a time. Each popped item is turned into an
//! upstream request, retried with backoff on transient failures, handed to
//! the stage handlers, and the entities they touched are written before
//! the follow-up items are queued. After every request the loop waits the
//! delay of the source it just used.

use serde::Serialize;

use super::handlers::{CrawlHandlers, CrawlState, StageHandlers, Transition};
use super::queue::WorkQueue;
use super::throttle::{RetryPolicy, Throttle};
use super::work::{Request, Response, WorkItem};
use crate::config::{Config, Environment, Limits};
use crate::error::{Error, Result};
use crate::model::{EntityGraph, EntityRef};
use crate::sources::{
    LastFmApi, MusicBrainzApi, RecordingSearchRequest, SourceError, TopArtistsRequest,
    TopTracksRequest, musicbrainz,
};
use crate::store::{DocumentStore, EntityRepository, StoreError};

/// Everything that shapes a crawl run.
#[derive(Debug, Clone)]
pub struct CrawlSettings {
    /// Chart tag to start from
    pub tag: String,
    pub limits: Limits,
    pub tracks_page_size: u32,
    pub recordings_page_size: u32,
    /// Empty-queue polls tolerated before giving up
    pub stall_polls: u32,
    pub retry: RetryPolicy,
    pub throttle: Throttle,
}

impl CrawlSettings {
    pub fn from_config(config: &Config, env: Environment) -> Self {
        Self {
            tag: config.crawl.tag.clone(),
            limits: config.limits(env),
            tracks_page_size: config.lastfm.page_size.max(1),
            recordings_page_size: config
                .musicbrainz
                .page_size
                .clamp(1, musicbrainz::MAX_SEARCH_LIMIT),
            stall_polls: config.crawl.stall_polls,
            retry: RetryPolicy::from_config(&config.retry),
            throttle: Throttle::from_config(config),
        }
    }
}

/// Counters reported at the end of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CrawlStats {
    pub artists: usize,
    pub tracks: usize,
    /// Upstream requests sent, including retries
    pub requests: usize,
    pub retries: usize,
    /// Items given up on after exhausting their attempts
    pub abandoned: usize,
    /// Records dropped by validation
    pub rejected: usize,
    /// Successful document writes
    pub writes: usize,
    /// Writes that failed at flush time
    pub failed_writes: usize,
}

/// Drives the work queue to completion.
pub struct Scheduler<L, M, S, H = CrawlHandlers> {
    lastfm: L,
    musicbrainz: M,
    repository: EntityRepository<S>,
    handlers: H,
    settings: CrawlSettings,
    throttle: Throttle,
    queue: WorkQueue,
    state: CrawlState,
    stats: CrawlStats,
}

impl<L, M, S> Scheduler<L, M, S, CrawlHandlers>
where
    L: LastFmApi,
    M: MusicBrainzApi,
    S: DocumentStore,
{
    /// Build a scheduler running the standard workflow.
    pub fn new(lastfm: L, musicbrainz: M, store: S, settings: CrawlSettings) -> Self {
        let handlers = CrawlHandlers {
            track_limit: settings.limits.tracks,
            tracks_page_size: settings.tracks_page_size,
        };
        Self::with_handlers(lastfm, musicbrainz, store, settings, handlers)
    }
}

impl<L, M, S, H> Scheduler<L, M, S, H>
where
    L: LastFmApi,
    M: MusicBrainzApi,
    S: DocumentStore,
    H: StageHandlers,
{
    pub fn with_handlers(
        lastfm: L,
        musicbrainz: M,
        store: S,
        settings: CrawlSettings,
        handlers: H,
    ) -> Self {
        Self {
            lastfm,
            musicbrainz,
            repository: EntityRepository::new(store),
            handlers,
            throttle: settings.throttle.clone(),
            settings,
            queue: WorkQueue::new(),
            state: CrawlState::new(),
            stats: CrawlStats::default(),
        }
    }

    pub fn enqueue(&mut self, item: WorkItem) {
        self.queue.push(item);
    }

    pub fn state(&self) -> &CrawlState {
        &self.state
    }

    /// Process the queue until a Terminate item is reached.
    ///
    /// Returns [`Error::Stalled`] if the queue stays empty for the configured
    /// number of polls first; everything gathered is flushed either way.
    pub async fn run(&mut self) -> Result<CrawlStats> {
        let mut idle_polls = 0;

        loop {
            let Some(item) = self.queue.pop() else {
                idle_polls += 1;
                tracing::warn!(
                    polls = idle_polls,
                    completed = self.state.completed,
                    discovered = self.state.discovered,
                    "Work queue is empty but the crawl has not terminated"
                );
                if idle_polls >= self.settings.stall_polls.max(1) {
                    self.flush().await?;
                    return Err(Error::Stalled {
                        completed: self.state.completed,
                        discovered: self.state.discovered,
                    });
                }
                self.throttle.idle().await;
                continue;
            };
            idle_polls = 0;

            let Some(request) = self.request_for(&item) else {
                if !self.queue.is_empty() {
                    tracing::debug!(
                        pending = self.queue.len(),
                        "Dropping work left after terminate"
                    );
                }
                tracing::info!(
                    artists = self.state.graph.artist_count(),
                    tracks = self.state.graph.track_count(),
                    "Terminating, flushing entities"
                );
                self.flush().await?;
                return Ok(self.stats());
            };

            let response = self.fetch(&item, &request).await;
            let transition = self.handle(&item, response);
            self.persist(&transition.touched).await?;
            self.queue.extend(transition.follow_ups);

            self.throttle.after(request.source()).await;
        }
    }

    fn stats(&self) -> CrawlStats {
        CrawlStats {
            artists: self.state.graph.artist_count(),
            tracks: self.state.graph.track_count(),
            rejected: self.state.rejected,
            writes: self.repository.writes(),
            ..self.stats.clone()
        }
    }

    /// The upstream call for an item; `None` for Terminate.
    fn request_for(&self, item: &WorkItem) -> Option<Request> {
        match item {
            WorkItem::DiscoverTopArtists => Some(Request::TopArtists(TopArtistsRequest {
                tag: self.settings.tag.clone(),
                limit: self.settings.limits.artists,
            })),
            WorkItem::DiscoverTopTracks {
                artist_id, page, ..
            } => Some(Request::TopTracks(TopTracksRequest {
                artist_id: artist_id.clone(),
                page: *page,
                limit: self.settings.tracks_page_size,
            })),
            WorkItem::EnrichCredits {
                artist_id, offset, ..
            } => Some(Request::Recordings(RecordingSearchRequest {
                artist_id: artist_id.clone(),
                limit: self.settings.recordings_page_size,
                offset: *offset,
            })),
            WorkItem::Terminate => None,
        }
    }

    async fn dispatch(&self, request: &Request) -> std::result::Result<Response, SourceError> {
        match request {
            Request::TopArtists(r) => self.lastfm.top_artists(r).await.map(Response::TopArtists),
            Request::TopTracks(r) => self.lastfm.top_tracks(r).await.map(Response::TopTracks),
            Request::Recordings(r) => self
                .musicbrainz
                .search_recordings(r)
                .await
                .map(Response::Recordings),
        }
    }

    /// Send a request, retrying transient failures with backoff.
    ///
    /// A retry never goes out sooner than the source's own pacing delay.
    /// An item that exhausts its attempts is abandoned and answered with an
    /// empty final page so its stage can move on.
    async fn fetch(&mut self, item: &WorkItem, request: &Request) -> Response {
        let mut attempts = 0;
        loop {
            attempts += 1;
            self.stats.requests += 1;
            tracing::debug!(item = %item, attempt = attempts, "Dispatching");

            match self.dispatch(request).await {
                Ok(response) => return response,
                Err(e) if e.is_retryable() && self.settings.retry.allows_retry(attempts) => {
                    let delay = self
                        .settings
                        .retry
                        .backoff(attempts)
                        .max(self.throttle.delay_for(request.source()));
                    tracing::warn!(item = %item, error = %e, ?delay, "Request failed, retrying");
                    self.stats.retries += 1;
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    tracing::error!(item = %item, error = %e, attempts, "Abandoning work item");
                    self.stats.abandoned += 1;
                    return request.empty_response();
                }
            }
        }
    }

    fn handle(&mut self, item: &WorkItem, response: Response) -> Transition {
        match (item, response) {
            (WorkItem::DiscoverTopArtists, Response::TopArtists(page)) => {
                self.handlers.top_artists(page, &mut self.state)
            }
            (
                WorkItem::DiscoverTopTracks {
                    artist_id,
                    page,
                    max_wanted,
                },
                Response::TopTracks(response),
            ) => self
                .handlers
                .top_tracks(artist_id, *page, *max_wanted, response, &mut self.state),
            (
                WorkItem::EnrichCredits {
                    artist_id,
                    known_track_ids,
                    page,
                    offset,
                },
                Response::Recordings(response),
            ) => self.handlers.credits(
                artist_id,
                known_track_ids,
                *page,
                *offset,
                response,
                &mut self.state,
            ),
            (item, _) => {
                tracing::error!(item = %item, "Response does not match work item");
                Transition::default()
            }
        }
    }

    /// Write the entities a handler touched. Only a repeated conflict is
    /// fatal; anything else is logged and rewritten at flush.
    async fn persist(&mut self, touched: &[EntityRef]) -> Result<()> {
        for entity in touched {
            if let Err(e) = write(&mut self.repository, &self.state.graph, entity).await {
                if e.is_fatal() {
                    return Err(e.into());
                }
                tracing::warn!(entity = ?entity, error = %e, "Write failed, will retry at flush");
            }
        }
        Ok(())
    }

    /// Write every artist, each preceded by its tracks.
    async fn flush(&mut self) -> Result<()> {
        let graph = &self.state.graph;
        let mut order = Vec::with_capacity(graph.artist_count() + graph.track_count());
        for artist in graph.artists() {
            order.extend(
                graph
                    .tracks_of(artist)
                    .map(|t| EntityRef::Track(t.id.clone())),
            );
            order.push(EntityRef::Artist(artist.id.clone()));
        }

        for entity in &order {
            if let Err(e) = write(&mut self.repository, &self.state.graph, entity).await {
                if e.is_fatal() {
                    return Err(e.into());
                }
                tracing::error!(entity = ?entity, error = %e, "Flush write failed");
                self.stats.failed_writes += 1;
            }
        }

        tracing::info!(documents = order.len(), "Flush complete");
        Ok(())
    }
}

async fn write<S: DocumentStore>(
    repository: &mut EntityRepository<S>,
    graph: &EntityGraph,
    entity: &EntityRef,
) -> std::result::Result<(), StoreError> {
    match entity {
        EntityRef::Artist(id) => {
            if let Some(artist) = graph.artist(id) {
                repository.upsert_artist(artist).await?;
            }
        }
        EntityRef::Track(id) => {
            if let Some(track) = graph.track(id) {
                repository.upsert_track(track).await?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::traits::mocks::{
        LastFmCall, MockLastFm, MockMusicBrainz, artist_draft, recording, track_draft,
    };
    use crate::sources::{RecordingsPage, TopArtistsPage, TopTracksPage};
    use crate::store::{MemoryStore, Revision, StoredDocument};
    use async_trait::async_trait;
    use serde_json::Value;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    fn settings(artists: u32, tracks: u32) -> CrawlSettings {
        CrawlSettings {
            tag: "hip-hop".to_string(),
            limits: Limits { artists, tracks },
            tracks_page_size: 50,
            recordings_page_size: 100,
            stall_polls: 3,
            retry: RetryPolicy {
                max_attempts: 3,
                base_delay: Duration::ZERO,
            },
            throttle: Throttle::none(),
        }
    }

    /// Settings with the default per-source delays and backoff.
    fn paced_settings(artists: u32, tracks: u32) -> CrawlSettings {
        CrawlSettings {
            retry: RetryPolicy::default(),
            throttle: Throttle::from_config(&Config::default()),
            ..settings(artists, tracks)
        }
    }

    /// Smallest gap between consecutive calls.
    fn min_gap(times: &[tokio::time::Instant]) -> Duration {
        times
            .windows(2)
            .map(|pair| pair[1] - pair[0])
            .min()
            .unwrap_or(Duration::MAX)
    }

    fn tracks(artist: &str, n: usize) -> Vec<crate::model::TrackDraft> {
        (1..=n)
            .map(|i| track_draft(&format!("{artist}-t{i}"), artist))
            .collect()
    }

    /// Memory store that remembers the order of writes.
    #[derive(Default)]
    struct LoggingStore {
        inner: MemoryStore,
        puts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl DocumentStore for LoggingStore {
        async fn fetch(&self, id: &str) -> std::result::Result<StoredDocument, StoreError> {
            self.inner.fetch(id).await
        }

        async fn put(
            &self,
            id: &str,
            document: Value,
            revision: Option<&Revision>,
        ) -> std::result::Result<Revision, StoreError> {
            self.puts.lock().unwrap().push(id.to_string());
            self.inner.put(id, document, revision).await
        }
    }

    struct AlwaysConflicting;

    #[async_trait]
    impl DocumentStore for AlwaysConflicting {
        async fn fetch(&self, id: &str) -> std::result::Result<StoredDocument, StoreError> {
            Err(StoreError::NotFound(id.to_string()))
        }

        async fn put(
            &self,
            id: &str,
            _document: Value,
            _revision: Option<&Revision>,
        ) -> std::result::Result<Revision, StoreError> {
            Err(StoreError::Conflict(id.to_string()))
        }
    }

    /// Drops every credit page on the floor, so no artist ever completes.
    struct NeverCompletes(CrawlHandlers);

    impl StageHandlers for NeverCompletes {
        fn top_artists(&self, page: TopArtistsPage, state: &mut CrawlState) -> Transition {
            self.0.top_artists(page, state)
        }

        fn top_tracks(
            &self,
            artist_id: &str,
            page_no: u32,
            max_wanted: u32,
            page: TopTracksPage,
            state: &mut CrawlState,
        ) -> Transition {
            self.0.top_tracks(artist_id, page_no, max_wanted, page, state)
        }

        fn credits(
            &self,
            _artist_id: &str,
            _known_track_ids: &[String],
            _page_no: u32,
            _offset: u32,
            _page: RecordingsPage,
            _state: &mut CrawlState,
        ) -> Transition {
            Transition::default()
        }
    }

    #[test]
    fn test_recordings_page_size_is_capped_at_search_limit() {
        let mut config = Config::default();
        config.musicbrainz.page_size = 500;

        let settings = CrawlSettings::from_config(&config, Environment::Test);
        assert_eq!(settings.recordings_page_size, 100);
    }

    #[tokio::test]
    async fn test_full_crawl_writes_linked_documents() {
        let lastfm = Arc::new(
            MockLastFm::new(vec![artist_draft("a1"), artist_draft("a2")])
                .with_tracks("a1", tracks("a1", 3))
                .with_tracks("a2", tracks("a2", 1)),
        );
        let musicbrainz = Arc::new(MockMusicBrainz::new().with_recordings(
            "a1",
            vec![recording("a1-t1", &[("a1", " feat. "), ("x9", "")])],
        ));
        let store = Arc::new(MemoryStore::new());

        let mut scheduler =
            Scheduler::new(lastfm.clone(), musicbrainz.clone(), store.clone(), settings(5, 2));
        scheduler.enqueue(WorkItem::DiscoverTopArtists);
        let stats = scheduler.run().await.unwrap();

        assert_eq!(stats.artists, 2);
        assert_eq!(stats.tracks, 3);
        assert_eq!(stats.abandoned, 0);
        assert_eq!(scheduler.state().completed, scheduler.state().discovered);

        let artist = store.get("a1").unwrap();
        assert_eq!(artist["klass"], "Artist");
        assert_eq!(
            artist["tracks"],
            serde_json::json!([{"_id": "a1-t1"}, {"_id": "a1-t2"}])
        );
        let track = store.get("a1-t1").unwrap();
        assert_eq!(track["credits"].as_array().unwrap().len(), 2);
        assert_eq!(track["credits"][0]["join_phrase"], " feat. ");
        assert!(store.get("a1-t3").is_none());

        // One credit search per artist, each covering every known track
        assert_eq!(musicbrainz.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_max_wanted_below_page_needs_one_page_and_one_enrichment() {
        let lastfm = Arc::new(
            MockLastFm::new(vec![artist_draft("a1")]).with_tracks("a1", tracks("a1", 3)),
        );
        let musicbrainz = Arc::new(MockMusicBrainz::new());

        let mut scheduler = Scheduler::new(
            lastfm.clone(),
            musicbrainz.clone(),
            MemoryStore::new(),
            settings(5, 2),
        );
        scheduler.enqueue(WorkItem::DiscoverTopArtists);
        scheduler.run().await.unwrap();

        assert_eq!(lastfm.track_pages("a1"), vec![1]);
        let calls = musicbrainz.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].offset, 0);
        assert_eq!(scheduler.state().graph.track_ids("a1").len(), 2);
    }

    #[tokio::test]
    async fn test_queue_is_fifo_across_artists() {
        let lastfm = Arc::new(
            MockLastFm::new(vec![artist_draft("a1"), artist_draft("a2")])
                .with_tracks("a1", tracks("a1", 4))
                .with_tracks("a2", tracks("a2", 4)),
        );
        let mut settings = settings(5, 4);
        settings.tracks_page_size = 2;

        let mut scheduler = Scheduler::new(
            lastfm.clone(),
            MockMusicBrainz::new(),
            MemoryStore::new(),
            settings,
        );
        scheduler.enqueue(WorkItem::DiscoverTopArtists);
        scheduler.run().await.unwrap();

        let order: Vec<(String, u32)> = lastfm
            .calls()
            .into_iter()
            .filter_map(|c| match c {
                LastFmCall::TopTracks(r) => Some((r.artist_id, r.page)),
                LastFmCall::TopArtists(_) => None,
            })
            .collect();
        assert_eq!(
            order,
            vec![
                ("a1".to_string(), 1),
                ("a2".to_string(), 1),
                ("a1".to_string(), 2),
                ("a2".to_string(), 2),
            ]
        );
    }

    #[tokio::test]
    async fn test_flush_writes_tracks_before_their_artist() {
        let lastfm = Arc::new(
            MockLastFm::new(vec![artist_draft("a1")]).with_tracks("a1", tracks("a1", 2)),
        );
        let store = Arc::new(LoggingStore::default());

        let mut scheduler =
            Scheduler::new(lastfm, MockMusicBrainz::new(), store.clone(), settings(5, 2));
        scheduler.enqueue(WorkItem::DiscoverTopArtists);
        scheduler.run().await.unwrap();

        let puts = store.puts.lock().unwrap().clone();
        assert_eq!(&puts[puts.len() - 3..], ["a1-t1", "a1-t2", "a1"]);
    }

    #[tokio::test]
    async fn test_transient_failure_is_retried() {
        let lastfm = Arc::new(
            MockLastFm::new(vec![artist_draft("a1")]).fail_next(SourceError::RateLimited),
        );

        let mut scheduler = Scheduler::new(
            lastfm.clone(),
            MockMusicBrainz::new(),
            MemoryStore::new(),
            settings(5, 2),
        );
        scheduler.enqueue(WorkItem::DiscoverTopArtists);
        let stats = scheduler.run().await.unwrap();

        assert_eq!(stats.retries, 1);
        assert_eq!(stats.artists, 1);
        let chart_calls = lastfm
            .calls()
            .iter()
            .filter(|c| matches!(c, LastFmCall::TopArtists(_)))
            .count();
        assert_eq!(chart_calls, 2);
    }

    #[tokio::test]
    async fn test_parse_error_is_not_retried() {
        let lastfm = Arc::new(
            MockLastFm::new(vec![artist_draft("a1")])
                .fail_next(SourceError::Parse("garbage".to_string())),
        );

        let mut scheduler = Scheduler::new(
            lastfm.clone(),
            MockMusicBrainz::new(),
            MemoryStore::new(),
            settings(5, 2),
        );
        scheduler.enqueue(WorkItem::DiscoverTopArtists);
        let stats = scheduler.run().await.unwrap();

        // The chart was abandoned, which leaves nothing to crawl
        assert_eq!(stats.abandoned, 1);
        assert_eq!(stats.retries, 0);
        assert_eq!(stats.artists, 0);
        assert_eq!(lastfm.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_exhausted_enrichment_still_completes_artist() {
        let lastfm = Arc::new(
            MockLastFm::new(vec![artist_draft("a1")]).with_tracks("a1", tracks("a1", 1)),
        );
        let musicbrainz = Arc::new(
            MockMusicBrainz::new()
                .fail_next(SourceError::Network("reset".into()))
                .fail_next(SourceError::Network("reset".into()))
                .fail_next(SourceError::Network("reset".into())),
        );

        let mut scheduler = Scheduler::new(
            lastfm,
            musicbrainz.clone(),
            MemoryStore::new(),
            settings(5, 2),
        );
        scheduler.enqueue(WorkItem::DiscoverTopArtists);
        let stats = scheduler.run().await.unwrap();

        assert_eq!(musicbrainz.calls().len(), 3);
        assert_eq!(stats.abandoned, 1);
        assert_eq!(scheduler.state().completed, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_waits_at_least_source_delay() {
        let lastfm = Arc::new(
            MockLastFm::new(vec![artist_draft("a1")]).with_tracks("a1", tracks("a1", 1)),
        );
        // First backoff (500ms) is shorter than the MusicBrainz delay (1s)
        let musicbrainz = Arc::new(MockMusicBrainz::new().fail_next(SourceError::RateLimited));

        let mut scheduler = Scheduler::new(
            lastfm,
            musicbrainz.clone(),
            MemoryStore::new(),
            paced_settings(5, 1),
        );
        scheduler.enqueue(WorkItem::DiscoverTopArtists);
        let stats = scheduler.run().await.unwrap();

        assert_eq!(stats.retries, 1);
        let times = musicbrainz.call_times();
        assert_eq!(times.len(), 2);
        assert!(times[1] - times[0] >= Duration::from_millis(1000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_same_source_requests_respect_delay() {
        let lastfm = Arc::new(
            MockLastFm::new(vec![artist_draft("a1"), artist_draft("a2")])
                .with_tracks("a1", tracks("a1", 3))
                .with_tracks("a2", tracks("a2", 3))
                .fail_next(SourceError::Network("reset".into())),
        );
        let musicbrainz = Arc::new(
            MockMusicBrainz::new()
                .with_recordings("a1", vec![recording("a1-t1", &[("a1", "")])])
                .fail_next(SourceError::RateLimited)
                .fail_next(SourceError::RateLimited),
        );
        let mut settings = paced_settings(5, 3);
        settings.tracks_page_size = 1;

        let mut scheduler = Scheduler::new(
            lastfm.clone(),
            musicbrainz.clone(),
            MemoryStore::new(),
            settings,
        );
        scheduler.enqueue(WorkItem::DiscoverTopArtists);
        let stats = scheduler.run().await.unwrap();

        assert_eq!(stats.retries, 3);
        assert_eq!(stats.abandoned, 0);

        let lastfm_times = lastfm.call_times();
        let musicbrainz_times = musicbrainz.call_times();
        // Chart (retried once) plus three track pages per artist
        assert_eq!(lastfm_times.len(), 8);
        // One search per artist, the first retried twice
        assert_eq!(musicbrainz_times.len(), 4);
        assert!(min_gap(&lastfm_times) >= Duration::from_millis(200));
        assert!(min_gap(&musicbrainz_times) >= Duration::from_millis(1000));
    }

    #[tokio::test]
    async fn test_stall_is_reported_after_flush() {
        let lastfm = Arc::new(MockLastFm::new(vec![artist_draft("a1")]));
        let store = Arc::new(MemoryStore::new());
        let settings = settings(5, 2);
        let handlers = NeverCompletes(CrawlHandlers {
            track_limit: 2,
            tracks_page_size: 50,
        });

        let mut scheduler = Scheduler::with_handlers(
            lastfm,
            MockMusicBrainz::new(),
            store.clone(),
            settings,
            handlers,
        );
        scheduler.enqueue(WorkItem::DiscoverTopArtists);
        let err = scheduler.run().await.unwrap_err();

        assert!(matches!(
            err,
            Error::Stalled {
                completed: 0,
                discovered: 1
            }
        ));
        assert!(store.get("a1").is_some());
    }

    #[tokio::test]
    async fn test_repeated_conflict_aborts_run() {
        let lastfm = Arc::new(MockLastFm::new(vec![artist_draft("a1")]));

        let mut scheduler = Scheduler::new(
            lastfm,
            MockMusicBrainz::new(),
            AlwaysConflicting,
            settings(5, 2),
        );
        scheduler.enqueue(WorkItem::DiscoverTopArtists);
        let err = scheduler.run().await.unwrap_err();

        assert!(matches!(
            err,
            Error::Store(StoreError::RepeatedConflict(ref id)) if id == "a1"
        ));
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Top-tracks pages requested = min(ceil(max_wanted / page_size), total_pages),
            /// followed by exactly one enrichment.
            #[test]
            fn top_tracks_page_count(
                available in 0usize..30,
                max_wanted in 1u32..20,
                page_size in 1u32..8,
            ) {
                let lastfm = Arc::new(
                    MockLastFm::new(vec![artist_draft("a1")])
                        .with_tracks("a1", tracks("a1", available)),
                );
                let musicbrainz = Arc::new(MockMusicBrainz::new());
                let mut settings = settings(5, max_wanted);
                settings.tracks_page_size = page_size;

                let mut scheduler = Scheduler::new(
                    lastfm.clone(),
                    musicbrainz.clone(),
                    MemoryStore::new(),
                    settings,
                );
                scheduler.enqueue(WorkItem::DiscoverTopArtists);

                let rt = tokio::runtime::Builder::new_current_thread()
                    .enable_time()
                    .build()
                    .unwrap();
                rt.block_on(scheduler.run()).unwrap();

                let total_pages = available.div_ceil(page_size as usize).max(1);
                let wanted_pages = (max_wanted as usize).div_ceil(page_size as usize);
                prop_assert_eq!(lastfm.track_pages("a1").len(), wanted_pages.min(total_pages));
                prop_assert_eq!(musicbrainz.calls().len(), 1);
                prop_assert_eq!(
                    scheduler.state().graph.track_ids("a1").len(),
                    available.min(max_wanted as usize)
                );
            }
        }
    }
}
