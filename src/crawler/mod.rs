//! Crawl scheduler.
//!
//! Harvests the chart in four stages, each driven by a [`WorkItem`]:
//!
//! ```text
//! DiscoverTopArtists ──▶ DiscoverTopTracks(artist, page) ──▶ EnrichCredits(artist, page) ──▶ Terminate
//!                              └── next page ──┘                   └── next page ──┘
//! ```
//!
//! Work is served FIFO with a single request in flight. Terminate is
//! enqueued once every discovered artist has finished enrichment; it
//! flushes the whole entity graph to the store and ends the run.

mod handlers;
mod queue;
mod scheduler;
mod throttle;
mod work;

pub use handlers::{CrawlHandlers, CrawlState, StageHandlers, Transition};
pub use queue::WorkQueue;
pub use scheduler::{CrawlSettings, CrawlStats, Scheduler};
pub use throttle::{RetryPolicy, Throttle};
pub use work::{Request, Response, WorkItem};
