//! Chart crawl command.

use std::sync::Arc;
use tokio::runtime::Runtime;
use tracing::info;

use crate::config::{Config, Environment};
use crate::crawler::{CrawlSettings, CrawlStats, Scheduler, WorkItem};
use crate::error::ResultExt;
use crate::sources::{LastFmClient, MusicBrainzClient};
use crate::store::{CouchStore, DocumentStore, MemoryStore};

/// Command-line overrides for a crawl
#[derive(Debug, Clone, Default)]
pub struct CrawlOptions {
    pub tag: Option<String>,
    pub artists: Option<u32>,
    pub tracks: Option<u32>,
    pub dry_run: bool,
}

impl CrawlOptions {
    /// Settings for this run: the environment profile with the overrides on top.
    fn settings(&self, config: &Config, env: Environment) -> CrawlSettings {
        let mut settings = CrawlSettings::from_config(config, env);
        if let Some(tag) = &self.tag {
            settings.tag = tag.clone();
        }
        if let Some(artists) = self.artists {
            settings.limits.artists = artists;
        }
        if let Some(tracks) = self.tracks {
            settings.limits.tracks = tracks;
        }
        settings
    }
}

/// Crawl the chart for a tag and write artists and tracks to the store
pub fn cmd_crawl(
    rt: &Runtime,
    config: &Config,
    env: Environment,
    options: CrawlOptions,
) -> anyhow::Result<()> {
    let Some(api_key) = config.credentials.lastfm_api_key.as_deref() else {
        anyhow::bail!(
            "No Last.fm API key configured. Set credentials.lastfm_api_key or LASTFM_API_KEY"
        );
    };

    let settings = options.settings(config, env);
    let user_agent = &config.credentials.user_agent;
    let lastfm = LastFmClient::new(&config.lastfm, api_key, user_agent)?;
    let musicbrainz = MusicBrainzClient::new(&config.musicbrainz, user_agent)?;

    println!(
        "Crawling tag '{}' ({}): {} artists, {} tracks each",
        settings.tag, env, settings.limits.artists, settings.limits.tracks
    );

    rt.block_on(async {
        if options.dry_run {
            let store = Arc::new(MemoryStore::new());
            let stats = crawl(lastfm, musicbrainz, Arc::clone(&store), settings).await?;
            print_summary(&stats);
            println!("Dry run: {} documents kept in memory", store.len());
        } else {
            let store = CouchStore::new(&config.store, &config.credentials)?;
            store
                .ensure_database()
                .await
                .with_context(format!("preparing database {}", config.store.database))?;
            info!(url = %config.store.url, database = %config.store.database, "Store ready");
            let stats = crawl(lastfm, musicbrainz, store, settings).await?;
            print_summary(&stats);
        }
        Ok::<_, anyhow::Error>(())
    })
}

async fn crawl<S: DocumentStore>(
    lastfm: LastFmClient,
    musicbrainz: MusicBrainzClient,
    store: S,
    settings: CrawlSettings,
) -> anyhow::Result<CrawlStats> {
    let mut scheduler = Scheduler::new(lastfm, musicbrainz, store, settings);
    scheduler.enqueue(WorkItem::DiscoverTopArtists);
    Ok(scheduler.run().await?)
}

fn print_summary(stats: &CrawlStats) {
    println!("\n=== Crawl Summary ===");
    println!("Artists:        {}", stats.artists);
    println!("Tracks:         {}", stats.tracks);
    println!("Requests:       {}", stats.requests);
    println!("Retries:        {}", stats.retries);
    println!("Abandoned:      {}", stats.abandoned);
    println!("Rejected:       {}", stats.rejected);
    println!("Writes:         {}", stats.writes);
    if stats.failed_writes > 0 {
        println!("Failed writes:  {}", stats.failed_writes);
    }
}
