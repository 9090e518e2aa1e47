//! Rapgraff - a hip-hop collaboration graph harvester.
//!
//! Crawls the Last.fm chart for a tag, enriches each artist's top tracks
//! with MusicBrainz artist credits, and stores artists and tracks as
//! documents in a CouchDB-compatible database. A small passthrough proxy
//! exposes that database to clients without the store credentials.

pub mod cli;
pub mod config;
pub mod crawler;
pub mod error;
pub mod model;
pub mod proxy;
pub mod sources;
pub mod store;
#[cfg(test)]
pub mod test_utils;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn main() -> anyhow::Result<()> {
    let args = cli::Cli::parse();

    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(EnvFilter::from_default_env().add_directive("rapgraff=info".parse()?))
        .init();

    cli::run_command(&args)
}
