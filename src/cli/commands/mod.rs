//! CLI command definitions and dispatch.
//!
//! Each subcommand is implemented in its own submodule:
//! - `crawl`: Harvest the chart into the document store
//! - `serve`: Passthrough proxy and configuration display

mod crawl;
mod serve;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tokio::runtime::Runtime;

use crate::config::{self, Config, Environment};

pub use crawl::{CrawlOptions, cmd_crawl};
pub use serve::{cmd_proxy, cmd_show_config};

/// Rapgraff CLI
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file (default: the OS config directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Environment profile: development, production or test
    #[arg(long, global = true, env = "RAPGRAFF_ENV", default_value = "development")]
    pub env: Environment,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Harvest top artists, their top tracks and credits into the store
    Crawl {
        /// Chart tag to crawl (default from config)
        #[arg(long)]
        tag: Option<String>,
        /// Number of top artists (overrides the environment profile)
        #[arg(long)]
        artists: Option<u32>,
        /// Number of top tracks per artist (overrides the environment profile)
        #[arg(long)]
        tracks: Option<u32>,
        /// Crawl into memory without writing to the store
        #[arg(long)]
        dry_run: bool,
    },
    /// Run the passthrough proxy in front of the document store
    Proxy {
        /// Listen address (default from config)
        #[arg(long)]
        bind: Option<String>,
    },
    /// Print the effective configuration
    ShowConfig,
}

/// Run the specified CLI command.
pub fn run_command(cli: &Cli) -> anyhow::Result<()> {
    let config = load_config(cli)?;

    match &cli.command {
        Commands::Crawl {
            tag,
            artists,
            tracks,
            dry_run,
        } => {
            let rt = Runtime::new()?;
            let options = CrawlOptions {
                tag: tag.clone(),
                artists: *artists,
                tracks: *tracks,
                dry_run: *dry_run,
            };
            cmd_crawl(&rt, &config, cli.env, options)
        }
        Commands::Proxy { bind } => {
            let rt = Runtime::new()?;
            let bind = bind.as_deref().unwrap_or(&config.proxy.bind);
            cmd_proxy(&rt, &config, bind)
        }
        Commands::ShowConfig => cmd_show_config(&config, cli.env),
    }
}

/// Load the config file named on the command line, or the default one.
fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => config::load_from(path)?,
        None => config::load()?,
    };
    config.apply_env_overrides();
    Ok(config)
}
