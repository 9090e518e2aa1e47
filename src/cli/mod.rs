//! Command-line interface for rapgraff.
//!
//! Provides the crawl, the passthrough proxy, and a configuration dump.

mod commands;

pub use commands::{Cli, Commands, run_command};
