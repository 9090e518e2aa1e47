//! Last.fm API integration
//!
//! Provides the chart data that seeds a crawl: top artists for a tag and
//! each artist's top tracks.
//!
//! API docs: https://www.last.fm/api

pub mod dto;
mod adapter;
mod client;

pub use client::LastFmClient;
