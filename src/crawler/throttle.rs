//! Per-source request pacing and retry backoff.
//!
//! Last.fm tolerates a few requests per second; MusicBrainz allows one.
//! The scheduler waits the delay of the source it just used before
//! dispatching again.

use std::time::Duration;

use crate::config::{Config, RetryConfig};
use crate::sources::Source;

/// Delay after each request, keyed by source.
#[derive(Debug, Clone)]
pub struct Throttle {
    lastfm: Duration,
    musicbrainz: Duration,
    last_used: Duration,
}

impl Throttle {
    pub fn new(lastfm: Duration, musicbrainz: Duration) -> Self {
        Self {
            lastfm,
            musicbrainz,
            last_used: lastfm,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            Duration::from_millis(config.lastfm.delay_ms),
            Duration::from_millis(config.musicbrainz.delay_ms),
        )
    }

    /// No pacing at all (tests).
    pub fn none() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO)
    }

    pub fn delay_for(&self, source: Source) -> Duration {
        match source {
            Source::LastFm => self.lastfm,
            Source::MusicBrainz => self.musicbrainz,
        }
    }

    /// Wait the delay of the source just used.
    pub async fn after(&mut self, source: Source) {
        let delay = self.delay_for(source);
        self.last_used = delay;
        if !delay.is_zero() {
            tracing::trace!(?delay, %source, "Throttling");
        }
        tokio::time::sleep(delay).await;
    }

    /// Wait before polling an empty queue again.
    pub async fn idle(&self) {
        tokio::time::sleep(self.last_used).await;
    }
}

/// Bounded retry with exponential backoff.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay: Duration::from_millis(config.base_delay_ms),
        }
    }

    /// Backoff before retry number `attempt` (1 = first retry).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay.saturating_mul(factor)
    }

    /// Whether another attempt is allowed after `attempts_made`.
    pub fn allows_retry(&self, attempts_made: u32) -> bool {
        attempts_made < self.max_attempts
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_per_source() {
        let throttle = Throttle::from_config(&Config::default());
        assert_eq!(throttle.delay_for(Source::LastFm), Duration::from_millis(200));
        assert_eq!(
            throttle.delay_for(Source::MusicBrainz),
            Duration::from_millis(1000)
        );
    }

    #[tokio::test]
    async fn test_idle_uses_last_delay() {
        let mut throttle = Throttle::none();
        throttle.after(Source::MusicBrainz).await;
        assert_eq!(throttle.last_used, Duration::ZERO);
        throttle.idle().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_after_waits_source_delay() {
        let mut throttle = Throttle::from_config(&Config::default());

        let start = tokio::time::Instant::now();
        throttle.after(Source::MusicBrainz).await;
        assert!(start.elapsed() >= Duration::from_millis(1000));

        let start = tokio::time::Instant::now();
        throttle.after(Source::LastFm).await;
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(200));
        assert!(elapsed < Duration::from_millis(1000));
    }

    #[test]
    fn test_backoff_doubles() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff(1), Duration::from_millis(500));
        assert_eq!(policy.backoff(2), Duration::from_millis(1000));
        assert_eq!(policy.backoff(3), Duration::from_millis(2000));
    }

    #[test]
    fn test_attempt_budget() {
        let policy = RetryPolicy::default();
        assert!(policy.allows_retry(1));
        assert!(policy.allows_retry(2));
        assert!(!policy.allows_retry(3));
    }
}
