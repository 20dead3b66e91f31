// src/crawler/retry.rs
// =============================================================================
// What to do when a fetch fails.
//
// A RetryPolicy looks at the failed attempt and either returns how long to
// wait before trying again, or None to give up on the address.
//
// - NoRetry: give up immediately (the address and everything only it links
//   to are simply never crawled)
// - RetryConfig: exponential backoff for recoverable errors
//
// Retries run inside the single fetch task, so a retried address still counts
// as "the one fetch in flight" and fetches never overlap.
// =============================================================================

use super::fetcher::FetchError;
use crate::config::millis;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Decides whether a failed fetch is attempted again.
pub trait RetryPolicy: Send + Sync + std::fmt::Debug {
    /// `attempt` counts the attempts made so far (1 after the first failure).
    ///
    /// Returns the delay before the next attempt, or None to give up.
    fn backoff(&self, attempt: u32, error: &FetchError) -> Option<Duration>;
}

/// Never retry.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRetry;

impl RetryPolicy for NoRetry {
    fn backoff(&self, _attempt: u32, _error: &FetchError) -> Option<Duration> {
        None
    }
}

/// Exponential backoff for recoverable errors.
///
/// Delay before retry n is `base_delay * 2^(n-1)`, capped at `max_delay`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Retries after the first attempt; 0 disables retrying
    pub max_retries: u32,

    /// Delay before the first retry
    #[serde(with = "millis")]
    pub base_delay: Duration,

    /// Upper bound for any single delay
    #[serde(with = "millis")]
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 0,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
        }
    }
}

impl RetryConfig {
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Default::default()
        }
    }

    pub fn with_delays(max_retries: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
            max_delay,
        }
    }

    fn delay_for(&self, attempt: u32) -> Duration {
        // 2^(attempt-1) without overflowing on silly attempt counts
        let factor = 1u32.checked_shl(attempt.saturating_sub(1)).unwrap_or(u32::MAX);
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }
}

impl RetryPolicy for RetryConfig {
    fn backoff(&self, attempt: u32, error: &FetchError) -> Option<Duration> {
        if attempt > self.max_retries || !error.is_recoverable() {
            return None;
        }
        Some(self.delay_for(attempt))
    }
}
