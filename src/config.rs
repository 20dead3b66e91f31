// src/config.rs
// =============================================================================
// Tuning knobs for a crawl.
//
// The command line (src/cli.rs) fills these in; library users can build one
// directly or deserialize it. `validate()` is called by the Dispatcher before
// any crawl starts, so a bad config never reaches the engine.
// =============================================================================

use crate::crawler::RetryConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Result queue size used when nothing else is configured
pub const DEFAULT_CAPACITY: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("result queue capacity must be at least 1")]
    ZeroCapacity,

    #[error("fetch timeout must be greater than zero")]
    ZeroFetchTimeout,

    #[error("could not build HTTP client: {message}")]
    HttpClient { message: String },

    #[error("invalid seed address '{url}': {message}")]
    InvalidSeed { url: String, message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlConfig {
    /// How many fetched items may wait for the consumer before fetching pauses
    pub capacity: usize,

    /// Stop queueing links deeper than the crawl's depth
    pub enforce_depth: bool,

    /// Per-request timeout for the HTTP fetcher
    #[serde(rename = "fetch_timeout_ms", with = "millis")]
    pub fetch_timeout: Duration,

    /// Only follow links on the seed's host (HTTP fetcher)
    pub same_host_only: bool,

    pub retry: RetryConfig,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            enforce_depth: false,
            fetch_timeout: Duration::from_secs(10),
            same_host_only: false,
            retry: RetryConfig::default(),
        }
    }
}

impl CrawlConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        if self.fetch_timeout.is_zero() {
            return Err(ConfigError::ZeroFetchTimeout);
        }
        Ok(())
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_enforced_depth(mut self, enforce: bool) -> Self {
        self.enforce_depth = enforce;
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }
}

// Durations as integer milliseconds in serialized config
pub(crate) mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(deserializer)?))
    }
}
