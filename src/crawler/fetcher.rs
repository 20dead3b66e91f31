// src/crawler/fetcher.rs
// =============================================================================
// The Fetcher contract: "give me the document at this address and the
// addresses it links to".
//
// The engine never knows how documents are retrieved. Anything implementing
// `Fetcher` can be plugged in:
// - HttpFetcher (src/http.rs) talks to real web servers
// - StaticFetcher (below) answers from a fixed table, for tests and demos
//
// The contract imposes no timeout and no retry. The engine decides what to do
// with a failure (see retry.rs).
//
// Rust concepts:
// - Traits: The shared interface every fetcher implements
// - async-trait: Lets trait methods be `async fn`
// - thiserror: Derives Display/Error for our error enum
// =============================================================================

use super::item::Item;
use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;

/// Why a single fetch attempt failed.
///
/// Errors are `Clone` because the engine keeps the last one it gave up on and
/// hands it back from `Crawl::cancel()`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The request did not finish in time
    #[error("request to {url} timed out")]
    Timeout { url: String },

    /// Connection, DNS, TLS or other transport failure
    #[error("transport error for {url}: {message}")]
    Transport { url: String, message: String },

    /// The server answered with a non-success status code
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    /// The body could not be read or decoded
    #[error("could not read body of {url}: {message}")]
    Body { url: String, message: String },

    /// The address is not a valid URL
    #[error("invalid address '{url}': {message}")]
    InvalidAddress { url: String, message: String },

    /// The fetcher has no document for this address
    #[error("no document for {url}")]
    NotFound { url: String },

    /// The fetcher panicked while handling this address
    #[error("fetcher panicked on {url}: {message}")]
    Panicked { url: String, message: String },
}

impl FetchError {
    /// Whether trying the same address again could succeed.
    ///
    /// Timeouts, transport failures, 5xx and 429 are worth another attempt.
    /// Everything else will fail the same way next time.
    pub fn is_recoverable(&self) -> bool {
        match self {
            FetchError::Timeout { .. } | FetchError::Transport { .. } => true,
            FetchError::Status { status, .. } => *status >= 500 || *status == 429,
            FetchError::Body { .. }
            | FetchError::InvalidAddress { .. }
            | FetchError::NotFound { .. }
            | FetchError::Panicked { .. } => false,
        }
    }

    /// The address the failed attempt was for
    pub fn url(&self) -> &str {
        match self {
            FetchError::Timeout { url }
            | FetchError::Transport { url, .. }
            | FetchError::Status { url, .. }
            | FetchError::Body { url, .. }
            | FetchError::InvalidAddress { url, .. }
            | FetchError::NotFound { url }
            | FetchError::Panicked { url, .. } => url,
        }
    }
}

/// Retrieves one document and its outbound links.
///
/// Implementations must be shareable across tasks: the engine holds the
/// fetcher in an `Arc` and calls it from a spawned fetch task.
#[async_trait]
pub trait Fetcher: Send + Sync + 'static {
    async fn fetch(&self, url: &str) -> Result<Item, FetchError>;
}

/// A fetcher backed by a fixed table of documents.
///
/// ```text
/// StaticFetcher::new()
///     .page("A", "a", ["B", "C"])
///     .page("B", "b", Vec::<String>::new())
/// ```
#[derive(Debug, Clone, Default)]
pub struct StaticFetcher {
    pages: HashMap<String, Item>,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) the document served for `url`
    pub fn page<I, S>(mut self, url: &str, body: &str, links: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let links = links.into_iter().map(Into::into).collect();
        self.pages.insert(url.to_string(), Item::new(body, links));
        self
    }
}

#[async_trait]
impl Fetcher for StaticFetcher {
    async fn fetch(&self, url: &str) -> Result<Item, FetchError> {
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| FetchError::NotFound {
                url: url.to_string(),
            })
    }
}

// Shared fetchers are fetchers too, so callers can keep a handle on an
// instrumented fetcher while the engine owns another.
#[async_trait]
impl<F: Fetcher + ?Sized> Fetcher for std::sync::Arc<F> {
    async fn fetch(&self, url: &str) -> Result<Item, FetchError> {
        (**self).fetch(url).await
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why `Send + Sync + 'static` on the trait?
//    - The engine runs fetches inside tokio::spawn
//    - Spawned tasks may move between threads (Send) and share the fetcher
//      through an Arc (Sync)
//    - 'static means the fetcher borrows nothing that could go away
//
// 2. What does #[async_trait] do?
//    - It rewrites `async fn` in traits into methods returning boxed futures
//    - That makes the trait usable as `dyn Fetcher` and inside generics alike
//
// 3. Why is the error an enum instead of a String?
//    - Callers can match on the variant (e.g. retry only timeouts)
//    - thiserror writes the Display impl from the #[error(...)] attributes
// -----------------------------------------------------------------------------
