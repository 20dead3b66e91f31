//! Shared fetchers for the integration tests.
//!
//! They wrap a real fetcher and record what the engine asked for, so tests
//! can check dedup, sequential fetching and backpressure from the outside.

#![allow(dead_code)]

use async_trait::async_trait;
use crawlstream::crawler::{FetchError, Fetcher, Item};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Records every call and how many fetches overlapped
pub struct RecordingFetcher<F> {
    inner: F,
    delay: Option<Duration>,
    calls: Mutex<Vec<String>>,
    active: AtomicUsize,
    max_active: AtomicUsize,
}

impl<F: Fetcher> RecordingFetcher<F> {
    pub fn new(inner: F) -> Arc<Self> {
        Self::with_delay(inner, None)
    }

    pub fn with_delay(inner: F, delay: Option<Duration>) -> Arc<Self> {
        Arc::new(Self {
            inner,
            delay,
            calls: Mutex::new(Vec::new()),
            active: AtomicUsize::new(0),
            max_active: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_for(&self, url: &str) -> usize {
        self.calls().iter().filter(|c| c.as_str() == url).count()
    }

    pub fn max_active(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<F: Fetcher> Fetcher for RecordingFetcher<F> {
    async fn fetch(&self, url: &str) -> Result<Item, FetchError> {
        self.calls.lock().unwrap().push(url.to_string());
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let result = self.inner.fetch(url).await;

        self.active.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

/// Never answers for the given address; flags when the fetch is dropped
pub struct HangingFetcher {
    pub hang_on: String,
    pub pages: HashMap<String, Item>,
    pub started: AtomicBool,
    pub dropped: Arc<AtomicBool>,
}

impl HangingFetcher {
    pub fn new(hang_on: &str) -> Arc<Self> {
        Arc::new(Self {
            hang_on: hang_on.to_string(),
            pages: HashMap::new(),
            started: AtomicBool::new(false),
            dropped: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn with_page(hang_on: &str, url: &str, item: Item) -> Arc<Self> {
        let mut pages = HashMap::new();
        pages.insert(url.to_string(), item);
        Arc::new(Self {
            hang_on: hang_on.to_string(),
            pages,
            started: AtomicBool::new(false),
            dropped: Arc::new(AtomicBool::new(false)),
        })
    }
}

struct DropFlag(Arc<AtomicBool>);

impl Drop for DropFlag {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl Fetcher for HangingFetcher {
    async fn fetch(&self, url: &str) -> Result<Item, FetchError> {
        if url == self.hang_on {
            let _flag = DropFlag(Arc::clone(&self.dropped));
            self.started.store(true, Ordering::SeqCst);
            futures::future::pending::<()>().await;
        }
        self.pages.get(url).cloned().ok_or_else(|| FetchError::NotFound {
            url: url.to_string(),
        })
    }
}

/// Fails with a timeout `failures` times, then serves `item`
pub struct FlakyFetcher {
    failures: usize,
    item: Item,
    attempts: AtomicUsize,
}

impl FlakyFetcher {
    pub fn new(failures: usize, item: Item) -> Arc<Self> {
        Arc::new(Self {
            failures,
            item,
            attempts: AtomicUsize::new(0),
        })
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Fetcher for FlakyFetcher {
    async fn fetch(&self, url: &str) -> Result<Item, FetchError> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
        if attempt < self.failures {
            Err(FetchError::Timeout {
                url: url.to_string(),
            })
        } else {
            Ok(self.item.clone())
        }
    }
}

/// Serves `inner`, but panics when asked for `panic_on`
pub struct PanickingFetcher<F> {
    pub inner: F,
    pub panic_on: &'static str,
}

#[async_trait]
impl<F: Fetcher> Fetcher for PanickingFetcher<F> {
    async fn fetch(&self, url: &str) -> Result<Item, FetchError> {
        if url == self.panic_on {
            panic!("fetcher blew up on {}", url);
        }
        self.inner.fetch(url).await
    }
}

/// Polls `check` until it holds, or panics after two seconds
pub async fn eventually<C: Fn() -> bool>(what: &str, check: C) {
    let waited = tokio::time::timeout(Duration::from_secs(2), async {
        while !check() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await;
    assert!(waited.is_ok(), "timed out waiting for: {}", what);
}

/// Lets the engine do whatever it can without the consumer.
///
/// Meant for tests on a paused clock: the sleep only completes once every
/// task is idle, so there is no real-time race.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(100)).await;
}
