// src/crawler/mod.rs
// =============================================================================
// The crawl engine and everything it is built from.
//
// Submodules:
// - item: The value one fetch produces (body + links)
// - fetcher: The pluggable "fetch one address" contract
// - frontier: Addresses still to visit and addresses already seen
// - retry: What happens when a fetch fails
// - engine: The coordinating task, the Crawl handle and the Dispatcher
//
// Typical use:
//   let crawl = dispatch(fetcher, "https://example.com", 2);
//   let mut results = crawl.results().unwrap();
//   while let Some(item) = results.recv().await { ... }
// =============================================================================

mod engine;
mod fetcher;
mod frontier;
mod item;
mod retry;

pub use engine::{dispatch, Crawl, Dispatcher, Results};
pub use fetcher::{FetchError, Fetcher, StaticFetcher};
pub use frontier::{Frontier, Pending};
pub use item::Item;
pub use retry::{NoRetry, RetryConfig, RetryPolicy};
