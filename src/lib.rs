// src/lib.rs
// =============================================================================
// crawlstream: crawl a graph of documents from a seed address and stream the
// fetched documents to the caller while the crawl is still running.
//
// Modules:
// - crawler: The engine (dispatch, Crawl handle, frontier, retry, Fetcher)
// - http: A Fetcher that speaks HTTP
// - links: Link extraction from HTML and Markdown
// - config: Tuning knobs (queue capacity, depth enforcement, timeouts)
// - logging: tracing setup for the binary
// =============================================================================

pub mod config;
pub mod crawler;
pub mod http;
pub mod links;
pub mod logging;

pub use config::{ConfigError, CrawlConfig};
pub use crawler::{dispatch, Crawl, Dispatcher, FetchError, Fetcher, Item, Results};
pub use http::HttpFetcher;
