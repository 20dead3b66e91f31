// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// We use the "derive" API which lets us define the CLI structure using
// Rust structs and attributes (the #[...] things).
//
// The flags map one-to-one onto CrawlConfig (src/config.rs), plus a few that
// only matter to the command line itself (--timeout, --json, logging).
// =============================================================================

use clap::{Args, Parser, Subcommand};
use crawlstream::config::DEFAULT_CAPACITY;
use crawlstream::crawler::RetryConfig;
use crawlstream::logging::LogFormat;
use crawlstream::CrawlConfig;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(
    name = "crawlstream",
    version,
    about = "Crawl documents from a seed URL and stream what was found",
    long_about = "crawlstream follows links from a starting URL, fetching one page at a time, \
                  and prints every fetched document as soon as it arrives."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Log at debug level (RUST_LOG overrides this)
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Pretty, global = true)]
    pub log_format: LogFormat,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Crawl starting from a URL
    ///
    /// Example: crawlstream crawl https://example.com --depth 2 --json
    Crawl(CrawlArgs),
}

#[derive(Args, Debug, Clone)]
pub struct CrawlArgs {
    /// URL to start crawling from
    pub url: String,

    /// Crawl depth (1 = just the starting page); only enforced with --enforce-depth
    #[arg(long, default_value_t = 1)]
    pub depth: usize,

    /// Stop following links deeper than --depth
    #[arg(long)]
    pub enforce_depth: bool,

    /// How many fetched pages may wait for output before fetching pauses
    #[arg(long, default_value_t = DEFAULT_CAPACITY)]
    pub capacity: usize,

    /// Cancel the whole crawl after this many seconds
    #[arg(long, default_value_t = 10)]
    pub timeout: u64,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 10)]
    pub fetch_timeout: u64,

    /// Retries for failed requests (timeouts, 5xx, connection errors)
    #[arg(long, default_value_t = 0)]
    pub retries: u32,

    /// Only follow links on the starting URL's host
    #[arg(long)]
    pub same_host: bool,

    /// Output results in JSON format instead of a table
    #[arg(long)]
    pub json: bool,
}

impl CrawlArgs {
    pub fn crawl_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    pub fn to_config(&self) -> CrawlConfig {
        CrawlConfig {
            capacity: self.capacity,
            enforce_depth: self.enforce_depth,
            fetch_timeout: Duration::from_secs(self.fetch_timeout),
            same_host_only: self.same_host,
            retry: RetryConfig::new(self.retries),
        }
    }
}
