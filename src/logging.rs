// src/logging.rs
// =============================================================================
// Sets up `tracing` output for the binary.
//
// - RUST_LOG wins when it is set (e.g. RUST_LOG=crawlstream=trace)
// - Otherwise: info for our crate, debug with --verbose
// - Logs go to stderr so that --json output on stdout stays clean
// =============================================================================

use anyhow::{anyhow, Result};
use clap::ValueEnum;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable, multi-line
    Pretty,
    /// One JSON object per line
    Json,
}

pub fn setup_tracing(format: LogFormat, verbose: bool) -> Result<()> {
    let default_filter = if verbose {
        "crawlstream=debug,warn"
    } else {
        "crawlstream=info,warn"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let registry = tracing_subscriber::registry().with(env_filter);
    let result = match format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().pretty().with_writer(std::io::stderr))
            .try_init(),
    };

    result.map_err(|e| anyhow!("could not install log subscriber: {}", e))
}
