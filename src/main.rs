// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Install the tracing subscriber (logs go to stderr)
// 3. Dispatch one crawl with the HTTP fetcher
// 4. Print items as they stream in; cancel the crawl if --timeout passes
// 5. Exit with proper code (0 = crawl finished, 1 = timed out, 2 = error)
// =============================================================================

mod cli;

use anyhow::{anyhow, Result};
use clap::Parser;
use cli::{Cli, Commands, CrawlArgs};
use crawlstream::logging::setup_tracing;
use crawlstream::{Dispatcher, HttpFetcher, Item};
use serde::Serialize;
use tracing::{info, warn};

#[tokio::main]
async fn main() {
    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

async fn run() -> Result<i32> {
    let cli = Cli::parse();
    setup_tracing(cli.log_format, cli.verbose)?;

    match cli.command {
        Commands::Crawl(args) => handle_crawl(args).await,
    }
}

// What --json prints
#[derive(Debug, Serialize)]
struct CrawlReport {
    id: String,
    params: CrawlParams,
    results: Vec<Item>,
    timed_out: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_error: Option<String>,
}

#[derive(Debug, Serialize)]
struct CrawlParams {
    url: String,
    depth: usize,
}

async fn handle_crawl(args: CrawlArgs) -> Result<i32> {
    let config = args.to_config();
    let fetcher = HttpFetcher::from_config(&config, &args.url)?;
    let dispatcher = Dispatcher::with_config(fetcher, config)?;

    info!(
        capacity = dispatcher.config().capacity,
        enforce_depth = dispatcher.config().enforce_depth,
        retries = dispatcher.config().retry.max_retries,
        "starting crawl"
    );
    let crawl = dispatcher.dispatch(&args.url, args.depth);
    let mut results = crawl
        .results()
        .ok_or_else(|| anyhow!("result stream already taken"))?;

    if !args.json {
        println!("🔍 Crawling: {}", args.url);
        println!("🆔 Crawl id: {}", crawl.id());
        println!("{:<6} {:<8} {}", "#", "LINKS", "FIRST LINE");
        println!("{}", "=".repeat(80));
    }

    // The crawl-wide timeout: once it fires we cancel, then keep reading
    // until the stream reports its end
    let deadline = tokio::time::sleep(args.crawl_timeout());
    tokio::pin!(deadline);
    let mut timed_out = false;
    let mut items = Vec::new();

    loop {
        tokio::select! {
            item = results.recv() => match item {
                Some(item) => {
                    if !args.json {
                        print_row(items.len() + 1, &item);
                    }
                    items.push(item);
                }
                None => break,
            },
            _ = &mut deadline, if !timed_out => {
                warn!(timeout = args.timeout, "crawl timed out, cancelling");
                timed_out = true;
                crawl.cancel().await;
            }
        }
    }

    // Already stopped by now; this just collects the last error
    let last_error = crawl.cancel().await;
    info!(id = %crawl.id(), items = items.len(), timed_out, "crawl finished");

    if args.json {
        let report = CrawlReport {
            id: crawl.id().to_string(),
            params: CrawlParams {
                url: args.url.clone(),
                depth: args.depth,
            },
            results: items,
            timed_out,
            last_error: last_error.map(|e| e.to_string()),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!();
        println!("📊 Summary:");
        println!("   📄 Documents: {}", items.len());
        if let Some(error) = &last_error {
            println!("   ⚠️  Last error: {}", error);
        }
        if timed_out {
            println!("   ⏱️  Stopped after {}s timeout", args.timeout);
        }
    }

    Ok(if timed_out { 1 } else { 0 })
}

fn print_row(index: usize, item: &Item) {
    let first_line = item
        .body
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("");

    // Truncate on a char boundary so multi-byte text can't panic
    let display: String = if first_line.chars().count() > 60 {
        format!("{}...", first_line.chars().take(57).collect::<String>())
    } else {
        first_line.to_string()
    };

    println!("{:<6} {:<8} {}", index, item.links.len(), display);
}
