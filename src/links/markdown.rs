// src/links/markdown.rs
// =============================================================================
// This module extracts links from Markdown text.
//
// We use the `pulldown-cmark` crate which:
// - Parses Markdown into events (heading, paragraph, link, etc.)
// - Follows the CommonMark specification
// - Is fast and memory-efficient (it's a streaming parser)
//
// Relative links ("./guide.md") are resolved against the document URL, so a
// README can lead the crawl to the rest of the docs.
// =============================================================================

use super::{dedup_in_order, resolve_link};
use pulldown_cmark::{Event, Parser, Tag};
use url::Url;

// Extracts all crawlable links from Markdown text
//
// Example input:
//   "Check out [Rust](https://www.rust-lang.org) and [the guide](guide.md)!"
//
// Example output (document at https://example.com/README.md):
//   ["https://www.rust-lang.org/", "https://example.com/guide.md"]
pub fn extract_markdown_links(markdown: &str, page_url: &Url) -> Vec<String> {
    let links = Parser::new(markdown)
        .filter_map(|event| match event {
            // In pulldown-cmark 0.9, Link is Tag::Link(link_type, dest_url, title)
            Event::Start(Tag::Link(_link_type, dest_url, _title)) => {
                resolve_link(page_url, &dest_url)
            }
            _ => None,
        })
        .collect();

    dedup_in_order(links)
}
