// src/links/html.rs
// =============================================================================
// This module extracts links from HTML pages.
//
// We use the `scraper` crate which:
// - Parses HTML into a DOM (Document Object Model)
// - Supports CSS selectors for finding elements
// - Is built on html5ever (Mozilla's HTML parser)
//
// A <base href> element, when present, changes what relative links resolve
// against, exactly as a browser would do it.
// =============================================================================

use super::{dedup_in_order, resolve_link};
use scraper::{Html, Selector};
use url::Url;

// Extracts all crawlable links from HTML content
//
// Parameters:
//   html: the HTML content to parse
//   page_url: the URL the page was served from
//
// Example:
//   html = "<a href='/docs'>Docs</a>"
//   page_url = "https://example.com"
//   result = ["https://example.com/docs"]
pub fn extract_html_links(html: &str, page_url: &Url) -> Vec<String> {
    let document = Html::parse_document(html);

    let (Ok(anchors), Ok(base_tag)) = (Selector::parse("a[href]"), Selector::parse("base[href]"))
    else {
        return Vec::new();
    };

    // Honour <base href="..."> if the page declares one
    let base = document
        .select(&base_tag)
        .next()
        .and_then(|element| element.value().attr("href"))
        .and_then(|href| page_url.join(href).ok())
        .unwrap_or_else(|| page_url.clone());

    let links = document
        .select(&anchors)
        .filter_map(|element| element.value().attr("href"))
        .filter_map(|href| resolve_link(&base, href))
        .collect();

    dedup_in_order(links)
}
