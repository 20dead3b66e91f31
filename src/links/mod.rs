// src/links/mod.rs
// =============================================================================
// Finding the outbound links of a fetched document.
//
// Submodules:
// - html: <a href> links from HTML pages
// - markdown: [text](target) links from Markdown documents
//
// Both return absolute http/https URLs, resolved against the document's own
// URL, without #fragments and without repeats, in document order.
// =============================================================================

mod html;
mod markdown;

pub use html::extract_html_links;
pub use markdown::extract_markdown_links;

use std::collections::HashSet;
use url::Url;

/// Which extractor a document needs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Html,
    Markdown,
}

impl DocumentKind {
    /// Guesses the kind from the Content-Type header and the URL path.
    ///
    /// Markdown wins if either says so; everything else is treated as HTML.
    pub fn detect(content_type: Option<&str>, url: &Url) -> Self {
        let markdown_type = content_type
            .map(|ct| ct.to_ascii_lowercase().starts_with("text/markdown"))
            .unwrap_or(false);
        let markdown_path = url.path().to_ascii_lowercase().ends_with(".md");

        if markdown_type || markdown_path {
            DocumentKind::Markdown
        } else {
            DocumentKind::Html
        }
    }
}

/// Extracts links from `body` using the extractor for `kind`
pub fn extract_links(kind: DocumentKind, body: &str, base: &Url) -> Vec<String> {
    match kind {
        DocumentKind::Html => extract_html_links(body, base),
        DocumentKind::Markdown => extract_markdown_links(body, base),
    }
}

// Resolves a possibly-relative link against the page URL.
//
// Returns None for anything we can't or shouldn't crawl:
// anchors, mailto:, tel:, javascript:, data:, unparseable hrefs.
fn resolve_link(base: &Url, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    // join() handles both absolute and relative hrefs
    let mut url = base.join(href).ok()?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return None;
    }

    // page.html#intro and page.html are the same document
    url.set_fragment(None);
    Some(url.to_string())
}

// Drops repeated links, keeping the first occurrence
fn dedup_in_order(links: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    links
        .into_iter()
        .filter(|link| seen.insert(link.clone()))
        .collect()
}
