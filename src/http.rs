// src/http.rs
// =============================================================================
// The production fetcher: plain HTTP GET with reqwest.
//
// For every address it:
// 1. Sends a GET request (with the configured timeout)
// 2. Fails with FetchError::Status for any non-2xx answer
// 3. Returns the body as-is, plus the links found in it
//
// Links are resolved against the URL the response finally came from, so
// relative links on a redirected page still point at the right place.
//
// Errors from reqwest are sorted into FetchError variants so the retry
// policy can tell a timeout (worth retrying) from a bad URL (not).
// =============================================================================

use crate::config::{ConfigError, CrawlConfig};
use crate::crawler::{FetchError, Fetcher, Item};
use crate::links::{extract_links, DocumentKind};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;
use url::Url;

#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    // When set, only links on this host are reported
    allowed_host: Option<String>,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self, ConfigError> {
        let client = Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(5))
            .user_agent(concat!("crawlstream/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ConfigError::HttpClient {
                message: e.to_string(),
            })?;

        Ok(Self {
            client,
            allowed_host: None,
        })
    }

    /// Builds a fetcher for a crawl starting at `seed`.
    ///
    /// With `same_host_only`, links leading off the seed's host are dropped.
    /// A seed that is not an absolute URL is rejected here, before any crawl
    /// is dispatched.
    pub fn from_config(config: &CrawlConfig, seed: &str) -> Result<Self, ConfigError> {
        let mut fetcher = Self::new(config.fetch_timeout)?;
        if config.same_host_only {
            let seed_url = Url::parse(seed).map_err(|e| ConfigError::InvalidSeed {
                url: seed.to_string(),
                message: e.to_string(),
            })?;
            fetcher.allowed_host = seed_url.host_str().map(str::to_string);
        }
        Ok(fetcher)
    }

    /// Restricts reported links to `host`
    pub fn with_allowed_host(mut self, host: impl Into<String>) -> Self {
        self.allowed_host = Some(host.into());
        self
    }

    fn keep_link(&self, link: &str) -> bool {
        match &self.allowed_host {
            None => true,
            Some(host) => Url::parse(link)
                .map(|url| url.host_str() == Some(host.as_str()))
                .unwrap_or(false),
        }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Item, FetchError> {
        let address = parse_address(url)?;

        let response = self
            .client
            .get(address)
            .send()
            .await
            .map_err(|e| categorize_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        // Where we ended up after redirects
        let final_url = response.url().clone();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        let body = response.text().await.map_err(|e| FetchError::Body {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        let kind = DocumentKind::detect(content_type.as_deref(), &final_url);
        let links: Vec<String> = extract_links(kind, &body, &final_url)
            .into_iter()
            .filter(|link| self.keep_link(link))
            .collect();

        debug!(url, status = status.as_u16(), ?kind, links = links.len(), "page fetched");
        Ok(Item::new(body, links))
    }
}

fn parse_address(url: &str) -> Result<Url, FetchError> {
    Url::parse(url).map_err(|e| FetchError::InvalidAddress {
        url: url.to_string(),
        message: e.to_string(),
    })
}

// Sorts reqwest failures into our error variants
fn categorize_error(url: &str, error: reqwest::Error) -> FetchError {
    let url = url.to_string();
    if error.is_timeout() {
        FetchError::Timeout { url }
    } else if error.is_builder() {
        FetchError::InvalidAddress {
            url,
            message: error.to_string(),
        }
    } else {
        FetchError::Transport {
            url,
            message: error.to_string(),
        }
    }
}
