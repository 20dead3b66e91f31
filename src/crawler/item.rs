// src/crawler/item.rs
// =============================================================================
// The value produced by one successful fetch.
//
// An Item is immutable once the fetcher hands it to the engine. It sits in the
// engine's result queue until the consumer reads it, and from then on it
// belongs to the consumer.
// =============================================================================

use serde::{Deserialize, Serialize};

/// The fetched content of one address: its body and the addresses it links to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Raw document body, exactly as the fetcher returned it
    pub body: String,
    /// Outbound links in document order
    pub links: Vec<String>,
}

impl Item {
    pub fn new(body: impl Into<String>, links: Vec<String>) -> Self {
        Self {
            body: body.into(),
            links,
        }
    }
}
