// src/crawler/frontier.rs
// =============================================================================
// The frontier: addresses still to visit, plus every address ever queued.
//
// Invariant: an address is recorded in `visited` at the same moment it is
// pushed to `pending`, so nothing is ever queued twice. `visited` only grows.
//
// Each pending address carries its level (seed = 1, links found on a level-n
// page = n + 1). Levels only matter when depth enforcement is switched on.
//
// Rust concepts:
// - VecDeque: FIFO queue, push at the back, pop from the front
// - HashSet: O(1) "have we seen this address?" checks
// =============================================================================

use std::collections::{HashSet, VecDeque};

/// An address waiting to be fetched, with its distance from the seed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pending {
    pub url: String,
    pub level: usize,
}

#[derive(Debug)]
pub struct Frontier {
    pending: VecDeque<Pending>,
    visited: HashSet<String>,
    // Deepest level that may be queued; None = no limit
    max_level: Option<usize>,
}

impl Frontier {
    /// Creates a frontier holding only the seed.
    ///
    /// The seed is always queued, even when `max_level` is 0.
    pub fn new(seed: &str, max_level: Option<usize>) -> Self {
        let mut pending = VecDeque::new();
        pending.push_back(Pending {
            url: seed.to_string(),
            level: 1,
        });

        let mut visited = HashSet::new();
        visited.insert(seed.to_string());

        Self {
            pending,
            visited,
            max_level,
        }
    }

    /// Queues the links found on a page at `parent_level`.
    ///
    /// Links already seen are skipped. Links beyond the depth limit are
    /// skipped without being marked visited. Returns how many were queued.
    pub fn discover<'a, I>(&mut self, links: I, parent_level: usize) -> usize
    where
        I: IntoIterator<Item = &'a String>,
    {
        let level = parent_level + 1;
        if let Some(max) = self.max_level {
            if level > max {
                return 0;
            }
        }

        let mut queued = 0;
        for link in links {
            // insert() returns false when the address was already there
            if self.visited.insert(link.clone()) {
                self.pending.push_back(Pending {
                    url: link.clone(),
                    level,
                });
                queued += 1;
            }
        }
        queued
    }

    /// Removes and returns the earliest discovered address
    pub fn next(&mut self) -> Option<Pending> {
        self.pending.pop_front()
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn visited_len(&self) -> usize {
        self.visited.len()
    }

    pub fn is_visited(&self, url: &str) -> bool {
        self.visited.contains(url)
    }
}
