//! Store Statistics Module
//!
//! Tracks read hits and misses of the in-memory store.

use serde::Serialize;

// == Store Stats ==
/// Read statistics for the in-memory store.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StoreStats {
    /// Number of `get` calls that found a live value
    pub hits: u64,
    /// Number of `get` calls on a missing or expired key
    pub misses: u64,
    /// Current number of entries in the store
    pub total_entries: usize,
}

impl StoreStats {
    /// Creates a new StoreStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns hits / (hits + misses), or 0.0 if no reads have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn set_total_entries(&mut self, count: usize) {
        self.total_entries = count;
    }
}
