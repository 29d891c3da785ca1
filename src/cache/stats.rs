//! Fetch Statistics Module
//!
//! Counts how intercepted fetches were answered.

use serde::Serialize;

// == Fetch Stats ==
/// Tracks where intercepted requests were served from.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FetchStats {
    /// Same-origin requests answered from a cache partition
    pub cache_hits: u64,
    /// Same-origin requests that fell through to the network
    pub cache_misses: u64,
    /// Cross-origin requests forwarded without a cache lookup
    pub passthroughs: u64,
}

impl FetchStats {
    // == Constructor ==
    /// Creates a new FetchStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Returns hits / (hits + misses), or 0.0 if nothing was looked up.
    pub fn hit_rate(&self) -> f64 {
        let total = self.cache_hits + self.cache_misses;
        if total == 0 {
            0.0
        } else {
            self.cache_hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.cache_hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.cache_misses += 1;
    }

    pub fn record_passthrough(&mut self) {
        self.passthroughs += 1;
    }
}
