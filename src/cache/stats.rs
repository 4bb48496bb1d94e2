//! Cache Statistics Module
//!
//! Tracks cache performance metrics including hits, misses, and evictions.

use serde::Serialize;

// == Cache Stats ==
/// Point-in-time view of cache performance, returned by `get_stats`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    /// Number of successful cache retrievals
    pub hits: u64,
    /// Number of failed cache retrievals (key not found or expired)
    pub misses: u64,
    /// Number of live entries dropped to respect the capacity
    pub evictions: u64,
    /// Physical entry count, including expired entries not yet reaped
    pub size: usize,
    /// hits / (hits + misses) as a percentage rounded to 2 decimals
    pub hit_rate: f64,
}

// == Stats Counter ==
/// Monotonic counters owned by the store. Only `reset` lowers them.
#[derive(Debug, Clone, Default)]
pub struct StatsCounter {
    hits: u64,
    misses: u64,
    evictions: u64,
}

impl StatsCounter {
    pub fn new() -> Self {
        Self::default()
    }

    // == Record Hit ==
    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    // == Record Miss ==
    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    // == Record Eviction ==
    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    // == Reset ==
    /// Zeroes every counter; used by `clear`.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    // == Snapshot ==
    /// Builds a `CacheStats` for the given current entry count.
    pub fn snapshot(&self, size: usize) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            evictions: self.evictions,
            size,
            hit_rate: hit_rate(self.hits, self.misses),
        }
    }
}

// == Hit Rate ==
/// Calculates the hit rate as a percentage rounded to two decimals.
///
/// Returns 0.0 if no requests have been made.
pub fn hit_rate(hits: u64, misses: u64) -> f64 {
    let total = hits + misses;
    if total == 0 {
        0.0
    } else {
        (hits as f64 / total as f64 * 10_000.0).round() / 100.0
    }
}
