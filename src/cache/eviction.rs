//! Eviction Policy Module
//!
//! Chooses which live entry to drop when a bounded store is full.
//!
//! The victim is the entry with the fewest hits; ties go to the entry
//! created first, then to the one inserted first. This ranks by access
//! frequency with an age tie-break rather than by last access time.

use std::collections::HashMap;

use crate::cache::CacheEntry;

// == Select Victim ==
/// Returns the key that should be evicted next, or `None` for an empty map.
pub fn select_victim<V>(entries: &HashMap<String, CacheEntry<V>>) -> Option<String> {
    entries
        .iter()
        .min_by_key(|(_, entry)| eviction_rank(entry))
        .map(|(key, _)| key.clone())
}

/// Ordering key for eviction; smaller ranks are evicted first.
fn eviction_rank<V>(entry: &CacheEntry<V>) -> (u64, u64, u64) {
    (entry.access_count, entry.created_at, entry.sequence)
}
