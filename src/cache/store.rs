//! Cache Store Module
//!
//! Main cache engine combining HashMap storage with TTL expiration, bounded
//! eviction and pattern invalidation. The store is single-owner (`&mut self`);
//! `Cache` wraps it in a lock for shared use.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::cache::clock::ttl_to_ms;
use crate::cache::{
    select_victim, CacheEntry, CacheStats, Clock, KeyPattern, StatsCounter, SystemClock,
};
use crate::config::Config;

// == Cache Store ==
/// Main cache storage with eviction and TTL support.
#[derive(Debug)]
pub struct CacheStore<V> {
    /// Key-value storage
    entries: HashMap<String, CacheEntry<V>>,
    /// Performance statistics
    stats: StatsCounter,
    /// Maximum number of entries allowed, 0 = unbounded
    capacity: usize,
    /// TTL applied when `set` is called without one
    default_ttl: Duration,
    /// Next insertion number
    next_sequence: u64,
    /// Time source
    clock: Arc<dyn Clock>,
}

impl<V: Clone> CacheStore<V> {
    // == Constructor ==
    /// Creates a new CacheStore with specified capacity and default TTL.
    ///
    /// # Arguments
    /// * `capacity` - Maximum number of entries, 0 disables eviction
    /// * `default_ttl` - TTL for entries stored without an explicit one
    pub fn new(capacity: usize, default_ttl: Duration) -> Self {
        Self::with_clock(capacity, default_ttl, Arc::new(SystemClock::new()))
    }

    /// Creates a store driven by a custom clock.
    pub fn with_clock(capacity: usize, default_ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: HashMap::new(),
            stats: StatsCounter::new(),
            capacity,
            default_ttl,
            next_sequence: 0,
            clock,
        }
    }

    /// Creates a store from a `Config`.
    pub fn from_config(config: &Config, clock: Arc<dyn Clock>) -> Self {
        Self::with_clock(config.capacity, config.default_ttl, clock)
    }

    // == Set ==
    /// Stores a key-value pair with optional TTL.
    ///
    /// If the key already exists, the entry is fully replaced: new creation
    /// time, new expiry, access count back to 0. If the store is bounded and
    /// full, exactly one entry is evicted before a new key is inserted.
    ///
    /// # Arguments
    /// * `key` - The key to store
    /// * `value` - The value to store
    /// * `ttl` - Optional TTL (uses the default TTL if None); zero expires immediately
    pub fn set(&mut self, key: impl Into<String>, value: V, ttl: Option<Duration>) {
        let key = key.into();

        if self.capacity > 0
            && self.entries.len() >= self.capacity
            && !self.entries.contains_key(&key)
        {
            self.evict_one();
        }

        let ttl_ms = ttl_to_ms(ttl.unwrap_or(self.default_ttl));
        let sequence = self.next_sequence;
        self.next_sequence += 1;

        let entry = CacheEntry::new(value, self.clock.now_ms(), ttl_ms, sequence);
        self.entries.insert(key, entry);
    }

    // == Get ==
    /// Retrieves a value by key.
    ///
    /// Returns a clone of the value if found and not expired. Expired entries
    /// are removed and counted as misses.
    pub fn get(&mut self, key: &str) -> Option<V> {
        let now = self.clock.now_ms();

        let expired = match self.entries.get(key) {
            Some(entry) => entry.is_expired_at(now),
            None => {
                self.stats.record_miss();
                return None;
            }
        };

        if expired {
            self.entries.remove(key);
            self.stats.record_miss();
            debug!(key, "Removed expired entry on read");
            return None;
        }

        let entry = self.entries.get_mut(key)?;
        entry.record_access();
        self.stats.record_hit();
        Some(entry.value.clone())
    }

    // == Has ==
    /// Checks whether a live entry exists without touching stats or the
    /// access count. An expired entry found here is removed.
    pub fn has(&mut self, key: &str) -> bool {
        let now = self.clock.now_ms();

        match self.entries.get(key) {
            Some(entry) if entry.is_expired_at(now) => {
                self.entries.remove(key);
                false
            }
            Some(_) => true,
            None => false,
        }
    }

    // == Delete ==
    /// Removes an entry by key. Returns whether the key was present.
    pub fn delete(&mut self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    // == Clear ==
    /// Removes every entry and resets the statistics.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.stats.reset();
    }

    // == Invalidate Pattern ==
    /// Removes every key matching the glob `pattern`.
    ///
    /// Returns the number of entries removed.
    pub fn invalidate_pattern(&mut self, pattern: &str) -> usize {
        let matcher = KeyPattern::new(pattern);

        let before = self.entries.len();
        self.entries.retain(|key, _| !matcher.matches(key));
        let removed = before - self.entries.len();

        debug!(pattern, removed, "Invalidated keys by pattern");
        removed
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        self.stats.snapshot(self.entries.len())
    }

    // == Cleanup Expired ==
    /// Removes all expired entries from the cache.
    ///
    /// Returns the number of entries removed.
    pub fn cleanup_expired(&mut self) -> usize {
        let now = self.clock.now_ms();

        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired_at(now));
        before - self.entries.len()
    }

    // == Keys ==
    /// Snapshot of the keys currently held, expired or not.
    pub fn keys(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    // == Length ==
    /// Returns the current number of entries in the cache.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    // == Is Empty ==
    /// Returns true if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of entries; 0 means unbounded.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Access count of a live entry, without counting as a read.
    pub fn access_count(&self, key: &str) -> Option<u64> {
        let now = self.clock.now_ms();
        self.entries
            .get(key)
            .filter(|entry| !entry.is_expired_at(now))
            .map(|entry| entry.access_count)
    }

    fn evict_one(&mut self) {
        if let Some(victim) = select_victim(&self.entries) {
            self.entries.remove(&victim);
            self.stats.record_eviction();
            debug!(key = %victim, capacity = self.capacity, "Evicted entry");
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ManualClock;

    const TTL: Duration = Duration::from_secs(300);

    fn manual_store(capacity: usize) -> (CacheStore<String>, ManualClock) {
        let clock = ManualClock::new(0);
        let store = CacheStore::with_clock(capacity, TTL, Arc::new(clock.clone()));
        (store, clock)
    }

    #[test]
    fn test_store_new() {
        let store: CacheStore<String> = CacheStore::new(100, TTL);
        assert_eq!(store.len(), 0);
        assert!(store.is_empty());
        assert_eq!(store.capacity(), 100);
    }

    #[test]
    fn test_store_set_and_get() {
        let (mut store, _) = manual_store(100);

        store.set("key1", "value1".to_string(), None);
        assert_eq!(store.get("key1"), Some("value1".to_string()));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_store_get_nonexistent() {
        let (mut store, _) = manual_store(100);

        assert_eq!(store.get("non-existent-key"), None);
        assert_eq!(store.stats().misses, 1);
    }

    #[test]
    fn test_store_composite_values() {
        let mut store: CacheStore<Vec<(String, i64)>> = CacheStore::new(0, TTL);
        let value = vec![("rent".to_string(), -1200), ("salary".to_string(), 3000)];

        store.set("dashboard:1", value.clone(), None);
        assert_eq!(store.get("dashboard:1"), Some(value));
    }

    #[test]
    fn test_store_delete() {
        let (mut store, _) = manual_store(100);

        store.set("key1", "value1".to_string(), None);
        assert!(store.delete("key1"));
        assert!(!store.delete("key1"));

        assert!(store.is_empty());
        assert_eq!(store.get("key1"), None);
    }

    #[test]
    fn test_store_overwrite_replaces_entry() {
        let (mut store, clock) = manual_store(100);

        store.set("key1", "value1".to_string(), Some(Duration::from_millis(100)));
        store.get("key1");
        store.get("key1");
        assert_eq!(store.access_count("key1"), Some(2));

        clock.advance(Duration::from_millis(80));
        store.set("key1", "value2".to_string(), Some(Duration::from_millis(100)));
        assert_eq!(store.access_count("key1"), Some(0));

        // The old expiry (t=100) is not carried over
        clock.advance(Duration::from_millis(50));
        assert_eq!(store.get("key1"), Some("value2".to_string()));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_store_ttl_expiration() {
        let (mut store, clock) = manual_store(100);

        store.set("key1", "value1".to_string(), Some(Duration::from_millis(1000)));
        assert!(store.get("key1").is_some());

        clock.advance(Duration::from_millis(1000));
        assert!(store.get("key1").is_some());

        clock.advance(Duration::from_millis(1));
        assert_eq!(store.get("key1"), None);
        assert!(store.is_empty(), "expired entry should be removed on read");
    }

    #[test]
    fn test_store_zero_ttl_expires_immediately() {
        let (mut store, _) = manual_store(100);

        store.set("key1", "value1".to_string(), Some(Duration::ZERO));
        assert_eq!(store.get("key1"), None);
    }

    #[test]
    fn test_store_sub_millisecond_ttl_is_live() {
        let (mut store, clock) = manual_store(100);

        store.set("key1", "value1".to_string(), Some(Duration::from_micros(900)));
        assert_eq!(store.get("key1"), Some("value1".to_string()));

        clock.advance(Duration::from_millis(2));
        assert_eq!(store.get("key1"), None);
    }

    #[test]
    fn test_store_default_ttl_applies() {
        let (mut store, clock) = manual_store(100);

        store.set("key1", "value1".to_string(), None);
        clock.advance(TTL);
        assert!(store.has("key1"));
        clock.advance(Duration::from_millis(1));
        assert!(!store.has("key1"));
    }

    #[test]
    fn test_store_has_does_not_touch_stats() {
        let (mut store, _) = manual_store(100);

        store.set("key1", "value1".to_string(), None);
        assert!(store.has("key1"));
        assert!(!store.has("missing"));

        let stats = store.stats();
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 0);
        assert_eq!(store.access_count("key1"), Some(0));
    }

    #[test]
    fn test_store_has_removes_expired() {
        let (mut store, clock) = manual_store(100);

        store.set("key1", "value1".to_string(), Some(Duration::from_millis(10)));
        clock.advance(Duration::from_millis(11));

        assert!(!store.has("key1"));
        assert_eq!(store.len(), 0);
        assert_eq!(store.stats().misses, 0);
    }

    #[test]
    fn test_store_eviction_lowest_access_then_oldest() {
        let (mut store, clock) = manual_store(2);

        store.set("a", "1".to_string(), None);
        clock.advance(Duration::from_millis(1));
        store.set("b", "2".to_string(), None);
        clock.advance(Duration::from_millis(1));
        store.set("c", "3".to_string(), None);

        assert_eq!(store.len(), 2);
        assert!(!store.has("a"));
        assert!(store.has("b"));
        assert!(store.has("c"));
        assert_eq!(store.stats().evictions, 1);
    }

    #[test]
    fn test_store_eviction_same_millisecond() {
        let (mut store, _) = manual_store(2);

        store.set("a", "1".to_string(), None);
        store.set("b", "2".to_string(), None);
        store.set("c", "3".to_string(), None);

        let mut keys = store.keys();
        keys.sort();
        assert_eq!(keys, vec!["b".to_string(), "c".to_string()]);
    }

    #[test]
    fn test_store_eviction_spares_accessed_entries() {
        let (mut store, clock) = manual_store(3);

        store.set("key1", "value1".to_string(), None);
        clock.advance(Duration::from_millis(1));
        store.set("key2", "value2".to_string(), None);
        clock.advance(Duration::from_millis(1));
        store.set("key3", "value3".to_string(), None);

        // key1 and key3 get reads, key2 stays cold
        store.get("key1");
        store.get("key3");

        store.set("key4", "value4".to_string(), None);

        assert!(store.has("key1"));
        assert!(!store.has("key2"));
        assert!(store.has("key3"));
        assert!(store.has("key4"));
    }

    #[test]
    fn test_store_overwrite_at_capacity_does_not_evict() {
        let (mut store, _) = manual_store(2);

        store.set("a", "1".to_string(), None);
        store.set("b", "2".to_string(), None);
        store.set("a", "1b".to_string(), None);

        assert_eq!(store.len(), 2);
        assert_eq!(store.stats().evictions, 0);
    }

    #[test]
    fn test_store_unbounded_never_evicts() {
        let (mut store, _) = manual_store(0);

        for i in 0..1_000 {
            store.set(format!("key{}", i), i.to_string(), None);
        }
        assert_eq!(store.len(), 1_000);
        assert_eq!(store.stats().evictions, 0);
    }

    #[test]
    fn test_store_invalidate_prefix() {
        let (mut store, _) = manual_store(0);

        store.set("user:123:data", "a".to_string(), None);
        store.set("user:456:data", "b".to_string(), None);
        store.set("product:789", "c".to_string(), None);

        assert_eq!(store.invalidate_pattern("user:*"), 2);
        assert_eq!(store.keys(), vec!["product:789".to_string()]);
    }

    #[test]
    fn test_store_invalidate_middle_wildcard() {
        let (mut store, _) = manual_store(0);

        store.set("dashboard:user:123", "a".to_string(), None);
        store.set("dashboard:user:456", "b".to_string(), None);
        store.set("transactions:user:123", "c".to_string(), None);

        assert_eq!(store.invalidate_pattern("*:user:123"), 2);
        assert_eq!(store.keys(), vec!["dashboard:user:456".to_string()]);
    }

    #[test]
    fn test_store_invalidate_without_wildcard_is_exact() {
        let (mut store, _) = manual_store(0);

        store.set("report:1", "a".to_string(), None);
        store.set("report:10", "b".to_string(), None);

        assert_eq!(store.invalidate_pattern("report:1"), 1);
        assert!(store.has("report:10"));
        assert_eq!(store.invalidate_pattern("missing:*"), 0);
    }

    #[test]
    fn test_store_stats() {
        let (mut store, _) = manual_store(100);

        store.get("key1"); // miss
        store.set("key1", "value1".to_string(), None);
        store.get("key1"); // hit
        store.get("key1"); // hit

        let stats = store.stats();
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.size, 1);
        assert_eq!(stats.hit_rate, 66.67);
    }

    #[test]
    fn test_store_size_includes_unreaped_expired() {
        let (mut store, clock) = manual_store(100);

        store.set("key1", "value1".to_string(), Some(Duration::from_millis(10)));
        clock.advance(Duration::from_millis(20));

        assert_eq!(store.stats().size, 1);
        assert_eq!(store.access_count("key1"), None);
    }

    #[test]
    fn test_store_clear_resets_everything() {
        let (mut store, _) = manual_store(100);

        store.set("key1", "value1".to_string(), None);
        store.set("key2", "value2".to_string(), None);
        store.get("key1");
        store.get("missing");

        store.clear();

        let stats = store.stats();
        assert_eq!(stats.size, 0);
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 0);
        assert_eq!(store.get("key1"), None);
        assert_eq!(store.get("key2"), None);
    }

    #[test]
    fn test_store_cleanup_expired() {
        let (mut store, clock) = manual_store(100);

        store.set("key1", "value1".to_string(), Some(Duration::from_secs(1)));
        store.set("key2", "value2".to_string(), Some(Duration::from_secs(10)));

        clock.advance(Duration::from_millis(1100));

        assert_eq!(store.cleanup_expired(), 1);
        assert_eq!(store.len(), 1);
        assert!(store.get("key2").is_some());
        assert_eq!(store.cleanup_expired(), 0);
    }
}
