//! Cache Entry Module
//!
//! Defines the structure for individual cache entries and the expiration rule.

// == Cache Entry ==
/// Represents a single cache entry with value and metadata.
///
/// Entries are owned by the store; callers only ever see clones of `value`.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry<V> {
    /// The stored value
    pub value: V,
    /// Creation timestamp (clock milliseconds)
    pub created_at: u64,
    /// Expiration timestamp (clock milliseconds), fixed at creation
    pub expires_at: u64,
    /// Number of successful reads since creation
    pub access_count: u64,
    /// Store-wide insertion number, breaks ties between equal `created_at`
    pub sequence: u64,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates a new cache entry.
    ///
    /// # Arguments
    /// * `value` - The value to store
    /// * `now_ms` - Current clock time in milliseconds
    /// * `ttl_ms` - Lifetime in milliseconds, 0 means expired from birth
    /// * `sequence` - Insertion number assigned by the store
    pub fn new(value: V, now_ms: u64, ttl_ms: u64, sequence: u64) -> Self {
        Self {
            value,
            created_at: now_ms,
            expires_at: now_ms.saturating_add(ttl_ms),
            access_count: 0,
            sequence,
        }
    }

    // == Is Expired ==
    /// Checks whether the entry is logically expired at `now_ms`.
    ///
    /// An entry expires once `now_ms > expires_at`. An entry created with an
    /// empty lifetime (`expires_at == created_at`) is expired immediately.
    pub fn is_expired_at(&self, now_ms: u64) -> bool {
        self.expires_at <= self.created_at || now_ms > self.expires_at
    }

    // == Time To Live ==
    /// Remaining lifetime in milliseconds, 0 once expired.
    pub fn ttl_remaining_ms(&self, now_ms: u64) -> u64 {
        if self.is_expired_at(now_ms) {
            0
        } else {
            self.expires_at - now_ms
        }
    }

    // == Record Access ==
    pub fn record_access(&mut self) {
        self.access_count = self.access_count.saturating_add(1);
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_creation() {
        let entry = CacheEntry::new("test_value".to_string(), 1_000, 60_000, 7);

        assert_eq!(entry.value, "test_value");
        assert_eq!(entry.created_at, 1_000);
        assert_eq!(entry.expires_at, 61_000);
        assert_eq!(entry.access_count, 0);
        assert_eq!(entry.sequence, 7);
        assert!(!entry.is_expired_at(1_000));
    }

    #[test]
    fn test_expiration_boundary_condition() {
        let entry = CacheEntry::new(1u32, 1_000, 500, 0);

        // Still live exactly at expires_at, expired strictly after it
        assert!(!entry.is_expired_at(1_500));
        assert!(entry.is_expired_at(1_501));
    }

    #[test]
    fn test_zero_ttl_is_expired_immediately() {
        let entry = CacheEntry::new(1u32, 1_000, 0, 0);
        assert!(entry.is_expired_at(1_000));
        assert_eq!(entry.ttl_remaining_ms(1_000), 0);
    }

    #[test]
    fn test_ttl_remaining() {
        let entry = CacheEntry::new((), 0, 10_000, 0);

        assert_eq!(entry.ttl_remaining_ms(0), 10_000);
        assert_eq!(entry.ttl_remaining_ms(9_000), 1_000);
        assert_eq!(entry.ttl_remaining_ms(20_000), 0);
    }

    #[test]
    fn test_expiry_saturates() {
        let entry = CacheEntry::new((), u64::MAX - 5, 100, 0);
        assert_eq!(entry.expires_at, u64::MAX);
        assert!(!entry.is_expired_at(u64::MAX));
    }

    #[test]
    fn test_record_access() {
        let mut entry = CacheEntry::new(vec![1, 2, 3], 0, 1_000, 0);
        entry.record_access();
        entry.record_access();
        assert_eq!(entry.access_count, 2);
    }
}
