//! Cache Module
//!
//! Provides in-memory caching with TTL expiration, pattern invalidation,
//! bounded eviction and cache-aside helpers.

mod clock;
mod entry;
mod eviction;
mod handle;
mod pattern;
mod stats;
mod store;


// Re-export public types
pub use clock::{duration_to_ms, ttl_from_millis, ttl_to_ms, Clock, ManualClock, SystemClock};
pub use entry::CacheEntry;
pub use eviction::select_victim;
pub use handle::Cache;
pub use pattern::KeyPattern;
pub use stats::{hit_rate, CacheStats, StatsCounter};
pub use store::CacheStore;
