//! Ledger Cache - in-process cache engine for the finance application
//!
//! Provides a TTL key/value store with glob invalidation, bounded eviction,
//! hit/miss statistics and cache-aside helpers.

pub mod cache;
pub mod config;
pub mod error;
pub mod keys;
pub mod tasks;

pub use cache::{Cache, CacheStats, CacheStore};
pub use config::Config;
pub use error::{CacheError, Result};
pub use tasks::spawn_reaper;
