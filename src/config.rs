//! Configuration Module
//!
//! Handles loading and validating cache configuration from environment variables.

use std::env;
use std::time::Duration;

use crate::error::{CacheError, Result};

/// Default TTL applied when callers omit one (5 minutes).
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// Default period between reaper sweeps (5 minutes).
pub const DEFAULT_REAPER_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Cache configuration parameters.
///
/// A `capacity` of 0 leaves the store unbounded; memory is then only
/// reclaimed by lazy expiration and the reaper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Maximum number of entries, 0 disables eviction
    pub capacity: usize,
    /// TTL used by `set` when the caller passes `None`
    pub default_ttl: Duration,
    /// Period of the background reaper, `None` disables it
    pub reaper_interval: Option<Duration>,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_CAPACITY` - Maximum cache entries, 0 = unbounded (default: 0)
    /// - `CACHE_DEFAULT_TTL_MS` - Default TTL in milliseconds (default: 300000)
    /// - `CACHE_REAPER_INTERVAL_SECS` - Reaper period in seconds, 0 = off (default: 300)
    ///
    /// Missing variables fall back to their defaults. A variable that is set
    /// but cannot be parsed, or a negative capacity, is rejected.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let capacity = match read_var::<i64>("CACHE_CAPACITY")? {
            Some(value) if value < 0 => {
                return Err(CacheError::InvalidConfig(format!(
                    "CACHE_CAPACITY must not be negative, got {}",
                    value
                )))
            }
            Some(value) => usize::try_from(value).map_err(|_| {
                CacheError::InvalidConfig(format!("CACHE_CAPACITY {} is out of range", value))
            })?,
            None => defaults.capacity,
        };

        let default_ttl = read_var::<u64>("CACHE_DEFAULT_TTL_MS")?
            .map(Duration::from_millis)
            .unwrap_or(defaults.default_ttl);

        let reaper_interval = match read_var::<u64>("CACHE_REAPER_INTERVAL_SECS")? {
            Some(0) => None,
            Some(secs) => Some(Duration::from_secs(secs)),
            None => defaults.reaper_interval,
        };

        Ok(Self {
            capacity,
            default_ttl,
            reaper_interval,
        })
    }

    /// Unbounded configuration with default TTL and reaper.
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Bounded configuration holding at most `capacity` entries.
    pub fn bounded(capacity: usize) -> Self {
        Self::default().with_capacity(capacity)
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    pub fn with_reaper_interval(mut self, interval: Duration) -> Self {
        self.reaper_interval = Some(interval);
        self
    }

    /// Disables the background reaper; expired entries are then only
    /// removed when read or by a manual cleanup.
    pub fn without_reaper(mut self) -> Self {
        self.reaper_interval = None;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            capacity: 0,
            default_ttl: DEFAULT_TTL,
            reaper_interval: Some(DEFAULT_REAPER_INTERVAL),
        }
    }
}

// == Helpers ==
/// Reads and parses an environment variable; `Ok(None)` when it is unset.
fn read_var<T: std::str::FromStr>(name: &str) -> Result<Option<T>> {
    match env::var(name) {
        Ok(raw) => raw.trim().parse::<T>().map(Some).map_err(|_| {
            CacheError::InvalidConfig(format!("{} has an invalid value: {:?}", name, raw))
        }),
        Err(_) => Ok(None),
    }
}
