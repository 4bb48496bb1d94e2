//! Error types for the cache engine
//!
//! Store operations are infallible and signal a miss with `None`. The only
//! cache-owned failure is a bad configuration; failures raised by a
//! cache-aside computation are returned to the caller as their own type.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// A configuration value could not be parsed or is out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

// == Result Type Alias ==
/// Convenience Result type for the cache engine.
pub type Result<T> = std::result::Result<T, CacheError>;
