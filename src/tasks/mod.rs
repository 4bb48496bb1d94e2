//! Background Tasks Module
//!
//! Contains long-running background tasks owned by a cache instance.

mod reaper;

pub use reaper::spawn_reaper;
