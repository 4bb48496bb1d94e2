//! TTL Reaper Task
//!
//! Background task that periodically removes expired cache entries, so that
//! entries nobody reads again do not pile up in an unbounded store.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::CacheStore;

/// Spawns a background task that periodically reaps expired cache entries.
///
/// The task runs in an infinite loop, sleeping for `interval` between passes.
/// Each pass holds the store's write lock, so it is atomic with respect to
/// every other cache operation.
///
/// # Arguments
/// * `store` - Shared reference to the cache store
/// * `interval` - Time between reaper passes
///
/// # Returns
/// A JoinHandle for the spawned task. Aborting it stops reaping; `Cache`
/// does this on `destroy` and on drop.
///
/// # Example
/// ```ignore
/// let store = Arc::new(RwLock::new(CacheStore::<String>::new(0, ttl)));
/// let reaper = spawn_reaper(store.clone(), Duration::from_secs(300));
/// // Later, during teardown:
/// reaper.abort();
/// ```
pub fn spawn_reaper<V>(store: Arc<RwLock<CacheStore<V>>>, interval: Duration) -> JoinHandle<()>
where
    V: Clone + Send + Sync + 'static,
{
    tokio::spawn(async move {
        info!(interval_ms = interval.as_millis() as u64, "Starting cache reaper");

        loop {
            tokio::time::sleep(interval).await;

            let (removed, remaining) = {
                let mut guard = store.write().await;
                let removed = guard.cleanup_expired();
                (removed, guard.len())
            };

            if removed > 0 {
                info!(removed, remaining, "Reaper removed expired entries");
            } else {
                debug!(remaining, "Reaper found no expired entries");
            }
        }
    })
}
