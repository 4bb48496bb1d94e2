//! Shared Cache Handle
//!
//! `Cache<V>` is the surface collaborators use: a lock around a `CacheStore`,
//! the background reaper that belongs to it, and the cache-aside helpers.

use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::{broadcast, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::{CacheStats, CacheStore, Clock, SystemClock};
use crate::config::Config;
use crate::tasks::spawn_reaper;

/// Result of a shared computation as seen by waiters. The error is type
/// erased so one registry serves every error type.
type SharedOutcome<V> = Result<V, Arc<dyn Any + Send + Sync>>;

type InFlightMap<V> = Mutex<HashMap<String, broadcast::Sender<SharedOutcome<V>>>>;

// == Cache ==
/// Thread-safe cache instance with its own reaper.
///
/// Every operation takes the store lock once, so each one is atomic with
/// respect to the others. Share an instance with `Arc<Cache<V>>`.
///
/// # Example
/// ```
/// use std::time::Duration;
///
/// use ledger_cache::{Cache, Config};
///
/// # tokio_test::block_on(async {
/// let cache: Cache<String> = Cache::new(Config::bounded(100).without_reaper());
/// cache.set("dashboard:42", "summary".to_string(), Some(Duration::from_secs(60))).await;
/// assert_eq!(cache.get("dashboard:42").await, Some("summary".to_string()));
/// # });
/// ```
pub struct Cache<V> {
    store: Arc<RwLock<CacheStore<V>>>,
    reaper: Mutex<Option<JoinHandle<()>>>,
    in_flight: InFlightMap<V>,
}

impl<V> Cache<V>
where
    V: Clone + Send + Sync + 'static,
{
    // == Constructor ==
    /// Creates a cache from `config` using the system clock.
    ///
    /// When a reaper interval is configured it is spawned on the current
    /// tokio runtime. Without a runtime the cache still works and relies on
    /// lazy expiration only.
    pub fn new(config: Config) -> Self {
        Self::with_clock(config, Arc::new(SystemClock::new()))
    }

    /// Creates a cache driven by a custom clock.
    pub fn with_clock(config: Config, clock: Arc<dyn Clock>) -> Self {
        let store = Arc::new(RwLock::new(CacheStore::from_config(&config, clock)));

        let reaper = match config.reaper_interval {
            Some(interval) if interval.is_zero() => {
                warn!("Reaper interval of zero ignored, reaper disabled");
                None
            }
            Some(interval) => match tokio::runtime::Handle::try_current() {
                Ok(_) => Some(spawn_reaper(store.clone(), interval)),
                Err(_) => {
                    warn!("No tokio runtime available, cache reaper disabled");
                    None
                }
            },
            None => None,
        };

        Self {
            store,
            reaper: Mutex::new(reaper),
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    // == Entry Store Operations ==
    /// Returns the live value for `key`, or `None` on a miss.
    pub async fn get(&self, key: &str) -> Option<V> {
        self.store.write().await.get(key)
    }

    /// Stores `value` under `key`. `None` uses the configured default TTL.
    pub async fn set(&self, key: impl Into<String>, value: V, ttl: Option<Duration>) {
        self.store.write().await.set(key, value, ttl);
    }

    /// Existence check that leaves stats and eviction ranking untouched.
    pub async fn has(&self, key: &str) -> bool {
        self.store.write().await.has(key)
    }

    pub async fn delete(&self, key: &str) -> bool {
        self.store.write().await.delete(key)
    }

    /// Removes all keys matching a glob pattern and returns how many.
    pub async fn invalidate_pattern(&self, pattern: &str) -> usize {
        self.store.write().await.invalidate_pattern(pattern)
    }

    /// Removes all entries and resets hit/miss counters.
    pub async fn clear(&self) {
        self.store.write().await.clear();
    }

    pub async fn get_stats(&self) -> CacheStats {
        self.store.read().await.stats()
    }

    pub async fn len(&self) -> usize {
        self.store.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.store.read().await.is_empty()
    }

    pub async fn keys(&self) -> Vec<String> {
        self.store.read().await.keys()
    }

    /// Runs one reaper pass immediately and returns the number removed.
    pub async fn cleanup(&self) -> usize {
        self.store.write().await.cleanup_expired()
    }

    // == Get Or Set ==
    /// Cache-aside read.
    ///
    /// On a hit the cached value is returned and `compute` is not called.
    /// On a miss `compute` runs once; a successful result is stored with
    /// `ttl` and returned, a failure is returned unchanged and nothing is
    /// stored. The store lock is not held while `compute` runs, so
    /// concurrent misses on one key may each compute (last write wins).
    pub async fn get_or_set<F, Fut, E>(
        &self,
        key: &str,
        compute: F,
        ttl: Option<Duration>,
    ) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.get(key).await {
            return Ok(value);
        }

        let value = compute().await?;
        self.set(key, value.clone(), ttl).await;
        Ok(value)
    }

    /// `get_or_set` for a synchronous computation.
    pub async fn get_or_set_with<F, E>(
        &self,
        key: &str,
        compute: F,
        ttl: Option<Duration>,
    ) -> Result<V, E>
    where
        F: FnOnce() -> Result<V, E>,
    {
        if let Some(value) = self.get(key).await {
            return Ok(value);
        }

        let value = compute()?;
        self.set(key, value.clone(), ttl).await;
        Ok(value)
    }

    // == Get Or Set Shared ==
    /// Cache-aside read that collapses concurrent misses on the same key.
    ///
    /// The first caller to miss runs `compute`; callers that miss while it
    /// is running wait for its outcome instead of computing. Successes and
    /// failures are both delivered to every waiter, and failures are still
    /// never cached. If the computing caller is dropped before finishing,
    /// its waiters fall back to computing themselves.
    pub async fn get_or_set_shared<F, Fut, E>(
        &self,
        key: &str,
        compute: F,
        ttl: Option<Duration>,
    ) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
        E: Clone + Send + Sync + 'static,
    {
        if let Some(value) = self.get(key).await {
            return Ok(value);
        }

        let (sender, _registration) = match self.join_or_lead(key) {
            Role::Follower(mut receiver) => {
                match receiver.recv().await {
                    Ok(Ok(value)) => return Ok(value),
                    Ok(Err(shared)) => {
                        if let Some(err) = shared.downcast_ref::<E>() {
                            return Err(err.clone());
                        }
                    }
                    Err(_) => {}
                }
                debug!(key, "Shared computation abandoned, computing locally");
                return self.get_or_set(key, compute, ttl).await;
            }
            Role::Leader(sender, registration) => (sender, registration),
        };

        let outcome = compute().await;
        if let Ok(value) = &outcome {
            self.set(key, value.clone(), ttl).await;
        }

        let shared: SharedOutcome<V> = match &outcome {
            Ok(value) => Ok(value.clone()),
            Err(err) => Err(Arc::new(err.clone())),
        };
        // No receivers simply means nobody was waiting
        let _ = sender.send(shared);

        outcome
    }

    fn join_or_lead(&self, key: &str) -> Role<'_, V> {
        let mut in_flight = lock(&self.in_flight);

        if let Some(sender) = in_flight.get(key) {
            return Role::Follower(sender.subscribe());
        }

        let (sender, _) = broadcast::channel(1);
        in_flight.insert(key.to_string(), sender.clone());
        Role::Leader(
            sender,
            Registration {
                in_flight: &self.in_flight,
                key: key.to_string(),
            },
        )
    }

    // == Destroy ==
    /// Stops the reaper and clears the store.
    ///
    /// Once this returns no further reaper pass will run. Calling it again
    /// is harmless. The cache remains usable afterwards, without a reaper.
    pub async fn destroy(&self) {
        let handle = lock(&self.reaper).take();

        if let Some(handle) = handle {
            handle.abort();
            // Resolves once the task has actually stopped
            let _ = handle.await;
            info!("Cache reaper stopped");
        }

        self.clear().await;
    }
}

impl<V> Drop for Cache<V> {
    fn drop(&mut self) {
        if let Some(handle) = lock(&self.reaper).take() {
            handle.abort();
        }
    }
}

enum Role<'a, V> {
    Leader(broadcast::Sender<SharedOutcome<V>>, Registration<'a, V>),
    Follower(broadcast::Receiver<SharedOutcome<V>>),
}

/// Removes the in-flight registration when the leading computation ends,
/// including when its future is dropped early.
struct Registration<'a, V> {
    in_flight: &'a InFlightMap<V>,
    key: String,
}

impl<V> Drop for Registration<'_, V> {
    fn drop(&mut self) {
        lock(self.in_flight).remove(&self.key);
    }
}

/// Locks a std mutex, recovering the data if a holder panicked.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
