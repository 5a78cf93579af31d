//! Cache Engine Module
//!
//! The public cache handle: store, lookup and delete operations over the shared
//! entry store, plus ownership of the background sweep task.

use std::borrow::Borrow;
use std::hash::Hash;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::Mutex;
use tracing::{trace, warn};

use crate::cache::{CacheEntry, CacheStats, EntryStore, ValueGenerator, SWEEP_INTERVAL};
use crate::config::{CacheConfig, GeneratorFailurePolicy};
use crate::error::{panic_message, CacheError, Result};
use crate::tasks::{spawn_sweep_task, SweepHandle};

// == Cache ==
/// An in-process key/value cache with per-entry expiry.
///
/// Entries stored with [`Cache::store`] are removed by the sweep once their
/// lifetime has passed. Entries stored with [`Cache::store_perpetual`] are
/// regenerated in place instead, so readers always see either the old or the
/// new value and never a miss.
///
/// Each cache owns one background sweep task, started by the constructor and
/// stopped by [`Cache::shutdown`]. Share a cache across tasks with `Arc`.
///
/// # Example
/// ```no_run
/// # async fn demo() -> refresh_cache::Result<()> {
/// use std::time::Duration;
/// use refresh_cache::Cache;
///
/// let cache: Cache<&str, String> = Cache::new()?;
/// cache.store("greeting", "hello".to_string(), Duration::from_secs(30)).await;
/// assert_eq!(cache.get("greeting").await.as_deref(), Some("hello"));
/// cache.shutdown().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Cache<K, V> {
    /// Entries and statistics behind the single exclusive lock
    store: Arc<Mutex<EntryStore<K, V>>>,
    /// Sweep task, `None` once shut down
    sweep: Mutex<Option<SweepHandle>>,
    config: CacheConfig,
}

impl<K, V> Cache<K, V>
where
    K: Eq + Hash + Send + 'static,
    V: Clone + Send + 'static,
{
    // == Constructors ==
    /// Creates an empty cache with the default configuration and starts its
    /// sweep task on the current Tokio runtime.
    pub fn new() -> Result<Self> {
        Self::with_config(CacheConfig::default())
    }

    /// Creates an empty cache with the given configuration.
    ///
    /// Fails with [`CacheError::RuntimeUnavailable`] outside a Tokio runtime.
    pub fn with_config(config: CacheConfig) -> Result<Self> {
        Self::with_sweep_interval(config, SWEEP_INTERVAL)
    }

    pub(crate) fn with_sweep_interval(config: CacheConfig, interval: Duration) -> Result<Self> {
        let runtime = Handle::try_current().map_err(|_| CacheError::RuntimeUnavailable)?;
        let store = Arc::new(Mutex::new(EntryStore::new()));
        let sweep = spawn_sweep_task(&runtime, store.clone(), interval, config.failure_policy);

        Ok(Self {
            store,
            sweep: Mutex::new(Some(sweep)),
            config,
        })
    }

    // == Store ==
    /// Stores `value` under `key` for `lifetime`, replacing any existing entry.
    ///
    /// Once expired the entry is removed by the next sweep. A zero lifetime
    /// makes it eligible for that sweep straight away.
    pub async fn store(&self, key: K, value: V, lifetime: Duration) {
        let entry = CacheEntry::transient(value, lifetime);
        self.store.lock().await.insert(key, entry);
        trace!("Stored entry with lifetime {:?}", lifetime);
    }

    // == Store Perpetual ==
    /// Stores a value produced by `generator` under `key`, replacing any
    /// existing entry. Each time `lifetime` passes the sweep calls `generator`
    /// again and swaps the result in, until the entry is deleted.
    ///
    /// The first value is generated before the lock is taken, so the entry is
    /// never visible without a value.
    ///
    /// # Errors
    /// Under [`GeneratorFailurePolicy::KeepStale`], a panic in the first call
    /// is reported as [`CacheError::GeneratorPanicked`] and nothing is stored.
    /// Under [`GeneratorFailurePolicy::Propagate`] the panic unwinds to the
    /// caller.
    pub async fn store_perpetual<F>(&self, key: K, generator: F, lifetime: Duration) -> Result<()>
    where
        F: Fn() -> V + Send + Sync + 'static,
    {
        let generator: ValueGenerator<V> = Arc::new(generator);

        let value = match self.config.failure_policy {
            GeneratorFailurePolicy::Propagate => generator(),
            GeneratorFailurePolicy::KeepStale => catch_unwind(AssertUnwindSafe(|| generator()))
                .map_err(|payload| {
                    let message = panic_message(payload.as_ref());
                    warn!("Generator panicked on first call: {}", message);
                    CacheError::GeneratorPanicked(message)
                })?,
        };

        let entry = CacheEntry::perpetual(value, generator, lifetime);
        self.store.lock().await.insert(key, entry);
        trace!("Stored perpetual entry with lifetime {:?}", lifetime);
        Ok(())
    }

    // == Get ==
    /// Returns a clone of the value stored under `key`, if any.
    ///
    /// A perpetual entry awaiting regeneration returns its previous value.
    pub async fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.store.lock().await.get(key)
    }

    // == Delete ==
    /// Removes the entry under `key`. Deleting a perpetual entry also ends its
    /// regeneration. No-op if absent.
    pub async fn delete<Q>(&self, key: &Q)
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        if self.store.lock().await.remove(key) {
            trace!("Deleted entry");
        }
    }

    // == Length ==
    /// Returns the current number of entries in the cache.
    pub async fn len(&self) -> usize {
        self.store.lock().await.len()
    }

    // == Is Empty ==
    /// Returns true if the cache holds no entries.
    pub async fn is_empty(&self) -> bool {
        self.store.lock().await.is_empty()
    }

    // == Stats ==
    /// Returns a snapshot of the cache statistics.
    pub async fn stats(&self) -> CacheStats {
        self.store.lock().await.stats()
    }

    // == Is Running ==
    /// Whether the sweep task is still alive. False after shutdown, or after
    /// a propagated generator panic killed it.
    pub async fn is_running(&self) -> bool {
        self.sweep
            .lock()
            .await
            .as_ref()
            .is_some_and(|handle| !handle.task.is_finished())
    }

    // == Shutdown ==
    /// Stops the sweep task and waits for it to exit. Entries stay readable
    /// afterwards but no longer expire. Calling it again is a no-op.
    ///
    /// # Errors
    /// [`CacheError::SweepTaskPanicked`] if the task had already died from a
    /// generator panic.
    pub async fn shutdown(&self) -> Result<()> {
        let Some(handle) = self.sweep.lock().await.take() else {
            return Ok(());
        };

        // The receiver is gone if the task already exited.
        let _ = handle.stop.send(());

        match handle.task.await {
            Ok(()) => Ok(()),
            Err(err) if err.is_panic() => {
                let message = panic_message(err.into_panic().as_ref());
                warn!("Sweep task had terminated with a panic: {}", message);
                Err(CacheError::SweepTaskPanicked(message))
            }
            Err(_) => Ok(()),
        }
    }
}
