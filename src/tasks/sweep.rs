//! Expiry Sweep Task
//!
//! Background task that periodically sweeps a cache's entries, evicting or
//! regenerating those past expiry.

use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::cache::EntryStore;
use crate::config::GeneratorFailurePolicy;

/// Stop signal and join handle of a running sweep task.
#[derive(Debug)]
pub struct SweepHandle {
    pub stop: oneshot::Sender<()>,
    pub task: JoinHandle<()>,
}

/// Spawns the sweep task on `runtime`.
///
/// The task parks on a select between the next tick and the stop signal, so
/// sweeps never overlap. The first sweep happens one `interval` after spawn.
/// The task exits when the stop signal fires or its sender is dropped.
///
/// # Arguments
/// * `runtime` - Runtime to spawn onto
/// * `store` - Shared, lock-protected entry store
/// * `interval` - Time between sweeps
/// * `policy` - Handling of panicking generators
///
/// # Example
/// ```ignore
/// let store = Arc::new(Mutex::new(EntryStore::new()));
/// let handle = spawn_sweep_task(&Handle::current(), store, SWEEP_INTERVAL, policy);
/// // Later:
/// let _ = handle.stop.send(());
/// handle.task.await?;
/// ```
pub fn spawn_sweep_task<K, V>(
    runtime: &Handle,
    store: Arc<Mutex<EntryStore<K, V>>>,
    interval: Duration,
    policy: GeneratorFailurePolicy,
) -> SweepHandle
where
    K: Eq + Hash + Send + 'static,
    V: Send + 'static,
{
    let (stop, mut stopped) = oneshot::channel::<()>();

    let task = runtime.spawn(async move {
        info!(
            "Starting expiry sweep task with interval of {:?} ({:?} policy)",
            interval, policy
        );

        let mut ticker = interval_at(Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let report = {
                        let mut guard = store.lock().await;
                        guard.sweep_expired(Instant::now(), policy)
                    };

                    if report.evicted + report.regenerated + report.failed > 0 {
                        debug!(
                            "Expiry sweep: evicted {}, regenerated {}, failed {}",
                            report.evicted, report.regenerated, report.failed
                        );
                    }
                }
                _ = &mut stopped => {
                    info!("Expiry sweep task stopped");
                    return;
                }
            }
        }
    });

    SweepHandle { stop, task }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    use crate::cache::{CacheEntry, ValueGenerator};

    const TEST_INTERVAL: Duration = Duration::from_millis(50);

    fn shared_store() -> Arc<Mutex<EntryStore<String, u32>>> {
        Arc::new(Mutex::new(EntryStore::new()))
    }

    #[tokio::test]
    async fn test_sweep_task_removes_expired_entries() {
        let store = shared_store();
        store.lock().await.insert(
            "expire_soon".to_string(),
            CacheEntry::transient(1, Duration::from_millis(100)),
        );

        let handle = spawn_sweep_task(
            &Handle::current(),
            store.clone(),
            TEST_INTERVAL,
            GeneratorFailurePolicy::Propagate,
        );

        tokio::time::sleep(Duration::from_millis(400)).await;

        assert!(
            !store.lock().await.contains_key("expire_soon"),
            "Expired entry should have been swept"
        );

        handle.stop.send(()).unwrap();
        handle.task.await.unwrap();
    }

    #[tokio::test]
    async fn test_sweep_task_preserves_valid_entries() {
        let store = shared_store();
        store.lock().await.insert(
            "long_lived".to_string(),
            CacheEntry::transient(7, Duration::from_secs(3600)),
        );

        let handle = spawn_sweep_task(
            &Handle::current(),
            store.clone(),
            TEST_INTERVAL,
            GeneratorFailurePolicy::Propagate,
        );

        tokio::time::sleep(Duration::from_millis(300)).await;

        {
            let mut guard = store.lock().await;
            assert_eq!(guard.get("long_lived"), Some(7));
            assert!(guard.stats().sweeps >= 1);
        }

        handle.stop.send(()).unwrap();
        handle.task.await.unwrap();
    }

    #[tokio::test]
    async fn test_sweep_task_regenerates_perpetual_entries() {
        let store = shared_store();
        let calls = Arc::new(AtomicU32::new(0));
        let counted = calls.clone();
        let generator: ValueGenerator<u32> =
            Arc::new(move || counted.fetch_add(1, Ordering::SeqCst) + 1);

        let first = generator();
        store.lock().await.insert(
            "config".to_string(),
            CacheEntry::perpetual(first, generator, Duration::from_millis(100)),
        );

        let handle = spawn_sweep_task(
            &Handle::current(),
            store.clone(),
            TEST_INTERVAL,
            GeneratorFailurePolicy::Propagate,
        );

        tokio::time::sleep(Duration::from_millis(500)).await;

        {
            let mut guard = store.lock().await;
            let value = guard.get("config").unwrap();
            assert!(value >= 2, "Perpetual entry should have been regenerated");
            assert_eq!(guard.len(), 1);
        }

        handle.stop.send(()).unwrap();
        handle.task.await.unwrap();
    }

    #[tokio::test]
    async fn test_sweep_task_stops_when_sender_dropped() {
        let handle = spawn_sweep_task(
            &Handle::current(),
            shared_store(),
            TEST_INTERVAL,
            GeneratorFailurePolicy::Propagate,
        );

        drop(handle.stop);

        tokio::time::timeout(Duration::from_secs(1), handle.task)
            .await
            .expect("Task should exit once its stop sender is gone")
            .unwrap();
    }

    #[tokio::test]
    async fn test_sweep_task_dies_on_propagated_panic() {
        let store = shared_store();
        let generator: ValueGenerator<u32> = Arc::new(|| -> u32 { panic!("generator failed") });
        store.lock().await.insert(
            "config".to_string(),
            CacheEntry::perpetual(1, generator, Duration::ZERO),
        );

        let handle = spawn_sweep_task(
            &Handle::current(),
            store.clone(),
            TEST_INTERVAL,
            GeneratorFailurePolicy::Propagate,
        );

        let result = tokio::time::timeout(Duration::from_secs(1), handle.task)
            .await
            .expect("Task should terminate after the generator panics");
        assert!(result.unwrap_err().is_panic());

        // The lock is not poisoned and the old value is still served.
        assert_eq!(store.lock().await.get("config"), Some(1));
    }
}
