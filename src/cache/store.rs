//! Entry Store Module
//!
//! The map of entries guarded by the cache lock, together with the sweep pass
//! that evicts or regenerates expired entries.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;
use std::panic::{catch_unwind, AssertUnwindSafe};

use tokio::time::Instant;
use tracing::warn;

use crate::cache::entry::expiry_after;
use crate::cache::{CacheEntry, CacheStats, EntryKind};
use crate::config::GeneratorFailurePolicy;
use crate::error::panic_message;

// == Sweep Report ==
/// Outcome of a single sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Transient entries removed
    pub evicted: usize,
    /// Perpetual entries given a fresh value
    pub regenerated: usize,
    /// Perpetual entries whose generator panicked and kept their old value
    pub failed: usize,
}

// == Entry Store ==
/// Key-value storage plus statistics. Every access goes through the cache's
/// single exclusive lock.
#[derive(Debug)]
pub struct EntryStore<K, V> {
    entries: HashMap<K, CacheEntry<V>>,
    stats: CacheStats,
}

impl<K, V> Default for EntryStore<K, V> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            stats: CacheStats::new(),
        }
    }
}

impl<K, V> EntryStore<K, V>
where
    K: Eq + Hash,
{
    // == Constructor ==
    /// Creates an empty store with zeroed statistics.
    pub fn new() -> Self {
        Self::default()
    }

    // == Insert ==
    /// Inserts an entry, overwriting whatever was stored under `key`.
    pub fn insert(&mut self, key: K, entry: CacheEntry<V>) {
        self.entries.insert(key, entry);
        self.stats.set_total_entries(self.entries.len());
    }

    // == Get ==
    /// Returns a clone of the current value, regardless of expiry.
    ///
    /// Staleness is the sweep's business: a perpetual entry keeps serving its
    /// old value until regenerated, a transient one until evicted.
    pub fn get<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        V: Clone,
    {
        match self.entries.get(key) {
            Some(entry) => {
                self.stats.record_hit();
                Some(entry.value.clone())
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }

    // == Remove ==
    /// Removes an entry. Returns whether something was removed.
    pub fn remove<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let removed = self.entries.remove(key).is_some();
        self.stats.set_total_entries(self.entries.len());
        removed
    }

    #[cfg(test)]
    pub(crate) fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.contains_key(key)
    }

    // == Sweep Expired ==
    /// Walks every entry once. Expired transient entries are removed; expired
    /// perpetual entries have their generator called and are rescheduled.
    ///
    /// The generator runs while the caller holds the cache lock, so a slow
    /// generator stalls every other cache operation for its duration.
    ///
    /// Under [`GeneratorFailurePolicy::Propagate`] a panicking generator
    /// unwinds out of this call. Entries already visited keep their updates.
    pub fn sweep_expired(&mut self, now: Instant, policy: GeneratorFailurePolicy) -> SweepReport {
        let mut report = SweepReport::default();
        let stats = &mut self.stats;

        self.entries.retain(|_, entry| {
            if !entry.is_expired_at(now) {
                return true;
            }

            let (generator, lifetime) = match &entry.kind {
                EntryKind::Transient => {
                    stats.record_expiration();
                    report.evicted += 1;
                    return false;
                }
                EntryKind::Perpetual {
                    generator,
                    lifetime,
                } => (generator.clone(), *lifetime),
            };

            let fresh = match policy {
                GeneratorFailurePolicy::Propagate => Some(generator()),
                GeneratorFailurePolicy::KeepStale => {
                    match catch_unwind(AssertUnwindSafe(|| generator())) {
                        Ok(value) => Some(value),
                        Err(payload) => {
                            warn!(
                                "Generator panicked during regeneration, keeping stale value: {}",
                                panic_message(payload.as_ref())
                            );
                            None
                        }
                    }
                }
            };

            match fresh {
                Some(value) => {
                    entry.value = value;
                    stats.record_regeneration();
                    report.regenerated += 1;
                }
                None => {
                    stats.record_regeneration_failure();
                    report.failed += 1;
                }
            }
            entry.expires_at = expiry_after(Instant::now(), lifetime);
            true
        });

        self.stats.set_total_entries(self.entries.len());
        self.stats.record_sweep();
        report
    }

    // == Stats ==
    /// Returns a snapshot of the current statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }

    // == Length ==
    /// Returns the current number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    // == Is Empty ==
    /// Returns true if the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
