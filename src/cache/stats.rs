//! Cache Statistics Module
//!
//! Tracks lookups, sweep activity, and regeneration outcomes.

use chrono::{DateTime, Utc};
use serde::Serialize;

// == Cache Stats ==
/// Tracks cache activity counters.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    /// Number of lookups that found a value
    pub hits: u64,
    /// Number of lookups that found nothing
    pub misses: u64,
    /// Number of transient entries removed by a sweep
    pub expirations: u64,
    /// Number of successful perpetual regenerations
    pub regenerations: u64,
    /// Number of regenerations whose generator panicked and was contained
    pub regeneration_failures: u64,
    /// Number of completed sweeps
    pub sweeps: u64,
    /// Current number of entries in the cache
    pub total_entries: usize,
    /// Wall-clock time of the last completed sweep
    pub last_sweep_at: Option<DateTime<Utc>>,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no lookups have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    // == Record Hit ==
    /// Increments the hit counter.
    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    // == Record Miss ==
    /// Increments the miss counter.
    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    // == Record Expiration ==
    /// Increments the expiration counter.
    pub fn record_expiration(&mut self) {
        self.expirations += 1;
    }

    // == Record Regeneration ==
    /// Increments the regeneration counter.
    pub fn record_regeneration(&mut self) {
        self.regenerations += 1;
    }

    // == Record Regeneration Failure ==
    /// Increments the regeneration failure counter.
    pub fn record_regeneration_failure(&mut self) {
        self.regeneration_failures += 1;
    }

    // == Record Sweep ==
    /// Counts a finished sweep and stamps its completion time.
    pub fn record_sweep(&mut self) {
        self.sweeps += 1;
        self.last_sweep_at = Some(Utc::now());
    }

    // == Update Entry Count ==
    /// Updates the total entries count.
    pub fn set_total_entries(&mut self, count: usize) {
        self.total_entries = count;
    }
}
