//! Cache Entry Module
//!
//! Defines individual cache entries: a value, its expiry instant, and whether
//! it is evicted or regenerated once that instant passes.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

/// A zero-argument function producing a fresh value for a perpetual entry.
pub type ValueGenerator<V> = Arc<dyn Fn() -> V + Send + Sync>;

/// Used when `now + lifetime` does not fit in an `Instant`.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

// == Entry Kind ==
/// Discriminates the two kinds of entries.
///
/// A perpetual entry always carries both its generator and its lifetime, a
/// transient one carries neither.
pub enum EntryKind<V> {
    /// Removed from the cache on expiry.
    Transient,
    /// Regenerated in place on expiry, then rescheduled `lifetime` later.
    Perpetual {
        generator: ValueGenerator<V>,
        lifetime: Duration,
    },
}

impl<V> fmt::Debug for EntryKind<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryKind::Transient => f.write_str("Transient"),
            EntryKind::Perpetual { lifetime, .. } => f
                .debug_struct("Perpetual")
                .field("lifetime", lifetime)
                .finish_non_exhaustive(),
        }
    }
}

// == Cache Entry ==
/// Represents a single cache entry with its value and expiry metadata.
#[derive(Debug)]
pub struct CacheEntry<V> {
    /// The currently served value
    pub value: V,
    /// Instant at or after which the entry is stale
    pub expires_at: Instant,
    /// Eviction or regeneration behaviour
    pub kind: EntryKind<V>,
}

impl<V> CacheEntry<V> {
    // == Constructors ==
    /// Creates a transient entry expiring `lifetime` from now.
    pub fn transient(value: V, lifetime: Duration) -> Self {
        Self {
            value,
            expires_at: expiry_after(Instant::now(), lifetime),
            kind: EntryKind::Transient,
        }
    }

    /// Creates a perpetual entry from an already generated first value.
    pub fn perpetual(value: V, generator: ValueGenerator<V>, lifetime: Duration) -> Self {
        Self {
            value,
            expires_at: expiry_after(Instant::now(), lifetime),
            kind: EntryKind::Perpetual {
                generator,
                lifetime,
            },
        }
    }

    // == Is Expired ==
    /// Checks whether the entry is stale at `now`.
    ///
    /// An entry whose expiry equals `now` counts as expired, so a zero
    /// lifetime makes it eligible for the very next sweep.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        self.expires_at <= now
    }

    #[cfg(test)]
    pub(crate) fn is_perpetual(&self) -> bool {
        matches!(self.kind, EntryKind::Perpetual { .. })
    }

    /// Remaining time before expiry, zero once expired.
    #[cfg(test)]
    pub(crate) fn time_to_live(&self) -> Duration {
        self.expires_at.saturating_duration_since(Instant::now())
    }
}

// == Utility Functions ==
/// Computes `now + lifetime`, saturating to a far-future instant on overflow.
pub fn expiry_after(now: Instant, lifetime: Duration) -> Instant {
    now.checked_add(lifetime)
        .unwrap_or_else(|| now + FAR_FUTURE)
}
