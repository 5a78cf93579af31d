//! Cache Module
//!
//! Provides an in-memory cache with per-entry expiry and perpetually
//! regenerated entries.

mod engine;
mod entry;
mod stats;
mod store;


// Re-export public types
pub use engine::Cache;
pub use entry::{CacheEntry, EntryKind, ValueGenerator};
pub use stats::CacheStats;
pub use store::{EntryStore, SweepReport};

// == Public Constants ==
/// Time between two expiry sweeps.
pub const SWEEP_INTERVAL: std::time::Duration = std::time::Duration::from_secs(1);
