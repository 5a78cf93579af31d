//! Refresh Cache - An in-process key/value cache
//!
//! Provides per-entry expiry and perpetual entries whose value is regenerated
//! in the background instead of being evicted.

pub mod cache;
pub mod config;
pub mod error;
pub mod tasks;

pub use cache::{Cache, CacheStats, SWEEP_INTERVAL};
pub use config::{CacheConfig, GeneratorFailurePolicy};
pub use error::{CacheError, Result};
