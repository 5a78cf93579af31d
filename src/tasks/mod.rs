//! Background Tasks Module
//!
//! Contains background tasks that run for the lifetime of a cache.
//!
//! # Tasks
//! - Sweep: evicts expired transient entries and regenerates perpetual ones

mod sweep;

pub use sweep::{spawn_sweep_task, SweepHandle};
