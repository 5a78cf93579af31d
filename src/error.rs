//! Error types for the cache
//!
//! Provides unified error handling using thiserror. Lookup misses and deletes
//! of absent keys are not errors.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// The cache was created outside a Tokio runtime
    #[error("No Tokio runtime available to run the sweep task")]
    RuntimeUnavailable,

    /// A generator panicked while producing the first value of a perpetual entry
    #[error("Generator panicked: {0}")]
    GeneratorPanicked(String),

    /// The sweep task terminated by panicking
    #[error("Sweep task panicked: {0}")]
    SweepTaskPanicked(String),

    /// A configuration value could not be parsed
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;

/// Extracts a readable message from a panic payload.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
