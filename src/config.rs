//! Configuration Module
//!
//! Handles loading cache configuration from environment variables.

use std::env;
use std::str::FromStr;

use crate::error::CacheError;

// == Generator Failure Policy ==
/// What happens when a perpetual entry's generator panics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GeneratorFailurePolicy {
    /// Let the panic unwind. During a sweep this ends the sweep task, and no
    /// further expiry happens for that cache.
    #[default]
    Propagate,
    /// Contain the panic. During a sweep the previous value keeps being served
    /// and the entry is rescheduled one lifetime later.
    KeepStale,
}

impl FromStr for GeneratorFailurePolicy {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "propagate" => Ok(Self::Propagate),
            "keep-stale" | "keep_stale" => Ok(Self::KeepStale),
            other => Err(CacheError::InvalidConfig(format!(
                "unknown generator failure policy '{}'",
                other
            ))),
        }
    }
}

/// Cache configuration parameters.
///
/// The sweep interval is fixed (see [`crate::cache::SWEEP_INTERVAL`]).
#[derive(Debug, Clone, Default)]
pub struct CacheConfig {
    /// Handling of panicking generators
    pub failure_policy: GeneratorFailurePolicy,
}

impl CacheConfig {
    /// Creates a new CacheConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_GENERATOR_FAILURE_POLICY` - `propagate` or `keep-stale` (default: propagate)
    pub fn from_env() -> Self {
        Self {
            failure_policy: env::var("CACHE_GENERATOR_FAILURE_POLICY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_default(),
        }
    }

    pub fn with_failure_policy(mut self, policy: GeneratorFailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }
}
