//! Cache configuration types

use crate::constants::*;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Cache store configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CacheConfig {
    /// TTL applied when `set` is called without one, in seconds
    pub default_ttl_secs: u64,

    /// Maximum number of entries
    pub max_size: usize,

    /// Interval between expiry sweeps, in seconds
    pub cleanup_interval_secs: u64,
}

impl CacheConfig {
    /// Default TTL as a Duration
    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl_secs)
    }

    /// Sweep interval as a Duration
    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl_secs: CACHE_DEFAULT_TTL_SECS,
            max_size: CACHE_DEFAULT_MAX_SIZE,
            cleanup_interval_secs: CACHE_CLEANUP_INTERVAL_SECS,
        }
    }
}
