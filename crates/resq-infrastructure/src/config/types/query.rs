//! Query execution configuration types

use crate::constants::*;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Query execution configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct QueryConfig {
    /// Executions slower than this are flagged, in milliseconds
    pub slow_operation_threshold_ms: u64,

    /// Whether query results are cached when a cache key is given
    pub enable_query_caching: bool,

    /// TTL for cached query results, in seconds
    pub cache_ttl_secs: u64,

    /// Retries performed for a failing query
    pub max_retries: u32,
}

impl QueryConfig {
    /// Slow-operation threshold as a Duration
    pub fn slow_operation_threshold(&self) -> Duration {
        Duration::from_millis(self.slow_operation_threshold_ms)
    }

    /// Query cache TTL as a Duration
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            slow_operation_threshold_ms: QUERY_SLOW_THRESHOLD_MS,
            enable_query_caching: true,
            cache_ttl_secs: QUERY_CACHE_TTL_SECS,
            max_retries: QUERY_DEFAULT_MAX_RETRIES,
        }
    }
}
