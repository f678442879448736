//! Infrastructure layer constants
//!
//! Contains constants that are part of the infrastructure implementation.
//! Buffer bounds shared with the domain are defined in `resq_domain::constants`.

use std::time::Duration;

// ============================================================================
// CONFIGURATION CONSTANTS
// ============================================================================

/// Default configuration file name
pub const DEFAULT_CONFIG_FILENAME: &str = "resq.toml";

/// Default configuration directory name
pub const DEFAULT_CONFIG_DIR: &str = "resq";

/// Environment variable prefix for configuration
pub const CONFIG_ENV_PREFIX: &str = "RESQ";

// ============================================================================
// CACHE CONSTANTS
// ============================================================================

/// Default cache TTL in seconds (5 minutes)
pub const CACHE_DEFAULT_TTL_SECS: u64 = 300;

/// Default maximum number of cache entries
pub const CACHE_DEFAULT_MAX_SIZE: usize = 500;

/// Default interval between expiry sweeps in seconds (5 minutes)
pub const CACHE_CLEANUP_INTERVAL_SECS: u64 = 300;

/// TTL applied to fallback data cached after a failed fetch
pub const CACHE_FALLBACK_TTL: Duration = Duration::from_secs(300);

/// Number of access-time samples kept for the rolling average
pub const CACHE_ACCESS_SAMPLE_WINDOW: usize = 100;

/// Cache namespace separator
pub const CACHE_NAMESPACE_SEPARATOR: &str = ":";

/// Source label stored on entries that were set without one
pub const CACHE_DEFAULT_SOURCE: &str = "unknown";

/// Retries performed by `get_or_set` on a cache miss
pub const CACHE_FETCH_MAX_RETRIES: u32 = 2;

/// Base backoff delay for `get_or_set` fetch retries in milliseconds
pub const CACHE_FETCH_BASE_DELAY_MS: u64 = 200;

/// Maximum backoff delay for `get_or_set` fetch retries in milliseconds
pub const CACHE_FETCH_MAX_DELAY_MS: u64 = 2_000;

// ============================================================================
// RESILIENCE CONSTANTS
// ============================================================================

/// Default number of retries after the first attempt
pub const RETRY_DEFAULT_MAX_RETRIES: u32 = 3;

/// Default base backoff delay in milliseconds
pub const RETRY_DEFAULT_BASE_DELAY_MS: u64 = 1_000;

/// Default maximum backoff delay in milliseconds
pub const RETRY_DEFAULT_MAX_DELAY_MS: u64 = 10_000;

/// Default backoff multiplier
pub const RETRY_DEFAULT_BACKOFF_FACTOR: f64 = 2.0;

/// Circuit breaker failure threshold
pub const CIRCUIT_BREAKER_FAILURE_THRESHOLD: u32 = 5;

/// Circuit breaker recovery timeout in seconds
pub const CIRCUIT_BREAKER_RECOVERY_TIMEOUT_SECS: u64 = 60;

/// Circuit breaker monitoring period in seconds
pub const CIRCUIT_BREAKER_MONITORING_PERIOD_SECS: u64 = 300;

/// Circuit key used when an operation does not name one
pub const CIRCUIT_BREAKER_GLOBAL_KEY: &str = "global";

// ============================================================================
// QUERY CONSTANTS
// ============================================================================

/// Executions slower than this are flagged, in milliseconds
pub const QUERY_SLOW_THRESHOLD_MS: u64 = 1_000;

/// Default TTL for cached query results in seconds (5 minutes)
pub const QUERY_CACHE_TTL_SECS: u64 = 300;

/// Retries performed for a failing query
pub const QUERY_DEFAULT_MAX_RETRIES: u32 = 2;

// ============================================================================
// LOGGING CONSTANTS
// ============================================================================

/// Default log level
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Environment variable overriding the log filter
pub const LOG_FILTER_ENV: &str = "RESQ_LOG";
