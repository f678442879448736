//! Resilience configuration types

use crate::constants::*;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Retry configuration
///
/// The serializable half of a retry policy; the retry predicate is attached
/// when a `RetryPolicy` is built from it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RetryConfig {
    /// Retries after the first attempt
    pub max_retries: u32,

    /// Delay before the first retry, in milliseconds
    pub base_delay_ms: u64,

    /// Upper bound on any single delay, in milliseconds
    pub max_delay_ms: u64,

    /// Multiplier applied per attempt
    pub backoff_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: RETRY_DEFAULT_MAX_RETRIES,
            base_delay_ms: RETRY_DEFAULT_BASE_DELAY_MS,
            max_delay_ms: RETRY_DEFAULT_MAX_DELAY_MS,
            backoff_factor: RETRY_DEFAULT_BACKOFF_FACTOR,
        }
    }
}

/// Circuit breaker configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CircuitBreakerConfig {
    /// Failures needed to open the circuit
    pub failure_threshold: u32,

    /// Time an open circuit waits before admitting a trial call, in seconds
    pub recovery_timeout_secs: u64,

    /// Failures further apart than this restart the count, in seconds
    pub monitoring_period_secs: u64,
}

impl CircuitBreakerConfig {
    /// Set the failure threshold
    pub fn with_failure_threshold(mut self, threshold: u32) -> Self {
        self.failure_threshold = threshold;
        self
    }

    /// Set the recovery timeout in seconds
    pub fn with_recovery_timeout_secs(mut self, secs: u64) -> Self {
        self.recovery_timeout_secs = secs;
        self
    }

    /// Recovery timeout as a Duration
    pub fn recovery_timeout(&self) -> Duration {
        Duration::from_secs(self.recovery_timeout_secs)
    }

    /// Monitoring period as a Duration
    pub fn monitoring_period(&self) -> Duration {
        Duration::from_secs(self.monitoring_period_secs)
    }
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: CIRCUIT_BREAKER_FAILURE_THRESHOLD,
            recovery_timeout_secs: CIRCUIT_BREAKER_RECOVERY_TIMEOUT_SECS,
            monitoring_period_secs: CIRCUIT_BREAKER_MONITORING_PERIOD_SECS,
        }
    }
}
