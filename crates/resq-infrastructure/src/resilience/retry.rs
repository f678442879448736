//! Retry policy with exponential backoff

use super::classify::categorize_error;
use crate::config::RetryConfig;
use resq_domain::{Error, ErrorCategory};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Predicate deciding whether a failed attempt is retried
pub type RetryPredicate = Arc<dyn Fn(&Error) -> bool + Send + Sync>;

/// Default retry predicate
///
/// Retries everything except circuit rejections and failures a repeat call
/// cannot fix (authentication and validation).
pub fn default_retry_predicate(error: &Error) -> bool {
    if error.is_circuit_open() {
        return false;
    }
    !matches!(
        categorize_error(error),
        ErrorCategory::Auth | ErrorCategory::Validation
    )
}

/// Retry policy
///
/// Attempt `n` (zero-based) that fails is followed by a delay of
/// `min(base_delay * backoff_factor^n, max_delay)`, without jitter.
#[derive(Clone)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Delay before the first retry
    pub base_delay: Duration,
    /// Upper bound on any single delay
    pub max_delay: Duration,
    /// Multiplier applied per attempt
    pub backoff_factor: f64,
    retry_predicate: RetryPredicate,
}

impl RetryPolicy {
    /// Create a policy from its numeric settings with the default predicate
    pub fn new(max_retries: u32, base_delay: Duration, max_delay: Duration, backoff_factor: f64) -> Self {
        Self {
            max_retries,
            base_delay,
            max_delay,
            backoff_factor,
            retry_predicate: Arc::new(default_retry_predicate),
        }
    }

    /// Build a policy from configuration with the default predicate
    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(
            config.max_retries,
            Duration::from_millis(config.base_delay_ms),
            Duration::from_millis(config.max_delay_ms),
            config.backoff_factor,
        )
    }

    /// Set the number of retries
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the base delay
    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    /// Set the maximum delay
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Set the backoff multiplier
    pub fn with_backoff_factor(mut self, factor: f64) -> Self {
        self.backoff_factor = factor;
        self
    }

    /// Replace the retry predicate
    pub fn with_retry_predicate<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&Error) -> bool + Send + Sync + 'static,
    {
        self.retry_predicate = Arc::new(predicate);
        self
    }

    /// Whether a failed attempt with `error` may be retried
    pub fn should_retry(&self, error: &Error) -> bool {
        (self.retry_predicate)(error)
    }

    /// Delay after the failed attempt with zero-based index `attempt`
    ///
    /// Rounded to whole milliseconds.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let millis = self.base_delay.as_millis() as f64 * self.backoff_factor.powi(exponent);
        if !millis.is_finite() || millis >= self.max_delay.as_millis() as f64 {
            return self.max_delay;
        }
        Duration::from_millis(millis.max(0.0).round() as u64)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

impl fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .field("backoff_factor", &self.backoff_factor)
            .finish_non_exhaustive()
    }
}
