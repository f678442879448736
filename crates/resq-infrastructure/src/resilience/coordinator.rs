//! Resilience coordinator
//!
//! Owns the breadcrumb trail, the bounded error report buffer, and the
//! circuit breaker registry, and composes them into `handle_error`,
//! `with_retry`, and `with_graceful_degradation`.

use super::breadcrumbs::BreadcrumbTrail;
use super::circuit_breaker::{CircuitBreakerRegistry, CircuitSnapshot};
use super::classify::{assess_severity, categorize_error};
use super::retry::RetryPolicy;
use super::sinks::TracingReportSink;
use crate::config::{AppConfig, CircuitBreakerConfig, RetryConfig};
use crate::constants::CIRCUIT_BREAKER_GLOBAL_KEY;
use crate::logging::log_error_report;
use resq_domain::constants::{ERROR_REPORT_CAPACITY, STATS_RECENT_REPORTS, STATS_TOP_N};
use resq_domain::error::{Error, Result};
use resq_domain::{
    CircuitState, ErrorCategory, ErrorReport, ErrorSeverity, ErrorStats, ReportContext, ReportSink,
};
use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Options for [`ResilienceCoordinator::handle_error`]
///
/// Category and severity are derived from the error when left unset.
#[derive(Debug, Clone, Copy)]
pub struct HandleOptions {
    /// Severity override
    pub severity: Option<ErrorSeverity>,
    /// Category override
    pub category: Option<ErrorCategory>,
    /// Whether the failure was recovered from
    pub handled: bool,
    /// Whether high and critical reports reach the report sink
    pub report: bool,
    /// Retries performed before this report
    pub retry_count: u32,
    /// Whether the report may count as a circuit failure for its origin
    pub track_circuit: bool,
}

impl Default for HandleOptions {
    fn default() -> Self {
        Self {
            severity: None,
            category: None,
            handled: true,
            report: true,
            retry_count: 0,
            track_circuit: true,
        }
    }
}

impl HandleOptions {
    /// Recovered failure at a fixed severity
    pub fn handled(severity: ErrorSeverity) -> Self {
        Self {
            severity: Some(severity),
            ..Self::default()
        }
    }

    /// Unrecovered failure at a fixed severity
    pub fn unhandled(severity: ErrorSeverity) -> Self {
        Self {
            severity: Some(severity),
            handled: false,
            ..Self::default()
        }
    }

    /// Set the category instead of inferring it
    pub fn with_category(mut self, category: ErrorCategory) -> Self {
        self.category = Some(category);
        self
    }

    /// Set the retry count
    pub fn with_retry_count(mut self, retry_count: u32) -> Self {
        self.retry_count = retry_count;
        self
    }

    /// Keep the report away from the report sink
    pub fn suppress_report(mut self) -> Self {
        self.report = false;
        self
    }

    /// Do not count this report against the origin's circuit
    pub fn without_circuit_tracking(mut self) -> Self {
        self.track_circuit = false;
        self
    }
}

/// Terminal outcome of a failed retry loop
#[derive(Debug)]
pub(crate) struct RetryFailure {
    /// Last error observed, or the circuit rejection
    pub(crate) error: Error,
    /// Retries performed after the first attempt
    pub(crate) retries: u32,
    /// Whether the circuit rejected the call before any attempt
    pub(crate) rejected: bool,
}

/// Resilience coordinator
///
/// Constructed explicitly and shared by reference (usually `Arc`), so
/// independent coordinators can coexist.
pub struct ResilienceCoordinator {
    circuits: CircuitBreakerRegistry,
    breadcrumbs: BreadcrumbTrail,
    reports: Mutex<VecDeque<ErrorReport>>,
    report_capacity: usize,
    report_sink: Arc<dyn ReportSink>,
    retry_config: RetryConfig,
}

impl ResilienceCoordinator {
    /// Create a coordinator with the given retry defaults and breaker settings
    pub fn new(retry: RetryConfig, circuit_breaker: CircuitBreakerConfig) -> Self {
        Self {
            circuits: CircuitBreakerRegistry::new(circuit_breaker),
            breadcrumbs: BreadcrumbTrail::new(),
            reports: Mutex::new(VecDeque::new()),
            report_capacity: ERROR_REPORT_CAPACITY,
            report_sink: Arc::new(TracingReportSink),
            retry_config: retry,
        }
    }

    /// Create a coordinator from the application configuration
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.retry.clone(), config.circuit_breaker.clone())
    }

    /// Replace the report sink
    pub fn with_report_sink(mut self, sink: Arc<dyn ReportSink>) -> Self {
        self.report_sink = sink;
        self
    }

    /// Bound the number of retained error reports
    pub fn with_report_capacity(mut self, capacity: usize) -> Self {
        self.report_capacity = capacity;
        self
    }

    /// Retry policy built from the configured defaults
    pub fn default_retry_policy(&self) -> RetryPolicy {
        RetryPolicy::from_config(&self.retry_config)
    }

    /// Circuit breaker registry
    pub fn circuits(&self) -> &CircuitBreakerRegistry {
        &self.circuits
    }
}

// Breadcrumbs and reports
impl ResilienceCoordinator {
    /// Append a breadcrumb to the trail
    pub fn add_breadcrumb<S: Into<String>>(&self, text: S) {
        self.breadcrumbs.add(text);
    }

    /// Copy of the breadcrumb trail, oldest first
    pub fn breadcrumbs(&self) -> Vec<String> {
        self.breadcrumbs.snapshot()
    }

    /// Clear the breadcrumb trail
    pub fn clear_breadcrumbs(&self) {
        self.breadcrumbs.clear();
    }

    /// Classify, record, log, and forward an error
    ///
    /// High and critical reports go to the report sink unless suppressed.
    /// Critical and network failures count against the circuit keyed by the
    /// context's origin.
    pub fn handle_error(
        &self,
        error: &Error,
        context: ReportContext,
        options: HandleOptions,
    ) -> ErrorReport {
        let category = options
            .category
            .unwrap_or_else(|| categorize_error(error));
        let severity = options
            .severity
            .unwrap_or_else(|| assess_severity(error, category));

        let report = ErrorReport {
            id: uuid::Uuid::new_v4().to_string(),
            message: error.to_string(),
            chain: error.chain(),
            context,
            severity,
            category,
            handled: options.handled,
            retry_count: options.retry_count,
            breadcrumbs: self.breadcrumbs.snapshot(),
        };

        self.store_report(report.clone());
        log_error_report(&report);

        if options.report && severity.is_reportable() {
            self.report_sink.report(&report);
        }

        if options.track_circuit
            && (severity == ErrorSeverity::Critical || category == ErrorCategory::Network)
        {
            self.circuits.record_failure(&report.context.origin);
        }

        report
    }

    fn store_report(&self, report: ErrorReport) {
        if self.report_capacity == 0 {
            return;
        }
        if let Ok(mut reports) = self.reports.lock() {
            while reports.len() >= self.report_capacity {
                reports.pop_front();
            }
            reports.push_back(report);
        }
    }

    /// The most recent `limit` reports, newest last
    pub fn recent_reports(&self, limit: usize) -> Vec<ErrorReport> {
        self.reports
            .lock()
            .map(|reports| {
                let skip = reports.len().saturating_sub(limit);
                reports.iter().skip(skip).cloned().collect()
            })
            .unwrap_or_default()
    }

    /// Rollup of the reports created within `window` of now
    pub fn get_error_stats(&self, window: Duration) -> ErrorStats {
        let cutoff = chrono::Duration::from_std(window)
            .ok()
            .and_then(|window| chrono::Utc::now().checked_sub_signed(window));

        let in_window: Vec<ErrorReport> = self
            .reports
            .lock()
            .map(|reports| {
                reports
                    .iter()
                    .filter(|report| cutoff.is_none_or(|cutoff| report.context.timestamp >= cutoff))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        let mut by_category = HashMap::new();
        let mut by_severity = HashMap::new();
        let mut messages: HashMap<&str, usize> = HashMap::new();
        for report in &in_window {
            *by_category.entry(report.category).or_insert(0) += 1;
            *by_severity.entry(report.severity).or_insert(0) += 1;
            *messages.entry(report.message.as_str()).or_insert(0) += 1;
        }

        let mut top_messages: Vec<(String, usize)> = messages
            .into_iter()
            .map(|(message, count)| (message.to_string(), count))
            .collect();
        top_messages.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        top_messages.truncate(STATS_TOP_N);

        let recent_start = in_window.len().saturating_sub(STATS_RECENT_REPORTS);
        let recent = in_window[recent_start..].to_vec();

        ErrorStats {
            total: in_window.len(),
            by_category,
            by_severity,
            top_messages,
            recent,
        }
    }
}

// Circuit breaker access
impl ResilienceCoordinator {
    /// Whether calls for `key` are currently rejected
    pub fn is_circuit_open(&self, key: &str) -> bool {
        self.circuits.is_open(key)
    }

    /// Current circuit state for `key`
    pub fn circuit_state(&self, key: &str) -> CircuitState {
        self.circuits.state(key)
    }

    /// Diagnostic snapshot of the circuit for `key`
    pub fn circuit_snapshot(&self, key: &str) -> Option<CircuitSnapshot> {
        self.circuits.snapshot(key)
    }

    /// Record a success observed outside `with_retry`
    pub fn record_success(&self, key: &str) {
        self.circuits.record_success(key);
    }

    /// Record a failure observed outside `with_retry`
    pub fn record_failure(&self, key: &str) {
        self.circuits.record_failure(key);
    }
}

// Execution combinators
impl ResilienceCoordinator {
    /// Run `operation` with retries and circuit breaker protection
    ///
    /// Fails immediately with [`Error::CircuitOpen`] when the circuit for
    /// `key` (the shared global circuit when empty) rejects the call. Otherwise makes up to `max_retries + 1`
    /// attempts, sleeping per the policy's backoff between them. Each failed
    /// attempt counts against the circuit; retrying stops early when the
    /// predicate rejects the error or the circuit opens. The final failure is
    /// reported as unhandled at high severity and returned.
    pub async fn with_retry<T, F, Fut>(&self, key: &str, policy: &RetryPolicy, operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        match self.run_attempts(key, policy, operation).await {
            Ok(value) => Ok(value),
            Err(failure) if failure.rejected => Err(failure.error),
            Err(failure) => {
                self.handle_error(
                    &failure.error,
                    ReportContext::new(key),
                    HandleOptions::unhandled(ErrorSeverity::High)
                        .with_retry_count(failure.retries)
                        .without_circuit_tracking(),
                );
                Err(failure.error)
            }
        }
    }

    /// Retry loop behind [`with_retry`](Self::with_retry), leaving the final
    /// report to the caller
    pub(crate) async fn run_attempts<T, F, Fut>(
        &self,
        key: &str,
        policy: &RetryPolicy,
        mut operation: F,
    ) -> std::result::Result<T, RetryFailure>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let key = if key.is_empty() {
            CIRCUIT_BREAKER_GLOBAL_KEY
        } else {
            key
        };
        let Some(mut permit) = self.circuits.acquire(key) else {
            self.add_breadcrumb(format!("{key}: rejected, circuit open"));
            warn!(key = %key, "Circuit open, call rejected");
            return Err(RetryFailure {
                error: Error::circuit_open(key),
                retries: 0,
                rejected: true,
            });
        };

        let total_attempts = policy.max_retries.saturating_add(1);
        let mut attempt: u32 = 0;
        loop {
            self.add_breadcrumb(format!("{key}: attempt {} of {}", attempt + 1, total_attempts));

            // Dropping this future mid-call drops `permit`, which reopens a
            // half-open circuit whose trial never finished
            let error = match operation().await {
                Ok(value) => {
                    self.circuits.record_success(key);
                    permit.resolve();
                    if attempt > 0 {
                        info!(key = %key, retries = attempt, "Operation succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(error) => error,
            };

            self.circuits.record_failure(key);
            permit.resolve();

            let exhausted = attempt >= policy.max_retries;
            if exhausted || !policy.should_retry(&error) {
                return Err(RetryFailure {
                    error,
                    retries: attempt,
                    rejected: false,
                });
            }

            let delay = policy.delay_for(attempt);
            debug!(
                key = %key,
                attempt = attempt + 1,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                error = %error,
                "Attempt failed, backing off"
            );
            tokio::time::sleep(delay).await;
            attempt += 1;

            permit = match self.circuits.acquire(key) {
                Some(next) => next,
                None => {
                    self.add_breadcrumb(format!("{key}: retries stopped, circuit open"));
                    return Err(RetryFailure {
                        error,
                        retries: attempt,
                        rejected: false,
                    });
                }
            };
        }
    }

    /// Run `primary`, falling back to `fallback` if it fails
    ///
    /// A primary failure is reported as handled at medium severity. A
    /// fallback failure is reported as unhandled at high severity and
    /// returned; total failure is never swallowed.
    pub async fn with_graceful_degradation<T, P, PFut, B, BFut>(
        &self,
        label: &str,
        primary: P,
        fallback: B,
    ) -> Result<T>
    where
        P: FnOnce() -> PFut,
        PFut: Future<Output = Result<T>>,
        B: FnOnce() -> BFut,
        BFut: Future<Output = Result<T>>,
    {
        self.add_breadcrumb(format!("{label}: primary"));
        let primary_error = match primary().await {
            Ok(value) => return Ok(value),
            Err(error) => error,
        };

        self.handle_error(
            &primary_error,
            ReportContext::new(label),
            HandleOptions::handled(ErrorSeverity::Medium),
        );
        self.add_breadcrumb(format!("{label}: fallback"));

        match fallback().await {
            Ok(value) => {
                self.add_breadcrumb(format!("{label}: fallback succeeded"));
                Ok(value)
            }
            Err(error) => {
                self.handle_error(
                    &error,
                    ReportContext::new(label),
                    HandleOptions::unhandled(ErrorSeverity::High),
                );
                Err(error)
            }
        }
    }
}

impl Default for ResilienceCoordinator {
    fn default() -> Self {
        Self::new(RetryConfig::default(), CircuitBreakerConfig::default())
    }
}
