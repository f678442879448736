//! Sink Ports
//!
//! Receivers for error reports and query metrics. Implementations must not
//! fail or panic: the core calls them on its error paths.

use crate::value_objects::{ErrorReport, QueryMetric};

/// Report sink interface
///
/// Receives high and critical error reports.
///
/// # Example
///
/// ```ignore
/// struct CountingSink(AtomicUsize);
///
/// impl ReportSink for CountingSink {
///     fn report(&self, _report: &ErrorReport) {
///         self.0.fetch_add(1, Ordering::SeqCst);
///     }
/// }
/// ```
pub trait ReportSink: Send + Sync {
    /// Accept a report
    fn report(&self, report: &ErrorReport);
}

/// Metrics sink interface
///
/// Receives every query metric as it is recorded.
pub trait MetricsSink: Send + Sync {
    /// Accept a query metric
    fn record_query(&self, metric: &QueryMetric);
}
