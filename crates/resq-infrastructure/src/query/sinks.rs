//! Metrics sinks

use resq_domain::{MetricsSink, QueryMetric};

/// Metrics sink that logs each metric at debug level under `resq::query`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingMetricsSink;

impl MetricsSink for TracingMetricsSink {
    fn record_query(&self, metric: &QueryMetric) {
        tracing::debug!(
            target: "resq::query",
            operation = %metric.operation_name,
            execution_time_ms = metric.execution_time_ms,
            success = metric.success,
            cached = metric.cached,
            row_count = ?metric.row_count,
            error = ?metric.error_message,
            "Query executed"
        );
    }
}

/// Metrics sink that discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullMetricsSink;

impl MetricsSink for NullMetricsSink {
    fn record_query(&self, _metric: &QueryMetric) {}
}
