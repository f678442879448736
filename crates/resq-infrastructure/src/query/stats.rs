//! Query statistics rollup

use resq_domain::constants::STATS_TOP_N;
use resq_domain::value_objects::OperationSummary;
use resq_domain::{QueryMetric, QueryStats};
use std::collections::HashMap;

/// Summarize `metrics`, counting executions slower than `slow_threshold_ms`
///
/// The slowest view groups metrics by operation name and keeps the
/// [`STATS_TOP_N`] names with the highest mean execution time.
#[allow(clippy::cast_precision_loss)]
pub fn summarize(metrics: &[QueryMetric], slow_threshold_ms: u64) -> QueryStats {
    if metrics.is_empty() {
        return QueryStats::default();
    }

    let successful = metrics.iter().filter(|m| m.success).count();
    let total_ms: u64 = metrics.iter().map(|m| m.execution_time_ms).sum();

    let mut groups: HashMap<&str, (u64, usize, chrono::DateTime<chrono::Utc>)> = HashMap::new();
    for metric in metrics {
        let group = groups
            .entry(metric.operation_name.as_str())
            .or_insert((0, 0, metric.timestamp));
        group.0 += metric.execution_time_ms;
        group.1 += 1;
        if metric.timestamp > group.2 {
            group.2 = metric.timestamp;
        }
    }

    let mut slowest: Vec<OperationSummary> = groups
        .into_iter()
        .map(|(name, (sum, count, last_executed))| OperationSummary {
            operation_name: name.to_string(),
            avg_execution_time_ms: sum as f64 / count as f64,
            count,
            last_executed,
        })
        .collect();
    slowest.sort_by(|a, b| {
        b.avg_execution_time_ms
            .total_cmp(&a.avg_execution_time_ms)
            .then_with(|| a.operation_name.cmp(&b.operation_name))
    });
    slowest.truncate(STATS_TOP_N);

    QueryStats {
        total: metrics.len(),
        successful,
        failed: metrics.len() - successful,
        avg_execution_time_ms: total_ms as f64 / metrics.len() as f64,
        slow_operations: metrics
            .iter()
            .filter(|m| m.execution_time_ms > slow_threshold_ms)
            .count(),
        cache_hits: metrics.iter().filter(|m| m.cached).count(),
        slowest,
    }
}
