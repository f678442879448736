//! Query Metric Value Objects

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Value Object: Query Metric
///
/// One record per wrapped query execution, whatever the outcome. Cache hits
/// are recorded with `cached = true` and zero execution time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueryMetric {
    /// Name the caller gave the operation
    pub operation_name: String,
    /// Wall-clock duration of the underlying fetch
    pub execution_time_ms: u64,
    /// Completion time
    pub timestamp: DateTime<Utc>,
    /// Whether the operation produced a result
    pub success: bool,
    /// Number of rows for list-shaped results
    pub row_count: Option<usize>,
    /// Rendered error for failed operations
    pub error_message: Option<String>,
    /// Whether the result was served from the cache
    pub cached: bool,
}

/// Per-operation rollup used for the slowest-operations view
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OperationSummary {
    /// Operation name
    pub operation_name: String,
    /// Mean execution time across calls
    pub avg_execution_time_ms: f64,
    /// Number of calls inside the window
    pub count: usize,
    /// Time of the most recent call
    pub last_executed: DateTime<Utc>,
}

/// Windowed rollup of query metrics
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct QueryStats {
    /// Metrics inside the window
    pub total: usize,
    /// Successful executions
    pub successful: usize,
    /// Failed executions
    pub failed: usize,
    /// Mean execution time across all metrics in the window
    pub avg_execution_time_ms: f64,
    /// Executions slower than the configured threshold
    pub slow_operations: usize,
    /// Executions served from the cache
    pub cache_hits: usize,
    /// Slowest operations by mean execution time, slowest first
    pub slowest: Vec<OperationSummary>,
}
