//! Domain layer constants
//!
//! Bounds on the diagnostic buffers shared by every component. Tunable
//! runtime settings live in the infrastructure configuration instead.

// ============================================================================
// DIAGNOSTIC BUFFER CONSTANTS
// ============================================================================

/// Maximum number of breadcrumbs kept on a coordinator trail
pub const BREADCRUMB_CAPACITY: usize = 50;

/// Maximum number of error reports retained before the oldest are dropped
pub const ERROR_REPORT_CAPACITY: usize = 1_000;

/// Maximum number of query metrics retained before the oldest are dropped
pub const QUERY_METRIC_CAPACITY: usize = 10_000;

// ============================================================================
// STATISTICS CONSTANTS
// ============================================================================

/// Number of entries returned by "top N" statistics views
pub const STATS_TOP_N: usize = 10;

/// Number of recent error reports included in error statistics
pub const STATS_RECENT_REPORTS: usize = 20;
