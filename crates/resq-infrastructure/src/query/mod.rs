//! Query execution wrapper
//!
//! Cache-aside lookups and retried fetches around caller-supplied query
//! operations, with per-execution metrics, slow-operation detection, and
//! windowed statistics.

pub mod executor;
pub mod helpers;
pub mod sinks;
pub mod stats;

pub use executor::{QueryExecutor, QueryOptions, QueryResult};
pub use helpers::Pagination;
pub use sinks::{NullMetricsSink, TracingMetricsSink};
