//! Domain Value Objects
//!
//! Records produced by the resilience and query layers. They are purely
//! diagnostic: control flow never reads them back.
//!
//! | Value Object | Description |
//! |--------------|-------------|
//! | [`ErrorReport`] | Classified failure with breadcrumbs |
//! | [`ErrorStats`] | Windowed rollup of error reports |
//! | [`CircuitState`] | Circuit breaker state for an operation key |
//! | [`QueryMetric`] | Outcome and timing of one wrapped query |
//! | [`QueryStats`] | Windowed rollup of query metrics |

/// Circuit breaker state value object
pub mod circuit;
/// Error taxonomy and report value objects
pub mod error_report;
/// Query metric value objects
pub mod query;

pub use circuit::CircuitState;
pub use error_report::{ErrorCategory, ErrorReport, ErrorSeverity, ErrorStats, ReportContext};
pub use query::{OperationSummary, QueryMetric, QueryStats};
