//! # Domain Layer
//!
//! Types shared by the cache store, the resilience coordinator, and the
//! query execution wrapper: the error taxonomy, diagnostic records, and the
//! sink ports that receive them.
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`error`] | `Error` enum and `Result` alias |
//! | [`value_objects`] | Error reports, categories, query metrics, statistics |
//! | [`ports`] | Report and metrics sink contracts |
//! | [`constants`] | Diagnostic buffer bounds |

pub mod constants;
pub mod error;
pub mod ports;
pub mod value_objects;

pub use error::{Error, Result};
pub use ports::{MetricsSink, ReportSink};
pub use value_objects::{
    CircuitState, ErrorCategory, ErrorReport, ErrorSeverity, ErrorStats, QueryMetric, QueryStats,
    ReportContext,
};
