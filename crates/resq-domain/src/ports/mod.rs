//! Domain Port Interfaces
//!
//! Outbound contracts for the diagnostic records the core produces. The
//! infrastructure layer ships tracing-backed implementations; callers can
//! plug in their own.

/// Report and metrics sink ports
pub mod sinks;

pub use sinks::{MetricsSink, ReportSink};
