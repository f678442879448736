//! Resilience coordination
//!
//! Error classification, breadcrumbs, retry with exponential backoff,
//! per-key circuit breakers, and graceful degradation, composed by
//! [`ResilienceCoordinator`].

pub mod breadcrumbs;
pub mod circuit_breaker;
pub mod classify;
pub mod coordinator;
pub mod retry;
pub mod sinks;

pub use breadcrumbs::BreadcrumbTrail;
pub use circuit_breaker::{CallPermit, CircuitBreakerRegistry, CircuitSnapshot};
pub use classify::{assess_severity, categorize_error};
pub use coordinator::{HandleOptions, ResilienceCoordinator};
pub use retry::{RetryPolicy, default_retry_predicate};
pub use sinks::{NullReportSink, TracingReportSink};
