//! Error Report Value Objects

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Error category
///
/// Coarse classification of where a failure came from. Assigned by keyword
/// heuristics over the error message unless the caller supplies one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCategory {
    /// Connectivity failure: refused, reset, timed out, offline
    Network,
    /// Remote endpoint returned an error response
    Api,
    /// Credentials rejected or missing
    Auth,
    /// Input rejected as malformed
    Validation,
    /// Rendering or presentation failure
    Ui,
    /// Application logic failure (only assigned explicitly)
    Logic,
    /// Nothing matched
    Unknown,
}

impl ErrorCategory {
    /// Get the category name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Api => "api",
            Self::Auth => "auth",
            Self::Validation => "validation",
            Self::Ui => "ui",
            Self::Logic => "logic",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error severity, ordered from least to most severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorSeverity {
    /// Degraded but harmless
    Low,
    /// Worth attention
    Medium,
    /// Forwarded to the report sink
    High,
    /// Forwarded to the report sink and counted against the circuit
    Critical,
}

impl ErrorSeverity {
    /// Get the severity name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }

    /// Whether reports of this severity go to the external report sink
    pub fn is_reportable(&self) -> bool {
        *self >= Self::High
    }
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where and when an error was observed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportContext {
    /// Time the context was captured
    pub timestamp: DateTime<Utc>,
    /// Operation or component the error originated from; also the circuit key
    pub origin: String,
    /// Free-form diagnostic payload
    pub additional_data: Option<serde_json::Value>,
}

impl ReportContext {
    /// Create a context for the given origin, stamped with the current time
    pub fn new<S: Into<String>>(origin: S) -> Self {
        Self {
            timestamp: Utc::now(),
            origin: origin.into(),
            additional_data: None,
        }
    }

    /// Attach additional diagnostic data
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.additional_data = Some(data);
        self
    }
}

/// Value Object: Error Report
///
/// Snapshot of a classified failure. Breadcrumbs are copied from the
/// coordinator trail at creation time, so later activity does not alter a
/// stored report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorReport {
    /// Unique report identifier
    pub id: String,
    /// Rendered error message
    pub message: String,
    /// Rendered source chain, outermost first
    pub chain: Vec<String>,
    /// Capture context
    pub context: ReportContext,
    /// Assessed or caller-supplied severity
    pub severity: ErrorSeverity,
    /// Assessed or caller-supplied category
    pub category: ErrorCategory,
    /// Whether the failure was recovered from
    pub handled: bool,
    /// Number of retries performed before this report
    pub retry_count: u32,
    /// Breadcrumb trail at creation time
    pub breadcrumbs: Vec<String>,
}

/// Windowed rollup of error reports
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorStats {
    /// Reports inside the window
    pub total: usize,
    /// Counts per category
    pub by_category: HashMap<ErrorCategory, usize>,
    /// Counts per severity
    pub by_severity: HashMap<ErrorSeverity, usize>,
    /// Most frequent messages with their counts, most frequent first
    pub top_messages: Vec<(String, usize)>,
    /// Most recent reports inside the window, newest last
    pub recent: Vec<ErrorReport>,
}
