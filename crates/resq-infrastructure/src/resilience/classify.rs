//! Error classification heuristics
//!
//! Category and severity are assigned by keyword matching over the rendered
//! error message. The tables are checked in priority order and the first
//! hit wins. Message matching is inherently fragile: a fetch that can report
//! structured status should surface it through a typed `Error` variant, whose
//! display prefix then matches here deterministically.

use resq_domain::{Error, ErrorCategory, ErrorSeverity};

const NETWORK_KEYWORDS: &[&str] = &[
    "network",
    "fetch",
    "connection",
    "timeout",
    "timed out",
    "econnrefused",
    "econnreset",
    "offline",
    "dns",
];

const AUTH_KEYWORDS: &[&str] = &[
    "401",
    "403",
    "unauthorized",
    "forbidden",
    "auth",
    "token",
    "permission",
];

const VALIDATION_KEYWORDS: &[&str] = &["400", "422", "validation", "invalid", "required", "malformed"];

const API_KEYWORDS: &[&str] = &["api", "endpoint", "http", "response", "status"];

const UI_KEYWORDS: &[&str] = &["render", "component", "element", "view"];

const CRITICAL_KEYWORDS: &[&str] = &[
    "out of memory",
    "stack overflow",
    "maximum call stack",
    "memory allocation",
];

const SERVER_ERROR_KEYWORDS: &[&str] = &["500", "502", "503", "504", "internal server"];

const CLIENT_ERROR_KEYWORDS: &[&str] = &["400", "404", "409", "422", "bad request", "not found"];

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| haystack.contains(needle))
}

/// Categorize an error message
pub fn categorize_message(message: &str) -> ErrorCategory {
    let message = message.to_lowercase();

    if contains_any(&message, NETWORK_KEYWORDS) {
        ErrorCategory::Network
    } else if contains_any(&message, AUTH_KEYWORDS) {
        ErrorCategory::Auth
    } else if contains_any(&message, VALIDATION_KEYWORDS) {
        ErrorCategory::Validation
    } else if contains_any(&message, API_KEYWORDS) {
        ErrorCategory::Api
    } else if contains_any(&message, UI_KEYWORDS) {
        ErrorCategory::Ui
    } else {
        ErrorCategory::Unknown
    }
}

/// Assess the severity of an error message given its category
pub fn assess_message_severity(message: &str, category: ErrorCategory) -> ErrorSeverity {
    let message = message.to_lowercase();

    if contains_any(&message, CRITICAL_KEYWORDS) {
        ErrorSeverity::Critical
    } else if category == ErrorCategory::Auth || contains_any(&message, SERVER_ERROR_KEYWORDS) {
        ErrorSeverity::High
    } else if matches!(category, ErrorCategory::Network | ErrorCategory::Api)
        || contains_any(&message, CLIENT_ERROR_KEYWORDS)
    {
        ErrorSeverity::Medium
    } else {
        ErrorSeverity::Low
    }
}

/// Categorize a domain error by its rendered message
pub fn categorize_error(error: &Error) -> ErrorCategory {
    categorize_message(&error.to_string())
}

/// Assess the severity of a domain error by its rendered message
pub fn assess_severity(error: &Error, category: ErrorCategory) -> ErrorSeverity {
    assess_message_severity(&error.to_string(), category)
}
