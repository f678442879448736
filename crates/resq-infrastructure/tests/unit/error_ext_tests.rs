//! Error Extension Tests

use resq_domain::{Error, ErrorCategory};
use resq_infrastructure::error_ext::ErrorContext;
use resq_infrastructure::resilience::categorize_error;
use std::io;

fn io_failure() -> Result<(), io::Error> {
    Err(io::Error::new(io::ErrorKind::ConnectionReset, "peer reset"))
}

#[test]
fn test_context_wraps_as_operation_error() {
    let err = io_failure().context("loading listings").unwrap_err();
    assert!(matches!(err, Error::Operation { .. }));
    assert_eq!(err.to_string(), "Operation failed: loading listings: peer reset");
    assert_eq!(err.chain(), vec!["peer reset".to_string()]);
}

#[test]
fn test_with_context_is_lazy() {
    let ok: Result<u32, io::Error> = Ok(1);
    let value = ok
        .with_context(|| -> String { unreachable!("context built for a success") })
        .unwrap();
    assert_eq!(value, 1);

    let err = io_failure()
        .with_context(|| format!("page {}", 3))
        .unwrap_err();
    assert!(err.to_string().contains("page 3"));
}

#[test]
fn test_network_context_is_classified_as_network() {
    let err = io_failure().network_context("listing request").unwrap_err();
    assert!(matches!(err, Error::Network { .. }));
    assert_eq!(categorize_error(&err), ErrorCategory::Network);
}

#[test]
fn test_config_context() {
    let err = io_failure().config_context("reading overrides").unwrap_err();
    assert!(matches!(err, Error::Configuration { .. }));
}

#[test]
fn test_api_context_keeps_status() {
    let err = io_failure().api_context(503, "listing service").unwrap_err();
    assert!(matches!(err, Error::Api { status: 503, .. }));
    assert_eq!(categorize_error(&err), ErrorCategory::Api);
}
