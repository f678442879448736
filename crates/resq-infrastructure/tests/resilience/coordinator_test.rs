//! Resilience Coordinator Tests

use resq_domain::{
    CircuitState, Error, ErrorCategory, ErrorReport, ErrorSeverity, ReportContext, ReportSink,
};
use resq_infrastructure::config::{CircuitBreakerConfig, RetryConfig};
use resq_infrastructure::resilience::{HandleOptions, ResilienceCoordinator};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Default)]
struct CollectingSink {
    reports: Mutex<Vec<ErrorReport>>,
}

impl ReportSink for CollectingSink {
    fn report(&self, report: &ErrorReport) {
        self.reports.lock().unwrap().push(report.clone());
    }
}

#[test]
fn test_handle_error_classifies_and_records() {
    let coordinator = ResilienceCoordinator::default();
    let report = coordinator.handle_error(
        &Error::network("connection refused"),
        ReportContext::new("listings"),
        HandleOptions::default(),
    );

    assert_eq!(report.category, ErrorCategory::Network);
    assert_eq!(report.severity, ErrorSeverity::Medium);
    assert!(report.handled);
    assert!(!report.id.is_empty());
    assert_eq!(coordinator.recent_reports(10), vec![report]);
}

#[test]
fn test_explicit_severity_and_category_override_inference() {
    let coordinator = ResilienceCoordinator::default();
    let report = coordinator.handle_error(
        &Error::internal("widget failed"),
        ReportContext::new("sidebar"),
        HandleOptions::unhandled(ErrorSeverity::Critical).with_category(ErrorCategory::Ui),
    );

    assert_eq!(report.category, ErrorCategory::Ui);
    assert_eq!(report.severity, ErrorSeverity::Critical);
    assert!(!report.handled);
}

#[test]
fn test_only_high_and_critical_reach_the_sink() {
    let sink = Arc::new(CollectingSink::default());
    let coordinator = ResilienceCoordinator::default().with_report_sink(sink.clone());

    coordinator.handle_error(
        &Error::internal("a"),
        ReportContext::new("x"),
        HandleOptions::handled(ErrorSeverity::Low),
    );
    coordinator.handle_error(
        &Error::internal("b"),
        ReportContext::new("x"),
        HandleOptions::handled(ErrorSeverity::Medium),
    );
    coordinator.handle_error(
        &Error::internal("c"),
        ReportContext::new("x"),
        HandleOptions::handled(ErrorSeverity::High),
    );
    coordinator.handle_error(
        &Error::internal("d"),
        ReportContext::new("x"),
        HandleOptions::handled(ErrorSeverity::Critical).suppress_report(),
    );

    let forwarded = sink.reports.lock().unwrap();
    assert_eq!(forwarded.len(), 1);
    assert_eq!(forwarded[0].message, "Internal error: c");
    assert_eq!(coordinator.recent_reports(10).len(), 4);
}

#[tokio::test(start_paused = true)]
async fn test_network_reports_count_against_origin_circuit() {
    let coordinator = ResilienceCoordinator::new(
        RetryConfig::default(),
        CircuitBreakerConfig::default().with_failure_threshold(2),
    );
    for _ in 0..2 {
        coordinator.handle_error(
            &Error::network("dns lookup failed"),
            ReportContext::new("geo"),
            HandleOptions::default(),
        );
    }
    assert_eq!(coordinator.circuit_state("geo"), CircuitState::Open);

    coordinator.handle_error(
        &Error::network("dns lookup failed"),
        ReportContext::new("untracked"),
        HandleOptions::default().without_circuit_tracking(),
    );
    assert!(coordinator.circuit_snapshot("untracked").is_none());
}

#[test]
fn test_breadcrumbs_are_attached_and_capped() {
    let coordinator = ResilienceCoordinator::default();
    for i in 0..60 {
        coordinator.add_breadcrumb(format!("step {i}"));
    }
    let trail = coordinator.breadcrumbs();
    assert_eq!(trail.len(), 50);
    assert_eq!(trail[0], "step 10");
    assert_eq!(trail[49], "step 59");

    let report = coordinator.handle_error(
        &Error::internal("boom"),
        ReportContext::new("x"),
        HandleOptions::default(),
    );
    assert_eq!(report.breadcrumbs, trail);

    coordinator.clear_breadcrumbs();
    assert!(coordinator.breadcrumbs().is_empty());
}

#[test]
fn test_report_buffer_drops_oldest() {
    let coordinator = ResilienceCoordinator::default().with_report_capacity(3);
    for i in 0..5 {
        coordinator.handle_error(
            &Error::internal(format!("failure {i}")),
            ReportContext::new("x"),
            HandleOptions::handled(ErrorSeverity::Low),
        );
    }
    let reports = coordinator.recent_reports(10);
    assert_eq!(reports.len(), 3);
    assert_eq!(reports[0].message, "Internal error: failure 2");
    assert_eq!(coordinator.recent_reports(1)[0].message, "Internal error: failure 4");
}

#[test]
fn test_error_stats_rollup() {
    let coordinator = ResilienceCoordinator::default();
    for _ in 0..3 {
        coordinator.handle_error(
            &Error::network("timeout"),
            ReportContext::new("a"),
            HandleOptions::default().without_circuit_tracking(),
        );
    }
    coordinator.handle_error(
        &Error::validation("price is required"),
        ReportContext::new("b"),
        HandleOptions::default(),
    );

    let stats = coordinator.get_error_stats(Duration::from_secs(3_600));
    assert_eq!(stats.total, 4);
    assert_eq!(stats.by_category.get(&ErrorCategory::Network), Some(&3));
    assert_eq!(stats.by_category.get(&ErrorCategory::Validation), Some(&1));
    assert_eq!(stats.by_severity.get(&ErrorSeverity::Medium), Some(&3));
    assert_eq!(stats.by_severity.get(&ErrorSeverity::Low), Some(&1));
    assert_eq!(stats.top_messages[0], ("Network error: timeout".to_string(), 3));
    assert_eq!(stats.recent.len(), 4);
}

#[tokio::test]
async fn test_graceful_degradation_uses_fallback() {
    let coordinator = ResilienceCoordinator::default();
    let fallback_calls = AtomicUsize::new(0);
    let counter = &fallback_calls;

    let value = coordinator
        .with_graceful_degradation(
            "recommendations",
            || async { Err(Error::network("offline")) },
            move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(vec!["popular"])
            },
        )
        .await
        .unwrap();

    assert_eq!(value, vec!["popular"]);
    assert_eq!(fallback_calls.load(Ordering::SeqCst), 1);
    let reports = coordinator.recent_reports(10);
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].severity, ErrorSeverity::Medium);
    assert!(reports[0].handled);
}

#[tokio::test]
async fn test_graceful_degradation_skips_fallback_on_success() {
    let coordinator = ResilienceCoordinator::default();
    let fallback_calls = AtomicUsize::new(0);
    let counter = &fallback_calls;

    let value = coordinator
        .with_graceful_degradation(
            "recommendations",
            || async { Ok(1) },
            move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(2)
            },
        )
        .await
        .unwrap();

    assert_eq!(value, 1);
    assert_eq!(fallback_calls.load(Ordering::SeqCst), 0);
    assert!(coordinator.recent_reports(10).is_empty());
}

#[tokio::test]
async fn test_graceful_degradation_surfaces_total_failure() {
    let coordinator = ResilienceCoordinator::default();

    let result: resq_domain::Result<u32> = coordinator
        .with_graceful_degradation(
            "recommendations",
            || async { Err(Error::network("offline")) },
            || async { Err(Error::internal("fallback store empty")) },
        )
        .await;

    assert!(matches!(result, Err(Error::Internal { .. })));
    let reports = coordinator.recent_reports(10);
    assert_eq!(reports.len(), 2);
    assert_eq!(reports[1].severity, ErrorSeverity::High);
    assert!(!reports[1].handled);
}
