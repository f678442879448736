//! Retry Tests

use resq_domain::{CircuitState, Error, ErrorSeverity};
use resq_infrastructure::resilience::{ResilienceCoordinator, RetryPolicy};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tokio::time::Instant;

fn policy(max_retries: u32) -> RetryPolicy {
    RetryPolicy::new(
        max_retries,
        Duration::from_millis(100),
        Duration::from_millis(1_000),
        2.0,
    )
}

#[tokio::test(start_paused = true)]
async fn test_succeeds_on_third_attempt_with_backoff() {
    let coordinator = ResilienceCoordinator::default();
    let calls = Arc::new(AtomicU32::new(0));
    let started = Instant::now();

    let result = coordinator
        .with_retry("listings", &policy(3), || {
            let calls = Arc::clone(&calls);
            async move {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(Error::network("connection reset"))
                } else {
                    Ok(42)
                }
            }
        })
        .await;

    assert_eq!(result.unwrap(), 42);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    let waited = started.elapsed();
    assert!(waited >= Duration::from_millis(300), "waited {waited:?}");
    assert!(waited < Duration::from_millis(310), "waited {waited:?}");
    assert!(coordinator.recent_reports(10).is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_exhausted_retries_report_final_failure() {
    let coordinator = ResilienceCoordinator::default();
    let calls = Arc::new(AtomicU32::new(0));

    let result: resq_domain::Result<()> = coordinator
        .with_retry("listings", &policy(2), || {
            let calls = Arc::clone(&calls);
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(Error::api(503, "service unavailable"))
            }
        })
        .await;

    assert!(matches!(result, Err(Error::Api { status: 503, .. })));
    assert_eq!(calls.load(Ordering::SeqCst), 3);

    let reports = coordinator.recent_reports(10);
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].severity, ErrorSeverity::High);
    assert!(!reports[0].handled);
    assert_eq!(reports[0].retry_count, 2);
    assert_eq!(reports[0].context.origin, "listings");
}

#[tokio::test(start_paused = true)]
async fn test_non_retryable_error_fails_after_one_attempt() {
    let coordinator = ResilienceCoordinator::default();
    let calls = Arc::new(AtomicU32::new(0));

    let result: resq_domain::Result<()> = coordinator
        .with_retry("profile", &policy(3), || {
            let calls = Arc::clone(&calls);
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(Error::authentication("session expired"))
            }
        })
        .await;

    assert!(result.is_err());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_custom_predicate_controls_retries() {
    let coordinator = ResilienceCoordinator::default();
    let calls = Arc::new(AtomicU32::new(0));
    let never = policy(3).with_retry_predicate(|_| false);

    let result: resq_domain::Result<()> = coordinator
        .with_retry("search", &never, || {
            let calls = Arc::clone(&calls);
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(Error::network("timeout"))
            }
        })
        .await;

    assert!(result.is_err());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_retries_stop_when_circuit_opens() {
    let coordinator = ResilienceCoordinator::new(
        Default::default(),
        resq_infrastructure::config::CircuitBreakerConfig::default().with_failure_threshold(2),
    );
    let calls = Arc::new(AtomicU32::new(0));

    let result: resq_domain::Result<()> = coordinator
        .with_retry("feed", &policy(5), || {
            let calls = Arc::clone(&calls);
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(Error::network("connection refused"))
            }
        })
        .await;

    assert!(matches!(result, Err(Error::Network { .. })));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert!(coordinator.is_circuit_open("feed"));
}

#[test]
fn test_policy_from_default_config() {
    let policy = RetryPolicy::default();
    assert_eq!(policy.max_retries, 3);
    assert_eq!(policy.delay_for(0), Duration::from_millis(1_000));
    assert_eq!(policy.delay_for(1), Duration::from_millis(2_000));
    assert_eq!(policy.delay_for(10), Duration::from_millis(10_000));
}

#[tokio::test(start_paused = true)]
async fn test_empty_key_uses_global_circuit() {
    let coordinator = ResilienceCoordinator::default();
    for _ in 0..5 {
        coordinator.record_failure("global");
    }

    let result = coordinator
        .with_retry("", &policy(0), || async { Ok(1) })
        .await;
    assert!(matches!(result, Err(Error::CircuitOpen { ref key }) if key == "global"));
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_half_open_trial_reopens_circuit() {
    let coordinator = ResilienceCoordinator::default();
    for _ in 0..5 {
        coordinator.record_failure("listings");
    }
    tokio::time::advance(Duration::from_secs(60)).await;

    let cancelled = tokio::time::timeout(
        Duration::from_secs(1),
        coordinator.with_retry("listings", &policy(0), || async {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Ok(1)
        }),
    )
    .await;
    assert!(cancelled.is_err());
    assert_eq!(coordinator.circuit_state("listings"), CircuitState::Open);

    tokio::time::advance(Duration::from_secs(60)).await;
    let result = coordinator
        .with_retry("listings", &policy(0), || async { Ok(2) })
        .await;
    assert_eq!(result.unwrap(), 2);
    assert_eq!(coordinator.circuit_state("listings"), CircuitState::Closed);
}
