//! Timing Tests

use resq_infrastructure::TimedOperation;
use std::time::Duration;

#[tokio::test(start_paused = true)]
async fn test_elapsed_follows_tokio_clock() {
    let timer = TimedOperation::start();
    tokio::time::advance(Duration::from_millis(250)).await;

    assert_eq!(timer.elapsed(), Duration::from_millis(250));
    assert_eq!(timer.elapsed_ms(), 250);
    assert!((timer.elapsed_ms_f64() - 250.0).abs() < 1e-6);
}
