//! Resilience Coordinator Tests

mod coordinator_test;
mod retry_test;
