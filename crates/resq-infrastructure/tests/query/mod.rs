//! Query Execution Tests
