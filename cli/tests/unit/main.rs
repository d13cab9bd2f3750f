//! Unit tests for cluster-harness
//!
//! These tests use mocked dependencies and run fast without external I/O.

mod architecture;
mod retry_policy;
mod teardown_order;
