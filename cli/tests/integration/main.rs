//! Integration tests for cluster-harness
//!
//! These tests spawn the actual binary and test argument handling end to end.
//! None of them reach a cloud provider.

mod cli_tests;
