//! Integration tests for the cluster-harness command line.

#![allow(clippy::expect_used)]

use assert_cmd::Command;
use predicates::prelude::*;

fn harness() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("cluster-harness"));
    cmd.env("NO_COLOR", "1");
    cmd.env_remove("HARNESS_MODULE_DIR");
    cmd
}

// --- Help and version tests ---

#[test]
fn test_cli_no_args_shows_help_and_exits_two() {
    harness().assert().code(2).stderr(predicate::str::contains(
        "Ephemeral cluster integration-test harness",
    ));
}

#[test]
fn test_cli_help_flag_shows_help() {
    harness()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"))
        .stdout(predicate::str::contains("run"));
}

#[test]
fn test_cli_version_flag_shows_version() {
    harness()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("cluster-harness"));
}

#[test]
fn test_version_command_shows_version() {
    harness()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains(concat!(
            "cluster-harness ",
            env!("CARGO_PKG_VERSION")
        )));
}

#[test]
fn test_version_command_json_outputs_valid_json() {
    let output = harness()
        .args(["version", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let value: serde_json::Value =
        serde_json::from_slice(&output).expect("version --json emits JSON");
    assert_eq!(value["version"], env!("CARGO_PKG_VERSION"));
}

// --- run argument handling ---

#[test]
fn test_run_help_lists_retry_and_health_options() {
    harness()
        .args(["run", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--max-retries"))
        .stdout(predicate::str::contains("--health-timeout"))
        .stdout(predicate::str::contains("--keep-workdir"));
}

#[test]
fn test_run_without_module_dir_is_usage_error() {
    harness()
        .arg("run")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--module-dir"));
}

#[test]
fn test_run_rejects_malformed_run_id() {
    harness()
        .args(["run", "--module-dir", ".", "--run-id", "Bad/Id"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--run-id"));
}

#[test]
fn test_run_missing_module_dir_fails_before_acquiring_anything() {
    let dir = tempfile::TempDir::new().expect("temp dir");
    let missing = dir.path().join("no-such-module");
    harness()
        .args(["run", "--data-dir"])
        .arg(dir.path())
        .arg("--module-dir")
        .arg(&missing)
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
    assert!(
        std::fs::read_dir(dir.path())
            .expect("read temp dir")
            .next()
            .is_none(),
        "no run directory is created"
    );
}

#[test]
fn test_run_rejects_invalid_transient_pattern() {
    let dir = tempfile::TempDir::new().expect("temp dir");
    harness()
        .args(["run", "--transient-error", "("])
        .arg("--module-dir")
        .arg(dir.path())
        .env("AWS_REGION", "us-east-1")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid transient error pattern"));
}

#[test]
fn test_run_json_reports_startup_error_as_json() {
    let dir = tempfile::TempDir::new().expect("temp dir");
    let output = harness()
        .args(["--json", "run", "--module-dir"])
        .arg(dir.path().join("no-such-module"))
        .assert()
        .failure()
        .get_output()
        .stdout
        .clone();
    let value: serde_json::Value =
        serde_json::from_slice(&output).expect("startup error is emitted as JSON");
    assert_eq!(value["error"], true);
    assert_eq!(value["code"], "STARTUP_FAILED");
    assert!(
        value["message"]
            .as_str()
            .expect("message string")
            .contains("does not exist")
    );
}

#[test]
fn test_run_json_bad_transient_pattern_has_typed_code() {
    let dir = tempfile::TempDir::new().expect("temp dir");
    let output = harness()
        .args(["run", "--json", "--transient-error", "("])
        .arg("--module-dir")
        .arg(dir.path())
        .assert()
        .failure()
        .get_output()
        .stdout
        .clone();
    let value: serde_json::Value = serde_json::from_slice(&output).expect("JSON error");
    assert_eq!(value["code"], "INVALID_PATTERN");
}
