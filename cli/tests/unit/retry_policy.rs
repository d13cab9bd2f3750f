//! Apply retry: transient errors retried up to the bound, others never.

#![allow(clippy::unwrap_used)]

use std::path::PathBuf;
use std::time::Duration;

use cluster_harness::application::services::provision::apply_with_retry;
use cluster_harness::domain::{
    ProvisionError, ProvisioningConfig, RetryPolicy, TransientErrors,
};

use crate::mocks::{FakeProvisioner, RecordingReporter, new_log};

fn config(max_retries: u32, transient: TransientErrors) -> ProvisioningConfig {
    ProvisioningConfig {
        module_dir: PathBuf::from("/mod"),
        vars: Default::default(),
        env: Default::default(),
        retry: RetryPolicy {
            max_retries,
            delay: Duration::ZERO,
            transient,
        },
    }
}

const THROTTLED: &str = "Error: creating EC2 Instance: RequestLimitExceeded: Request limit exceeded.";

#[tokio::test]
async fn transient_errors_are_retried_until_success() {
    let log = new_log();
    let tf = FakeProvisioner::new(&log).failing_with(&[THROTTLED, THROTTLED]);
    let reporter = RecordingReporter::default();

    let cluster = apply_with_retry(
        &tf,
        &config(3, TransientErrors::default()),
        PathBuf::from("/data/r1/kubeconfig"),
        &reporter,
    )
    .await
    .unwrap();

    assert_eq!(cluster.kubeconfig, PathBuf::from("/data/r1/kubeconfig"));
    assert_eq!(tf.applies(), 3);
    let warnings = reporter
        .messages
        .borrow()
        .iter()
        .filter(|m| m.starts_with("warn:"))
        .count();
    assert_eq!(warnings, 2);
}

#[tokio::test]
async fn retries_stop_at_the_bound() {
    let log = new_log();
    let tf = FakeProvisioner::new(&log).failing_with(&[THROTTLED; 5]);

    let err = apply_with_retry(
        &tf,
        &config(2, TransientErrors::default()),
        PathBuf::from("/k"),
        &RecordingReporter::default(),
    )
    .await
    .unwrap_err();

    assert_eq!(
        err,
        ProvisionError::RetriesExhausted {
            attempts: 3,
            message: THROTTLED.into(),
        }
    );
    assert_eq!(tf.applies(), 3);
}

#[tokio::test]
async fn non_transient_error_is_never_retried() {
    let log = new_log();
    let tf = FakeProvisioner::new(&log).failing_with(&["Error: Unsupported argument", THROTTLED]);

    let err = apply_with_retry(
        &tf,
        &config(5, TransientErrors::default()),
        PathBuf::from("/k"),
        &RecordingReporter::default(),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, ProvisionError::Terminal { attempts: 1, .. }));
    assert_eq!(tf.applies(), 1);
}

#[tokio::test]
async fn zero_retries_means_one_attempt() {
    let log = new_log();
    let tf = FakeProvisioner::new(&log).failing_with(&[THROTTLED]);
    let err = apply_with_retry(
        &tf,
        &config(0, TransientErrors::default()),
        PathBuf::from("/k"),
        &RecordingReporter::default(),
    )
    .await
    .unwrap_err();
    assert_eq!(err.attempts(), 1);
    assert!(matches!(err, ProvisionError::RetriesExhausted { .. }));
}

#[tokio::test]
async fn classifier_is_injectable() {
    let log = new_log();
    let tf = FakeProvisioner::new(&log).failing_with(&["quota exceeded for vCPU", THROTTLED]);
    let custom = TransientErrors::new(&["quota exceeded"]).unwrap();

    let err = apply_with_retry(
        &tf,
        &config(3, custom),
        PathBuf::from("/k"),
        &RecordingReporter::default(),
    )
    .await
    .unwrap_err();

    // the custom set knows nothing about throttling
    assert_eq!(
        err,
        ProvisionError::Terminal {
            attempts: 2,
            message: THROTTLED.into(),
        }
    );
}

#[tokio::test]
async fn none_classifier_fails_fast() {
    let log = new_log();
    let tf = FakeProvisioner::new(&log).failing_with(&[THROTTLED]);
    let err = apply_with_retry(
        &tf,
        &config(3, TransientErrors::none()),
        PathBuf::from("/k"),
        &RecordingReporter::default(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ProvisionError::Terminal { attempts: 1, .. }));
}
