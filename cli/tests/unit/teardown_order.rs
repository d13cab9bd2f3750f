//! Teardown coordinator: ordering, best-effort semantics, single execution.

#![allow(clippy::unwrap_used)]

use std::path::{Path, PathBuf};

use cluster_harness::application::ports::LocalFs;
use cluster_harness::application::services::teardown::{Acquired, TeardownOptions, teardown};
use cluster_harness::domain::{KeyPair, ProvisioningConfig, RetryPolicy, RunContext};
use cluster_harness::infra::fs::HostFs;
use harness_common::{ProviderEnv, StepStatus, TeardownStep};

use crate::mocks::{FakeAgent, World, context, count, position};

fn config(module: &str) -> ProvisioningConfig {
    ProvisioningConfig {
        module_dir: PathBuf::from(module),
        vars: Default::default(),
        env: Default::default(),
        retry: RetryPolicy::default(),
    }
}

fn key() -> KeyPair {
    KeyPair {
        name: "tf-r1".into(),
        public_key: "ssh-rsa AAAA".into(),
        private_key: "PRIVATE".into(),
    }
}

async fn full_ledger(world: &World) -> Acquired<FakeAgent> {
    use cluster_harness::application::ports::SigningAgentLauncher;
    Acquired {
        run_dir: Some(PathBuf::from("/data/r1")),
        key_pair: Some(key()),
        agent: Some(world.agents.start(&key()).await.unwrap()),
        applied: vec![config("/mod/a"), config("/mod/b")],
    }
}

#[tokio::test]
async fn every_destroy_is_attempted_even_after_a_failure() {
    let mut world = World::new();
    world.provisioner.fail_destroy = true;
    let acquired = full_ledger(&world).await;

    let report = teardown(
        &context(),
        acquired,
        &world.provisioner,
        &world.keys,
        &world.diagnostics,
        &world.fs,
        &world.reporter,
        TeardownOptions {
            failed: true,
            keep_workdir: false,
        },
    )
    .await;

    let log = world.entries();
    assert_eq!(count(&log, "tf.destroy /mod/a"), 1);
    assert_eq!(count(&log, "tf.destroy /mod/b"), 1);
    assert_eq!(count(&log, "keys.delete"), 1);
    assert_eq!(count(&log, "agent.stop"), 1);
    assert_eq!(count(&log, "fs.rmdir"), 0, "state of leaked infrastructure is kept");
    assert_eq!(
        report.status_of(TeardownStep::RemoveWorkdir),
        Some(&StepStatus::Skipped(
            "earlier teardown step failed; state kept".into()
        ))
    );

    let failures = report.failures();
    assert_eq!(failures.len(), 2);
    assert!(failures.iter().all(|(step, _)| *step == TeardownStep::DestroyInfra));
}

#[tokio::test]
async fn steps_run_in_fixed_order() {
    let world = World::new();
    let acquired = full_ledger(&world).await;

    let report = teardown(
        &context(),
        acquired,
        &world.provisioner,
        &world.keys,
        &world.diagnostics,
        &world.fs,
        &world.reporter,
        TeardownOptions {
            failed: true,
            keep_workdir: false,
        },
    )
    .await;

    assert_eq!(report.order(), TeardownStep::ORDER.to_vec());
    let log = world.entries();
    let diag = position(&log, "diag /data/r1/kubeconfig -> /data/r1/diagnostics.log").unwrap();
    let destroy = position(&log, "tf.destroy").unwrap();
    let delete = position(&log, "keys.delete").unwrap();
    let stop = position(&log, "agent.stop").unwrap();
    assert!(diag < destroy && destroy < delete && delete < stop);
    assert_eq!(
        report.status_of(TeardownStep::RemoveWorkdir),
        Some(&StepStatus::Skipped("diagnostics kept".into()))
    );
}

#[tokio::test]
async fn empty_ledger_skips_everything() {
    let world = World::new();
    let report = teardown(
        &context(),
        Acquired::<FakeAgent>::default(),
        &world.provisioner,
        &world.keys,
        &world.diagnostics,
        &world.fs,
        &world.reporter,
        TeardownOptions {
            failed: true,
            keep_workdir: false,
        },
    )
    .await;

    assert!(world.entries().is_empty());
    assert!(report.is_clean());
    assert_eq!(
        report.status_of(TeardownStep::CollectDiagnostics),
        Some(&StepStatus::Skipped("nothing applied".into()))
    );
    assert_eq!(
        report.status_of(TeardownStep::DestroyInfra),
        Some(&StepStatus::Skipped("nothing applied".into()))
    );
}

#[tokio::test]
async fn passing_run_skips_diagnostics() {
    let world = World::new();
    let acquired = full_ledger(&world).await;
    let report = teardown(
        &context(),
        acquired,
        &world.provisioner,
        &world.keys,
        &world.diagnostics,
        &world.fs,
        &world.reporter,
        TeardownOptions::default(),
    )
    .await;
    let log = world.entries();
    assert_eq!(count(&log, "diag"), 0);
    assert_eq!(
        report.status_of(TeardownStep::CollectDiagnostics),
        Some(&StepStatus::Skipped("run passed".into()))
    );
    let stop = position(&log, "agent.stop").unwrap();
    let rmdir = position(&log, "fs.rmdir /data/r1").unwrap();
    assert!(stop < rmdir);
    assert_eq!(report.status_of(TeardownStep::RemoveWorkdir), Some(&StepStatus::Completed));
}

#[tokio::test]
async fn failed_destroy_keeps_state_file_on_disk() {
    let tmp = tempfile::tempdir().unwrap();
    let ctx = RunContext::new(
        "r1",
        "ci@example.com",
        tmp.path(),
        Path::new("/modules/downstream"),
        &ProviderEnv::default(),
        None,
    );
    HostFs.create_dir_all(&ctx.run_dir).unwrap();
    let state = ctx.run_dir.join("tfstate");
    std::fs::write(&state, "{}").unwrap();

    let mut world = World::new();
    world.provisioner.fail_destroy = true;
    let acquired = Acquired::<FakeAgent> {
        run_dir: Some(ctx.run_dir.clone()),
        applied: vec![config("/modules/downstream")],
        ..Acquired::default()
    };

    let report = teardown(
        &ctx,
        acquired,
        &world.provisioner,
        &world.keys,
        &world.diagnostics,
        &HostFs,
        &world.reporter,
        TeardownOptions {
            failed: true,
            keep_workdir: false,
        },
    )
    .await;

    assert!(matches!(
        report.status_of(TeardownStep::DestroyInfra),
        Some(StepStatus::Failed(_))
    ));
    assert!(state.exists(), "tfstate must survive a failed destroy");
    assert!(ctx.run_dir.is_dir());
}

#[tokio::test]
async fn clean_passing_teardown_removes_run_directory_from_disk() {
    let tmp = tempfile::tempdir().unwrap();
    let ctx = RunContext::new(
        "r1",
        "ci@example.com",
        tmp.path(),
        Path::new("/modules/downstream"),
        &ProviderEnv::default(),
        None,
    );
    HostFs.create_dir_all(&ctx.run_dir).unwrap();
    std::fs::write(ctx.run_dir.join("tfstate"), "{}").unwrap();

    let world = World::new();
    let acquired = Acquired::<FakeAgent> {
        run_dir: Some(ctx.run_dir.clone()),
        applied: vec![config("/modules/downstream")],
        ..Acquired::default()
    };
    let report = teardown(
        &ctx,
        acquired,
        &world.provisioner,
        &world.keys,
        &world.diagnostics,
        &HostFs,
        &world.reporter,
        TeardownOptions::default(),
    )
    .await;

    assert!(report.is_clean());
    assert!(!ctx.run_dir.exists());
}
