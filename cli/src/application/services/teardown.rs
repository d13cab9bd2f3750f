//! Application service: unconditional teardown.
//!
//! Every step is attempted even if an earlier one failed. Errors are logged
//! and recorded in the returned [`TeardownReport`], never propagated.

use std::path::PathBuf;

use harness_common::{StepStatus, TeardownStep};
use tracing::{error, info, warn};

use crate::application::ports::{
    DiagnosticsCollector, KeyPairStore, LocalFs, ProgressReporter, Provisioner, SigningAgent,
};
use crate::domain::{KeyPair, KeyPairDeletion, ProvisioningConfig, RunContext, TeardownReport};

/// Resources a run has acquired so far, filled in acquisition order.
pub struct Acquired<A> {
    pub run_dir: Option<PathBuf>,
    pub key_pair: Option<KeyPair>,
    pub agent: Option<A>,
    /// Configurations handed to the provisioning tool, recorded before apply.
    pub applied: Vec<ProvisioningConfig>,
}

impl<A> Default for Acquired<A> {
    fn default() -> Self {
        Self {
            run_dir: None,
            key_pair: None,
            agent: None,
            applied: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TeardownOptions {
    /// The run failed; collect diagnostics before destroying anything.
    pub failed: bool,
    pub keep_workdir: bool,
}

/// Release everything in `acquired`, in order: diagnostics (failed runs
/// only), destroy, key pair, agent, run directory.
///
/// The run directory survives when an earlier step failed or diagnostics
/// were written, so leftover state and logs stay inspectable.
#[allow(clippy::too_many_arguments)]
pub async fn teardown<A: SigningAgent>(
    ctx: &RunContext,
    acquired: Acquired<A>,
    provisioner: &impl Provisioner,
    keys: &impl KeyPairStore,
    diagnostics: &impl DiagnosticsCollector,
    fs: &impl LocalFs,
    reporter: &impl ProgressReporter,
    opts: TeardownOptions,
) -> TeardownReport {
    let mut report = TeardownReport::default();
    info!(run_id = %ctx.run_id, failed = opts.failed, "tearing down");

    // CollectDiagnostics
    let status = if !opts.failed {
        StepStatus::Skipped("run passed".into())
    } else if acquired.applied.is_empty() {
        StepStatus::Skipped("nothing applied".into())
    } else {
        reporter.step(TeardownStep::CollectDiagnostics.description());
        outcome(
            TeardownStep::CollectDiagnostics,
            diagnostics
                .collect(&ctx.kubeconfig_path(), &ctx.diagnostics_path())
                .await,
        )
    };
    report.record(TeardownStep::CollectDiagnostics, status);

    // DestroyInfra
    if acquired.applied.is_empty() {
        report.record(
            TeardownStep::DestroyInfra,
            StepStatus::Skipped("nothing applied".into()),
        );
    }
    for config in &acquired.applied {
        reporter.step(TeardownStep::DestroyInfra.description());
        let status = outcome(TeardownStep::DestroyInfra, provisioner.destroy(config).await);
        report.record(TeardownStep::DestroyInfra, status);
    }

    // DeleteKeyPair
    let status = match &acquired.key_pair {
        None => StepStatus::Skipped("no key pair created".into()),
        Some(key) => {
            reporter.step(TeardownStep::DeleteKeyPair.description());
            match keys.delete(&ctx.region, &key.name).await {
                Ok(KeyPairDeletion::Deleted) => StepStatus::Completed,
                Ok(KeyPairDeletion::AlreadyAbsent) => {
                    info!(key_pair = %key.name, "key pair already absent");
                    StepStatus::Skipped("already absent".into())
                }
                Err(e) => outcome(TeardownStep::DeleteKeyPair, Err(e)),
            }
        }
    };
    report.record(TeardownStep::DeleteKeyPair, status);

    // StopAgent
    let status = match &acquired.agent {
        None => StepStatus::Skipped("no agent started".into()),
        Some(agent) => {
            reporter.step(TeardownStep::StopAgent.description());
            outcome(TeardownStep::StopAgent, agent.stop().await)
        }
    };
    report.record(TeardownStep::StopAgent, status);

    // RemoveWorkdir: the run dir holds tfstate and diagnostics.log
    let diagnostics_written =
        report.status_of(TeardownStep::CollectDiagnostics) == Some(&StepStatus::Completed);
    let status = match &acquired.run_dir {
        _ if opts.keep_workdir => StepStatus::Skipped("--keep-workdir".into()),
        None => StepStatus::Skipped("not created".into()),
        Some(dir) if !report.is_clean() => {
            warn!(run_dir = %dir.display(), "keeping run directory for manual cleanup");
            StepStatus::Skipped("earlier teardown step failed; state kept".into())
        }
        Some(dir) if diagnostics_written => {
            info!(run_dir = %dir.display(), "keeping run directory with diagnostics");
            StepStatus::Skipped("diagnostics kept".into())
        }
        Some(dir) => {
            reporter.step(TeardownStep::RemoveWorkdir.description());
            outcome(TeardownStep::RemoveWorkdir, fs.remove_dir_all(dir))
        }
    };
    report.record(TeardownStep::RemoveWorkdir, status);

    if report.is_clean() {
        reporter.success("teardown complete");
    } else {
        reporter.warn("teardown finished with errors; see log for details");
        warn!(failures = report.failures().len(), "teardown incomplete");
    }
    report
}

fn outcome(step: TeardownStep, result: anyhow::Result<()>) -> StepStatus {
    match result {
        Ok(()) => StepStatus::Completed,
        Err(e) => {
            error!(step = ?step, error = %format!("{e:#}"), "teardown step failed");
            StepStatus::Failed(format!("{e:#}"))
        }
    }
}
