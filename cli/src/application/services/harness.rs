//! Application service: one full provision/validate/teardown cycle.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.
//! Teardown runs exactly once per call, whatever the outcome.

use chrono::{DateTime, Utc};
use harness_common::RunPhase;
use tracing::{Instrument, debug, info_span};

use crate::application::ports::{
    ClusterProbe, DiagnosticsCollector, KeyPairStore, LocalFs, ProgressReporter, Provisioner,
    ReleaseSource, SigningAgentLauncher,
};
use crate::application::services::teardown::{Acquired, TeardownOptions, teardown};
use crate::application::services::{health, provision, resolve, setup};
use crate::domain::{
    HealthPolicy, Products, ResolvedVersions, RetryPolicy, RunContext, RunError, TeardownReport,
    build_provisioning_config,
};

/// Injected adapters for every external collaborator.
pub struct Collaborators<'a, F, K, L, S, P, C, D, R> {
    pub fs: &'a F,
    pub keys: &'a K,
    pub agents: &'a L,
    pub releases: &'a S,
    pub provisioner: &'a P,
    pub probe: &'a C,
    pub diagnostics: &'a D,
    pub reporter: &'a R,
}

/// Tuning that is policy, not orchestration.
#[derive(Debug, Clone, Default)]
pub struct HarnessOptions {
    pub products: Products,
    /// Explicit platform version; skips the release lookup for it.
    pub platform_override: Option<String>,
    pub retry: RetryPolicy,
    pub health: HealthPolicy,
    pub keep_workdir: bool,
}

/// Everything observable about a finished run.
#[derive(Debug)]
pub struct RunReport {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Phases in the order they were entered.
    pub phases: Vec<RunPhase>,
    pub versions: Option<ResolvedVersions>,
    pub outcome: Result<(), RunError>,
    pub teardown: TeardownReport,
}

impl RunReport {
    #[must_use]
    pub fn passed(&self) -> bool {
        self.outcome.is_ok()
    }
}

struct PhaseLog(Vec<RunPhase>);

impl PhaseLog {
    fn advance(&mut self, next: RunPhase) {
        if let Some(&current) = self.0.last() {
            debug_assert!(
                current.can_transition_to(next),
                "illegal phase transition {current:?} -> {next:?}"
            );
        }
        debug!(phase = ?next, "{}", next.description());
        self.0.push(next);
    }
}

/// Run one full cycle against `ctx`.
///
/// Never returns early: every failure is captured in
/// [`RunReport::outcome`] after teardown has run.
pub async fn run_harness<F, K, L, S, P, C, D, R>(
    ctx: &RunContext,
    c: &Collaborators<'_, F, K, L, S, P, C, D, R>,
    opts: &HarnessOptions,
) -> RunReport
where
    F: LocalFs,
    K: KeyPairStore,
    L: SigningAgentLauncher,
    S: ReleaseSource,
    P: Provisioner,
    C: ClusterProbe,
    D: DiagnosticsCollector,
    R: ProgressReporter,
{
    let span = info_span!("run", run_id = %ctx.run_id);
    async {
        let started_at = Utc::now();
        let mut phases = PhaseLog(vec![RunPhase::Init]);
        let mut acquired = Acquired::default();
        let mut versions = None;

        let outcome = execute(ctx, c, opts, &mut acquired, &mut phases, &mut versions).await;

        phases.advance(RunPhase::Teardown);
        let teardown = teardown(
            ctx,
            acquired,
            c.provisioner,
            c.keys,
            c.diagnostics,
            c.fs,
            c.reporter,
            TeardownOptions {
                failed: outcome.is_err(),
                keep_workdir: opts.keep_workdir,
            },
        )
        .await;
        phases.advance(RunPhase::Done);

        RunReport {
            run_id: ctx.run_id.clone(),
            started_at,
            finished_at: Utc::now(),
            phases: phases.0,
            versions,
            outcome,
            teardown,
        }
    }
    .instrument(span)
    .await
}

async fn execute<F, K, L, S, P, C, D, R>(
    ctx: &RunContext,
    c: &Collaborators<'_, F, K, L, S, P, C, D, R>,
    opts: &HarnessOptions,
    acquired: &mut Acquired<L::Agent>,
    phases: &mut PhaseLog,
    resolved: &mut Option<ResolvedVersions>,
) -> Result<(), RunError>
where
    F: LocalFs,
    K: KeyPairStore,
    L: SigningAgentLauncher,
    S: ReleaseSource,
    P: Provisioner,
    C: ClusterProbe,
    D: DiagnosticsCollector,
    R: ProgressReporter,
{
    let (key, auth_sock) = setup::acquire(ctx, c.fs, c.keys, c.agents, c.reporter, acquired)
        .await
        .map_err(RunError::Setup)?;

    c.reporter.step("resolving release versions...");
    let versions = resolve::resolve_versions(
        c.releases,
        &opts.products,
        opts.platform_override.as_deref(),
    )
    .await
    .map_err(RunError::Resolve)?;
    *resolved = Some(versions.clone());

    let config = build_provisioning_config(
        ctx,
        &key,
        &versions,
        &opts.products,
        &auth_sock,
        opts.retry.clone(),
    );
    acquired.applied.push(config.clone());

    phases.advance(RunPhase::Provisioning);
    let cluster = match provision::apply_with_retry(
        c.provisioner,
        &config,
        ctx.kubeconfig_path(),
        c.reporter,
    )
    .await
    {
        Ok(cluster) => cluster,
        Err(e) => {
            phases.advance(RunPhase::Failed);
            return Err(e.into());
        }
    };
    phases.advance(RunPhase::Provisioned);

    phases.advance(RunPhase::Validating);
    if let Err(e) = health::wait_ready(c.probe, &cluster, &opts.health, c.reporter).await {
        phases.advance(RunPhase::ValidationFailed);
        return Err(RunError::Validation(e));
    }
    phases.advance(RunPhase::Ready);
    Ok(())
}
