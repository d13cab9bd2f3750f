//! Application context and production adapter wiring.
//!
//! `AppContext` carries presentation state for command handlers;
//! `Adapters` is the one place production port implementations are built.

use std::time::Duration;

use harness_common::ProviderEnv;

use crate::infra::agent::SshAgentLauncher;
use crate::infra::command_runner::TokioCommandRunner;
use crate::infra::fs::HostFs;
use crate::infra::keypair::AwsKeyPairStore;
use crate::infra::kubectl::Kubectl;
use crate::infra::releases::GithubReleases;
use crate::infra::terraform::TerraformCli;
use crate::output::OutputContext;

/// Output rendering mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-readable terminal output (default).
    Human,
    /// Machine-readable JSON output.
    Json,
}

/// Flags passed from the top-level CLI to `AppContext::new`.
pub struct AppFlags {
    pub no_color: bool,
    pub quiet: bool,
    pub json: bool,
}

/// Unified application context passed to every command handler.
pub struct AppContext {
    /// Terminal output context (colors, quiet mode).
    pub output: OutputContext,
    /// Output rendering mode (human vs JSON).
    pub mode: OutputMode,
}

impl AppContext {
    /// Construct an `AppContext` from top-level CLI flags.
    ///
    /// JSON mode silences progress output so stdout carries only the report.
    #[must_use]
    pub fn new(flags: &AppFlags) -> Self {
        let mode = if flags.json {
            OutputMode::Json
        } else {
            OutputMode::Human
        };
        Self {
            output: OutputContext::new(flags.no_color, flags.quiet || flags.json),
            mode,
        }
    }

    /// Returns `true` when JSON output mode is active.
    #[must_use]
    pub fn is_json(&self) -> bool {
        self.mode == OutputMode::Json
    }
}

/// Production implementations of every port the harness needs.
pub struct Adapters {
    pub fs: HostFs,
    pub keys: AwsKeyPairStore<TokioCommandRunner>,
    pub agents: SshAgentLauncher<TokioCommandRunner>,
    pub releases: GithubReleases,
    pub provisioner: TerraformCli<TokioCommandRunner>,
    pub kubectl: Kubectl<TokioCommandRunner>,
}

impl Adapters {
    #[must_use]
    pub fn production(
        provider: &ProviderEnv,
        apply_timeout: Duration,
        terraform_bin: &str,
    ) -> Self {
        let runner = TokioCommandRunner::default();
        Self {
            fs: HostFs,
            keys: AwsKeyPairStore::new(runner),
            agents: SshAgentLauncher::new(runner),
            releases: GithubReleases::from_provider(provider),
            provisioner: TerraformCli::new(runner, apply_timeout).with_binary(terraform_bin),
            kubectl: Kubectl::new(runner),
        }
    }
}
