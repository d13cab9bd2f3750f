//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain`: never from `crate::infra`,
//! `crate::commands`, or `crate::output`.

use std::path::Path;
use std::process::Output;
use std::time::Duration;

use anyhow::Result;

use crate::domain::{KeyPair, KeyPairDeletion, NodeList, PodList, ProvisioningConfig, Release};

// ── Command Runner Port ───────────────────────────────────────────────────────

/// Abstracts process execution so infrastructure can be swapped or mocked.
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    /// Run a program and capture its output.
    ///
    /// Implementations should delegate to `run_with_env` using the
    /// instance's configured default timeout and no extra environment.
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output>;
    /// Run a program with extra environment variables and a timeout override.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned or exceeds `timeout`.
    /// On timeout, the child process must be killed (not left orphaned).
    async fn run_with_env(
        &self,
        program: &str,
        args: &[&str],
        env: &[(&str, &str)],
        timeout: Duration,
    ) -> Result<Output>;
    /// Run a program with stdin piped from `input`.
    async fn run_with_stdin(
        &self,
        program: &str,
        args: &[&str],
        env: &[(&str, &str)],
        input: &[u8],
    ) -> Result<Output>;
}

// ── Credential Ports ──────────────────────────────────────────────────────────

/// Remote key-pair registry of the cloud provider.
#[allow(async_fn_in_trait)]
pub trait KeyPairStore {
    /// Generate a key pair locally and register its public half remotely.
    ///
    /// On error nothing must exist remotely.
    async fn create(&self, region: &str, owner: &str, run_id: &str, name: &str)
    -> Result<KeyPair>;
    /// Delete a registered key pair. A pair that is already gone is
    /// reported as [`KeyPairDeletion::AlreadyAbsent`], not as an error.
    async fn delete(&self, region: &str, name: &str) -> Result<KeyPairDeletion>;
}

/// Starts a signing agent holding one private key.
#[allow(async_fn_in_trait)]
pub trait SigningAgentLauncher {
    type Agent: SigningAgent;

    /// Start an agent and load `key` into it. If loading fails, the
    /// half-started agent must be stopped before the error is returned.
    async fn start(&self, key: &KeyPair) -> Result<Self::Agent>;
}

/// A running signing agent.
#[allow(async_fn_in_trait)]
pub trait SigningAgent {
    /// Socket clients use to reach the agent.
    fn auth_sock(&self) -> &str;
    /// Stop the agent. Calling this again after success is a no-op.
    async fn stop(&self) -> Result<()>;
}

// ── Release Port ──────────────────────────────────────────────────────────────

/// Source of release metadata for a product.
#[allow(async_fn_in_trait)]
pub trait ReleaseSource {
    /// All releases published under `repo` (`owner/name`).
    async fn releases(&self, repo: &str) -> Result<Vec<Release>>;
}

// ── Provisioning Ports ────────────────────────────────────────────────────────

/// The infrastructure-as-code tool.
#[allow(async_fn_in_trait)]
pub trait Provisioner {
    /// Initialise the module and apply it once.
    ///
    /// The error's display text must carry the tool's own error output so
    /// callers can classify it.
    async fn init_and_apply(&self, config: &ProvisioningConfig) -> Result<()>;
    /// Destroy everything the configuration created.
    async fn destroy(&self, config: &ProvisioningConfig) -> Result<()>;
}

/// Read access to a running cluster.
#[allow(async_fn_in_trait)]
pub trait ClusterProbe {
    async fn nodes(&self, kubeconfig: &Path) -> Result<NodeList>;
    async fn pods(&self, kubeconfig: &Path) -> Result<PodList>;
}

/// Dumps cluster state for post-mortem debugging.
#[allow(async_fn_in_trait)]
pub trait DiagnosticsCollector {
    /// Collect diagnostics using `kubeconfig` and write them to `dest`.
    async fn collect(&self, kubeconfig: &Path, dest: &Path) -> Result<()>;
}

// ── Filesystem Port ───────────────────────────────────────────────────────────

/// Local filesystem operations on run directories.
pub trait LocalFs {
    /// Create `path` and its parents, owner-only.
    fn create_dir_all(&self, path: &Path) -> Result<()>;
    /// Write `contents` to `path`, readable only by the owner (mode 0600).
    fn write_private(&self, path: &Path, contents: &str) -> Result<()>;
    /// Remove `path` recursively; a missing path is not an error.
    fn remove_dir_all(&self, path: &Path) -> Result<()>;
    fn exists(&self, path: &Path) -> bool;
}

// ── Progress Reporting Port ───────────────────────────────────────────────────

/// Abstracts progress reporting so services can emit events without
/// depending on the Presentation layer. Sync trait, no async needed.
pub trait ProgressReporter {
    /// Emit an in-progress step message.
    fn step(&self, message: &str);
    /// Emit a success message.
    fn success(&self, message: &str);
    /// Emit a warning message.
    fn warn(&self, message: &str);
}
