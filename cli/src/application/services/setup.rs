//! Application service: ephemeral credential acquisition.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.
//! Every acquired resource is recorded in the [`Acquired`] ledger the moment
//! it exists, so teardown releases exactly what was created.

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::application::ports::{
    KeyPairStore, LocalFs, ProgressReporter, SigningAgent, SigningAgentLauncher,
};
use crate::application::services::teardown::Acquired;
use crate::domain::{KeyPair, RunContext};

/// Create the run directory (owner-only).
///
/// The directory is recorded before creation so a partially created tree
/// is still removed by teardown.
///
/// # Errors
///
/// Returns an error if the directory cannot be created.
pub fn create_run_directories<A>(
    ctx: &RunContext,
    fs: &impl LocalFs,
    acquired: &mut Acquired<A>,
) -> Result<()> {
    acquired.run_dir = Some(ctx.run_dir.clone());
    fs.create_dir_all(&ctx.run_dir)
        .with_context(|| format!("creating run directory {}", ctx.run_dir.display()))?;
    debug!(path = %ctx.run_dir.display(), "run directory created");
    Ok(())
}

/// Create and register the run's key pair.
///
/// # Errors
///
/// Returns an error if generation or remote registration fails. Nothing is
/// recorded in that case.
pub async fn create_key_pair<A>(
    ctx: &RunContext,
    keys: &impl KeyPairStore,
    acquired: &mut Acquired<A>,
) -> Result<KeyPair> {
    let name = ctx.key_pair_name();
    let key = keys
        .create(&ctx.region, &ctx.owner, &ctx.run_id, &name)
        .await
        .with_context(|| format!("creating key pair {name} in {}", ctx.region))?;
    acquired.key_pair = Some(key.clone());
    info!(key_pair = %key.name, region = %ctx.region, "key pair created");
    Ok(key)
}

/// Write the private key to `<run dir>/id_rsa` with mode 0600.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn persist_private_key(ctx: &RunContext, key: &KeyPair, fs: &impl LocalFs) -> Result<()> {
    let path = ctx.private_key_path();
    fs.write_private(&path, &key.private_key)
        .with_context(|| format!("writing private key {}", path.display()))
}

/// Start a signing agent holding the run's key.
///
/// # Errors
///
/// Returns an error if the agent cannot start or the key cannot be loaded.
pub async fn start_signing_agent<L: SigningAgentLauncher>(
    key: &KeyPair,
    launcher: &L,
    acquired: &mut Acquired<L::Agent>,
) -> Result<String> {
    let agent = launcher
        .start(key)
        .await
        .context("starting signing agent")?;
    let sock = agent.auth_sock().to_string();
    acquired.agent = Some(agent);
    debug!(auth_sock = %sock, "signing agent started");
    Ok(sock)
}

/// Acquire everything a run needs before provisioning, in order.
///
/// Returns the key pair and the agent socket.
///
/// # Errors
///
/// Returns the first failing step's error. Whatever was acquired before the
/// failure stays in `acquired` for teardown.
pub async fn acquire<L: SigningAgentLauncher>(
    ctx: &RunContext,
    fs: &impl LocalFs,
    keys: &impl KeyPairStore,
    launcher: &L,
    reporter: &impl ProgressReporter,
    acquired: &mut Acquired<L::Agent>,
) -> Result<(KeyPair, String)> {
    reporter.step("creating run directory...");
    create_run_directories(ctx, fs, acquired)?;

    reporter.step("creating key pair...");
    let key = create_key_pair(ctx, keys, acquired).await?;
    persist_private_key(ctx, &key, fs)?;

    reporter.step("starting signing agent...");
    let sock = start_signing_agent(&key, launcher, acquired).await?;
    reporter.success("credentials ready");
    Ok((key, sock))
}
