//! SSH signing agent backed by `ssh-agent` / `ssh-add`.

use std::cell::Cell;

use anyhow::{Context, Result, bail};
use tracing::{debug, warn};

use crate::application::ports::{CommandRunner, SigningAgent, SigningAgentLauncher};
use crate::domain::keys::parse_agent_output;
use crate::domain::{AgentEnv, KeyPair};
use crate::infra::command_runner::DEFAULT_CMD_TIMEOUT;

/// Starts one `ssh-agent` per run.
#[derive(Debug, Clone)]
pub struct SshAgentLauncher<R> {
    runner: R,
}

impl<R: CommandRunner + Clone> SshAgentLauncher<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }
}

impl<R: CommandRunner + Clone> SigningAgentLauncher for SshAgentLauncher<R> {
    type Agent = SshAgent<R>;

    async fn start(&self, key: &KeyPair) -> Result<SshAgent<R>> {
        let out = self.runner.run("ssh-agent", &["-s"]).await?;
        if !out.status.success() {
            bail!(
                "ssh-agent failed: {}",
                String::from_utf8_lossy(&out.stderr).trim()
            );
        }
        let env = parse_agent_output(&String::from_utf8_lossy(&out.stdout))?;
        let agent = SshAgent {
            runner: self.runner.clone(),
            env,
            stopped: Cell::new(false),
        };

        if let Err(e) = agent.add(key).await {
            if let Err(stop_err) = agent.stop().await {
                warn!(pid = agent.env.pid, error = %stop_err, "could not stop half-started agent");
            }
            return Err(e);
        }
        debug!(pid = agent.env.pid, key = %key.name, "key loaded into agent");
        Ok(agent)
    }
}

/// A running `ssh-agent` process.
#[derive(Debug)]
pub struct SshAgent<R> {
    runner: R,
    env: AgentEnv,
    stopped: Cell<bool>,
}

impl<R: CommandRunner> SshAgent<R> {
    fn env_pairs(&self) -> [(&str, String); 2] {
        [
            ("SSH_AUTH_SOCK", self.env.auth_sock.clone()),
            ("SSH_AGENT_PID", self.env.pid.to_string()),
        ]
    }

    async fn add(&self, key: &KeyPair) -> Result<()> {
        let pairs = self.env_pairs();
        let env: Vec<(&str, &str)> = pairs.iter().map(|(k, v)| (*k, v.as_str())).collect();
        let out = self
            .runner
            .run_with_stdin("ssh-add", &["-"], &env, key.private_key.as_bytes())
            .await
            .context("loading key into ssh-agent")?;
        if !out.status.success() {
            bail!(
                "ssh-add failed: {}",
                String::from_utf8_lossy(&out.stderr).trim()
            );
        }
        Ok(())
    }
}

impl<R: CommandRunner> SigningAgent for SshAgent<R> {
    fn auth_sock(&self) -> &str {
        &self.env.auth_sock
    }

    async fn stop(&self) -> Result<()> {
        if self.stopped.get() {
            return Ok(());
        }
        let pairs = self.env_pairs();
        let env: Vec<(&str, &str)> = pairs.iter().map(|(k, v)| (*k, v.as_str())).collect();
        let out = self
            .runner
            .run_with_env("ssh-agent", &["-k"], &env, DEFAULT_CMD_TIMEOUT)
            .await?;
        if !out.status.success() {
            bail!(
                "ssh-agent -k failed: {}",
                String::from_utf8_lossy(&out.stderr).trim()
            );
        }
        self.stopped.set(true);
        debug!(pid = self.env.pid, "ssh-agent stopped");
        Ok(())
    }
}
