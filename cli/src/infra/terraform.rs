//! Terraform CLI implementation of the `Provisioner` port.

use std::time::Duration;

use anyhow::{Result, bail};
use tracing::{debug, info};

use crate::application::ports::{CommandRunner, Provisioner};
use crate::domain::ProvisioningConfig;

/// Default bound on a single `apply` or `destroy`.
pub const DEFAULT_APPLY_TIMEOUT: Duration = Duration::from_secs(90 * 60);

/// Drives `terraform` as a child process.
#[derive(Debug, Clone)]
pub struct TerraformCli<R> {
    runner: R,
    binary: String,
    timeout: Duration,
}

impl<R: CommandRunner> TerraformCli<R> {
    pub fn new(runner: R, timeout: Duration) -> Self {
        Self {
            runner,
            binary: "terraform".to_string(),
            timeout,
        }
    }

    /// Use a different executable (e.g. `tofu`).
    #[must_use]
    pub fn with_binary(mut self, binary: &str) -> Self {
        self.binary = binary.to_string();
        self
    }

    async fn invoke(&self, config: &ProvisioningConfig, verb: &str, args: &[String]) -> Result<()> {
        let chdir = format!("-chdir={}", config.module_dir.display());
        let mut argv: Vec<&str> = vec![chdir.as_str(), verb];
        argv.extend(args.iter().map(String::as_str));
        let env: Vec<(&str, &str)> = config
            .env
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();

        debug!(binary = %self.binary, verb, "invoking provisioning tool");
        let out = self
            .runner
            .run_with_env(&self.binary, &argv, &env, self.timeout)
            .await?;
        if !out.status.success() {
            let stderr = String::from_utf8_lossy(&out.stderr);
            let detail = if stderr.trim().is_empty() {
                String::from_utf8_lossy(&out.stdout).trim().to_string()
            } else {
                stderr.trim().to_string()
            };
            bail!("{} {verb} failed: {detail}", self.binary);
        }
        Ok(())
    }
}

fn var_args(config: &ProvisioningConfig) -> Vec<String> {
    config
        .vars
        .iter()
        .flat_map(|(k, v)| ["-var".to_string(), format!("{k}={v}")])
        .collect()
}

fn mutate_args(config: &ProvisioningConfig) -> Vec<String> {
    let mut args = vec![
        "-input=false".to_string(),
        "-auto-approve".to_string(),
        "-no-color".to_string(),
    ];
    args.extend(var_args(config));
    args
}

impl<R: CommandRunner> Provisioner for TerraformCli<R> {
    async fn init_and_apply(&self, config: &ProvisioningConfig) -> Result<()> {
        let init = ["-upgrade", "-input=false", "-no-color"].map(String::from);
        self.invoke(config, "init", &init).await?;
        self.invoke(config, "apply", &mutate_args(config)).await?;
        info!(module = %config.module_dir.display(), "apply complete");
        Ok(())
    }

    async fn destroy(&self, config: &ProvisioningConfig) -> Result<()> {
        self.invoke(config, "destroy", &mutate_args(config)).await?;
        info!(module = %config.module_dir.display(), "destroy complete");
        Ok(())
    }
}
