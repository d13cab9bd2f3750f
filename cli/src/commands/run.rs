//! `run` command: one full provision, validate, teardown cycle.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Args;
use harness_common::ACME_STAGING_URL;
use owo_colors::OwoColorize as _;

use crate::app::{Adapters, AppContext};
use crate::application::services::harness::{
    Collaborators, HarnessOptions, RunReport, run_harness,
};
use crate::domain::provisioning::DEFAULT_TRANSIENT_PATTERNS;
use crate::domain::{
    HealthPolicy, Products, RetryPolicy, RunContext, TransientErrors, generate_run_id,
    validate_run_id,
};
use crate::infra::config::load_provider_env;
use crate::output::{OutputContext, TerminalReporter, json};

/// Arguments for the run command.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Terraform module that provisions the cluster
    #[arg(long, env = "HARNESS_MODULE_DIR")]
    pub module_dir: PathBuf,

    /// Parent of per-run directories (key, state, kubeconfig)
    #[arg(long, env = "HARNESS_DATA_DIR", default_value = ".harness")]
    pub data_dir: PathBuf,

    /// Owner tag applied to cloud resources
    #[arg(long, env = "HARNESS_OWNER", default_value = "cluster-harness")]
    pub owner: String,

    /// Explicit run id (default: generated)
    #[arg(long, env = "HARNESS_RUN_ID", value_parser = parse_run_id)]
    pub run_id: Option<String>,

    /// Retries after a transient apply failure
    #[arg(long, env = "HARNESS_MAX_RETRIES", default_value_t = 3)]
    pub max_retries: u32,

    /// Seconds between apply attempts
    #[arg(long, env = "HARNESS_RETRY_DELAY", default_value_t = 5)]
    pub retry_delay: u64,

    /// Extra regex treated as a transient apply error (repeatable)
    #[arg(long = "transient-error", value_name = "REGEX")]
    pub transient_errors: Vec<String>,

    /// Seconds allowed for one apply or destroy
    #[arg(long, env = "HARNESS_APPLY_TIMEOUT", default_value_t = 90 * 60)]
    pub apply_timeout: u64,

    /// Seconds to wait for the cluster to become ready
    #[arg(long, env = "HARNESS_HEALTH_TIMEOUT", default_value_t = 15 * 60)]
    pub health_timeout: u64,

    /// Seconds between readiness checks
    #[arg(long, env = "HARNESS_POLL_INTERVAL", default_value_t = 10)]
    pub poll_interval: u64,

    /// Platform version to deploy instead of the stable release
    #[arg(long)]
    pub platform_version: Option<String>,

    /// Point the cluster's certificate issuer at the ACME staging directory
    #[arg(long)]
    pub staging_acme: bool,

    /// Provisioning tool executable
    #[arg(long, env = "HARNESS_TERRAFORM_BIN", default_value = "terraform")]
    pub terraform_bin: String,

    /// Leave the run directory in place after teardown
    #[arg(long)]
    pub keep_workdir: bool,
}

fn parse_run_id(s: &str) -> Result<String> {
    validate_run_id(s)?;
    Ok(s.to_string())
}

impl RunArgs {
    /// Retry policy from flags, default transient signatures plus extras.
    ///
    /// # Errors
    ///
    /// Returns an error if an extra pattern is not a valid regex.
    pub fn retry_policy(&self) -> Result<RetryPolicy> {
        let patterns: Vec<&str> = DEFAULT_TRANSIENT_PATTERNS
            .iter()
            .copied()
            .chain(self.transient_errors.iter().map(String::as_str))
            .collect();
        Ok(RetryPolicy {
            max_retries: self.max_retries,
            delay: Duration::from_secs(self.retry_delay),
            transient: TransientErrors::new(&patterns)?,
        })
    }

    #[must_use]
    pub fn health_policy(&self) -> HealthPolicy {
        HealthPolicy {
            timeout: Duration::from_secs(self.health_timeout),
            interval: Duration::from_secs(self.poll_interval),
        }
    }
}

/// Run the harness once.
///
/// # Errors
///
/// Returns an error only for problems detected before any resource is
/// acquired (bad flags, unreadable environment, missing module).
pub async fn run(app: &AppContext, args: &RunArgs) -> Result<ExitCode> {
    if !args.module_dir.is_dir() {
        bail!("module directory {} does not exist", args.module_dir.display());
    }
    let provider = load_provider_env()?;
    let retry = args.retry_policy()?;
    let module_dir = std::path::absolute(&args.module_dir)
        .with_context(|| format!("resolving {}", args.module_dir.display()))?;
    let data_dir = std::path::absolute(&args.data_dir)
        .with_context(|| format!("resolving {}", args.data_dir.display()))?;

    let run_id = args.run_id.clone().unwrap_or_else(generate_run_id);
    let acme = args.staging_acme.then(|| ACME_STAGING_URL.to_string());
    let ctx = RunContext::new(&run_id, &args.owner, &data_dir, &module_dir, &provider, acme);

    let opts = HarnessOptions {
        products: Products::default(),
        platform_override: args
            .platform_version
            .clone()
            .or_else(|| provider.platform_override().map(str::to_string)),
        retry,
        health: args.health_policy(),
        keep_workdir: args.keep_workdir,
    };

    let adapters = Adapters::production(
        &provider,
        Duration::from_secs(args.apply_timeout),
        &args.terraform_bin,
    );
    let reporter = TerminalReporter::new(&app.output);
    app.output.header(&format!("run {run_id} ({})", ctx.region));

    let report = run_harness(
        &ctx,
        &Collaborators {
            fs: &adapters.fs,
            keys: &adapters.keys,
            agents: &adapters.agents,
            releases: &adapters.releases,
            provisioner: &adapters.provisioner,
            probe: &adapters.kubectl,
            diagnostics: &adapters.kubectl,
            reporter: &reporter,
        },
        &opts,
    )
    .await;
    drop(reporter);

    if app.is_json() {
        println!("{}", json::format_report(&report)?);
    } else {
        print_summary(&app.output, &report);
    }
    Ok(if report.passed() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn print_summary(out: &OutputContext, report: &RunReport) {
    if let Some(v) = &report.versions {
        out.kv("engine  ", &v.engine);
        out.kv("platform", &v.platform);
    }
    for (step, err) in report.teardown.failures() {
        out.warn(&format!("teardown: {} failed: {err}", step.description()));
    }
    match &report.outcome {
        Ok(()) => println!("{}", "Test passed...".style(out.styles.success)),
        Err(e) => {
            println!("{}", "Test failed...".style(out.styles.error));
            out.error(&e.to_string());
        }
    }
}
