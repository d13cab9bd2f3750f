//! Provisioning configuration and retry classification.
//!
//! This module is intentionally free of I/O, async, and external layer imports.
//! All functions take data in and return data out.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use harness_common::Product;
use regex::RegexSet;

use crate::domain::error::IdentityError;
use crate::domain::keys::KeyPair;
use crate::domain::release::ResolvedVersions;
use crate::domain::run::RunContext;

/// Variables never printed by `Debug`.
const SECRET_VARS: [&str; 3] = [
    "aws_access_key_id",
    "aws_secret_access_key",
    "aws_session_token",
];

/// Error signatures that are worth another apply.
pub const DEFAULT_TRANSIENT_PATTERNS: &[&str] = &[
    "RequestLimitExceeded",
    "Throttling",
    "Rate exceeded",
    "(?i)connection reset by peer",
    "TLS handshake timeout",
    "Failed to install provider",
    "Error installing provider",
    "Failed to query available provider packages",
    "timeout while waiting for plugin to start",
    "(?i)502 Bad Gateway",
    "(?i)503 Service Unavailable",
];

/// Classifier deciding whether an apply error is transient.
#[derive(Clone)]
pub struct TransientErrors {
    set: RegexSet,
}

impl TransientErrors {
    /// Compile a classifier from regular expressions.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::InvalidPattern`] naming the first pattern that
    /// fails to compile.
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self, IdentityError> {
        for p in patterns {
            if let Err(e) = regex::Regex::new(p.as_ref()) {
                return Err(IdentityError::InvalidPattern {
                    pattern: p.as_ref().to_string(),
                    reason: e.to_string(),
                });
            }
        }
        let set = RegexSet::new(patterns.iter().map(AsRef::as_ref)).map_err(|e| {
            IdentityError::InvalidPattern {
                pattern: "<set>".to_string(),
                reason: e.to_string(),
            }
        })?;
        Ok(Self { set })
    }

    /// A classifier that treats every error as terminal.
    #[must_use]
    pub fn none() -> Self {
        Self {
            set: RegexSet::empty(),
        }
    }

    #[must_use]
    pub fn is_transient(&self, message: &str) -> bool {
        self.set.is_match(message)
    }

    /// Patterns that matched `message`, for logging.
    #[must_use]
    pub fn matches<'a>(&'a self, message: &str) -> Vec<&'a str> {
        self.set
            .matches(message)
            .into_iter()
            .map(|i| self.set.patterns()[i].as_str())
            .collect()
    }
}

impl Default for TransientErrors {
    fn default() -> Self {
        Self::new(DEFAULT_TRANSIENT_PATTERNS).unwrap_or_else(|_| Self::none())
    }
}

impl fmt::Debug for TransientErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.set.patterns()).finish()
    }
}

/// How many times and how often to retry a transient apply failure.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries after the first attempt; `0` means a single attempt.
    pub max_retries: u32,
    /// Pause between attempts.
    pub delay: Duration,
    pub transient: TransientErrors,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            delay: Duration::from_secs(5),
            transient: TransientErrors::default(),
        }
    }
}

impl RetryPolicy {
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

/// Everything the provisioning tool needs for one apply/destroy cycle.
#[derive(Clone)]
pub struct ProvisioningConfig {
    pub module_dir: PathBuf,
    /// Passed as `-var key=value`.
    pub vars: BTreeMap<String, String>,
    /// Set on the tool's process environment.
    pub env: BTreeMap<String, String>,
    pub retry: RetryPolicy,
}

impl fmt::Debug for ProvisioningConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let vars: BTreeMap<&str, &str> = self
            .vars
            .iter()
            .map(|(k, v)| {
                let shown = if SECRET_VARS.contains(&k.as_str()) {
                    "<redacted>"
                } else {
                    v.as_str()
                };
                (k.as_str(), shown)
            })
            .collect();
        f.debug_struct("ProvisioningConfig")
            .field("module_dir", &self.module_dir)
            .field("vars", &vars)
            .field("env", &self.env)
            .field("retry", &self.retry)
            .finish()
    }
}

/// Products whose versions a run deploys.
#[derive(Debug, Clone)]
pub struct Products {
    pub engine: Product,
    pub platform: Product,
}

impl Default for Products {
    fn default() -> Self {
        Self {
            engine: Product::default_engine(),
            platform: Product::default_platform(),
        }
    }
}

/// Assemble the variable and environment payload for a run.
#[must_use]
pub fn build_provisioning_config(
    ctx: &RunContext,
    key: &KeyPair,
    versions: &ResolvedVersions,
    products: &Products,
    agent_socket: &str,
    retry: RetryPolicy,
) -> ProvisioningConfig {
    let run_dir = ctx.run_dir.display().to_string();
    let state_args = format!("-no-color -state={}", ctx.state_file_path().display());

    let vars: BTreeMap<String, String> = [
        ("identifier".to_string(), ctx.run_id.clone()),
        ("owner".to_string(), ctx.owner.clone()),
        ("key_name".to_string(), key.name.clone()),
        ("key".to_string(), key.public_key.clone()),
        ("zone".to_string(), ctx.zone.clone()),
        (products.engine.version_var(), versions.engine.clone()),
        (products.platform.version_var(), versions.platform.clone()),
        ("file_path".to_string(), run_dir.clone()),
        (
            "aws_access_key_id".to_string(),
            ctx.credentials.access_key.clone(),
        ),
        (
            "aws_secret_access_key".to_string(),
            ctx.credentials.secret_key.clone(),
        ),
        (
            "aws_session_token".to_string(),
            ctx.credentials.session_token.clone(),
        ),
        ("aws_region".to_string(), ctx.region.clone()),
    ]
    .into_iter()
    .collect();

    let mut env: BTreeMap<String, String> = [
        ("AWS_DEFAULT_REGION", ctx.region.clone()),
        ("AWS_REGION", ctx.region.clone()),
        ("TF_DATA_DIR", run_dir.clone()),
        ("TF_IN_AUTOMATION", "1".to_string()),
        (
            "KUBECONFIG",
            ctx.kubeconfig_path().display().to_string(),
        ),
        ("KUBE_CONFIG_PATH", run_dir),
        ("TF_CLI_ARGS_plan", state_args.clone()),
        ("TF_CLI_ARGS_apply", state_args.clone()),
        ("TF_CLI_ARGS_destroy", state_args.clone()),
        ("TF_CLI_ARGS_output", state_args),
        ("SSH_AUTH_SOCK", agent_socket.to_string()),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect();
    if let Some(acme) = &ctx.acme_server {
        env.insert("ACME_SERVER_URL".to_string(), acme.clone());
    }

    ProvisioningConfig {
        module_dir: ctx.module_dir.clone(),
        vars,
        env,
        retry,
    }
}

/// A cluster that the provisioning tool reported as applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterHandle {
    pub kubeconfig: PathBuf,
}
