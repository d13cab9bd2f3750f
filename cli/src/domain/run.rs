//! Run identity and the immutable per-run context.
//!
//! This module is intentionally free of I/O, async, and external layer imports.
//! All functions take data in and return data out.

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::Result;
use harness_common::ProviderEnv;

use crate::domain::error::IdentityError;

/// Credentials file written by the provisioning module.
pub const KUBECONFIG_FILE: &str = "kubeconfig";
/// Private half of the run's key pair.
pub const PRIVATE_KEY_FILE: &str = "id_rsa";
/// Terraform state, pinned per run so concurrent runs never share state.
pub const STATE_FILE: &str = "tfstate";
/// Collected cluster diagnostics on failure.
pub const DIAGNOSTICS_FILE: &str = "diagnostics.log";

/// Cloud credential triple handed to the provisioning module.
#[derive(Clone, Default)]
pub struct Credentials {
    pub access_key: String,
    pub secret_key: String,
    pub session_token: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key", &"<redacted>")
            .field("secret_key", &"<redacted>")
            .field("session_token", &"<redacted>")
            .finish()
    }
}

/// Everything a run needs to know about itself. Built once, never mutated.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub run_id: String,
    pub region: String,
    pub owner: String,
    pub zone: String,
    pub credentials: Credentials,
    /// Terraform module driven by this run.
    pub module_dir: PathBuf,
    /// `<data dir>/<run id>`; holds key, state, kubeconfig and diagnostics.
    pub run_dir: PathBuf,
    /// ACME directory for the cluster's certificate issuer, if overridden.
    pub acme_server: Option<String>,
}

impl RunContext {
    /// Build a context from the identifiers and the provider environment.
    ///
    /// `acme_server` wins over `provider.acme_server_url`; pass `None` to keep
    /// whatever the environment says.
    #[must_use]
    pub fn new(
        run_id: &str,
        owner: &str,
        data_dir: &Path,
        module_dir: &Path,
        provider: &ProviderEnv,
        acme_server: Option<String>,
    ) -> Self {
        Self {
            run_id: run_id.to_string(),
            region: provider.aws_region.clone(),
            owner: owner.to_string(),
            zone: provider.zone.clone(),
            credentials: Credentials {
                access_key: provider.aws_access_key_id.clone(),
                secret_key: provider.aws_secret_access_key.clone(),
                session_token: provider.aws_session_token.clone(),
            },
            module_dir: module_dir.to_path_buf(),
            run_dir: data_dir.join(run_id),
            acme_server: acme_server.or_else(|| provider.acme_server_url.clone()),
        }
    }

    #[must_use]
    pub fn kubeconfig_path(&self) -> PathBuf {
        self.run_dir.join(KUBECONFIG_FILE)
    }

    #[must_use]
    pub fn private_key_path(&self) -> PathBuf {
        self.run_dir.join(PRIVATE_KEY_FILE)
    }

    #[must_use]
    pub fn state_file_path(&self) -> PathBuf {
        self.run_dir.join(STATE_FILE)
    }

    #[must_use]
    pub fn diagnostics_path(&self) -> PathBuf {
        self.run_dir.join(DIAGNOSTICS_FILE)
    }

    /// Remote key-pair name, unique per run.
    #[must_use]
    pub fn key_pair_name(&self) -> String {
        format!("tf-{}", self.run_id)
    }
}

/// Validates a caller-supplied run identifier.
///
/// Run ids end up in cloud resource names and file paths, so only
/// lowercase alphanumerics and `-` are allowed, 1 to 31 characters,
/// starting with an alphanumeric.
///
/// # Errors
///
/// Returns an error if the id doesn't match the expected format.
pub fn validate_run_id(id: &str) -> Result<()> {
    let valid = !id.is_empty()
        && id.len() <= 31
        && id
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        && !id.starts_with('-');
    if !valid {
        return Err(IdentityError::InvalidRunId(id.to_string()).into());
    }
    Ok(())
}

/// Generate a unique run identifier.
///
/// Format: `tf` followed by 8 lowercase hex characters.
/// Entropy sources: nanosecond timestamp and two independent `RandomState` hashes.
#[must_use]
pub fn generate_run_id() -> String {
    use std::collections::hash_map::RandomState;
    use std::hash::{BuildHasher, Hasher};

    let mut hasher = RandomState::new().build_hasher();
    hasher.write_u128(
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0),
    );
    hasher.write_u64(RandomState::new().build_hasher().finish());
    hasher.write_u64(RandomState::new().build_hasher().finish());
    format!("tf{:08x}", hasher.finish() & 0xffff_ffff)
}
