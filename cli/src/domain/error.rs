//! Typed domain error enums.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! Wrapped `anyhow::Error`s are rendered with `{:#}` so the full context
//! chain reaches the single failure line.

use thiserror::Error;

// ── Run errors ────────────────────────────────────────────────────────────────

/// Why a run failed. Every variant still routes through teardown.
#[derive(Debug, Error)]
pub enum RunError {
    /// Directory, key-pair, key-file or signing-agent acquisition failed.
    #[error("setup failed: {0:#}")]
    Setup(anyhow::Error),

    /// Release metadata could not be resolved.
    #[error("release resolution failed: {0:#}")]
    Resolve(anyhow::Error),

    /// The provisioning tool's apply failed.
    #[error("provisioning failed: {0}")]
    Provision(#[from] ProvisionError),

    /// The cluster came up but never became healthy.
    #[error("cluster validation failed: {0:#}")]
    Validation(anyhow::Error),
}

impl RunError {
    /// Short machine-readable code for JSON output.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Setup(_) => "SETUP_FAILED",
            Self::Resolve(_) => "RESOLVE_FAILED",
            Self::Provision(_) => "PROVISION_FAILED",
            Self::Validation(_) => "VALIDATION_FAILED",
        }
    }
}

// ── Provisioning errors ───────────────────────────────────────────────────────

/// Final failure of an apply, carrying the tool's error text verbatim.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProvisionError {
    /// The error did not match any transient signature.
    #[error("apply failed after {attempts} attempt(s): {message}")]
    Terminal { attempts: u32, message: String },

    /// Every attempt hit a transient error and the retry bound ran out.
    #[error("apply kept failing with transient errors after {attempts} attempt(s): {message}")]
    RetriesExhausted { attempts: u32, message: String },
}

impl ProvisionError {
    #[must_use]
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Terminal { attempts, .. } | Self::RetriesExhausted { attempts, .. } => *attempts,
        }
    }
}

// ── Identity errors ───────────────────────────────────────────────────────────

/// Errors related to run identity and configuration input.
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("Invalid run ID: {0} (expected 1-31 chars of [a-z0-9-], starting alphanumeric)")]
    InvalidRunId(String),

    #[error("Invalid transient error pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

impl IdentityError {
    /// Short machine-readable code for JSON output.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidRunId(_) => "INVALID_RUN_ID",
            Self::InvalidPattern { .. } => "INVALID_PATTERN",
        }
    }
}

// ── Release errors ────────────────────────────────────────────────────────────

/// Errors selecting a version from release metadata.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReleaseError {
    #[error("no stable releases found for {0}")]
    NoStableReleases(String),
}
