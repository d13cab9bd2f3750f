use serde::Deserialize;
use std::fmt;

/// A piece of software whose version the harness resolves and hands to the
/// provisioning module as `<name>_version`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    /// Variable prefix, e.g. `rke2`.
    pub name: String,
    /// GitHub `owner/repo` publishing the releases.
    pub repo: String,
}

impl Product {
    #[must_use]
    pub fn new(name: &str, repo: &str) -> Self {
        Self {
            name: name.to_string(),
            repo: repo.to_string(),
        }
    }

    /// Cluster engine deployed under the platform (released far more often).
    #[must_use]
    pub fn default_engine() -> Self {
        Self::new("rke2", "rancher/rke2")
    }

    /// Platform under test.
    #[must_use]
    pub fn default_platform() -> Self {
        Self::new("rancher", "rancher/rancher")
    }

    /// Name of the provisioning variable carrying this product's version.
    #[must_use]
    pub fn version_var(&self) -> String {
        format!("{}_version", self.name)
    }
}

/// Cloud and provider settings read once from the process environment.
///
/// Field names map to upper-case variables (`aws_region` ← `AWS_REGION`).
/// Nothing is validated here: a missing credential surfaces when the cloud
/// call that needs it fails.
#[derive(Clone, Default, Deserialize)]
pub struct ProviderEnv {
    #[serde(default)]
    pub aws_region: String,
    #[serde(default)]
    pub aws_access_key_id: String,
    #[serde(default)]
    pub aws_secret_access_key: String,
    #[serde(default)]
    pub aws_session_token: String,
    /// Availability zone selector passed through to the module.
    #[serde(default)]
    pub zone: String,
    /// Explicit platform version; skips release lookup when set.
    #[serde(default)]
    pub rancher_version: Option<String>,
    /// ACME directory the cluster's certificate issuer should use.
    #[serde(default)]
    pub acme_server_url: Option<String>,
    /// Releases API root; the public GitHub API when unset.
    #[serde(default)]
    pub harness_github_api_url: Option<String>,
    /// Token for the releases API, lifting the anonymous rate limit.
    #[serde(default)]
    pub github_token: Option<String>,
}

impl ProviderEnv {
    /// Platform override, treating an empty variable as unset.
    #[must_use]
    pub fn platform_override(&self) -> Option<&str> {
        self.rancher_version
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }

    /// Releases API root, treating an empty variable as unset.
    #[must_use]
    pub fn github_api_url(&self) -> Option<&str> {
        self.harness_github_api_url
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }
}

impl fmt::Debug for ProviderEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderEnv")
            .field("aws_region", &self.aws_region)
            .field("aws_access_key_id", &redact(&self.aws_access_key_id))
            .field("aws_secret_access_key", &redact(&self.aws_secret_access_key))
            .field("aws_session_token", &redact(&self.aws_session_token))
            .field("zone", &self.zone)
            .field("rancher_version", &self.rancher_version)
            .field("acme_server_url", &self.acme_server_url)
            .field("harness_github_api_url", &self.harness_github_api_url)
            .field(
                "github_token",
                &redact(self.github_token.as_deref().unwrap_or_default()),
            )
            .finish()
    }
}

fn redact(value: &str) -> &'static str {
    if value.is_empty() { "<unset>" } else { "<redacted>" }
}

/// Let's Encrypt staging directory, used so test clusters never consume
/// production issuance quota.
pub const ACME_STAGING_URL: &str = "https://acme-staging-v02.api.letsencrypt.org/directory";
