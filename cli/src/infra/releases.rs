//! GitHub releases implementation of the `ReleaseSource` port.

use anyhow::{Context, Result};
use harness_common::ProviderEnv;

use crate::application::ports::ReleaseSource;
use crate::domain::Release;

/// Public GitHub API root.
pub const GITHUB_API_URL: &str = "https://api.github.com";

const PER_PAGE: usize = 100;
/// Three pages cover well over three minor lines for every product we track.
const MAX_PAGES: usize = 3;

/// Reads releases from the GitHub REST API with `ureq`.
#[derive(Debug, Clone)]
pub struct GithubReleases {
    base_url: String,
    token: Option<String>,
}

impl GithubReleases {
    #[must_use]
    pub fn new(base_url: &str, token: Option<String>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.is_empty()),
        }
    }

    /// `HARNESS_GITHUB_API_URL` (default: public API) and optional `GITHUB_TOKEN`.
    #[must_use]
    pub fn from_provider(provider: &ProviderEnv) -> Self {
        Self::new(
            provider.github_api_url().unwrap_or(GITHUB_API_URL),
            provider.github_token.clone(),
        )
    }

    fn page_url(&self, repo: &str, page: usize) -> String {
        format!(
            "{}/repos/{repo}/releases?per_page={PER_PAGE}&page={page}",
            self.base_url
        )
    }

    fn fetch_page(&self, url: &str) -> Result<Vec<Release>> {
        let req = ureq::get(url)
            .set("Accept", "application/vnd.github+json")
            .set("User-Agent", "cluster-harness");
        let req = match &self.token {
            Some(token) => req.set("Authorization", &format!("Bearer {token}")),
            None => req,
        };

        let body = match req.call() {
            Ok(resp) => resp.into_string().context("reading response")?,
            Err(ureq::Error::Status(403, _)) => anyhow::bail!(
                "cannot fetch releases: rate limited.\n\nTry again in a few minutes, or set GITHUB_TOKEN."
            ),
            Err(ureq::Error::Status(code, _)) => {
                anyhow::bail!("cannot fetch releases: HTTP {code} from {url}")
            }
            Err(e) => anyhow::bail!("cannot fetch releases from {url}: {e}"),
        };
        parse_releases(&body)
    }

    fn fetch_all(&self, repo: &str) -> Result<Vec<Release>> {
        let mut all = Vec::new();
        for page in 1..=MAX_PAGES {
            let batch = self.fetch_page(&self.page_url(repo, page))?;
            let last = batch.len() < PER_PAGE;
            all.extend(batch);
            if last {
                break;
            }
        }
        Ok(all)
    }
}

/// Decode a releases page.
///
/// # Errors
///
/// Returns an error if the body is not a JSON array of releases.
pub fn parse_releases(body: &str) -> Result<Vec<Release>> {
    serde_json::from_str(body).context("parsing releases response")
}

impl ReleaseSource for GithubReleases {
    async fn releases(&self, repo: &str) -> Result<Vec<Release>> {
        let this = self.clone();
        let repo = repo.to_string();
        tokio::task::spawn_blocking(move || this.fetch_all(&repo))
            .await
            .context("spawn_blocking for release fetch")?
    }
}
