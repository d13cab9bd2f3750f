//! Release channel selection.
//!
//! Pure: takes the release list a source returned and picks the
//! `latest`, `stable` and `oldest` versions from it.

use std::collections::BTreeMap;

use semver::Version;
use serde::Deserialize;

use crate::domain::error::ReleaseError;

/// Minor lines considered "supported" when picking channels.
pub const SUPPORTED_LINES: usize = 3;

/// Subset of a GitHub release object.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Release {
    pub tag_name: String,
    #[serde(default)]
    pub prerelease: bool,
    #[serde(default)]
    pub draft: bool,
}

impl Release {
    #[must_use]
    pub fn new(tag: &str) -> Self {
        Self {
            tag_name: tag.to_string(),
            prerelease: false,
            draft: false,
        }
    }
}

/// The three versions a product publishes at any one time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseChannels {
    /// Newest patch of the newest minor line.
    pub latest: String,
    /// Newest patch of the second-newest minor line.
    pub stable: String,
    /// Newest patch of the oldest supported minor line.
    pub oldest: String,
}

/// Versions chosen for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedVersions {
    pub engine: String,
    pub platform: String,
}

/// Pick release channels from raw release metadata.
///
/// Drafts, pre-releases and tags that are not semver (after stripping a
/// leading `v`) are ignored. A semver pre-release suffix also excludes a tag.
/// Build metadata such as `+rke2r1` is kept, and the returned strings are
/// the original tag names.
///
/// # Errors
///
/// Returns [`ReleaseError::NoStableReleases`] if nothing usable remains.
pub fn select_channels(
    releases: &[Release],
    product: &str,
) -> Result<ReleaseChannels, ReleaseError> {
    // (major, minor) -> newest release in that line
    let mut lines: BTreeMap<(u64, u64), (Version, &str)> = BTreeMap::new();
    for release in releases.iter().filter(|r| !r.draft && !r.prerelease) {
        let raw = release.tag_name.trim();
        let Ok(version) = Version::parse(raw.strip_prefix('v').unwrap_or(raw)) else {
            continue;
        };
        if !version.pre.is_empty() {
            continue;
        }
        let key = (version.major, version.minor);
        let newer = lines
            .get(&key)
            .is_none_or(|(current, _)| cmp_with_build(&version, current).is_gt());
        if newer {
            lines.insert(key, (version, raw));
        }
    }

    let newest_first: Vec<&str> = lines
        .values()
        .rev()
        .take(SUPPORTED_LINES)
        .map(|(_, tag)| *tag)
        .collect();
    let Some(&latest) = newest_first.first() else {
        return Err(ReleaseError::NoStableReleases(product.to_string()));
    };
    let stable = newest_first.get(1).copied().unwrap_or(latest);
    let oldest = newest_first.last().copied().unwrap_or(latest);
    Ok(ReleaseChannels {
        latest: latest.to_string(),
        stable: stable.to_string(),
        oldest: oldest.to_string(),
    })
}

/// Semver precedence, with build metadata as a tie-breaker so `+rke2r2`
/// beats `+rke2r1` on the same patch.
fn cmp_with_build(a: &Version, b: &Version) -> std::cmp::Ordering {
    a.cmp_precedence(b).then_with(|| a.build.cmp(&b.build))
}
