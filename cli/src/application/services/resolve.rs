//! Application service: release resolution.

use anyhow::{Context, Result};
use harness_common::Product;
use tracing::info;

use crate::application::ports::ReleaseSource;
use crate::domain::{Products, ReleaseChannels, ResolvedVersions, select_channels};

/// Fetch and classify the engine's releases.
///
/// # Errors
///
/// Returns an error if the source fails or publishes no usable release.
pub async fn resolve_engine_version(
    source: &impl ReleaseSource,
    engine: &Product,
) -> Result<ReleaseChannels> {
    channels(source, engine).await
}

/// The override verbatim when present, else the platform's stable channel.
///
/// # Errors
///
/// Returns an error if no override is given and the lookup fails.
pub async fn resolve_platform_version(
    source: &impl ReleaseSource,
    platform: &Product,
    override_version: Option<&str>,
) -> Result<String> {
    if let Some(v) = override_version {
        info!(product = %platform.name, version = %v, "using platform version override");
        return Ok(v.to_string());
    }
    Ok(channels(source, platform).await?.stable)
}

/// Engine on its oldest supported line, platform on stable (or override).
///
/// # Errors
///
/// Returns an error if either lookup fails.
pub async fn resolve_versions(
    source: &impl ReleaseSource,
    products: &Products,
    platform_override: Option<&str>,
) -> Result<ResolvedVersions> {
    let engine = resolve_engine_version(source, &products.engine).await?.oldest;
    let platform = resolve_platform_version(source, &products.platform, platform_override).await?;
    info!(
        engine = %engine,
        platform = %platform,
        "resolved versions"
    );
    Ok(ResolvedVersions { engine, platform })
}

async fn channels(source: &impl ReleaseSource, product: &Product) -> Result<ReleaseChannels> {
    let releases = source
        .releases(&product.repo)
        .await
        .with_context(|| format!("fetching {} releases from {}", product.name, product.repo))?;
    let channels = select_channels(&releases, &product.name)?;
    info!(
        product = %product.name,
        latest = %channels.latest,
        stable = %channels.stable,
        oldest = %channels.oldest,
        "release channels"
    );
    Ok(channels)
}
