//! Provider environment loading.

use anyhow::{Context, Result};
use harness_common::ProviderEnv;

/// Read cloud and provider settings from the process environment.
///
/// Missing variables become empty values; nothing is validated here.
///
/// # Errors
///
/// Returns an error only if a present variable cannot be decoded.
pub fn load_provider_env() -> Result<ProviderEnv> {
    envy::from_env::<ProviderEnv>().context("cannot read provider environment")
}
