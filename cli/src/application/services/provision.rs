//! Application service: apply with retry on transient errors.

use std::path::PathBuf;

use tracing::{error, info, warn};

use crate::application::ports::{ProgressReporter, Provisioner};
use crate::domain::{ClusterHandle, ProvisionError, ProvisioningConfig};

/// Apply `config`, retrying while the error matches the configured
/// transient signatures and the retry bound allows.
///
/// A non-matching error is never retried. The tool's error text is
/// carried verbatim in the returned [`ProvisionError`].
///
/// # Errors
///
/// [`ProvisionError::Terminal`] for a non-transient failure,
/// [`ProvisionError::RetriesExhausted`] when every attempt was transient.
pub async fn apply_with_retry(
    provisioner: &impl Provisioner,
    config: &ProvisioningConfig,
    kubeconfig: PathBuf,
    reporter: &impl ProgressReporter,
) -> Result<ClusterHandle, ProvisionError> {
    let policy = &config.retry;
    let max_attempts = policy.max_attempts();
    let mut attempt = 0u32;

    loop {
        attempt += 1;
        reporter.step(&format!("applying infrastructure (attempt {attempt}/{max_attempts})..."));

        let Err(e) = provisioner.init_and_apply(config).await else {
            info!(attempt, "apply succeeded");
            reporter.success("infrastructure applied");
            return Ok(ClusterHandle { kubeconfig });
        };

        let message = format!("{e:#}");
        if !policy.transient.is_transient(&message) {
            error!(attempt, error = %message, "apply failed with non-retryable error");
            return Err(ProvisionError::Terminal {
                attempts: attempt,
                message,
            });
        }
        if attempt >= max_attempts {
            error!(attempt, error = %message, "apply failed after max retries");
            return Err(ProvisionError::RetriesExhausted {
                attempts: attempt,
                message,
            });
        }

        warn!(
            attempt,
            matched = ?policy.transient.matches(&message),
            delay_ms = policy.delay.as_millis(),
            "transient apply error, retrying"
        );
        reporter.warn(&format!(
            "transient error on attempt {attempt}, retrying in {}s",
            policy.delay.as_secs()
        ));
        tokio::time::sleep(policy.delay).await;
    }
}
