//! Application service: wait for the cluster to become healthy.

use anyhow::{Result, bail};
use tokio::time::Instant;
use tracing::{debug, info};

use crate::application::ports::{ClusterProbe, ProgressReporter};
use crate::domain::{ClusterHandle, HealthPolicy, Readiness, assess_nodes, assess_workloads};

/// One readiness check: nodes first, then workloads.
///
/// Probe errors count as "not ready" so a cluster whose API server is still
/// starting does not abort the wait.
pub async fn check_once(probe: &impl ClusterProbe, cluster: &ClusterHandle) -> Readiness {
    let nodes = match probe.nodes(&cluster.kubeconfig).await {
        Ok(list) => assess_nodes(&list),
        Err(e) => Readiness::NotReady {
            reason: format!("listing nodes: {e:#}"),
        },
    };
    if !nodes.is_ready() {
        return nodes;
    }
    match probe.pods(&cluster.kubeconfig).await {
        Ok(list) => assess_workloads(&list),
        Err(e) => Readiness::NotReady {
            reason: format!("listing pods: {e:#}"),
        },
    }
}

/// Poll until every node is ready and every pod is running, or the policy
/// timeout elapses. At least one check always runs.
///
/// # Errors
///
/// Returns an error carrying the last not-ready reason on timeout.
pub async fn wait_ready(
    probe: &impl ClusterProbe,
    cluster: &ClusterHandle,
    policy: &HealthPolicy,
    reporter: &impl ProgressReporter,
) -> Result<()> {
    reporter.step("waiting for cluster to become ready...");
    let deadline = Instant::now() + policy.timeout;
    let mut checks = 0u32;

    loop {
        checks += 1;
        match check_once(probe, cluster).await {
            Readiness::Ready => {
                info!(checks, "cluster ready");
                reporter.success("cluster ready");
                return Ok(());
            }
            Readiness::NotReady { reason } => {
                debug!(checks, %reason, "cluster not ready");
                if Instant::now() + policy.interval >= deadline {
                    bail!(
                        "cluster not ready after {}s: {reason}",
                        policy.timeout.as_secs()
                    );
                }
            }
        }
        tokio::time::sleep(policy.interval).await;
    }
}
