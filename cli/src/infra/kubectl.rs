//! `kubectl`-backed cluster probe and diagnostics collector.

use std::fmt::Write as _;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::application::ports::{ClusterProbe, CommandRunner, DiagnosticsCollector};
use crate::domain::{NodeList, PodList};

/// Commands whose output makes up a diagnostics report.
const DIAGNOSTIC_QUERIES: [&[&str]; 3] = [
    &["get", "nodes", "-o", "wide"],
    &["get", "pods", "-A", "-o", "wide"],
    &["get", "events", "-A", "--sort-by=.lastTimestamp"],
];

#[derive(Debug, Clone)]
pub struct Kubectl<R> {
    runner: R,
}

impl<R: CommandRunner> Kubectl<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }

    async fn get_json<T: DeserializeOwned>(&self, kubeconfig: &Path, args: &[&str]) -> Result<T> {
        let kc = kubeconfig.to_string_lossy();
        let mut argv = vec!["--kubeconfig", kc.as_ref()];
        argv.extend_from_slice(args);
        let out = self.runner.run("kubectl", &argv).await?;
        if !out.status.success() {
            bail!(
                "kubectl {} failed: {}",
                args.join(" "),
                String::from_utf8_lossy(&out.stderr).trim()
            );
        }
        serde_json::from_slice(&out.stdout)
            .with_context(|| format!("parsing kubectl {} output", args.join(" ")))
    }
}

impl<R: CommandRunner> ClusterProbe for Kubectl<R> {
    async fn nodes(&self, kubeconfig: &Path) -> Result<NodeList> {
        self.get_json(kubeconfig, &["get", "nodes", "-o", "json"])
            .await
    }

    async fn pods(&self, kubeconfig: &Path) -> Result<PodList> {
        self.get_json(kubeconfig, &["get", "pods", "-A", "-o", "json"])
            .await
    }
}

impl<R: CommandRunner> DiagnosticsCollector for Kubectl<R> {
    async fn collect(&self, kubeconfig: &Path, dest: &Path) -> Result<()> {
        let kc = kubeconfig.to_string_lossy();
        let mut report = String::new();
        let mut failures = 0;

        for query in DIAGNOSTIC_QUERIES {
            let mut argv = vec!["--kubeconfig", kc.as_ref()];
            argv.extend_from_slice(query);
            let title = format!("kubectl {}", query.join(" "));
            let _ = writeln!(report, "### {title}");
            match self.runner.run("kubectl", &argv).await {
                Ok(out) => {
                    if !out.status.success() {
                        failures += 1;
                    }
                    report.push_str(&String::from_utf8_lossy(&out.stdout));
                    report.push_str(&String::from_utf8_lossy(&out.stderr));
                }
                Err(e) => {
                    failures += 1;
                    let _ = writeln!(report, "error: {e:#}");
                }
            }
            report.push('\n');
        }

        warn!(path = %dest.display(), "cluster diagnostics:\n{report}");
        tokio::fs::write(dest, &report)
            .await
            .with_context(|| format!("writing diagnostics {}", dest.display()))?;
        if failures == DIAGNOSTIC_QUERIES.len() {
            bail!("no diagnostics could be collected from {}", kubeconfig.display());
        }
        Ok(())
    }
}
