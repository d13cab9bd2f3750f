//! Cluster readiness assessment.
//!
//! This module is intentionally free of I/O, async, and external layer imports.
//! All functions take data in and return data out.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;

// ── Types ─────────────────────────────────────────────────────────────────────

/// Labels marking a control-plane node, old and new spelling.
const CONTROL_PLANE_LABELS: [&str; 2] = [
    "node-role.kubernetes.io/control-plane",
    "node-role.kubernetes.io/master",
];

/// `kubectl get nodes -o json`.
#[derive(Debug, Deserialize)]
pub struct NodeList {
    #[serde(default)]
    pub items: Vec<Node>,
}

#[derive(Debug, Deserialize)]
pub struct Node {
    pub metadata: Metadata,
    #[serde(default)]
    pub status: NodeStatus,
}

#[derive(Debug, Default, Deserialize)]
pub struct NodeStatus {
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

#[derive(Debug, Deserialize)]
pub struct Condition {
    #[serde(rename = "type")]
    pub kind: String,
    pub status: String,
}

/// `kubectl get pods -A -o json`.
#[derive(Debug, Deserialize)]
pub struct PodList {
    #[serde(default)]
    pub items: Vec<Pod>,
}

#[derive(Debug, Deserialize)]
pub struct Pod {
    pub metadata: Metadata,
    #[serde(default)]
    pub status: PodStatus,
}

#[derive(Debug, Default, Deserialize)]
pub struct PodStatus {
    #[serde(default)]
    pub phase: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Metadata {
    pub name: String,
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
}

/// Result of one readiness check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Readiness {
    Ready,
    NotReady { reason: String },
}

impl Readiness {
    #[must_use]
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }

    fn not_ready(reason: impl Into<String>) -> Self {
        Self::NotReady {
            reason: reason.into(),
        }
    }
}

/// Polling bounds for readiness.
#[derive(Debug, Clone, Copy)]
pub struct HealthPolicy {
    pub timeout: Duration,
    pub interval: Duration,
}

impl Default for HealthPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(15 * 60),
            interval: Duration::from_secs(10),
        }
    }
}

// ── Pure assessment ───────────────────────────────────────────────────────────

/// Nodes are ready when a control-plane node exists and every node reports
/// `Ready=True`.
#[must_use]
pub fn assess_nodes(nodes: &NodeList) -> Readiness {
    if nodes.items.is_empty() {
        return Readiness::not_ready("no nodes registered");
    }
    let has_control_plane = nodes.items.iter().any(|n| {
        CONTROL_PLANE_LABELS
            .iter()
            .any(|l| n.metadata.labels.contains_key(*l))
    });
    if !has_control_plane {
        return Readiness::not_ready("no control-plane node registered");
    }
    let not_ready: Vec<&str> = nodes
        .items
        .iter()
        .filter(|n| {
            !n.status
                .conditions
                .iter()
                .any(|c| c.kind == "Ready" && c.status == "True")
        })
        .map(|n| n.metadata.name.as_str())
        .collect();
    if not_ready.is_empty() {
        Readiness::Ready
    } else {
        Readiness::not_ready(format!("nodes not ready: {}", not_ready.join(", ")))
    }
}

/// Workloads are running when every pod is `Running` or `Succeeded`.
#[must_use]
pub fn assess_workloads(pods: &PodList) -> Readiness {
    let pending: Vec<String> = pods
        .items
        .iter()
        .filter(|p| {
            !matches!(
                p.status.phase.as_deref(),
                Some("Running" | "Succeeded")
            )
        })
        .map(|p| {
            format!(
                "{}/{} ({})",
                p.metadata.namespace.as_deref().unwrap_or("default"),
                p.metadata.name,
                p.status.phase.as_deref().unwrap_or("Unknown")
            )
        })
        .collect();
    if pending.is_empty() {
        Readiness::Ready
    } else {
        Readiness::not_ready(format!("pods not running: {}", pending.join(", ")))
    }
}
