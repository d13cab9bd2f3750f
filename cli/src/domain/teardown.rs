//! Teardown bookkeeping.

use harness_common::{StepStatus, TeardownStep};
use serde::Serialize;

/// One executed teardown substate.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct StepRecord {
    pub step: TeardownStep,
    #[serde(flatten)]
    pub status: StepStatus,
}

/// Ordered record of a teardown sequence. Steps are appended in execution
/// order; a step may appear more than once (one destroy per applied config).
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct TeardownReport {
    pub steps: Vec<StepRecord>,
}

impl TeardownReport {
    pub fn record(&mut self, step: TeardownStep, status: StepStatus) {
        self.steps.push(StepRecord { step, status });
    }

    /// Whether every step completed or was skipped.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        !self.steps.iter().any(|r| r.status.is_failed())
    }

    /// Failed steps with their error text.
    #[must_use]
    pub fn failures(&self) -> Vec<(TeardownStep, &str)> {
        self.steps
            .iter()
            .filter_map(|r| match &r.status {
                StepStatus::Failed(msg) => Some((r.step, msg.as_str())),
                _ => None,
            })
            .collect()
    }

    /// Status of the first record for `step`.
    #[must_use]
    pub fn status_of(&self, step: TeardownStep) -> Option<&StepStatus> {
        self.steps.iter().find(|r| r.step == step).map(|r| &r.status)
    }

    /// Distinct steps in the order they first ran.
    #[must_use]
    pub fn order(&self) -> Vec<TeardownStep> {
        let mut seen = Vec::new();
        for r in &self.steps {
            if !seen.contains(&r.step) {
                seen.push(r.step);
            }
        }
        seen
    }
}
