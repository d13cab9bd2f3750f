use serde::{Deserialize, Serialize};

/// Phase of a single harness run.
///
/// `Init → Provisioning → {Provisioned | Failed}`,
/// `Provisioned → Validating → {Ready | ValidationFailed}`, and every
/// outcome routes into `Teardown → Done`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RunPhase {
    Init,
    Provisioning,
    Provisioned,
    Failed,
    Validating,
    Ready,
    ValidationFailed,
    Teardown,
    Done,
}

impl RunPhase {
    pub const ALL: [RunPhase; 9] = [
        Self::Init,
        Self::Provisioning,
        Self::Provisioned,
        Self::Failed,
        Self::Validating,
        Self::Ready,
        Self::ValidationFailed,
        Self::Teardown,
        Self::Done,
    ];

    /// Human-readable description used in progress output.
    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::Init => "preparing run",
            Self::Provisioning => "provisioning infrastructure",
            Self::Provisioned => "infrastructure provisioned",
            Self::Failed => "provisioning failed",
            Self::Validating => "validating cluster health",
            Self::Ready => "cluster ready",
            Self::ValidationFailed => "cluster validation failed",
            Self::Teardown => "tearing down",
            Self::Done => "done",
        }
    }

    /// Whether `next` is a legal successor of `self`.
    ///
    /// Any phase before `Teardown` may jump straight to `Teardown`: setup and
    /// resolution failures abort before provisioning starts.
    #[must_use]
    pub fn can_transition_to(self, next: RunPhase) -> bool {
        use RunPhase::{
            Done, Failed, Init, Provisioned, Provisioning, Ready, Teardown, Validating,
            ValidationFailed,
        };
        match (self, next) {
            (Init, Provisioning)
            | (Provisioning, Provisioned | Failed)
            | (Provisioned, Validating)
            | (Validating, Ready | ValidationFailed)
            | (Teardown, Done) => true,
            (Teardown | Done, _) => false,
            (_, Teardown) => true,
            _ => false,
        }
    }
}

/// Teardown substates, executed in declaration order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TeardownStep {
    CollectDiagnostics,
    DestroyInfra,
    DeleteKeyPair,
    StopAgent,
    RemoveWorkdir,
}

impl TeardownStep {
    /// Fixed execution order.
    pub const ORDER: [TeardownStep; 5] = [
        Self::CollectDiagnostics,
        Self::DestroyInfra,
        Self::DeleteKeyPair,
        Self::StopAgent,
        Self::RemoveWorkdir,
    ];

    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::CollectDiagnostics => "collecting diagnostic logs",
            Self::DestroyInfra => "destroying infrastructure",
            Self::DeleteKeyPair => "deleting key pair",
            Self::StopAgent => "stopping signing agent",
            Self::RemoveWorkdir => "removing run directory",
        }
    }

    /// Next substate, or `None` after the last one.
    #[must_use]
    pub fn next(self) -> Option<TeardownStep> {
        let idx = Self::ORDER.iter().position(|s| *s == self)?;
        Self::ORDER.get(idx + 1).copied()
    }
}

/// Outcome of one teardown substate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "status", content = "detail")]
pub enum StepStatus {
    Completed,
    Skipped(String),
    Failed(String),
}

impl StepStatus {
    #[must_use]
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}
