//! Domain layer: pure business logic, types, and validation.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All functions are synchronous and take data in, returning data out.

pub mod error;
pub mod health;
pub mod keys;
pub mod provisioning;
pub mod release;
pub mod run;
pub mod teardown;

pub use error::{IdentityError, ProvisionError, ReleaseError, RunError};
pub use health::{HealthPolicy, NodeList, PodList, Readiness, assess_nodes, assess_workloads};
pub use keys::{AgentEnv, KeyPair, KeyPairDeletion};
pub use provisioning::{
    ClusterHandle, Products, ProvisioningConfig, RetryPolicy, TransientErrors,
    build_provisioning_config,
};
pub use release::{Release, ReleaseChannels, ResolvedVersions, select_channels};
pub use run::{Credentials, RunContext, generate_run_id, validate_run_id};
pub use teardown::{StepRecord, TeardownReport};
