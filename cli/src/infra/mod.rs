//! Infrastructure layer: concrete implementations of application port traits.
//!
//! This module contains all I/O-performing code: process execution, filesystem
//! access, cloud key pairs, the signing agent, the provisioning tool, release
//! metadata, and cluster queries.
//!
//! Imports from `crate::domain` and `crate::application::ports` are allowed.
//! Imports from `crate::commands` or `crate::output` are forbidden.

pub mod agent;
pub mod command_runner;
pub mod config;
pub mod fs;
pub mod keypair;
pub mod kubectl;
pub mod releases;
pub mod terraform;
