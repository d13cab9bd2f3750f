//! Key pair and signing-agent domain types.
//!
//! This module is intentionally free of I/O, async, and external layer imports.
//! All functions take data in and return data out.

use std::fmt;

use anyhow::{Result, bail};

/// A cloud key pair created for exactly one run.
#[derive(Clone, PartialEq, Eq)]
pub struct KeyPair {
    /// Remote key-pair name (`tf-<run id>`).
    pub name: String,
    /// OpenSSH public key line.
    pub public_key: String,
    /// PEM/OpenSSH private key material.
    pub private_key: String,
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("name", &self.name)
            .field("public_key", &self.public_key)
            .field("private_key", &"<redacted>")
            .finish()
    }
}

/// Outcome of deleting a remote key pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyPairDeletion {
    Deleted,
    /// Nothing to delete; the pair was already gone.
    AlreadyAbsent,
}

/// Environment exported by a freshly started signing agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentEnv {
    pub auth_sock: String,
    pub pid: u32,
}

/// Parse the Bourne-shell output of `ssh-agent -s`.
///
/// ```text
/// SSH_AUTH_SOCK=/tmp/ssh-XXXX/agent.123; export SSH_AUTH_SOCK;
/// SSH_AGENT_PID=124; export SSH_AGENT_PID;
/// echo Agent pid 124;
/// ```
///
/// # Errors
///
/// Returns an error if either variable is missing or the pid is not numeric.
pub fn parse_agent_output(stdout: &str) -> Result<AgentEnv> {
    let mut auth_sock = None;
    let mut pid = None;
    for statement in stdout.split([';', '\n']) {
        let Some((key, value)) = statement.trim().split_once('=') else {
            continue;
        };
        match key {
            "SSH_AUTH_SOCK" => auth_sock = Some(value.to_string()),
            "SSH_AGENT_PID" => pid = Some(value.to_string()),
            _ => {}
        }
    }
    let Some(auth_sock) = auth_sock.filter(|s| !s.is_empty()) else {
        bail!("ssh-agent output did not contain SSH_AUTH_SOCK");
    };
    let Some(pid) = pid else {
        bail!("ssh-agent output did not contain SSH_AGENT_PID");
    };
    let pid = pid
        .parse::<u32>()
        .map_err(|e| anyhow::anyhow!("invalid SSH_AGENT_PID '{pid}': {e}"))?;
    Ok(AgentEnv { auth_sock, pid })
}

/// Whether a key-pair API error means the pair does not exist.
#[must_use]
pub fn is_missing_key_pair_error(stderr: &str) -> bool {
    stderr.contains("InvalidKeyPair.NotFound")
}
