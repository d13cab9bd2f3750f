//! Cloud key pairs via `ssh-keygen` and the AWS CLI.

use std::path::Path;

use anyhow::{Context, Result, bail};
use tracing::debug;

use crate::application::ports::{CommandRunner, KeyPairStore};
use crate::domain::keys::is_missing_key_pair_error;
use crate::domain::{KeyPair, KeyPairDeletion};

/// Generates RSA keys locally and registers the public half with EC2.
#[derive(Debug, Clone)]
pub struct AwsKeyPairStore<R> {
    runner: R,
}

impl<R: CommandRunner> AwsKeyPairStore<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }

    async fn generate(&self, dir: &Path, comment: &str) -> Result<(String, String)> {
        let key_path = dir.join("id_rsa");
        let key_arg = key_path.to_string_lossy();
        let out = self
            .runner
            .run(
                "ssh-keygen",
                &["-q", "-t", "rsa", "-b", "4096", "-N", "", "-C", comment, "-f", &key_arg],
            )
            .await?;
        if !out.status.success() {
            bail!(
                "ssh-keygen failed: {}",
                String::from_utf8_lossy(&out.stderr).trim()
            );
        }
        let private_key = tokio::fs::read_to_string(&key_path)
            .await
            .with_context(|| format!("cannot read {}", key_path.display()))?;
        let pub_path = key_path.with_extension("pub");
        let public_key = tokio::fs::read_to_string(&pub_path)
            .await
            .with_context(|| format!("cannot read {}", pub_path.display()))?;
        Ok((public_key.trim().to_string(), private_key))
    }
}

impl<R: CommandRunner> KeyPairStore for AwsKeyPairStore<R> {
    async fn create(
        &self,
        region: &str,
        owner: &str,
        run_id: &str,
        name: &str,
    ) -> Result<KeyPair> {
        let tmp = tempfile::tempdir().context("cannot create temp dir for key generation")?;
        let (public_key, private_key) = self.generate(tmp.path(), name).await?;

        let material = format!("fileb://{}", tmp.path().join("id_rsa.pub").display());
        let tags = format!(
            "ResourceType=key-pair,Tags=[{{Key=Owner,Value={owner}}},{{Key=Identifier,Value={run_id}}}]"
        );
        let out = self
            .runner
            .run(
                "aws",
                &[
                    "ec2",
                    "import-key-pair",
                    "--region",
                    region,
                    "--key-name",
                    name,
                    "--public-key-material",
                    &material,
                    "--tag-specifications",
                    &tags,
                    "--output",
                    "json",
                ],
            )
            .await?;
        if !out.status.success() {
            bail!(
                "import-key-pair {name} failed: {}",
                String::from_utf8_lossy(&out.stderr).trim()
            );
        }
        debug!(key_pair = %name, %region, "key pair imported");

        Ok(KeyPair {
            name: name.to_string(),
            public_key,
            private_key,
        })
    }

    async fn delete(&self, region: &str, name: &str) -> Result<KeyPairDeletion> {
        let out = self
            .runner
            .run(
                "aws",
                &["ec2", "delete-key-pair", "--region", region, "--key-name", name],
            )
            .await?;
        if out.status.success() {
            return Ok(KeyPairDeletion::Deleted);
        }
        let stderr = String::from_utf8_lossy(&out.stderr);
        if is_missing_key_pair_error(&stderr) {
            return Ok(KeyPairDeletion::AlreadyAbsent);
        }
        bail!("delete-key-pair {name} failed: {}", stderr.trim())
    }
}
