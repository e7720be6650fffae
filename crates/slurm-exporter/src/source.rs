use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;

use slurm_common::SINFO_FORMAT;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to run {bin}: {source}")]
    Spawn {
        bin: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{bin} exited with {}: {stderr}", describe_exit(.code))]
    Exit {
        bin: String,
        code: Option<i32>,
        stderr: String,
    },
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {code}"),
        None => "signal".to_string(),
    }
}

/// Supplier of raw per-node scheduler output.
#[async_trait]
pub trait NodeSource: Send + Sync {
    async fn fetch(&self) -> Result<Vec<u8>, SourceError>;
}

/// Runs `sinfo` once per fetch.
#[derive(Debug, Clone)]
pub struct SinfoSource {
    bin: String,
}

impl SinfoSource {
    pub fn new(bin: impl Into<String>) -> Self {
        Self { bin: bin.into() }
    }
}

#[async_trait]
impl NodeSource for SinfoSource {
    async fn fetch(&self) -> Result<Vec<u8>, SourceError> {
        let output = Command::new(&self.bin)
            .args(["-h", "-N", "-O", SINFO_FORMAT])
            .output()
            .await
            .map_err(|source| SourceError::Spawn {
                bin: self.bin.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(SourceError::Exit {
                bin: self.bin.clone(),
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        tracing::debug!(bin=%self.bin, bytes = output.stdout.len(), "sinfo finished");
        Ok(output.stdout)
    }
}
