//! Package installer collaborator, run between the remove and write phases
//! when a commit needs dependencies materialized first.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::error::InstallError;

/// One invocation of a package tool.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InstallRequest {
    pub tool_name: String,
    pub args: Vec<String>,
    pub working_dir: PathBuf,
}

impl InstallRequest {
    pub fn new(tool_name: impl Into<String>, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            tool_name: tool_name.into(),
            args: Vec::new(),
            working_dir: working_dir.into(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }
}

/// Captured output of a successful install.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InstallOutput {
    pub stdout: String,
    pub stderr: String,
}

#[async_trait]
pub trait PackageInstaller: Send + Sync {
    async fn install(&self, request: &InstallRequest) -> Result<InstallOutput, InstallError>;
}

/// Runs the tool as a child process.
#[derive(Clone, Copy, Debug, Default)]
pub struct CommandInstaller;

#[async_trait]
impl PackageInstaller for CommandInstaller {
    async fn install(&self, request: &InstallRequest) -> Result<InstallOutput, InstallError> {
        debug!(
            tool = %request.tool_name,
            args = ?request.args,
            dir = %request.working_dir.display(),
            "running installer"
        );
        let output = Command::new(&request.tool_name)
            .args(&request.args)
            .current_dir(&request.working_dir)
            .output()
            .await
            .map_err(|source| InstallError::Spawn {
                tool: request.tool_name.clone(),
                source,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        if !output.status.success() {
            return Err(InstallError::Failed {
                tool: request.tool_name.clone(),
                status: output.status.to_string(),
                stderr,
            });
        }
        Ok(InstallOutput { stdout, stderr })
    }
}
