//! `cm_ctl` execution
//!
//! Runs a [`ResourceCommand`] directly (no shell), captures its output and
//! maps a non-zero exit status to an error.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};

use dbcm_common::{Error, Result};
use tokio::process::Command;
use tracing::{debug, error, info, warn};

use super::command::{ResourceCommand, CM_CTL};

/// Default cluster-manager command timeout
pub const DEFAULT_CM_TIMEOUT: Duration = Duration::from_secs(300);

/// Captured result of a successful `cm_ctl` run
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub duration: Duration,
}

/// Cluster-manager CLI executor
#[derive(Debug, Clone)]
pub struct CmCtl {
    program: PathBuf,
    timeout: Duration,
}

impl Default for CmCtl {
    fn default() -> Self {
        Self::new(CM_CTL, DEFAULT_CM_TIMEOUT)
    }
}

impl CmCtl {
    pub fn new(program: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }

    pub fn program(&self) -> &PathBuf {
        &self.program
    }

    /// Execute `cmd`, failing on spawn errors, timeout or non-zero exit
    pub async fn run(&self, cmd: &ResourceCommand) -> Result<CommandOutput> {
        let program = self.program.display().to_string();
        info!(
            program = %program,
            action = %cmd.action(),
            resource = cmd.name(),
            "Running cluster-manager command"
        );
        debug!(args = ?cmd.args(), "cm_ctl arguments");

        let start = Instant::now();
        let child = Command::new(&self.program)
            .args(cmd.args())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::CommandSpawn {
                program: program.clone(),
                reason: e.to_string(),
            })?;

        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(result) => result?,
            Err(_) => {
                warn!(
                    program = %program,
                    timeout_secs = self.timeout.as_secs(),
                    "Cluster-manager command timed out"
                );
                return Err(Error::Timeout(format!(
                    "{} did not finish within {}s",
                    program,
                    self.timeout.as_secs()
                )));
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        if !output.status.success() {
            error!(
                program = %program,
                code = ?output.status.code(),
                stderr = %stderr.trim(),
                "Cluster-manager command failed"
            );
            return Err(Error::CommandFailed {
                program,
                code: output.status.code(),
                stderr: stderr.trim().to_string(),
            });
        }

        let duration = start.elapsed();
        info!(
            resource = cmd.name(),
            duration_ms = duration.as_millis() as u64,
            "Cluster-manager command completed"
        );

        Ok(CommandOutput {
            stdout,
            stderr,
            duration,
        })
    }
}
