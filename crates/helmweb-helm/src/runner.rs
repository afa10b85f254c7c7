//! Running the helm binary
//!
//! One invocation, one subordinate process, fully buffered output. The exit
//! code alone does not decide success: helm reports conflicts in stderr, so
//! the captured text is always handed back for interpretation.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, error};

use helmweb_core::{DeployError, HelmCommand, Result, ToolOutput, classify_output};

/// How a completed invocation ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitState {
    Succeeded,
    /// Non-zero exit; `None` when the process was terminated by a signal
    Failed(Option<i32>),
}

/// Raw result of a completed invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    pub stdout: String,
    pub stderr: String,
    pub status: ExitState,
}

impl ExecutionResult {
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: String::new(),
            status: ExitState::Succeeded,
        }
    }

    pub fn failure(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            stdout: String::new(),
            stderr: stderr.into(),
            status: ExitState::Failed(Some(code)),
        }
    }

    pub fn with_stderr(mut self, stderr: impl Into<String>) -> Self {
        self.stderr = stderr.into();
        self
    }

    pub fn succeeded(&self) -> bool {
        self.status == ExitState::Succeeded
    }

    /// Keep the output of a successful run, classify the diagnostics of a failed one
    pub fn into_output(self) -> Result<ToolOutput> {
        if self.succeeded() {
            Ok(ToolOutput::new(self.stdout, self.stderr))
        } else {
            Err(classify_output(&self.stdout, &self.stderr))
        }
    }
}

/// Executes helm commands
#[async_trait]
pub trait HelmRunner: Send + Sync {
    /// Run one command to completion.
    ///
    /// Fails only when no result could be obtained (the process did not
    /// start or ran out of time); a tool error is an `Ok` result with a
    /// failed status.
    async fn run(&self, command: &HelmCommand) -> Result<ExecutionResult>;
}

/// Spawns the helm binary for every command
#[derive(Debug, Clone)]
pub struct ProcessExecutor {
    binary: PathBuf,
    timeout: Duration,
}

impl ProcessExecutor {
    pub fn new(binary: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            timeout,
        }
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    fn program(&self) -> String {
        self.binary.display().to_string()
    }
}

#[async_trait]
impl HelmRunner for ProcessExecutor {
    async fn run(&self, command: &HelmCommand) -> Result<ExecutionResult> {
        debug!(binary = %self.binary.display(), command = %command, "running helm");

        // Dropping the output future kills the child, both on timeout and
        // when the caller itself goes away
        let output = Command::new(&self.binary)
            .args(command.args())
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output();

        let output = match tokio::time::timeout(self.timeout, output).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                error!(binary = %self.binary.display(), error = %e, "failed to start helm");
                return Err(DeployError::ProcessStart {
                    program: self.program(),
                    message: e.to_string(),
                });
            }
            Err(_) => {
                error!(command = %command, timeout = ?self.timeout, "helm timed out, process killed");
                return Err(DeployError::Timeout {
                    program: self.program(),
                    seconds: self.timeout.as_secs(),
                });
            }
        };

        let result = ExecutionResult {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            status: if output.status.success() {
                ExitState::Succeeded
            } else {
                ExitState::Failed(output.status.code())
            },
        };
        debug!(
            command = %command,
            status = ?result.status,
            stdout = %result.stdout,
            stderr = %result.stderr,
            "helm finished"
        );
        Ok(result)
    }
}
