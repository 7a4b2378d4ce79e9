use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::ScriptError;

/// Exit code reported for a process that was terminated by a signal.
pub const SIGNALED_EXIT_CODE: i32 = -1;

/// Captured result of a finished script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

/// Runs a script to completion and captures its output.
///
/// Implementations must stop waiting for the script when `cancel` fires and
/// return [`ScriptError::Cancelled`].
#[async_trait]
pub trait ScriptRunner: Send + Sync {
    async fn run(&self, script: &str, cancel: &CancellationToken) -> Result<ScriptOutput, ScriptError>;
}

/// Runs scripts as `<shell> -c <script>` child processes.
///
/// The child is killed if the operation is cancelled.
#[derive(Debug, Clone)]
pub struct ShellRunner {
    shell: String,
}

impl ShellRunner {
    /// Create a runner using `bash`.
    pub fn new() -> Self {
        Self::with_shell("bash")
    }

    /// Create a runner using the given shell binary.
    pub fn with_shell(shell: impl Into<String>) -> Self {
        Self {
            shell: shell.into(),
        }
    }

    pub fn shell(&self) -> &str {
        &self.shell
    }
}

impl Default for ShellRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ScriptRunner for ShellRunner {
    async fn run(&self, script: &str, cancel: &CancellationToken) -> Result<ScriptOutput, ScriptError> {
        let child = Command::new(&self.shell)
            .arg("-c")
            .arg(script)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ScriptError::Spawn {
                shell: self.shell.clone(),
                source,
            })?;

        debug!(shell = %self.shell, pid = ?child.id(), "script started");

        // Dropping the wait future drops the child, which kills it.
        let output = tokio::select! {
            output = child.wait_with_output() => output.map_err(ScriptError::Wait)?,
            () = cancel.cancelled() => {
                warn!(shell = %self.shell, "script cancelled, killing child process");
                return Err(ScriptError::Cancelled);
            }
        };

        let exit_code = output.status.code().unwrap_or(SIGNALED_EXIT_CODE);
        debug!(exit_code, "script finished");

        Ok(ScriptOutput {
            exit_code,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
