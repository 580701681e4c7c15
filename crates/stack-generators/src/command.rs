//! External command execution with a deadline

use std::io::ErrorKind;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;

use crate::{Error, Result};

/// Captured output of a successful command.
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Run `program` in `work_dir`, killing it if it outlives `timeout`.
///
/// # Errors
///
/// - [`Error::CommandNotFound`] when the program cannot be spawned because it does not exist
/// - [`Error::Timeout`] when the deadline passes
/// - [`Error::CommandFailed`] on a non-zero exit
pub async fn run_command(
    program: &str,
    args: &[String],
    work_dir: &Path,
    timeout: Duration,
) -> Result<CommandOutput> {
    tracing::debug!(program, ?args, "Running command");

    let child = Command::new(program)
        .args(args)
        .current_dir(work_dir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| match e.kind() {
            ErrorKind::NotFound => Error::CommandNotFound {
                command: program.to_string(),
            },
            _ => Error::io(work_dir, e),
        })?;

    let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(result) => result.map_err(|e| Error::io(work_dir, e))?,
        Err(_) => {
            tracing::warn!(program, seconds = timeout.as_secs(), "Command timed out");
            return Err(Error::Timeout {
                command: program.to_string(),
                seconds: timeout.as_secs(),
            });
        }
    };

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();

    if !output.status.success() {
        return Err(Error::CommandFailed {
            command: program.to_string(),
            code: output.status.code(),
            stderr: stderr.trim().to_string(),
        });
    }

    Ok(CommandOutput { stdout, stderr })
}
