//! Builder for running a single external command.

use std::ffi::{OsStr, OsString};
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};

use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::error::ProcessError;
use super::render_command_line;

/// Output captured from a successful command.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    /// Process exit status.
    pub status: ExitStatus,
    /// Captured standard output.
    pub stdout: Vec<u8>,
    /// Captured standard error (lossy UTF-8).
    pub stderr: String,
}

/// A builder for one external tool invocation.
///
/// # Example
///
/// ```no_run
/// use audioconvert_core::process::ToolCommand;
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() -> Result<(), audioconvert_core::process::ProcessError> {
/// let output = ToolCommand::new("ffprobe")
///     .args(["-hide_banner", "-show_format", "-print_format", "json"])
///     .arg("-i")
///     .arg("/music/01.flac")
///     .execute(&CancellationToken::new())
///     .await?;
/// println!("{}", String::from_utf8_lossy(&output.stdout));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ToolCommand {
    program: PathBuf,
    args: Vec<OsString>,
    envs: Vec<(OsString, OsString)>,
}

impl ToolCommand {
    /// Create a new command for the given program.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            envs: Vec::new(),
        }
    }

    /// Append a single argument.
    pub fn arg(&mut self, arg: impl AsRef<OsStr>) -> &mut Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    /// Append multiple arguments.
    pub fn args<I, S>(&mut self, args: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    /// Set an environment variable for the child.
    pub fn env(&mut self, key: impl AsRef<OsStr>, value: impl AsRef<OsStr>) -> &mut Self {
        self.envs
            .push((key.as_ref().to_os_string(), value.as_ref().to_os_string()));
        self
    }

    /// The command line, for logs and error messages.
    pub fn command_line(&self) -> String {
        render_command_line(&self.program, &self.args)
    }

    /// Run the command to completion, capturing stdout and stderr.
    ///
    /// Both pipes are drained before the exit status is read, so a chatty
    /// child can never block on a full pipe buffer. If `cancel` fires first
    /// the child is killed and [`ProcessError::Cancelled`] is returned.
    ///
    /// # Errors
    ///
    /// - [`ProcessError::Spawn`] if the program cannot be started.
    /// - [`ProcessError::Failed`] on a non-zero exit, with stderr attached.
    /// - [`ProcessError::Cancelled`] if the token was cancelled.
    pub async fn execute(&self, cancel: &CancellationToken) -> Result<ToolOutput, ProcessError> {
        if cancel.is_cancelled() {
            return Err(ProcessError::Cancelled);
        }

        let command_line = self.command_line();
        debug!(command = %command_line, "Running command");

        let child = {
            let mut cmd = Command::new(&self.program);
            cmd.args(&self.args)
                .envs(self.envs.iter().map(|(k, v)| (k, v)))
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .kill_on_drop(true);
            cmd.spawn().map_err(|source| ProcessError::Spawn {
                program: self.program.to_string_lossy().into_owned(),
                source,
            })?
        };

        let output = tokio::select! {
            output = child.wait_with_output() => output?,
            _ = cancel.cancelled() => return Err(ProcessError::Cancelled),
        };

        if !output.status.success() {
            return Err(ProcessError::failed(command_line, &output));
        }

        Ok(ToolOutput {
            status: output.status,
            stdout: output.stdout,
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
