//! Error types for process execution.

use std::process::Output;
use thiserror::Error;

/// Errors that can occur while running an external process.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// The program could not be started.
    #[error("Failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The process ran but exited unsuccessfully.
    #[error("`{command}` {}: {}", exit_label(.code), .stderr.trim())]
    Failed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    /// I/O error while talking to the process.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The wait was abandoned because the run was cancelled.
    #[error("Process cancelled")]
    Cancelled,
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exited with code {}", code),
        None => "was terminated by a signal".to_string(),
    }
}

impl ProcessError {
    /// Builds a [`ProcessError::Failed`] from a finished process's output.
    pub fn failed(command: impl Into<String>, output: &Output) -> Self {
        Self::Failed {
            command: command.into(),
            code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }

    /// Captured stderr, when the process got far enough to produce any.
    pub fn stderr(&self) -> Option<&str> {
        match self {
            Self::Failed { stderr, .. } => Some(stderr),
            _ => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
