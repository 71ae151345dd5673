//! Error types for the metadata module.

use std::path::PathBuf;
use thiserror::Error;

use crate::process::ProcessError;

/// Errors that can occur while probing a file.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// The probe process could not be run or exited unsuccessfully.
    #[error("Probe failed: {0}")]
    Process(#[source] ProcessError),

    /// The probe ran but its output was not the expected document.
    #[error("Failed to parse probe output for {}: {reason}", .path.display())]
    Parse { path: PathBuf, reason: String },

    /// The run was cancelled while the probe was in flight.
    #[error("Probe cancelled")]
    Cancelled,
}

impl From<ProcessError> for ProbeError {
    fn from(err: ProcessError) -> Self {
        match err {
            ProcessError::Cancelled => Self::Cancelled,
            other => Self::Process(other),
        }
    }
}

impl ProbeError {
    /// Creates a new parse error.
    pub fn parse(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
