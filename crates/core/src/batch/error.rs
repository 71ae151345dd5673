//! Error types for the batch module.

use std::path::PathBuf;
use thiserror::Error;

use crate::metadata::ProbeError;
use crate::transcode::TranscodeError;

/// Errors that abort a batch run. Any one of them is fatal to the whole batch.
#[derive(Debug, Error)]
pub enum BatchError {
    /// Probing an input failed.
    #[error("Failed to read metadata from {}: {source}", .input.display())]
    Probe {
        input: PathBuf,
        #[source]
        source: ProbeError,
    },

    /// Transcoding an input failed.
    #[error("Failed to transcode {}: {source}", .input.display())]
    Transcode {
        input: PathBuf,
        #[source]
        source: TranscodeError,
    },

    /// The transcode reported success but the output is missing or empty.
    #[error("Output verification failed for {}: {reason}", .output.display())]
    OutputVerification { output: PathBuf, reason: String },

    /// Two inputs derived the same output file name.
    #[error(
        "{} and {} would both be written to {}",
        .first.display(),
        .second.display(),
        .output.display()
    )]
    DuplicateOutput {
        output: PathBuf,
        first: PathBuf,
        second: PathBuf,
    },

    /// The output directory could not be created.
    #[error("Failed to create output directory {}: {source}", .path.display())]
    OutputDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The pool size must be at least one.
    #[error("Pool size must be at least 1")]
    InvalidPoolSize,

    /// A worker task panicked.
    #[error("Worker panicked: {reason}")]
    WorkerPanicked { reason: String },

    /// The batch was cancelled from outside.
    #[error("Batch cancelled")]
    Cancelled,
}

impl BatchError {
    /// Whether this error is only a consequence of cancellation rather than
    /// an original failure.
    pub fn is_cancelled(&self) -> bool {
        match self {
            Self::Probe { source, .. } => source.is_cancelled(),
            Self::Transcode { source, .. } => source.is_cancelled(),
            Self::Cancelled => true,
            _ => false,
        }
    }

    /// The input the failure belongs to, when there is one.
    pub fn input(&self) -> Option<&std::path::Path> {
        match self {
            Self::Probe { input, .. } | Self::Transcode { input, .. } => Some(input),
            Self::DuplicateOutput { second, .. } => Some(second),
            _ => None,
        }
    }
}
