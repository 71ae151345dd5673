//! Error types for the transcode module.

use std::fmt;
use thiserror::Error;

use crate::process::{PipelineError, PipelineSide, ProcessError};

/// The external invocation a transcode failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// The single shell command of a command operation.
    Command,
    /// The decoding side of a pipeline.
    Decode,
    /// The encoding side of a pipeline.
    Encode,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Command => f.write_str("command"),
            Self::Decode => f.write_str("decode"),
            Self::Encode => f.write_str("encode"),
        }
    }
}

impl From<PipelineSide> for Stage {
    fn from(side: PipelineSide) -> Self {
        match side {
            PipelineSide::Decode => Self::Decode,
            PipelineSide::Encode => Self::Encode,
        }
    }
}

/// Errors that can occur while transcoding one file.
#[derive(Debug, Error)]
pub enum TranscodeError {
    /// An external stage failed to start or exited unsuccessfully.
    #[error("{stage} stage failed: {source}")]
    Stage {
        stage: Stage,
        #[source]
        source: ProcessError,
    },

    /// The operation cannot be executed as configured.
    #[error("Invalid transcode operation: {reason}")]
    InvalidOperation { reason: String },

    /// The run was cancelled while the transcode was in flight.
    #[error("Transcode cancelled")]
    Cancelled,
}

impl TranscodeError {
    /// Creates a stage error, folding process cancellation into `Cancelled`.
    pub fn stage(stage: Stage, source: ProcessError) -> Self {
        match source {
            ProcessError::Cancelled => Self::Cancelled,
            source => Self::Stage { stage, source },
        }
    }

    /// Creates a new invalid operation error.
    pub fn invalid_operation(reason: impl Into<String>) -> Self {
        Self::InvalidOperation {
            reason: reason.into(),
        }
    }

    /// The stage that failed, if the failure came from an external process.
    pub fn failed_stage(&self) -> Option<Stage> {
        match self {
            Self::Stage { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// Captured stderr of the failing stage.
    pub fn stderr(&self) -> Option<&str> {
        match self {
            Self::Stage { source, .. } => source.stderr(),
            _ => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

impl From<PipelineError> for TranscodeError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::Stage { side, source } => Self::stage(side.into(), source),
            PipelineError::Cancelled => Self::Cancelled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_error_keeps_side() {
        let err: TranscodeError = PipelineError::Stage {
            side: PipelineSide::Decode,
            source: ProcessError::Failed {
                command: "ffmpeg -i a.flac -f caf -".to_string(),
                code: Some(1),
                stderr: "a.flac: Invalid data found\n".to_string(),
            },
        }
        .into();

        assert_eq!(err.failed_stage(), Some(Stage::Decode));
        assert_eq!(err.stderr(), Some("a.flac: Invalid data found\n"));
        assert!(err.to_string().starts_with("decode stage failed: `ffmpeg -i a.flac -f caf -`"));
    }

    #[test]
    fn test_cancelled_process_folds_into_cancelled() {
        let err = TranscodeError::stage(Stage::Command, ProcessError::Cancelled);
        assert!(err.is_cancelled());
        assert_eq!(err.failed_stage(), None);

        let err: TranscodeError = PipelineError::Cancelled.into();
        assert!(err.is_cancelled());
    }
}
