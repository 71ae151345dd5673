//! Two-stage process pipelines (decoder piped into encoder).

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::PathBuf;
use std::process::{Output, Stdio};

use thiserror::Error;
use tokio::process::{Child, Command};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::error::ProcessError;
use super::render_command_line;

/// Which side of a pipeline a failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineSide {
    /// The upstream stage writing to the pipe.
    Decode,
    /// The downstream stage reading from the pipe.
    Encode,
}

impl fmt::Display for PipelineSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Decode => f.write_str("decode"),
            Self::Encode => f.write_str("encode"),
        }
    }
}

/// One fully-bound stage of a pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineStage {
    pub program: PathBuf,
    pub args: Vec<OsString>,
}

impl PipelineStage {
    pub fn new<I, S>(program: impl Into<PathBuf>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(|a| a.as_ref().to_os_string()).collect(),
        }
    }

    pub fn command_line(&self) -> String {
        render_command_line(&self.program, &self.args)
    }

    fn spawn(&self, stdin: Stdio) -> std::io::Result<Child> {
        // The Command (and any pipe end it holds) is dropped on return, so the
        // parent never keeps a copy of the inter-stage pipe open.
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(stdin)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd.spawn()
    }

    fn spawn_error(&self, side: PipelineSide, source: std::io::Error) -> PipelineError {
        PipelineError::Stage {
            side,
            source: ProcessError::Spawn {
                program: self.program.to_string_lossy().into_owned(),
                source,
            },
        }
    }
}

/// Errors from [`run_pipeline`].
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A specific stage failed; `source` carries its command line and stderr.
    #[error("{side} stage failed: {source}")]
    Stage {
        side: PipelineSide,
        #[source]
        source: ProcessError,
    },

    /// The run was cancelled while the pipeline was in flight.
    #[error("Pipeline cancelled")]
    Cancelled,
}

impl PipelineError {
    fn stage(side: PipelineSide, source: ProcessError) -> Self {
        Self::Stage { side, source }
    }

    pub fn side(&self) -> Option<PipelineSide> {
        match self {
            Self::Stage { side, .. } => Some(*side),
            Self::Cancelled => None,
        }
    }
}

/// Runs `decode | encode` and waits for both stages to exit.
///
/// The decoder's stdout becomes the encoder's stdin. Both stderr streams are
/// drained concurrently while the stages run.
///
/// Failure attribution: a decoder that exits with a non-zero code is blamed
/// first. A decoder that was killed by a signal (typically SIGPIPE because
/// the encoder went away) is only blamed if the encoder itself succeeded.
pub async fn run_pipeline(
    decode: &PipelineStage,
    encode: &PipelineStage,
    cancel: &CancellationToken,
) -> Result<(), PipelineError> {
    if cancel.is_cancelled() {
        return Err(PipelineError::Cancelled);
    }

    debug!(
        decode = %decode.command_line(),
        encode = %encode.command_line(),
        "Running pipeline"
    );

    let mut decoder = decode
        .spawn(Stdio::null())
        .map_err(|e| decode.spawn_error(PipelineSide::Decode, e))?;

    let stream: Stdio = match decoder.stdout.take() {
        Some(stdout) => stdout
            .try_into()
            .map_err(|e| PipelineError::stage(PipelineSide::Decode, ProcessError::Io(e)))?,
        None => {
            return Err(PipelineError::stage(
                PipelineSide::Decode,
                ProcessError::Io(std::io::Error::other("decoder stdout was not captured")),
            ))
        }
    };

    // On failure the decoder is dropped here and killed.
    let encoder = encode
        .spawn(stream)
        .map_err(|e| encode.spawn_error(PipelineSide::Encode, e))?;

    let (decoded, encoded) = tokio::select! {
        outputs = async { tokio::join!(decoder.wait_with_output(), encoder.wait_with_output()) } => outputs,
        _ = cancel.cancelled() => return Err(PipelineError::Cancelled),
    };

    let decoded =
        decoded.map_err(|e| PipelineError::stage(PipelineSide::Decode, ProcessError::Io(e)))?;
    let encoded =
        encoded.map_err(|e| PipelineError::stage(PipelineSide::Encode, ProcessError::Io(e)))?;

    attribute_failure(decode, &decoded, encode, &encoded)
}

fn attribute_failure(
    decode: &PipelineStage,
    decoded: &Output,
    encode: &PipelineStage,
    encoded: &Output,
) -> Result<(), PipelineError> {
    let decode_exited_nonzero = !decoded.status.success() && decoded.status.code().is_some();

    if decode_exited_nonzero {
        return Err(PipelineError::stage(
            PipelineSide::Decode,
            ProcessError::failed(decode.command_line(), decoded),
        ));
    }
    if !encoded.status.success() {
        return Err(PipelineError::stage(
            PipelineSide::Encode,
            ProcessError::failed(encode.command_line(), encoded),
        ));
    }
    if !decoded.status.success() {
        return Err(PipelineError::stage(
            PipelineSide::Decode,
            ProcessError::failed(decode.command_line(), decoded),
        ));
    }
    Ok(())
}
