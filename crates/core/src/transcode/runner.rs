//! Process-backed transcoder.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::error::{Stage, TranscodeError};
use super::traits::Transcoder;
use super::types::TranscodeOperation;
use crate::process::{run_pipeline, ToolCommand};

/// Runs transcode operations as external processes.
#[derive(Debug, Clone)]
pub struct ProcessTranscoder {
    shell: PathBuf,
}

impl Default for ProcessTranscoder {
    fn default() -> Self {
        Self::new("sh")
    }
}

impl ProcessTranscoder {
    /// Creates a transcoder that runs command templates with the given shell.
    pub fn new(shell: impl Into<PathBuf>) -> Self {
        Self {
            shell: shell.into(),
        }
    }

    async fn run_command(
        &self,
        template: &str,
        input: &Path,
        output: &Path,
        cancel: &CancellationToken,
    ) -> Result<(), TranscodeError> {
        if template.trim().is_empty() {
            return Err(TranscodeError::invalid_operation("command template is empty"));
        }

        ToolCommand::new(&self.shell)
            .arg("-c")
            .arg(template)
            .env("input", input)
            .env("output", output)
            .execute(cancel)
            .await
            .map_err(|e| TranscodeError::stage(Stage::Command, e))?;
        Ok(())
    }
}

#[async_trait]
impl Transcoder for ProcessTranscoder {
    fn name(&self) -> &str {
        "process"
    }

    async fn transcode(
        &self,
        operation: &TranscodeOperation,
        input: &Path,
        output: &Path,
        cancel: &CancellationToken,
    ) -> Result<(), TranscodeError> {
        debug!(
            input = %input.display(),
            output = %output.display(),
            "Transcoding"
        );

        match operation {
            TranscodeOperation::Command { template, .. } => {
                self.run_command(template, input, output, cancel).await
            }
            TranscodeOperation::Pipeline { decode, encode, .. } => {
                let decode = decode.bind(input, output);
                let encode = encode.bind(input, output);
                run_pipeline(&decode, &encode, cancel).await?;
                Ok(())
            }
        }
    }
}
