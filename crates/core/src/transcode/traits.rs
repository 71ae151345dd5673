//! Trait definitions for the transcode module.

use async_trait::async_trait;
use std::path::Path;
use tokio_util::sync::CancellationToken;

use super::error::TranscodeError;
use super::types::TranscodeOperation;

/// Executes a [`TranscodeOperation`] for one file.
#[async_trait]
pub trait Transcoder: Send + Sync {
    /// Returns the name of this transcoder implementation.
    fn name(&self) -> &str;

    /// Converts `input` into `output`, blocking until every stage has exited.
    ///
    /// Implementations must stop promptly (terminating their child processes)
    /// once `cancel` fires, returning [`TranscodeError::Cancelled`].
    async fn transcode(
        &self,
        operation: &TranscodeOperation,
        input: &Path,
        output: &Path,
        cancel: &CancellationToken,
    ) -> Result<(), TranscodeError>;
}
