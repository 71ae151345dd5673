//! Mock transcoder for testing.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use crate::process::ProcessError;
use crate::transcode::{Stage, TranscodeError, TranscodeOperation, Transcoder};

/// A recorded transcode for test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedTranscode {
    pub input: PathBuf,
    pub output: PathBuf,
}

/// Mock implementation of the Transcoder trait.
///
/// By default every call writes a small non-empty file to the output path.
/// Behavior can be changed per input:
/// - fail at a given stage
/// - report success without writing anything
/// - write an empty file
/// - take longer (cancellation aware)
///
/// It also tracks the highest number of calls in flight at once.
#[derive(Debug, Clone)]
pub struct MockTranscoder {
    /// Completed calls.
    calls: Arc<RwLock<Vec<RecordedTranscode>>>,
    /// Inputs that fail, with the stage to blame.
    failures: Arc<RwLock<HashMap<PathBuf, Stage>>>,
    /// Inputs for which no output is written.
    missing_outputs: Arc<RwLock<HashSet<PathBuf>>>,
    /// Inputs for which an empty output is written.
    empty_outputs: Arc<RwLock<HashSet<PathBuf>>>,
    /// Per-input simulated durations.
    delays: Arc<RwLock<HashMap<PathBuf, Duration>>>,
    /// Simulated duration for inputs without their own delay.
    default_delay: Arc<RwLock<Duration>>,
    /// Bytes written to each output.
    output_bytes: Arc<RwLock<Vec<u8>>>,
    active: Arc<AtomicUsize>,
    max_active: Arc<AtomicUsize>,
    cancelled: Arc<AtomicUsize>,
}

impl Default for MockTranscoder {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTranscoder {
    /// Create a new mock transcoder.
    pub fn new() -> Self {
        Self {
            calls: Arc::new(RwLock::new(Vec::new())),
            failures: Arc::new(RwLock::new(HashMap::new())),
            missing_outputs: Arc::new(RwLock::new(HashSet::new())),
            empty_outputs: Arc::new(RwLock::new(HashSet::new())),
            delays: Arc::new(RwLock::new(HashMap::new())),
            default_delay: Arc::new(RwLock::new(Duration::ZERO)),
            output_bytes: Arc::new(RwLock::new(b"mock-aac-data".to_vec())),
            active: Arc::new(AtomicUsize::new(0)),
            max_active: Arc::new(AtomicUsize::new(0)),
            cancelled: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Make transcoding `input` fail at `stage`.
    pub async fn fail_on(&self, input: impl AsRef<Path>, stage: Stage) {
        self.failures
            .write()
            .await
            .insert(input.as_ref().to_path_buf(), stage);
    }

    /// Report success for `input` without writing an output file.
    pub async fn skip_output_for(&self, input: impl AsRef<Path>) {
        self.missing_outputs
            .write()
            .await
            .insert(input.as_ref().to_path_buf());
    }

    /// Write an empty output file for `input`.
    pub async fn write_empty_for(&self, input: impl AsRef<Path>) {
        self.empty_outputs
            .write()
            .await
            .insert(input.as_ref().to_path_buf());
    }

    /// Simulate a slow transcode for `input`.
    pub async fn set_delay_for(&self, input: impl AsRef<Path>, delay: Duration) {
        self.delays
            .write()
            .await
            .insert(input.as_ref().to_path_buf(), delay);
    }

    /// Simulate a duration for every input without its own delay.
    pub async fn set_default_delay(&self, delay: Duration) {
        *self.default_delay.write().await = delay;
    }

    /// Set the bytes written to each output.
    pub async fn set_output_bytes(&self, bytes: impl Into<Vec<u8>>) {
        *self.output_bytes.write().await = bytes.into();
    }

    /// All completed calls.
    pub async fn recorded_transcodes(&self) -> Vec<RecordedTranscode> {
        self.calls.read().await.clone()
    }

    /// Number of completed calls.
    pub async fn transcode_count(&self) -> usize {
        self.calls.read().await.len()
    }

    /// Highest number of calls that were in flight simultaneously.
    pub fn max_concurrent(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }

    /// Number of calls that stopped because of cancellation.
    pub fn cancelled_count(&self) -> usize {
        self.cancelled.load(Ordering::SeqCst)
    }

    async fn simulate(
        &self,
        input: &Path,
        output: &Path,
        cancel: &CancellationToken,
    ) -> Result<(), TranscodeError> {
        let delay = match self.delays.read().await.get(input) {
            Some(delay) => *delay,
            None => *self.default_delay.read().await,
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                self.cancelled.fetch_add(1, Ordering::SeqCst);
                return Err(TranscodeError::Cancelled);
            }
            _ = tokio::time::sleep(delay) => {}
        }

        if let Some(stage) = self.failures.read().await.get(input).copied() {
            return Err(TranscodeError::stage(
                stage,
                ProcessError::Failed {
                    command: format!("mock-{} {}", stage, input.display()),
                    code: Some(1),
                    stderr: format!("mock {} failure for {}\n", stage, input.display()),
                },
            ));
        }

        if self.missing_outputs.read().await.contains(input) {
            return Ok(());
        }

        let bytes = if self.empty_outputs.read().await.contains(input) {
            Vec::new()
        } else {
            self.output_bytes.read().await.clone()
        };
        tokio::fs::write(output, bytes)
            .await
            .map_err(|e| TranscodeError::stage(Stage::Encode, ProcessError::Io(e)))?;
        Ok(())
    }
}

#[async_trait]
impl Transcoder for MockTranscoder {
    fn name(&self) -> &str {
        "mock"
    }

    async fn transcode(
        &self,
        _operation: &TranscodeOperation,
        input: &Path,
        output: &Path,
        cancel: &CancellationToken,
    ) -> Result<(), TranscodeError> {
        let now_active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now_active, Ordering::SeqCst);

        let result = self.simulate(input, output, cancel).await;

        self.active.fetch_sub(1, Ordering::SeqCst);
        if result.is_ok() {
            self.calls.write().await.push(RecordedTranscode {
                input: input.to_path_buf(),
                output: output.to_path_buf(),
            });
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn op() -> TranscodeOperation {
        TranscodeOperation::command("true", "m4a")
    }

    #[tokio::test]
    async fn test_writes_output_and_records_call() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("01 - A.m4a");
        let transcoder = MockTranscoder::new();

        transcoder
            .transcode(&op(), Path::new("/src/a.flac"), &output, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(std::fs::read(&output).unwrap(), b"mock-aac-data");
        assert_eq!(transcoder.transcode_count().await, 1);
        assert_eq!(transcoder.max_concurrent(), 1);
    }

    #[tokio::test]
    async fn test_configured_stage_failure() {
        let dir = tempfile::tempdir().unwrap();
        let transcoder = MockTranscoder::new();
        transcoder.fail_on("/src/a.flac", Stage::Decode).await;

        let err = transcoder
            .transcode(
                &op(),
                Path::new("/src/a.flac"),
                &dir.path().join("a.m4a"),
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();
        assert_eq!(err.failed_stage(), Some(Stage::Decode));
        assert_eq!(transcoder.transcode_count().await, 0);
    }
}
