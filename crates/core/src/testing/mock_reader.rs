//! Mock metadata reader for testing.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use crate::metadata::{MetadataReader, ProbeError, TrackMetadata};
use crate::process::ProcessError;

/// Mock implementation of the MetadataReader trait.
///
/// Unknown paths get a title equal to the file stem and no track number.
#[derive(Debug, Clone, Default)]
pub struct MockMetadataReader {
    /// Pre-configured metadata by path.
    metadata: Arc<RwLock<HashMap<PathBuf, TrackMetadata>>>,
    /// Paths whose probe fails.
    failures: Arc<RwLock<HashSet<PathBuf>>>,
    /// Simulated probe duration.
    delay: Arc<RwLock<Duration>>,
    /// Number of probes performed.
    reads: Arc<AtomicUsize>,
}

impl MockMetadataReader {
    /// Create a new mock reader.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the metadata returned for a specific path.
    pub async fn set_metadata(&self, path: impl AsRef<Path>, metadata: TrackMetadata) {
        self.metadata
            .write()
            .await
            .insert(path.as_ref().to_path_buf(), metadata);
    }

    /// Make probing `path` fail.
    pub async fn fail_on(&self, path: impl AsRef<Path>) {
        self.failures
            .write()
            .await
            .insert(path.as_ref().to_path_buf());
    }

    /// Set the simulated probe duration.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = delay;
    }

    /// Number of probes performed so far.
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MetadataReader for MockMetadataReader {
    fn name(&self) -> &str {
        "mock"
    }

    async fn read(
        &self,
        path: &Path,
        cancel: &CancellationToken,
    ) -> Result<TrackMetadata, ProbeError> {
        self.reads.fetch_add(1, Ordering::SeqCst);

        let delay = *self.delay.read().await;
        if !delay.is_zero() {
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = cancel.cancelled() => return Err(ProbeError::Cancelled),
            }
        }
        if cancel.is_cancelled() {
            return Err(ProbeError::Cancelled);
        }

        if self.failures.read().await.contains(path) {
            return Err(ProbeError::Process(ProcessError::Failed {
                command: format!("mock-probe {}", path.display()),
                code: Some(1),
                stderr: format!(
                    "{}: Invalid data found when processing input\n",
                    path.display()
                ),
            }));
        }

        if let Some(metadata) = self.metadata.read().await.get(path) {
            return Ok(metadata.clone());
        }

        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(TrackMetadata::new("", stem))
    }
}
