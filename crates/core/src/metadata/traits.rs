//! Trait definitions for the metadata module.

use async_trait::async_trait;
use std::path::Path;
use tokio_util::sync::CancellationToken;

use super::error::ProbeError;
use super::types::TrackMetadata;

/// Reads per-track tags from an input file.
#[async_trait]
pub trait MetadataReader: Send + Sync {
    /// Returns the name of this reader implementation.
    fn name(&self) -> &str;

    /// Probes `path`. Each call probes again; nothing is cached.
    async fn read(
        &self,
        path: &Path,
        cancel: &CancellationToken,
    ) -> Result<TrackMetadata, ProbeError>;
}
