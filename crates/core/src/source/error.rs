//! Error types for source preparation.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    /// Filesystem error on a specific path.
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The archive could not be read or extracted.
    #[error("Failed to extract {}: {source}", .path.display())]
    Archive {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    /// The archive held no top-level audio files.
    #[error("No audio files found in {}", .path.display())]
    NoAudioFiles { path: PathBuf },

    /// The blocking extraction task died.
    #[error("Extraction task failed: {0}")]
    Task(String),
}

impl SourceError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
