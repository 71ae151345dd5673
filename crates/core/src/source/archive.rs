//! Zip extraction.

use std::fs::File;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::{debug, info};
use zip::ZipArchive;

use super::error::SourceError;

/// Extracts `archive` into a fresh temporary directory, removed when the
/// returned handle is dropped.
///
/// Entries whose names would escape the directory are rejected by the zip
/// crate.
pub(crate) async fn extract(archive: &Path) -> Result<TempDir, SourceError> {
    let archive = archive.to_path_buf();
    tokio::task::spawn_blocking(move || extract_blocking(&archive))
        .await
        .map_err(|e| SourceError::Task(e.to_string()))?
}

fn extract_blocking(archive: &Path) -> Result<TempDir, SourceError> {
    info!(name = %display_name(archive), "Unzipping");

    let file = File::open(archive).map_err(|e| SourceError::io(archive, e))?;
    let mut zip = ZipArchive::new(file).map_err(|source| SourceError::Archive {
        path: archive.to_path_buf(),
        source,
    })?;

    let dir = tempfile::Builder::new()
        .prefix("audioconvert")
        .tempdir()
        .map_err(|e| SourceError::io(std::env::temp_dir(), e))?;

    zip.extract(dir.path()).map_err(|source| SourceError::Archive {
        path: archive.to_path_buf(),
        source,
    })?;
    debug!(entries = zip.len(), dir = %dir.path().display(), "Extracted");

    Ok(dir)
}

/// Top-level regular files of an extracted archive, sorted by name.
pub(crate) fn top_level_files(dir: &Path) -> Result<Vec<PathBuf>, SourceError> {
    let entries = std::fs::read_dir(dir).map_err(|e| SourceError::io(dir, e))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| SourceError::io(dir, e))?;
        let file_type = entry.file_type().map_err(|e| SourceError::io(entry.path(), e))?;
        if file_type.is_file() {
            files.push(entry.path());
        } else {
            debug!(path = %entry.path().display(), "Skipping non-file entry");
        }
    }
    files.sort();
    Ok(files)
}

pub(crate) fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
