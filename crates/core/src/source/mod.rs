//! Grouping command-line inputs into album sources.
//!
//! Every `.zip` album becomes its own [`Source`]; loose `.flac` files are
//! gathered into a single one. Anything else is logged and skipped. A source
//! is only extracted when [`Source::prepare`] is called, so each album can be
//! converted and published before the next one touches the disk.

mod archive;
mod error;

pub use error::SourceError;

use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::{error, info, warn};

use crate::naming::path_segment;
use archive::display_name;

const AUDIO_EXTENSIONS: [&str; 1] = ["flac"];
const ARTWORK_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// An album named on the command line, not yet extracted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Archive(PathBuf),
    /// All loose audio inputs, in command-line order.
    Files(Vec<PathBuf>),
}

impl Source {
    /// Archive file name, or `"files"` for loose inputs.
    pub fn label(&self) -> String {
        match self {
            Self::Archive(path) => display_name(path),
            Self::Files(_) => "files".to_string(),
        }
    }

    /// Extracts the source and sets up its output directory.
    ///
    /// With a configured `output_dir`, an archive writes into its own
    /// subdirectory named after the archive and loose files write into
    /// `output_dir` itself. Without one, each source gets a fresh directory
    /// under the system temp dir that outlives the process.
    pub async fn prepare(&self, output_dir: Option<&Path>) -> Result<SourceBatch, SourceError> {
        match self {
            Self::Archive(path) => prepare_archive(path, output_dir).await,
            Self::Files(inputs) => Ok(SourceBatch {
                label: self.label(),
                inputs: inputs.clone(),
                output_dir: batch_output_dir(output_dir).await?,
                extracted: None,
            }),
        }
    }
}

/// One prepared album: its inputs and where the outputs go.
#[derive(Debug)]
pub struct SourceBatch {
    pub label: String,
    pub inputs: Vec<PathBuf>,
    pub output_dir: PathBuf,
    /// Keeps extracted archive contents alive until the batch is dropped.
    extracted: Option<TempDir>,
}

impl SourceBatch {
    pub fn first_input(&self) -> Option<&Path> {
        self.inputs.first().map(PathBuf::as_path)
    }

    /// Whether the inputs live in a temporary extraction directory.
    pub fn is_extracted(&self) -> bool {
        self.extracted.is_some()
    }
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| extensions.iter().any(|x| x.eq_ignore_ascii_case(e)))
}

/// Groups `inputs` into sources, archives in the order given, with the
/// loose-file source last. Nothing is read from disk.
pub fn plan_sources(inputs: &[PathBuf]) -> Vec<Source> {
    let mut sources = Vec::new();
    let mut loose = Vec::new();

    for input in inputs {
        if has_extension(input, &["zip"]) {
            sources.push(Source::Archive(input.clone()));
        } else if has_extension(input, &AUDIO_EXTENSIONS) {
            loose.push(input.clone());
        } else {
            error!(file = %input.display(), "Unknown file type, skipping");
        }
    }

    if !loose.is_empty() {
        sources.push(Source::Files(loose));
    }

    sources
}

async fn prepare_archive(
    archive: &Path,
    output_dir: Option<&Path>,
) -> Result<SourceBatch, SourceError> {
    let extracted = archive::extract(archive).await?;
    let album_dir = output_dir.map(|dir| dir.join(archive_dir_name(archive)));
    let output_dir = batch_output_dir(album_dir.as_deref()).await?;

    let mut inputs = Vec::new();
    for file in archive::top_level_files(extracted.path())? {
        if has_extension(&file, &AUDIO_EXTENSIONS) {
            inputs.push(file);
        } else if has_extension(&file, &ARTWORK_EXTENSIONS) {
            info!(file = %display_name(&file), "Copying artwork");
            move_file(&file, &output_dir.join(display_name(&file))).await?;
        } else {
            warn!(file = %display_name(&file), "Unknown file type in archive, skipping");
        }
    }

    if inputs.is_empty() {
        return Err(SourceError::NoAudioFiles {
            path: archive.to_path_buf(),
        });
    }

    Ok(SourceBatch {
        label: display_name(archive),
        inputs,
        output_dir,
        extracted: Some(extracted),
    })
}

/// `Album.zip` writes into `Album/`.
fn archive_dir_name(archive: &Path) -> String {
    let stem = archive
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    path_segment(&stem)
}

async fn batch_output_dir(configured: Option<&Path>) -> Result<PathBuf, SourceError> {
    match configured {
        Some(dir) => {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| SourceError::io(dir, e))?;
            Ok(dir.to_path_buf())
        }
        None => {
            let dir = tempfile::Builder::new()
                .prefix("audioconvert")
                .tempdir()
                .map_err(|e| SourceError::io(std::env::temp_dir(), e))?;
            Ok(dir.keep())
        }
    }
}

/// Rename, falling back to copy-and-delete across filesystems.
async fn move_file(from: &Path, to: &Path) -> Result<(), SourceError> {
    if tokio::fs::rename(from, to).await.is_ok() {
        return Ok(());
    }
    tokio::fs::copy(from, to)
        .await
        .map_err(|e| SourceError::io(to, e))?;
    tokio::fs::remove_file(from)
        .await
        .map_err(|e| SourceError::io(from, e))
}
