//! Publishing finished albums with rsync.

use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::naming::path_segment;
use crate::process::{ProcessError, ToolCommand};

/// Where and how converted albums are published.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PublishConfig {
    /// rsync destination root, local path or `host:/path`.
    pub destination: String,
    #[serde(default = "default_rsync_path")]
    pub rsync_path: PathBuf,
    /// Delete the local output directory once the transfer succeeded.
    #[serde(default = "default_remove_after_publish")]
    pub remove_after_publish: bool,
}

fn default_rsync_path() -> PathBuf {
    PathBuf::from("rsync")
}

fn default_remove_after_publish() -> bool {
    true
}

impl PublishConfig {
    pub fn new(destination: impl Into<String>) -> Self {
        Self {
            destination: destination.into(),
            rsync_path: default_rsync_path(),
            remove_after_publish: default_remove_after_publish(),
        }
    }
}

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("rsync to {destination} failed: {source}")]
    Transfer {
        destination: String,
        #[source]
        source: ProcessError,
    },

    #[error("Failed to remove {}: {source}", .path.display())]
    Cleanup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Publish cancelled")]
    Cancelled,
}

impl PublishError {
    /// rsync's stderr for a failed transfer.
    pub fn stderr(&self) -> Option<&str> {
        match self {
            Self::Transfer { source, .. } => source.stderr(),
            _ => None,
        }
    }
}

/// Copies an album directory to `<destination>/<artist>/<album>/`.
#[derive(Debug, Clone)]
pub struct RsyncPublisher {
    config: PublishConfig,
}

impl RsyncPublisher {
    pub fn new(config: PublishConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PublishConfig {
        &self.config
    }

    /// The remote directory an album lands in. Artist and album are reduced
    /// to single safe path segments.
    pub fn album_destination(&self, artist: &str, album: &str) -> String {
        format!(
            "{}/{}/{}/",
            self.config.destination.trim_end_matches('/'),
            path_segment(artist),
            path_segment(album)
        )
    }

    /// Transfers the contents of `output_dir`, then removes it if configured.
    /// Returns the destination written to.
    pub async fn publish(
        &self,
        output_dir: &Path,
        artist: &str,
        album: &str,
        cancel: &CancellationToken,
    ) -> Result<String, PublishError> {
        let destination = self.album_destination(artist, album);

        // Trailing slash: copy the directory's contents, not the directory.
        let mut source = OsString::from(output_dir.as_os_str());
        source.push("/");

        ToolCommand::new(&self.config.rsync_path)
            .args(["-rv", "--mkpath"])
            .arg(&source)
            .arg(&destination)
            .execute(cancel)
            .await
            .map_err(|source| match source {
                ProcessError::Cancelled => PublishError::Cancelled,
                source => PublishError::Transfer {
                    destination: destination.clone(),
                    source,
                },
            })?;

        info!(destination = %destination, "Published");

        if self.config.remove_after_publish {
            tokio::fs::remove_dir_all(output_dir)
                .await
                .map_err(|source| PublishError::Cleanup {
                    path: output_dir.to_path_buf(),
                    source,
                })?;
        } else {
            warn!(output_dir = %output_dir.display(), "Keeping local copy after publish");
        }

        Ok(destination)
    }
}
