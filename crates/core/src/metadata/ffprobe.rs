//! FFprobe-based metadata reader.

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;

use super::error::ProbeError;
use super::traits::MetadataReader;
use super::types::{CodecInfo, TrackMetadata};
use crate::process::ToolCommand;

/// Reads track tags by running `ffprobe` with JSON output.
#[derive(Debug, Clone)]
pub struct FfprobeReader {
    ffprobe_path: PathBuf,
}

impl FfprobeReader {
    /// Creates a reader that runs the given ffprobe binary.
    pub fn new(ffprobe_path: impl Into<PathBuf>) -> Self {
        Self {
            ffprobe_path: ffprobe_path.into(),
        }
    }

    /// Creates a reader that runs `ffprobe` from `PATH`.
    pub fn with_defaults() -> Self {
        Self::new("ffprobe")
    }

    pub fn ffprobe_path(&self) -> &Path {
        &self.ffprobe_path
    }

    /// Parses ffprobe JSON output into TrackMetadata.
    fn parse_probe_output(path: &Path, output: &[u8]) -> Result<TrackMetadata, ProbeError> {
        #[derive(Deserialize)]
        struct ProbeOutput {
            format: ProbeFormat,
            #[serde(default)]
            streams: Vec<ProbeStream>,
        }

        #[derive(Deserialize)]
        struct ProbeFormat {
            #[serde(default)]
            tags: HashMap<String, String>,
        }

        #[derive(Deserialize)]
        struct ProbeStream {
            codec_type: Option<String>,
            codec_name: Option<String>,
            sample_rate: Option<String>,
            channels: Option<u8>,
        }

        let probe: ProbeOutput = serde_json::from_slice(output)
            .map_err(|e| ProbeError::parse(path, format!("invalid ffprobe JSON: {}", e)))?;

        let tags = &probe.format.tags;
        let artist = tag(tags, &["artist"]);
        let album_artist = match tag(tags, &["album_artist", "albumartist"]) {
            a if a.is_empty() => artist.clone(),
            a => a,
        };

        let codec = probe
            .streams
            .iter()
            .find(|s| s.codec_type.as_deref() == Some("audio"))
            .and_then(|s| {
                Some(CodecInfo {
                    codec_name: s.codec_name.clone()?,
                    sample_rate: s.sample_rate.as_ref().and_then(|r| r.parse().ok()),
                    channels: s.channels,
                })
            });

        Ok(TrackMetadata {
            album: tag(tags, &["album"]),
            artist,
            album_artist,
            title: tag(tags, &["title"]),
            track: tag(tags, &["track", "tracknumber"]),
            codec,
        })
    }
}

// FLAC Vorbis comments come through upper case, so keys match case-insensitively.
fn tag(tags: &HashMap<String, String>, keys: &[&str]) -> String {
    keys.iter()
        .find_map(|key| {
            tags.iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(key))
                .map(|(_, v)| v.trim().to_string())
        })
        .unwrap_or_default()
}

#[async_trait]
impl MetadataReader for FfprobeReader {
    fn name(&self) -> &str {
        "ffprobe"
    }

    async fn read(
        &self,
        path: &Path,
        cancel: &CancellationToken,
    ) -> Result<TrackMetadata, ProbeError> {
        let output = ToolCommand::new(&self.ffprobe_path)
            .arg("-hide_banner")
            .arg("-i")
            .arg(path)
            .args(["-show_format", "-show_streams", "-print_format", "json"])
            .execute(cancel)
            .await?;

        Self::parse_probe_output(path, &output.stdout)
    }
}
