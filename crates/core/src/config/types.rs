use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::ConfigError;
use crate::batch::BatchConfig;
use crate::publish::PublishConfig;
use crate::transcode::{StageTemplate, TranscodeOperation};

/// Root configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// Log level used when `RUST_LOG` is unset (debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub batch: BatchConfig,
    #[serde(default)]
    pub probe: ProbeConfig,
    #[serde(default)]
    pub transcode: TranscodeConfig,
    /// Publishing is enabled only when this section is present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publish: Option<PublishConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            batch: BatchConfig::default(),
            probe: ProbeConfig::default(),
            transcode: TranscodeConfig::default(),
            publish: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Metadata probe configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ProbeConfig {
    #[serde(default = "default_ffprobe_path")]
    pub ffprobe_path: PathBuf,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            ffprobe_path: default_ffprobe_path(),
        }
    }
}

fn default_ffprobe_path() -> PathBuf {
    PathBuf::from("ffprobe")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TranscodeMode {
    /// ffmpeg decodes to CAF on stdout, fdkaac encodes from stdin
    #[default]
    Pipeline,
    /// A single user-supplied shell command per file
    Command,
}

/// Transcode operation configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TranscodeConfig {
    #[serde(default)]
    pub mode: TranscodeMode,
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: PathBuf,
    /// Extra decoder arguments, split on whitespace
    #[serde(default)]
    pub ffmpeg_options: String,
    #[serde(default = "default_fdkaac_path")]
    pub fdkaac_path: PathBuf,
    /// Encoder arguments, split on whitespace
    #[serde(default = "default_fdkaac_options")]
    pub fdkaac_options: String,
    #[serde(default = "default_extension")]
    pub extension: String,
    /// Shell command template for `mode = "command"`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
}

impl Default for TranscodeConfig {
    fn default() -> Self {
        Self {
            mode: TranscodeMode::default(),
            ffmpeg_path: default_ffmpeg_path(),
            ffmpeg_options: String::new(),
            fdkaac_path: default_fdkaac_path(),
            fdkaac_options: default_fdkaac_options(),
            extension: default_extension(),
            command: None,
        }
    }
}

fn default_ffmpeg_path() -> PathBuf {
    PathBuf::from("ffmpeg")
}

fn default_fdkaac_path() -> PathBuf {
    PathBuf::from("fdkaac")
}

fn default_fdkaac_options() -> String {
    "-I -p 2 -m 5 -G 0".to_string()
}

fn default_extension() -> String {
    "m4a".to_string()
}

impl TranscodeConfig {
    /// Builds the operation shared by every worker of a run.
    pub fn operation(&self) -> Result<TranscodeOperation, ConfigError> {
        match self.mode {
            TranscodeMode::Pipeline => {
                let mut decode_args = vec!["-hide_banner", "-i", "$input"];
                decode_args.extend(self.ffmpeg_options.split_whitespace());
                decode_args.extend(["-f", "caf", "-"]);

                let mut encode_args: Vec<&str> = self.fdkaac_options.split_whitespace().collect();
                encode_args.extend(["-", "-o", "$output"]);

                Ok(TranscodeOperation::pipeline(
                    StageTemplate::new(&self.ffmpeg_path, decode_args),
                    StageTemplate::new(&self.fdkaac_path, encode_args),
                    self.extension.as_str(),
                ))
            }
            TranscodeMode::Command => {
                let template = self
                    .command
                    .as_deref()
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .ok_or_else(|| {
                        ConfigError::ValidationError(
                            "transcode.command is required when transcode.mode = \"command\""
                                .to_string(),
                        )
                    })?;
                Ok(TranscodeOperation::command(template, self.extension.as_str()))
            }
        }
    }
}
