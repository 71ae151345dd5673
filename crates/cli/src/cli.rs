use clap::Parser;
use std::path::PathBuf;

use audioconvert_core::{Config, PublishConfig, TranscodeMode};

#[derive(Debug, Parser)]
#[command(name = "audioconvert")]
#[command(author, version, about = "Convert FLAC albums to AAC in parallel")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Log level: debug, info, warn or error (RUST_LOG takes precedence)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Directory for converted files (default: a new temp directory)
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Number of files converted at once
    #[arg(short = 'j', long)]
    pub pool_size: Option<usize>,

    /// Extra ffmpeg decoder options
    #[arg(long, allow_hyphen_values = true)]
    pub ffmpeg_options: Option<String>,

    /// fdkaac encoder options
    #[arg(long, allow_hyphen_values = true)]
    pub fdkaac_options: Option<String>,

    /// Shell command run per file instead of ffmpeg | fdkaac; use "$input" and "$output"
    #[arg(long, allow_hyphen_values = true)]
    pub command: Option<String>,

    /// Output file extension
    #[arg(long)]
    pub extension: Option<String>,

    /// rsync destination; albums are uploaded to <DEST>/<artist>/<album>/
    #[arg(long, value_name = "DEST")]
    pub rsync: Option<String>,

    /// .flac files and .zip albums to convert
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
}

impl Cli {
    /// Applies command-line flags on top of the loaded configuration.
    pub fn apply(&self, config: &mut Config) {
        if let Some(level) = &self.log_level {
            config.log_level = level.clone();
        }
        if let Some(dir) = &self.output_dir {
            config.batch.output_dir = Some(dir.clone());
        }
        if let Some(pool_size) = self.pool_size {
            config.batch.pool_size = pool_size;
        }
        if let Some(options) = &self.ffmpeg_options {
            config.transcode.ffmpeg_options = options.clone();
        }
        if let Some(options) = &self.fdkaac_options {
            config.transcode.fdkaac_options = options.clone();
        }
        if let Some(command) = &self.command {
            config.transcode.mode = TranscodeMode::Command;
            config.transcode.command = Some(command.clone());
        }
        if let Some(extension) = &self.extension {
            config.transcode.extension = extension.clone();
        }
        if let Some(destination) = &self.rsync {
            match config.publish.as_mut() {
                Some(publish) => publish.destination = destination.clone(),
                None => config.publish = Some(PublishConfig::new(destination.clone())),
            }
        }
    }
}
