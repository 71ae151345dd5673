//! Testing utilities and mock implementations.
//!
//! Mock implementations of the [`MetadataReader`](crate::metadata::MetadataReader)
//! and [`Transcoder`](crate::transcode::Transcoder) seams let the batch
//! scheduler be exercised without ffprobe or any encoder installed.
//!
//! # Example
//!
//! ```rust,ignore
//! use audioconvert_core::testing::{MockMetadataReader, MockTranscoder};
//!
//! let reader = MockMetadataReader::new();
//! let transcoder = MockTranscoder::new();
//!
//! reader.set_metadata("/src/01.flac", TrackMetadata::new("1", "Intro")).await;
//! transcoder.fail_on("/src/02.flac", Stage::Encode).await;
//!
//! let scheduler = BatchScheduler::new(config, reader.clone(), transcoder.clone());
//! ```

mod mock_reader;
mod mock_transcoder;

pub use mock_reader::MockMetadataReader;
pub use mock_transcoder::{MockTranscoder, RecordedTranscode};

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::path::{Path, PathBuf};

    /// Writes placeholder `.flac` files named `{stem}.flac` into `dir`.
    pub fn write_flac_stubs(dir: &Path, stems: &[&str]) -> std::io::Result<Vec<PathBuf>> {
        stems
            .iter()
            .map(|stem| {
                let path = dir.join(format!("{}.flac", stem));
                std::fs::write(&path, format!("fLaC stub for {}", stem))?;
                Ok(path)
            })
            .collect()
    }

    /// Writes an executable stand-in for ffprobe into `dir`.
    ///
    /// It reports the input's file stem as the title. A stem of the form
    /// `NN-rest` also yields track `NN`. An input whose name contains
    /// `corrupt` makes it fail like ffprobe does on bad data.
    #[cfg(unix)]
    pub fn write_fake_ffprobe(dir: &Path) -> std::io::Result<PathBuf> {
        use std::os::unix::fs::PermissionsExt;

        let script = dir.join("fake-ffprobe");
        std::fs::write(
            &script,
            r#"#!/bin/sh
# invoked as: -hide_banner -i <path> -show_format ...
path="$3"
case "$path" in
  *corrupt*) echo "$path: Invalid data found when processing input" >&2; exit 1 ;;
esac
stem=$(basename "$path" .flac)
case "$stem" in
  [0-9]*-*) track="${stem%%-*}"; title="${stem#*-}" ;;
  *) track=""; title="$stem" ;;
esac
printf '{"format":{"tags":{"ARTIST":"Fixture Artist","ALBUM":"Fixture Album","TITLE":"%s","track":"%s"}},"streams":[{"codec_type":"audio","codec_name":"flac","sample_rate":"44100","channels":2}]}' "$title" "$track"
"#,
        )?;
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755))?;
        Ok(script)
    }
}
