//! Transcode operations.
//!
//! A [`TranscodeOperation`] describes how one input file becomes one output
//! file. It is built once per batch and shared read-only by all workers:
//!
//! - [`TranscodeOperation::Command`]: a shell command template run with the
//!   `input` and `output` environment variables bound.
//! - [`TranscodeOperation::Pipeline`]: a decoder whose stdout is streamed into
//!   an encoder's stdin.
//!
//! # Example
//!
//! ```ignore
//! use audioconvert_core::transcode::{ProcessTranscoder, StageTemplate, TranscodeOperation, Transcoder};
//!
//! let operation = TranscodeOperation::pipeline(
//!     StageTemplate::new("ffmpeg", ["-hide_banner", "-i", "$input", "-f", "caf", "-"]),
//!     StageTemplate::new("fdkaac", ["-I", "-p", "2", "-m", "5", "-", "-o", "$output"]),
//!     "m4a",
//! );
//!
//! ProcessTranscoder::default()
//!     .transcode(&operation, input, output, &cancel)
//!     .await?;
//! ```

mod error;
mod runner;
mod traits;
mod types;

pub use error::{Stage, TranscodeError};
pub use runner::ProcessTranscoder;
pub use traits::Transcoder;
pub use types::{StageTemplate, TranscodeOperation};
