//! Track metadata probing.
//!
//! The [`MetadataReader`] trait is the seam the batch scheduler probes
//! through; [`FfprobeReader`] is the production implementation.

mod error;
mod ffprobe;
mod traits;
mod types;

pub use error::ProbeError;
pub use ffprobe::FfprobeReader;
pub use traits::MetadataReader;
pub use types::{CodecInfo, TrackMetadata};
