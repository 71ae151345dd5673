//! Bounded concurrent batch conversion.
//!
//! [`BatchScheduler`] fans a list of input files out over a fixed pool of
//! workers. Each worker probes the file, derives its output name, runs the
//! transcode operation and verifies the output. The first failure anywhere
//! cancels the whole batch: in-flight child processes are terminated, no
//! further items are started, and the caller gets that failure as a
//! [`BatchError`] instead of a partial result.
//!
//! Results are gathered without a shared lock: every worker keeps its own
//! records and the scheduler merges them when the worker is joined.
//!
//! # Example
//!
//! ```ignore
//! use audioconvert_core::batch::{BatchConfig, BatchScheduler};
//! use audioconvert_core::metadata::FfprobeReader;
//! use audioconvert_core::transcode::ProcessTranscoder;
//!
//! let scheduler = BatchScheduler::new(
//!     BatchConfig::default().with_pool_size(8),
//!     FfprobeReader::with_defaults(),
//!     ProcessTranscoder::default(),
//! );
//! let result = scheduler.convert_batch(files, &output_dir, &operation).await?;
//! println!("{} files, {} bytes", result.len(), result.total_bytes());
//! ```

mod config;
mod error;
mod scheduler;
mod types;

pub use config::BatchConfig;
pub use error::BatchError;
pub use scheduler::{convert_batch, BatchScheduler};
pub use types::{BatchResult, OutputRecord};
