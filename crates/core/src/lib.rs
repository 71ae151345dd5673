pub mod batch;
pub mod config;
pub mod metadata;
pub mod naming;
pub mod process;
pub mod publish;
pub mod source;
pub mod testing;
pub mod transcode;

pub use batch::{convert_batch, BatchConfig, BatchError, BatchResult, BatchScheduler, OutputRecord};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, ProbeConfig,
    TranscodeConfig, TranscodeMode,
};
pub use metadata::{CodecInfo, FfprobeReader, MetadataReader, ProbeError, TrackMetadata};
pub use naming::{output_file_name, pad_track, path_segment, sanitize};
pub use process::{ProcessError, ToolCommand, ToolOutput};
pub use publish::{PublishConfig, PublishError, RsyncPublisher};
pub use source::{plan_sources, Source, SourceBatch, SourceError};
pub use transcode::{
    ProcessTranscoder, Stage, StageTemplate, TranscodeError, TranscodeOperation, Transcoder,
};
