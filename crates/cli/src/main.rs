mod cli;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use audioconvert_core::{
    load_config, plan_sources, validate_config, BatchScheduler, Config, FfprobeReader,
    MetadataReader, ProcessTranscoder, RsyncPublisher, SourceBatch, TranscodeOperation,
};

use cli::Cli;

/// Log level used until the configuration has been read.
const DEFAULT_LOG_LEVEL: &str = "info";

type Scheduler = BatchScheduler<FfprobeReader, ProcessTranscoder>;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

/// RUST_LOG wins over the configured level.
fn init_logging(level: &str) {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(level.trim().to_ascii_lowercase())),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn load_settings(cli: &Cli) -> Result<Config> {
    let mut config = load_config(cli.config.as_deref()).context("Failed to load configuration")?;
    cli.apply(&mut config);
    validate_config(&config).context("Configuration validation failed")?;
    Ok(config)
}

async fn run(cli: Cli) -> Result<()> {
    let config = match load_settings(&cli) {
        Ok(config) => config,
        Err(e) => {
            init_logging(DEFAULT_LOG_LEVEL);
            return Err(e);
        }
    };
    init_logging(&config.log_level);

    let operation = config
        .transcode
        .operation()
        .context("Invalid transcode settings")?;
    info!(operation = %operation.describe(), workers = config.batch.pool_size, "Configuration loaded");

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, stopping conversions");
                cancel.cancel();
            }
        }
    });

    let reader = FfprobeReader::new(&config.probe.ffprobe_path);
    let scheduler = BatchScheduler::new(config.batch.clone(), reader, ProcessTranscoder::default())
        .with_cancellation(cancel.clone());
    let publisher = config.publish.clone().map(RsyncPublisher::new);

    let sources = plan_sources(&cli.files);
    if sources.is_empty() {
        bail!("No .flac or .zip files to convert");
    }

    // One album at a time: its extraction is dropped before the next starts.
    for source in &sources {
        let label = source.label();
        info!(source = %label, "Preparing");
        let batch = source
            .prepare(config.batch.output_dir.as_deref())
            .await
            .with_context(|| format!("Failed to prepare {}", label))?;
        convert_album(&batch, &scheduler, &operation, publisher.as_ref(), &cancel)
            .await
            .with_context(|| format!("Failed to convert {}", label))?;
    }

    Ok(())
}

async fn convert_album(
    batch: &SourceBatch,
    scheduler: &Scheduler,
    operation: &TranscodeOperation,
    publisher: Option<&RsyncPublisher>,
    cancel: &CancellationToken,
) -> Result<()> {
    let Some(first) = batch.first_input() else {
        return Ok(());
    };

    let album = scheduler
        .reader()
        .read(first, cancel)
        .await
        .with_context(|| format!("Failed to read metadata from {}", first.display()))?;
    info!(artist = %album.album_artist, album = %album.album, "Metadata");
    info!(count = batch.inputs.len(), "Transcoding");

    let result = scheduler
        .convert_batch(batch.inputs.clone(), &batch.output_dir, operation)
        .await?;
    info!(
        files = result.len(),
        total_bytes = result.total_bytes(),
        "Album converted"
    );

    match publisher {
        Some(publisher) => {
            info!(
                destination = %publisher.album_destination(&album.album_artist, &album.album),
                "Uploading"
            );
            publisher
                .publish(&batch.output_dir, &album.album_artist, &album.album, cancel)
                .await?;
        }
        None => info!(path = %batch.output_dir.display(), "Output files"),
    }

    Ok(())
}
