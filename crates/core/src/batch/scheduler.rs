//! Worker pool that drives a batch of conversions.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use super::config::BatchConfig;
use super::error::BatchError;
use super::types::{BatchResult, OutputRecord};
use crate::metadata::{FfprobeReader, MetadataReader};
use crate::naming;
use crate::transcode::{ProcessTranscoder, TranscodeOperation, Transcoder};

/// Receiving end of the work queue, shared by all workers.
type WorkQueue = Arc<Mutex<mpsc::Receiver<PathBuf>>>;

/// State shared by the workers of one run.
struct WorkerContext<R, T> {
    reader: Arc<R>,
    transcoder: Arc<T>,
    operation: TranscodeOperation,
    output_dir: PathBuf,
    cancel: CancellationToken,
    /// Output path to the input that claimed it.
    claimed: Mutex<HashMap<PathBuf, PathBuf>>,
}

impl<R, T> WorkerContext<R, T> {
    /// Reserves `output` for `input`. A second input deriving the same path
    /// fails instead of overwriting the first.
    async fn claim(&self, output: &Path, input: &Path) -> Result<(), BatchError> {
        let mut claimed = self.claimed.lock().await;
        if let Some(first) = claimed.get(output) {
            return Err(BatchError::DuplicateOutput {
                output: output.to_path_buf(),
                first: first.clone(),
                second: input.to_path_buf(),
            });
        }
        claimed.insert(output.to_path_buf(), input.to_path_buf());
        Ok(())
    }
}

/// Converts batches of files with a fixed number of concurrent workers.
pub struct BatchScheduler<R: MetadataReader, T: Transcoder> {
    config: BatchConfig,
    reader: Arc<R>,
    transcoder: Arc<T>,
    cancel: CancellationToken,
}

impl<R: MetadataReader + 'static, T: Transcoder + 'static> BatchScheduler<R, T> {
    /// Creates a new scheduler.
    pub fn new(config: BatchConfig, reader: R, transcoder: T) -> Self {
        Self {
            config,
            reader: Arc::new(reader),
            transcoder: Arc::new(transcoder),
            cancel: CancellationToken::new(),
        }
    }

    /// Ties runs to an outside token. Cancelling it aborts the running batch
    /// with [`BatchError::Cancelled`].
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// The reader workers probe with, for callers that need album-level tags.
    pub fn reader(&self) -> &R {
        &self.reader
    }

    /// Converts every input into `output_dir`.
    ///
    /// Blocks until all workers have exited. On success the result holds
    /// exactly one record per input, in completion order. On the first
    /// failure the remaining work is cancelled and that failure is returned;
    /// no partial result is produced.
    pub async fn convert_batch(
        &self,
        inputs: Vec<PathBuf>,
        output_dir: &Path,
        operation: &TranscodeOperation,
    ) -> Result<BatchResult, BatchError> {
        let pool_size = self.config.pool_size;
        if pool_size == 0 {
            return Err(BatchError::InvalidPoolSize);
        }
        if inputs.is_empty() {
            return Ok(BatchResult::default());
        }

        tokio::fs::create_dir_all(output_dir)
            .await
            .map_err(|source| BatchError::OutputDirectory {
                path: output_dir.to_path_buf(),
                source,
            })?;

        let total = inputs.len();
        let run = self.cancel.child_token();
        let context = Arc::new(WorkerContext {
            reader: Arc::clone(&self.reader),
            transcoder: Arc::clone(&self.transcoder),
            operation: operation.clone(),
            output_dir: output_dir.to_path_buf(),
            cancel: run.clone(),
            claimed: Mutex::new(HashMap::with_capacity(total)),
        });

        info!(
            count = total,
            workers = pool_size,
            operation = %operation.describe(),
            "Starting batch"
        );

        let (tx, rx) = mpsc::channel::<PathBuf>(1);
        let queue: WorkQueue = Arc::new(Mutex::new(rx));

        let mut workers = JoinSet::new();
        for worker_id in 0..pool_size {
            workers.spawn(run_worker(
                worker_id,
                Arc::clone(&queue),
                Arc::clone(&context),
            ));
        }
        drop(queue);

        let producer = tokio::spawn(enqueue(inputs, tx, run.clone()));

        let mut records = Vec::with_capacity(total);
        let mut failure: Option<BatchError> = None;

        while let Some(joined) = workers.join_next().await {
            let outcome = joined.unwrap_or_else(|e| {
                Err(BatchError::WorkerPanicked {
                    reason: e.to_string(),
                })
            });

            match outcome {
                Ok(mut worker_records) => records.append(&mut worker_records),
                Err(err) => {
                    run.cancel();
                    // Keep the first real failure; cancellations it caused
                    // in other workers are only echoes of it.
                    let replace = failure
                        .as_ref()
                        .map_or(true, |current| current.is_cancelled() && !err.is_cancelled());
                    if replace {
                        failure = Some(err);
                    }
                }
            }
        }

        if let Err(e) = producer.await {
            error!(error = %e, "Work producer failed");
        }

        if let Some(err) = failure.filter(|err| !err.is_cancelled()) {
            error!(error = %err, "Batch aborted");
            return Err(err);
        }
        if records.len() < total {
            // Only reachable when the outer token was cancelled.
            info!(
                completed = records.len(),
                count = total,
                "Batch cancelled"
            );
            return Err(BatchError::Cancelled);
        }

        let result = BatchResult::new(records);
        info!(
            count = result.len(),
            total_bytes = result.total_bytes(),
            "Batch complete"
        );
        Ok(result)
    }
}

/// Converts `inputs` with `pool_size` workers, using `ffprobe` from `PATH`
/// for metadata and external processes for the operation.
pub async fn convert_batch(
    inputs: Vec<PathBuf>,
    output_dir: &Path,
    operation: &TranscodeOperation,
    pool_size: usize,
) -> Result<BatchResult, BatchError> {
    BatchScheduler::new(
        BatchConfig::default().with_pool_size(pool_size),
        FfprobeReader::with_defaults(),
        ProcessTranscoder::default(),
    )
    .convert_batch(inputs, output_dir, operation)
    .await
}

/// Feeds the queue, then closes it by dropping the sender.
async fn enqueue(inputs: Vec<PathBuf>, tx: mpsc::Sender<PathBuf>, cancel: CancellationToken) {
    for input in inputs {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            sent = tx.send(input) => {
                if sent.is_err() {
                    // Every worker is gone.
                    break;
                }
            }
        }
    }
}

async fn run_worker<R, T>(
    worker_id: usize,
    queue: WorkQueue,
    context: Arc<WorkerContext<R, T>>,
) -> Result<Vec<OutputRecord>, BatchError>
where
    R: MetadataReader,
    T: Transcoder,
{
    let mut records = Vec::new();

    loop {
        let next = {
            let mut rx = tokio::select! {
                biased;
                _ = context.cancel.cancelled() => break,
                rx = queue.lock() => rx,
            };
            tokio::select! {
                biased;
                _ = context.cancel.cancelled() => None,
                item = rx.recv() => item,
            }
        };

        let Some(input) = next else {
            break;
        };
        if context.cancel.is_cancelled() {
            break;
        }

        match process_item(&context, &input).await {
            Ok(record) => records.push(record),
            Err(err) => {
                if err.is_cancelled() {
                    debug!(worker = worker_id, input = %input.display(), "Stopped by cancellation");
                } else {
                    error!(
                        worker = worker_id,
                        input = %input.display(),
                        error = %err,
                        "Item failed, aborting batch"
                    );
                }
                context.cancel.cancel();
                return Err(err);
            }
        }
    }

    debug!(worker = worker_id, completed = records.len(), "Worker finished");
    Ok(records)
}

/// Probe, name, claim the name, transcode, verify.
async fn process_item<R, T>(
    context: &WorkerContext<R, T>,
    input: &Path,
) -> Result<OutputRecord, BatchError>
where
    R: MetadataReader,
    T: Transcoder,
{
    let metadata = context
        .reader
        .read(input, &context.cancel)
        .await
        .map_err(|source| BatchError::Probe {
            input: input.to_path_buf(),
            source,
        })?;

    if let Some(codec) = &metadata.codec {
        debug!(
            input = %input.display(),
            codec = %codec.codec_name,
            sample_rate = ?codec.sample_rate,
            channels = ?codec.channels,
            "Probed"
        );
    }

    let fallback = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = naming::output_file_name(&metadata, &fallback, context.operation.extension());
    let output = context.output_dir.join(&name);
    context.claim(&output, input).await?;

    context
        .transcoder
        .transcode(&context.operation, input, &output, &context.cancel)
        .await
        .map_err(|source| {
            if let Some(stderr) = source.stderr() {
                error!(input = %input.display(), stderr = %stderr.trim(), "Transcoder output");
            }
            BatchError::Transcode {
                input: input.to_path_buf(),
                source,
            }
        })?;

    let size_bytes = verify_output(&output).await?;
    info!(name = %name, size_bytes, "Transcoded");

    Ok(OutputRecord {
        input: input.to_path_buf(),
        path: output,
        size_bytes,
    })
}

/// Returns the size of a finished output, which must exist and be non-empty.
async fn verify_output(output: &Path) -> Result<u64, BatchError> {
    let meta = tokio::fs::metadata(output)
        .await
        .map_err(|e| BatchError::OutputVerification {
            output: output.to_path_buf(),
            reason: e.to_string(),
        })?;

    if !meta.is_file() {
        return Err(BatchError::OutputVerification {
            output: output.to_path_buf(),
            reason: "not a regular file".to_string(),
        });
    }
    if meta.len() == 0 {
        return Err(BatchError::OutputVerification {
            output: output.to_path_buf(),
            reason: "output is empty".to_string(),
        });
    }
    Ok(meta.len())
}
