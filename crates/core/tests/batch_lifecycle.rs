//! Batch lifecycle integration tests.
//!
//! These tests drive the batch scheduler with mock reader and transcoder:
//! - Every input converted exactly once for any pool size
//! - Concurrency never exceeds the pool size
//! - Fail-fast on probe, transcode and verification failures
//! - Two inputs deriving one output name fail the batch
//! - External cancellation stops in-flight work

use std::collections::HashSet;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

use audioconvert_core::{
    testing::{MockMetadataReader, MockTranscoder},
    BatchConfig, BatchError, BatchScheduler, Stage, TrackMetadata, TranscodeOperation,
};

/// Test helper to create a batch scheduler with mocks.
struct TestHarness {
    scheduler: BatchScheduler<MockMetadataReader, MockTranscoder>,
    reader: MockMetadataReader,
    transcoder: MockTranscoder,
    cancel: CancellationToken,
    output_dir: TempDir,
}

impl TestHarness {
    fn new(pool_size: usize) -> Self {
        let reader = MockMetadataReader::new();
        let transcoder = MockTranscoder::new();
        let cancel = CancellationToken::new();
        let scheduler = BatchScheduler::new(
            BatchConfig::default().with_pool_size(pool_size),
            reader.clone(),
            transcoder.clone(),
        )
        .with_cancellation(cancel.clone());

        Self {
            scheduler,
            reader,
            transcoder,
            cancel,
            output_dir: TempDir::new().expect("Failed to create output dir"),
        }
    }

    async fn run(&self, inputs: Vec<PathBuf>) -> Result<audioconvert_core::BatchResult, BatchError> {
        self.scheduler
            .convert_batch(inputs, self.output_dir.path(), &operation())
            .await
    }
}

fn operation() -> TranscodeOperation {
    TranscodeOperation::command(r#"cp "$input" "$output""#, "m4a")
}

/// Inputs whose mock metadata gives each a distinct output name.
async fn tracks(reader: &MockMetadataReader, count: usize) -> Vec<PathBuf> {
    let mut inputs = Vec::with_capacity(count);
    for i in 1..=count {
        let input = PathBuf::from(format!("/music/album/{:03}.flac", i));
        reader
            .set_metadata(
                &input,
                TrackMetadata::new(i.to_string(), format!("Track {}", i))
                    .with_album("Artist", "Album"),
            )
            .await;
        inputs.push(input);
    }
    inputs
}

#[tokio::test]
async fn test_hundred_items_each_converted_once() {
    for round in 0..5 {
        let harness = TestHarness::new(8);
        let inputs = tracks(&harness.reader, 100).await;

        let result = harness.run(inputs.clone()).await.unwrap();

        assert_eq!(result.len(), 100, "round {round}");
        let converted: HashSet<_> = result.records().iter().map(|r| r.input.clone()).collect();
        assert_eq!(converted, inputs.iter().cloned().collect::<HashSet<_>>());

        let outputs: HashSet<_> = result.records().iter().map(|r| r.path.clone()).collect();
        assert_eq!(outputs.len(), 100);
        assert!(outputs.iter().all(|p| p.starts_with(harness.output_dir.path())));

        assert_eq!(harness.transcoder.transcode_count().await, 100);
        assert_eq!(harness.reader.read_count(), 100);
    }
}

#[tokio::test]
async fn test_concurrency_bounded_by_pool_size() {
    for pool_size in [1, 3, 8] {
        let harness = TestHarness::new(pool_size);
        harness
            .transcoder
            .set_default_delay(Duration::from_millis(25))
            .await;
        let inputs = tracks(&harness.reader, 24).await;

        harness.run(inputs).await.unwrap();

        let max = harness.transcoder.max_concurrent();
        assert!(max <= pool_size, "pool {pool_size} ran {max} at once");
        assert_eq!(max, pool_size, "pool {pool_size} never saturated");
    }
}

#[tokio::test]
async fn test_pool_larger_than_batch() {
    let harness = TestHarness::new(16);
    let inputs = tracks(&harness.reader, 3).await;

    let result = harness.run(inputs).await.unwrap();
    assert_eq!(result.len(), 3);
    assert!(harness.transcoder.max_concurrent() <= 3);
}

#[tokio::test]
async fn test_album_output_names() {
    let harness = TestHarness::new(2);
    let inputs = vec![
        PathBuf::from("/in/a.flac"),
        PathBuf::from("/in/b.flac"),
        PathBuf::from("/in/c.flac"),
    ];
    harness
        .reader
        .set_metadata(&inputs[0], TrackMetadata::new("1", "A"))
        .await;
    harness
        .reader
        .set_metadata(&inputs[1], TrackMetadata::new("2", "B/C"))
        .await;
    harness
        .reader
        .set_metadata(&inputs[2], TrackMetadata::new("10", "D\"E"))
        .await;

    harness.run(inputs).await.unwrap();

    let mut names: Vec<String> = std::fs::read_dir(harness.output_dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    assert_eq!(names, ["01 - A.m4a", "02 - B_C.m4a", "10 - D_E.m4a"]);
}

#[tokio::test]
async fn test_probe_failure_aborts_batch() {
    let harness = TestHarness::new(4);
    let inputs = tracks(&harness.reader, 40).await;
    harness
        .transcoder
        .set_default_delay(Duration::from_millis(5))
        .await;
    harness.reader.fail_on(&inputs[10]).await;

    let err = harness.run(inputs.clone()).await.unwrap_err();

    match &err {
        BatchError::Probe { input, source } => {
            assert_eq!(input, &inputs[10]);
            assert!(!source.is_cancelled());
        }
        other => panic!("expected probe failure, got {other:?}"),
    }
    assert!(harness.transcoder.transcode_count().await < 40);
}

#[tokio::test]
async fn test_encode_failure_reports_stage_and_stops_other_workers() {
    let harness = TestHarness::new(4);
    let inputs = tracks(&harness.reader, 40).await;
    harness
        .transcoder
        .set_default_delay(Duration::from_millis(200))
        .await;
    harness
        .transcoder
        .set_delay_for(&inputs[0], Duration::ZERO)
        .await;
    harness.transcoder.fail_on(&inputs[0], Stage::Encode).await;

    let started = Instant::now();
    let err = harness.run(inputs.clone()).await.unwrap_err();

    match &err {
        BatchError::Transcode { input, source } => {
            assert_eq!(input, &inputs[0]);
            assert_eq!(source.failed_stage(), Some(Stage::Encode));
            assert!(source.stderr().unwrap().contains("mock encode failure"));
        }
        other => panic!("expected transcode failure, got {other:?}"),
    }

    // The three slow siblings were interrupted rather than waited out.
    assert!(harness.transcoder.cancelled_count() >= 1);
    assert_eq!(harness.transcoder.transcode_count().await, 0);
    assert!(started.elapsed() < Duration::from_millis(190));
}

#[tokio::test]
async fn test_missing_output_is_verification_failure() {
    let harness = TestHarness::new(2);
    let inputs = tracks(&harness.reader, 6).await;
    harness.transcoder.skip_output_for(&inputs[3]).await;

    let err = harness.run(inputs).await.unwrap_err();
    match err {
        BatchError::OutputVerification { output, .. } => {
            assert_eq!(output.file_name().unwrap(), "04 - Track 4.m4a");
        }
        other => panic!("expected verification failure, got {other:?}"),
    }
}

#[tokio::test]
async fn test_empty_output_is_verification_failure() {
    let harness = TestHarness::new(2);
    let inputs = tracks(&harness.reader, 4).await;
    harness.transcoder.write_empty_for(&inputs[1]).await;

    let err = harness.run(inputs).await.unwrap_err();
    assert!(matches!(err, BatchError::OutputVerification { .. }));
}

#[tokio::test]
async fn test_external_cancellation() {
    let harness = TestHarness::new(4);
    let inputs = tracks(&harness.reader, 20).await;
    harness
        .transcoder
        .set_default_delay(Duration::from_secs(30))
        .await;

    let cancel = harness.cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        cancel.cancel();
    });

    let started = Instant::now();
    let err = harness.run(inputs).await.unwrap_err();

    assert!(matches!(err, BatchError::Cancelled));
    assert!(err.is_cancelled());
    assert_eq!(harness.transcoder.cancelled_count(), 4);
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn test_scheduler_reusable_after_failure() {
    let harness = TestHarness::new(3);
    let inputs = tracks(&harness.reader, 5).await;
    harness.transcoder.fail_on(&inputs[2], Stage::Decode).await;

    assert!(harness.run(inputs.clone()).await.is_err());

    let result = harness.run(inputs[..2].to_vec()).await.unwrap();
    assert_eq!(result.len(), 2);
}

#[tokio::test]
async fn test_multi_disc_name_clash_fails_batch() {
    let harness = TestHarness::new(2);
    harness
        .transcoder
        .set_default_delay(Duration::from_millis(20))
        .await;

    let mut inputs = Vec::new();
    for disc in ["cd1", "cd2"] {
        for track in 1..=3 {
            let input = PathBuf::from(format!("/music/album/{disc}/{track:02}.flac"));
            harness
                .reader
                .set_metadata(
                    &input,
                    TrackMetadata::new(track.to_string(), format!("Track {track}"))
                        .with_album("Artist", "Album"),
                )
                .await;
            inputs.push(input);
        }
    }

    let err = harness.run(inputs.clone()).await.unwrap_err();
    let BatchError::DuplicateOutput {
        output,
        first,
        second,
    } = &err
    else {
        panic!("expected DuplicateOutput, got {err:?}");
    };
    assert_ne!(first, second);
    assert_eq!(first.file_name(), second.file_name());
    assert_eq!(output.parent(), Some(harness.output_dir.path()));
    assert_eq!(err.input(), Some(second.as_path()));

    // Claims belong to one run; the first disc alone converts cleanly.
    let result = harness.run(inputs[..3].to_vec()).await.unwrap();
    assert_eq!(result.len(), 3);
}

#[cfg(unix)]
mod end_to_end {
    use super::*;
    use audioconvert_core::{
        testing::fixtures, FfprobeReader, ProcessTranscoder, StageTemplate,
    };

    #[tokio::test]
    async fn test_pipeline_with_real_processes() {
        let tools = TempDir::new().unwrap();
        let source = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();

        let ffprobe = fixtures::write_fake_ffprobe(tools.path()).unwrap();
        let inputs = fixtures::write_flac_stubs(
            source.path(),
            &["1-Intro", "2-Song Two", "12-Outro: Reprise"],
        )
        .unwrap();

        // cat stands in for the decoder, tr for the encoder writing $output.
        let operation = TranscodeOperation::pipeline(
            StageTemplate::new("cat", ["$input"]),
            StageTemplate::new("sh", ["-c", "tr a-z A-Z > \"$0\"", "$output"]),
            "m4a",
        );
        let scheduler = BatchScheduler::new(
            BatchConfig::default().with_pool_size(2),
            FfprobeReader::new(ffprobe),
            ProcessTranscoder::default(),
        );

        let result = scheduler
            .convert_batch(inputs, output.path(), &operation)
            .await
            .unwrap();

        let names: Vec<String> = result
            .sorted_by_path()
            .iter()
            .map(|r| r.path.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            ["01 - Intro.m4a", "02 - Song Two.m4a", "12 - Outro_ Reprise.m4a"]
        );
        assert_eq!(
            std::fs::read_to_string(output.path().join("01 - Intro.m4a")).unwrap(),
            "FLAC STUB FOR 1-INTRO"
        );
    }

    #[tokio::test]
    async fn test_corrupt_input_fails_probe() {
        let tools = TempDir::new().unwrap();
        let source = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();

        let ffprobe = fixtures::write_fake_ffprobe(tools.path()).unwrap();
        let inputs =
            fixtures::write_flac_stubs(source.path(), &["1-Fine", "2-corrupt"]).unwrap();

        let scheduler = BatchScheduler::new(
            BatchConfig::default().with_pool_size(2),
            FfprobeReader::new(ffprobe),
            ProcessTranscoder::default(),
        );
        let err = scheduler
            .convert_batch(
                inputs.clone(),
                output.path(),
                &TranscodeOperation::command(r#"cp "$input" "$output""#, "m4a"),
            )
            .await
            .unwrap_err();

        match err {
            BatchError::Probe { input, source } => {
                assert_eq!(input, inputs[1]);
                assert!(source.to_string().contains("Invalid data"));
            }
            other => panic!("expected probe failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_command_failure_surfaces_stderr() {
        let tools = TempDir::new().unwrap();
        let source = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();

        let ffprobe = fixtures::write_fake_ffprobe(tools.path()).unwrap();
        let inputs = fixtures::write_flac_stubs(source.path(), &["1-One"]).unwrap();

        let scheduler = BatchScheduler::new(
            BatchConfig::default().with_pool_size(1),
            FfprobeReader::new(ffprobe),
            ProcessTranscoder::default(),
        );
        let err = scheduler
            .convert_batch(
                inputs,
                output.path(),
                &TranscodeOperation::command("echo 'encoder exploded' >&2; exit 3", "m4a"),
            )
            .await
            .unwrap_err();

        match err {
            BatchError::Transcode { source, .. } => {
                assert_eq!(source.failed_stage(), Some(Stage::Command));
                assert!(source.stderr().unwrap().contains("encoder exploded"));
            }
            other => panic!("expected transcode failure, got {other:?}"),
        }
    }
}
