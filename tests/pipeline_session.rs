//! End-to-end pipeline tests with a scripted frame source and mock model.

use lavalier::audio::source::ScriptedFrameSource;
use lavalier::export::{ExportFormat, save_transcripts};
use lavalier::pipeline::orchestrator::{Pipeline, PipelineConfig};
use lavalier::pipeline::state::SharedState;
use lavalier::stt::model::MockModel;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tempfile::TempDir;

/// 100Hz "audio", 1s chunks, 0.25s overlap, interim buffer effectively off.
fn session_config() -> PipelineConfig {
    PipelineConfig {
        sample_rate: 100,
        buffer_duration_secs: 1000.0,
        chunking_enabled: true,
        chunk_duration_secs: 1.0,
        overlap_duration_secs: 0.25,
        queue_capacity: 64,
        pop_timeout: Duration::from_millis(20),
        join_timeout: Duration::from_millis(2000),
        quiet: true,
        verbosity: 0,
    }
}

fn wait_for<F: Fn() -> bool>(cond: F) {
    let deadline = Instant::now() + Duration::from_secs(3);
    while !cond() {
        assert!(Instant::now() < deadline, "condition not met in time");
        std::thread::sleep(Duration::from_millis(5));
    }
}

#[test]
fn session_transcribes_and_exports() {
    // 4s of audio in 100ms frames; with 0.75s of new audio per chunk
    // (1s chunk − 0.25s overlap) that yields at least 4 full chunks.
    let frames = vec![vec![0.1f32; 10]; 40];
    let source = ScriptedFrameSource::new(frames);
    let model = Arc::new(MockModel::new("mock").with_response("an aligned sentence"));
    let state = SharedState::new();

    let handle = Pipeline::new(session_config())
        .start(Box::new(source), model, state.clone())
        .unwrap();

    wait_for(|| state.chunks_processed() >= 4);
    let stopped = handle.stop();

    assert!(stopped.results.len() >= 4);
    assert!(!stopped.capture_failed);

    // Consecutive chunks start 0.75s apart in session time
    let starts: Vec<f64> = stopped
        .results
        .iter()
        .map(|r| r.sentences[0].start)
        .collect();
    for (i, pair) in starts.windows(2).enumerate() {
        assert!(
            (pair[1] - pair[0] - 0.75).abs() < 1e-9,
            "chunks {i} and {} are {}s apart",
            i + 1,
            pair[1] - pair[0]
        );
    }

    // Export the session and verify each format landed
    let dir = TempDir::new().unwrap();
    let written = save_transcripts(
        &stopped.results,
        dir.path(),
        &[ExportFormat::Text, ExportFormat::Subtitle, ExportFormat::Json],
        true,
    )
    .unwrap();
    assert_eq!(written.len(), 3);

    let txt = std::fs::read_to_string(&written[0]).unwrap();
    assert!(txt.lines().count() >= 4);
    assert!(txt.contains("an aligned sentence"));

    let srt = std::fs::read_to_string(&written[1]).unwrap();
    assert!(srt.starts_with("1\n00:00:00,000 --> "));

    let json = std::fs::read_to_string(&written[2]).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert!(value.as_array().unwrap().len() >= 4);
}

#[test]
fn malformed_model_output_yields_empty_session() {
    let frames = vec![vec![0.1f32; 10]; 20];
    let source = ScriptedFrameSource::new(frames);
    let model = Arc::new(MockModel::new("mock").with_missing_text());
    let state = SharedState::new();

    let handle = Pipeline::new(session_config())
        .start(Box::new(source), model, state.clone())
        .unwrap();

    // Give the pipeline time to chew through the script
    std::thread::sleep(Duration::from_millis(300));
    let stopped = handle.stop();

    // Every block was skipped; nothing processed, nothing retained
    assert_eq!(state.chunks_processed(), 0);
    assert!(stopped.results.is_empty());

    // And an empty session writes no files
    let dir = TempDir::new().unwrap();
    let written =
        save_transcripts(&stopped.results, dir.path(), &[ExportFormat::Text], true).unwrap();
    assert!(written.is_empty());
}

#[test]
fn interrupt_mid_stream_flushes_completed_chunks() {
    // A long script that will still be playing when we stop
    let frames = vec![vec![0.1f32; 10]; 1000];
    let source = ScriptedFrameSource::new(frames).with_interval(Duration::from_millis(2));
    let model = Arc::new(MockModel::new("mock").with_response("kept"));
    let state = SharedState::new();

    let handle = Pipeline::new(session_config())
        .start(Box::new(source), model, state.clone())
        .unwrap();

    wait_for(|| state.chunks_processed() >= 1);
    let processed_before_stop = state.chunks_processed();
    let stopped = handle.stop();

    // Everything finalized before the stop signal survives the flush
    assert!(stopped.results.len() as u64 >= processed_before_stop);
    assert!(stopped.results.iter().all(|r| r.text == "kept"));
}
