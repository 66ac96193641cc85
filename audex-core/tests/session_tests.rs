// audex-core/tests/session_tests.rs

use audex_core::config::{DEFAULT_EXTRACT_DIR, EngineConfig};
use audex_core::engine::Engine;
use audex_core::error::CoreError;
use audex_core::extraction::OutputFormat;
use audex_core::mocks::MockFfmpegSpawner;
use audex_core::session::{ExtractionStatus, LoadStatus, Session, SessionState};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::tempdir;

const MOVIE_INFO: &[&str] = &[
    "Input #0, matroska,webm, from 'input_mnt_probe/movie.mkv':",
    "  Duration: 00:01:40.00, start: 0.000000, bitrate: 2000 kb/s",
    "  Stream #0:0: Video: h264 (High), yuv420p, 1920x1080",
    "  Stream #0:1(jpn): Audio: aac (LC), 48000 Hz, stereo, fltp (default)",
    "  Stream #0:2(eng): Audio: ac3, 48000 Hz, 5.1(side), fltp, 448 kb/s",
    "At least one output file must be specified",
];

fn create_dummy_file(dir: &Path, filename: &str) -> PathBuf {
    let file_path = dir.join(filename);
    fs::write(&file_path, b"dummy content").expect("Failed to create dummy file");
    file_path
}

fn new_session(spawner: &MockFfmpegSpawner) -> Session<MockFfmpegSpawner> {
    Session::new(Arc::new(Engine::new(spawner.clone(), EngineConfig::default())))
}

/// A ready session with `movie.mkv` probed (two audio tracks, 100s).
fn probed_session(
    spawner: &MockFfmpegSpawner,
    input_dir: &Path,
) -> Result<Session<MockFfmpegSpawner>, CoreError> {
    let session = new_session(spawner);
    session.initialize()?;
    spawner.expect_info(MOVIE_INFO);
    session.select_file(&create_dummy_file(input_dir, "movie.mkv"))?;
    Ok(session)
}

#[test]
fn test_full_round_trip() -> Result<(), Box<dyn std::error::Error>> {
    let input_dir = tempdir()?;
    let output_dir = tempdir()?;
    let spawner = MockFfmpegSpawner::new();
    let session = probed_session(&spawner, input_dir.path())?;

    session.set_output_format(OutputFormat::Wav);
    spawner.expect_transcode(
        &["size=  1024kB time=00:00:50.00 bitrate=1411.2kbits/s speed=60x"],
        0,
        &[("track_1_0.wav", &b"jpn-pcm"[..]), ("track_2_1.wav", &b"eng-pcm"[..])],
    );
    session.run_extraction()?;

    let state = session.state();
    assert_eq!(state.extraction_status, ExtractionStatus::Done);
    assert_eq!(state.progress, 100);
    assert_eq!(state.message, "Extraction complete! Extracted 2 tracks.");
    assert!(state.error.is_none());

    let artifacts = session.artifacts();
    assert_eq!(artifacts.len(), 2);
    let names: HashSet<_> = artifacts.iter().map(|a| a.display_name.clone()).collect();
    assert_eq!(names.len(), 2);
    assert_eq!(artifacts[0].label, "Track 1 (jpn)");
    assert_eq!(artifacts[0].track_number, 2);
    assert_eq!(artifacts[0].mime_type, "audio/wav");
    assert_eq!(artifacts[1].label, "Track 2 (eng)");
    assert_eq!(artifacts[1].size, 7);
    assert_eq!(session.artifact_store().live_count(), 2);

    let saved = session.save_artifact(1, output_dir.path())?;
    assert_eq!(saved, output_dir.path().join("track_2_1.wav"));
    assert_eq!(fs::read(&saved)?, b"eng-pcm");

    session.release_artifacts();
    session.release_artifacts();
    assert_eq!(session.artifact_store().live_count(), 0);
    assert!(session.artifacts().is_empty());
    assert!(session.save_artifact(0, output_dir.path()).is_err());
    Ok(())
}

#[test]
fn test_engine_loads_once_across_sessions() -> Result<(), Box<dyn std::error::Error>> {
    let spawner = MockFfmpegSpawner::new();
    let engine = Arc::new(Engine::new(spawner.clone(), EngineConfig::default()));

    let first = Session::new(Arc::clone(&engine));
    first.initialize()?;
    first.initialize()?;
    let second = Session::new(Arc::clone(&engine));
    second.initialize()?;

    assert_eq!(spawner.load_count(), 1);
    assert_eq!(second.state().load_status, LoadStatus::Ready);
    Ok(())
}

#[test]
fn test_load_failure_blocks_operations() -> Result<(), Box<dyn std::error::Error>> {
    let input_dir = tempdir()?;
    let spawner = MockFfmpegSpawner::new();
    spawner.fail_load("ffmpeg not found");
    let session = new_session(&spawner);

    assert!(session.initialize().is_err());
    let state = session.state();
    assert_eq!(state.load_status, LoadStatus::Failed);
    assert!(!state.is_loaded());

    let err = session
        .select_file(&create_dummy_file(input_dir.path(), "movie.mkv"))
        .unwrap_err();
    assert!(matches!(err, CoreError::EngineLoad(_)));
    assert!(session.state().error.unwrap().starts_with("Failed to load FFmpeg"));
    assert!(spawner.get_received_calls().is_empty());
    Ok(())
}

#[test]
fn test_dropped_sessions_stop_receiving_engine_lines() -> Result<(), Box<dyn std::error::Error>> {
    let input_dir = tempdir()?;
    let spawner = MockFfmpegSpawner::new();
    let engine = Arc::new(Engine::new(spawner.clone(), EngineConfig::default()));

    let sessions: Vec<_> = (0..5).map(|_| Session::new(Arc::clone(&engine))).collect();
    for session in &sessions {
        session.initialize()?;
    }
    assert_eq!(engine.subscriber_count(), 5);
    drop(sessions);
    assert_eq!(engine.subscriber_count(), 0);

    // A later session's probe is not seen by anything left behind.
    let live = Session::new(Arc::clone(&engine));
    live.initialize()?;
    spawner.expect_info(MOVIE_INFO);
    live.select_file(&create_dummy_file(input_dir.path(), "movie.mkv"))?;
    assert_eq!(engine.subscriber_count(), 1);
    assert!(live.state().logs.iter().any(|l| l.contains("Stream #0:1(jpn)")));
    Ok(())
}

#[test]
fn test_failed_load_leaves_no_subscriber() -> Result<(), Box<dyn std::error::Error>> {
    let spawner = MockFfmpegSpawner::new();
    spawner.fail_load("ffmpeg not found");
    let engine = Arc::new(Engine::new(spawner.clone(), EngineConfig::default()));

    let session = Session::new(Arc::clone(&engine));
    assert!(session.initialize().is_err());
    assert_eq!(engine.subscriber_count(), 0);
    drop(session);
    assert_eq!(engine.subscriber_count(), 0);
    Ok(())
}

#[test]
fn test_empty_selection_is_rejected_without_engine_calls() -> Result<(), Box<dyn std::error::Error>> {
    let input_dir = tempdir()?;
    let spawner = MockFfmpegSpawner::new();
    let session = probed_session(&spawner, input_dir.path())?;

    session.toggle_all(false);
    let err = session.run_extraction().unwrap_err();

    assert!(matches!(err, CoreError::InvalidSelection(_)));
    let state = session.state();
    assert_eq!(
        state.error.as_deref(),
        Some("Please select at least one track to extract.")
    );
    assert_eq!(state.extraction_status, ExtractionStatus::Idle);
    assert_eq!(spawner.get_received_calls().len(), 1);
    Ok(())
}

#[test]
fn test_only_selected_tracks_are_mapped() -> Result<(), Box<dyn std::error::Error>> {
    let input_dir = tempdir()?;
    let spawner = MockFfmpegSpawner::new();
    let session = probed_session(&spawner, input_dir.path())?;

    session.toggle_one(0)?;
    spawner.expect_transcode(&[], 0, &[("track_2_0.mp3", &b"eng"[..])]);
    session.run_extraction()?;

    let calls = spawner.get_received_calls();
    let transcode = &calls[1];
    assert!(transcode.contains(&"0:2".to_string()));
    assert!(!transcode.contains(&"0:1".to_string()));
    assert_eq!(session.artifacts()[0].label, "Track 2 (eng)");
    Ok(())
}

#[test]
fn test_failed_extraction_releases_everything() -> Result<(), Box<dyn std::error::Error>> {
    let input_dir = tempdir()?;
    let spawner = MockFfmpegSpawner::new();
    let session = probed_session(&spawner, input_dir.path())?;

    spawner.expect_transcode(&[], 0, &[("track_1_0.mp3", &b"a"[..]), ("track_2_1.mp3", &b"b"[..])]);
    session.run_extraction()?;
    assert_eq!(session.artifact_store().live_count(), 2);

    spawner.expect_transcode(&["Conversion failed!"], 1, &[]);
    let err = session.run_extraction().unwrap_err();
    assert!(matches!(err, CoreError::CommandExecution { .. }));

    let state = session.state();
    assert_eq!(state.extraction_status, ExtractionStatus::Failed);
    assert!(!state.is_processing());
    assert!(state.error.is_some());
    assert!(state.artifacts.is_empty());
    assert_eq!(session.artifact_store().live_count(), 0);

    let engine = session.engine();
    assert!(!engine.is_mounted(DEFAULT_EXTRACT_DIR));
    // Only the session's own log handler stays installed.
    assert_eq!(engine.subscriber_count(), 1);
    Ok(())
}

#[test]
fn test_selecting_new_file_resets_per_file_state() -> Result<(), Box<dyn std::error::Error>> {
    let input_dir = tempdir()?;
    let spawner = MockFfmpegSpawner::new();
    let session = probed_session(&spawner, input_dir.path())?;

    spawner.expect_transcode(&[], 0, &[("track_1_0.mp3", &b"a"[..]), ("track_2_1.mp3", &b"b"[..])]);
    session.run_extraction()?;

    spawner.expect_info(&["  Stream #0:0: Video: h264"]);
    session.select_file(&create_dummy_file(input_dir.path(), "clip.mp4"))?;

    let state = session.state();
    assert!(state.tracks.is_empty());
    assert!(state.artifacts.is_empty());
    assert_eq!(state.duration, 0.0);
    assert_eq!(state.progress, 0);
    assert_eq!(state.extraction_status, ExtractionStatus::Idle);
    assert_eq!(state.error.as_deref(), Some("No audio tracks found in this file."));
    assert_eq!(session.artifact_store().live_count(), 0);
    Ok(())
}

#[test]
fn test_observer_sees_progress_and_transitions() -> Result<(), Box<dyn std::error::Error>> {
    let input_dir = tempdir()?;
    let spawner = MockFfmpegSpawner::new();
    let session = probed_session(&spawner, input_dir.path())?;

    let snapshots: Arc<Mutex<Vec<SessionState>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&snapshots);
    session.on_change(move |state: &SessionState| sink.lock().unwrap().push(state.clone()));

    spawner.expect_transcode(
        &[
            "size=  100kB time=00:00:20.00 bitrate=40.0kbits/s",
            "size=  300kB time=00:01:00.00 bitrate=40.0kbits/s",
        ],
        0,
        &[("track_1_0.mp3", &b"a"[..]), ("track_2_1.mp3", &b"b"[..])],
    );
    session.run_extraction()?;

    let snapshots = snapshots.lock().unwrap();
    assert!(snapshots.iter().any(|s| s.is_processing()));
    let progress: Vec<u8> = snapshots
        .iter()
        .filter(|s| s.is_processing())
        .map(|s| s.progress)
        .collect();
    assert!(progress.contains(&20));
    assert!(progress.contains(&60));
    assert!(progress.windows(2).all(|w| w[0] <= w[1]));

    let last = snapshots.last().unwrap();
    assert_eq!(last.extraction_status, ExtractionStatus::Done);
    assert_eq!(last.progress, 100);
    Ok(())
}
