// audex-core/tests/probe_tests.rs

use audex_core::config::{DEFAULT_PROBE_DIR, EngineConfig};
use audex_core::engine::Engine;
use audex_core::error::CoreError;
use audex_core::mocks::{CallMatcher, MockFfmpegExpectation, MockFfmpegSpawner};
use audex_core::probe::probe;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

const MOVIE_INFO: &[&str] = &[
    "Input #0, matroska,webm, from 'input_mnt_probe/movie.mkv':",
    "  Duration: 00:09:42.57, start: 0.000000, bitrate: 3120 kb/s",
    "  Stream #0:0: Video: h264 (High), yuv420p(progressive), 1920x1080, 23.98 fps",
    "  Stream #0:1(jpn): Audio: aac (LC), 48000 Hz, stereo, fltp (default)",
    "  Stream #0:2(eng): Audio: ac3, 48000 Hz, 5.1(side), fltp, 448 kb/s",
    "  Stream #0:3(eng): Subtitle: subrip",
    "At least one output file must be specified",
];

fn create_dummy_file(dir: &Path, filename: &str) -> PathBuf {
    let file_path = dir.join(filename);
    fs::write(&file_path, b"dummy content").expect("Failed to create dummy file");
    file_path
}

fn ready_engine(spawner: &MockFfmpegSpawner) -> Engine<MockFfmpegSpawner> {
    let engine = Engine::new(spawner.clone(), EngineConfig::default());
    engine.initialize(None).expect("mock engine loads");
    engine
}

fn assert_probe_dir_released(engine: &Engine<MockFfmpegSpawner>) {
    assert!(!engine.is_mounted(DEFAULT_PROBE_DIR));
    assert!(!engine.working_dir().unwrap().join(DEFAULT_PROBE_DIR).exists());
    assert_eq!(engine.subscriber_count(), 0);
}

#[test]
fn test_probe_finds_tracks_and_duration() -> Result<(), Box<dyn std::error::Error>> {
    let input_dir = tempdir()?;
    let movie = create_dummy_file(input_dir.path(), "movie.mkv");

    let spawner = MockFfmpegSpawner::new();
    spawner.expect_info(MOVIE_INFO);
    let engine = ready_engine(&spawner);

    let result = probe(&engine, &movie)?;

    assert!((result.duration - 582.57).abs() < 1e-9);
    assert_eq!(result.tracks.len(), 2);
    assert_eq!(result.tracks[0].local_index, 0);
    assert_eq!(result.tracks[0].global_stream_index, 1);
    assert_eq!(result.tracks[0].language, "jpn");
    assert_eq!(result.tracks[0].codec, "aac");
    assert_eq!(result.tracks[1].global_stream_index, 2);
    assert_eq!(result.tracks[1].language, "eng");
    assert_eq!(result.tracks[1].codec, "ac3");

    let calls = spawner.get_received_calls();
    assert_eq!(calls, vec![vec!["-i".to_string(), "input_mnt_probe/movie.mkv".to_string()]]);
    assert_probe_dir_released(&engine);
    Ok(())
}

#[test]
fn test_probe_file_without_audio_is_empty_not_error() -> Result<(), Box<dyn std::error::Error>> {
    let input_dir = tempdir()?;
    let clip = create_dummy_file(input_dir.path(), "silent.mp4");

    let spawner = MockFfmpegSpawner::new();
    spawner.expect_info(&["  Stream #0:0: Video: h264, yuv420p, 640x480"]);
    let engine = ready_engine(&spawner);

    let result = probe(&engine, &clip)?;
    assert!(result.tracks.is_empty());
    assert_eq!(result.duration, 0.0);
    assert_probe_dir_released(&engine);
    Ok(())
}

#[test]
fn test_probe_tolerates_existing_probe_dir() -> Result<(), Box<dyn std::error::Error>> {
    let input_dir = tempdir()?;
    let movie = create_dummy_file(input_dir.path(), "movie.mkv");

    let spawner = MockFfmpegSpawner::new();
    spawner.expect_info(MOVIE_INFO);
    let engine = ready_engine(&spawner);
    engine.create_dir(DEFAULT_PROBE_DIR)?;

    let result = probe(&engine, &movie)?;
    assert_eq!(result.tracks.len(), 2);
    assert_probe_dir_released(&engine);
    Ok(())
}

#[test]
fn test_probe_before_initialize_fails() {
    let spawner = MockFfmpegSpawner::new();
    let engine = Engine::new(spawner.clone(), EngineConfig::default());

    let err = probe(&engine, Path::new("/tmp/whatever.mkv")).unwrap_err();
    assert!(matches!(err, CoreError::EngineNotLoaded));
    assert!(spawner.get_received_calls().is_empty());
}

#[test]
fn test_probe_spawn_failure_propagates_and_cleans_up() -> Result<(), Box<dyn std::error::Error>> {
    let input_dir = tempdir()?;
    let movie = create_dummy_file(input_dir.path(), "movie.mkv");

    let spawner = MockFfmpegSpawner::new();
    spawner.expect_spawn_error(CallMatcher::Info);
    let engine = ready_engine(&spawner);

    let err = probe(&engine, &movie).unwrap_err();
    assert!(matches!(err, CoreError::CommandStart(_, _)));
    assert_probe_dir_released(&engine);
    Ok(())
}

#[test]
fn test_probe_missing_input_never_runs_ffmpeg() -> Result<(), Box<dyn std::error::Error>> {
    let input_dir = tempdir()?;
    let spawner = MockFfmpegSpawner::new();
    let engine = ready_engine(&spawner);

    assert!(probe(&engine, &input_dir.path().join("nope.mkv")).is_err());
    assert!(spawner.get_received_calls().is_empty());
    assert_probe_dir_released(&engine);
    Ok(())
}

#[test]
fn test_probes_do_not_see_each_others_lines() -> Result<(), Box<dyn std::error::Error>> {
    let input_dir = tempdir()?;
    let movie = create_dummy_file(input_dir.path(), "movie.mkv");

    let spawner = MockFfmpegSpawner::new();
    spawner.expect_info(MOVIE_INFO);
    spawner.expect_info(&["  Stream #0:4: Audio: mp3, 44100 Hz, stereo, fltp, 192 kb/s"]);
    let engine = ready_engine(&spawner);

    assert_eq!(probe(&engine, &movie)?.tracks.len(), 2);
    let second = probe(&engine, &movie)?;
    assert_eq!(second.tracks.len(), 1);
    assert_eq!(second.tracks[0].global_stream_index, 4);
    assert_eq!(second.tracks[0].language, "und");
    Ok(())
}

#[test]
fn test_cleanup_failure_does_not_mask_probe_result() -> Result<(), Box<dyn std::error::Error>> {
    let input_dir = tempdir()?;
    let movie = create_dummy_file(input_dir.path(), "movie.mkv");

    // A file left in the mount directory makes deleting it fail.
    let spawner = MockFfmpegSpawner::new();
    spawner.add_expectation(MockFfmpegExpectation {
        matcher: CallMatcher::Info,
        lines: MOVIE_INFO.iter().map(|l| l.to_string()).collect(),
        exit_code: 1,
        outputs: vec![(format!("{DEFAULT_PROBE_DIR}/stray"), b"leftover".to_vec())],
        spawn_error: false,
    });
    let engine = ready_engine(&spawner);

    let result = probe(&engine, &movie)?;
    assert_eq!(result.tracks.len(), 2);
    assert!((result.duration - 582.57).abs() < 1e-9);

    let probe_dir = engine.working_dir()?.join(DEFAULT_PROBE_DIR);
    assert!(!engine.is_mounted(DEFAULT_PROBE_DIR));
    assert!(probe_dir.join("stray").exists());
    assert!(!probe_dir.join("movie.mkv").exists());
    assert_eq!(engine.subscriber_count(), 0);

    // The leftover directory does not block the next probe.
    spawner.expect_info(MOVIE_INFO);
    assert_eq!(probe(&engine, &movie)?.tracks.len(), 2);
    Ok(())
}
