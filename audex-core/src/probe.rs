// ============================================================================
// audex-core/src/probe.rs
// ============================================================================
//
// PROBE OPERATION: Audio Track Discovery
//
// Mounts a file, runs ffmpeg with only an input (which prints the container
// metadata and then fails for lack of an output), and parses the collected
// diagnostics into a track list and a duration. The mount and the log
// collector are both scoped: they are removed on every exit path.

use crate::diagnostics::{self, AudioTrackInfo};
use crate::engine::{Engine, FfmpegSpawner, MountedInput, lock};
use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Tracks and duration found by a probe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeResult {
    pub tracks: Vec<AudioTrackInfo>,
    /// Container duration in seconds; 0 when ffmpeg did not report one.
    pub duration: f64,
}

/// Probes `file` for audio streams.
pub fn probe<S: FfmpegSpawner>(engine: &Engine<S>, file: &Path) -> CoreResult<ProbeResult> {
    engine.ensure_ready()?;
    log::info!("Probing {}", file.display());

    let mount = mount_input(engine, &engine.config().probe_dir, file)?;
    let output = collect_info_output(engine, mount.input_path())?;
    mount.release();

    let result = ProbeResult {
        tracks: diagnostics::parse_audio_streams(&output),
        duration: diagnostics::parse_duration(&output),
    };
    log::info!(
        "Found {} audio track(s), duration {:.2}s",
        result.tracks.len(),
        result.duration
    );
    Ok(result)
}

/// Arguments of the info invocation.
pub fn info_args(input_path: &str) -> Vec<String> {
    vec!["-i".to_string(), input_path.to_string()]
}

/// Creates `dir` (an existing one is fine) and mounts `file` into it.
pub(crate) fn mount_input<'e, S: FfmpegSpawner>(
    engine: &'e Engine<S>,
    dir: &str,
    file: &Path,
) -> CoreResult<MountedInput<'e, S>> {
    match engine.create_dir(dir) {
        Ok(()) => {}
        Err(e) if e.is_already_exists() => log::debug!("Mount directory {} already exists", dir),
        Err(e) => return Err(e),
    }

    engine.mount(dir, file).inspect_err(|_| {
        if let Err(cleanup) = engine.delete_dir(dir) {
            log::debug!("Could not remove {} after failed mount: {}", dir, cleanup);
        }
    })
}

/// Runs the info command against a mounted input and returns everything it printed.
///
/// Its non-zero exit is expected and swallowed; failures to run ffmpeg at
/// all are propagated.
pub(crate) fn collect_info_output<S: FfmpegSpawner>(
    engine: &Engine<S>,
    input_path: &str,
) -> CoreResult<String> {
    let lines = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&lines);
    let subscription = engine.subscribe(move |line| lock(&sink).push(line.text.clone()));

    let result = engine.exec_expecting_failure(&info_args(input_path));
    subscription.unsubscribe();

    match result {
        Ok(()) => {}
        Err(CoreError::CommandExecution { status, .. }) => {
            log::debug!("Info command exited with {} (expected)", status);
        }
        Err(e) => return Err(e),
    }

    let output = lock(&lines).join("\n");
    Ok(output)
}
