// ============================================================================
// audex-cli/src/commands/extract.rs
// ============================================================================
//
// EXTRACT COMMAND: Probe, Select, Extract, Save
//
// Walks the session through the same steps an interactive user would:
// pick the file, adjust the track selection, choose a format, run the
// extraction, then save every artifact and release the handles.

use crate::cli::ExtractArgs;
use crate::commands::{CliEngine, open_session};
use crate::error::{CliResult, validate_input_file};
use crate::terminal::{
    extraction_progress_bar, print_artifact, print_duration, print_section, print_status,
    print_success, print_track_table,
};
use audex_core::{CoreError, FfmpegSpawner, Session, SessionState};
use std::collections::HashSet;
use std::fs;

pub fn run_extract(engine: &CliEngine, args: ExtractArgs) -> CliResult<()> {
    let input = validate_input_file(&args.input_path)?;
    fs::create_dir_all(&args.output_dir)?;

    let session = open_session(engine)?;

    print_section("Analysis");
    session.select_file(&input)?;
    let state = session.state();
    print_status("File", &input.display().to_string(), true);
    print_duration(state.duration);
    if state.tracks.is_empty() {
        return Err(CoreError::NoTracksFound);
    }
    print_track_table(&state.tracks);

    if let Some(indices) = &args.tracks {
        select_tracks(&session, indices)?;
    }
    session.set_output_format(args.format);

    print_section("Extraction");
    print_status("Format", &args.format.to_string(), false);
    print_status("Output", &args.output_dir.display().to_string(), false);

    let pb = extraction_progress_bar();
    let bar = pb.clone();
    session.on_change(move |state: &SessionState| {
        if state.is_processing() {
            bar.set_position(u64::from(state.progress));
        }
    });
    let result = session.run_extraction();
    pb.finish_and_clear();
    result?;

    for (index, artifact) in session.artifacts().iter().enumerate() {
        let path = session.save_artifact(index, &args.output_dir)?;
        print_artifact(artifact, &path.display().to_string());
    }
    print_success(&session.state().message);

    session.release_artifacts();
    Ok(())
}

/// Selects exactly the tracks with the given global stream indices.
pub(crate) fn select_tracks<S: FfmpegSpawner>(
    session: &Session<S>,
    indices: &[u32],
) -> CliResult<()> {
    let tracks = session.state().tracks;
    session.toggle_all(false);

    let mut selected = HashSet::new();
    for &index in indices {
        let track = tracks
            .iter()
            .find(|t| t.info.global_stream_index == index)
            .ok_or_else(|| {
                CoreError::InvalidSelection(format!("stream #{index} is not an audio track"))
            })?;
        if selected.insert(track.info.local_index) {
            session.toggle_one(track.info.local_index)?;
        }
    }
    Ok(())
}
