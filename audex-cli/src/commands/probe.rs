// audex-cli/src/commands/probe.rs
//
// `audex probe`: list the audio tracks of one file.

use crate::cli::ProbeArgs;
use crate::commands::{CliEngine, open_session};
use crate::error::{CliResult, validate_input_file};
use crate::terminal::{print_duration, print_notice, print_section, print_status, print_track_table};
use audex_core::CoreError;

pub fn run_probe(engine: &CliEngine, args: ProbeArgs) -> CliResult<()> {
    let input = validate_input_file(&args.input_path)?;
    let session = open_session(engine)?;

    session.select_file(&input)?;
    let state = session.state();

    if args.json {
        let report = serde_json::json!({
            "file": input,
            "duration": state.duration,
            "tracks": state.tracks,
        });
        let text = serde_json::to_string_pretty(&report).map_err(|e| CoreError::Io(e.into()))?;
        println!("{text}");
        return Ok(());
    }

    print_section("Audio Tracks");
    print_status("File", &input.display().to_string(), true);
    print_duration(state.duration);
    match &state.error {
        Some(notice) => print_notice(notice),
        None => {
            print_status("Tracks", &state.tracks.len().to_string(), false);
            print_track_table(&state.tracks);
        }
    }
    Ok(())
}
