//! Command implementations for the CLI.
//!
//! Each submodule contains the implementation of a specific command.

use crate::cli::EngineArgs;
use crate::error::CliResult;
use audex_core::{Engine, Session, SidecarSpawner};
use std::sync::Arc;

/// Module containing the implementation of the `probe` command.
pub mod probe;

/// Module containing the implementation of the `extract` command.
/// This command exports the chosen audio tracks into an output directory.
pub mod extract;

/// The engine of one `audex` run. Its workspace is removed when the last
/// handle is dropped, so it must not outlive the command.
pub type CliEngine = Arc<Engine<SidecarSpawner>>;

/// Builds the engine for this process from the command-line options.
pub fn create_engine(engine_args: &EngineArgs) -> CliEngine {
    Arc::new(Engine::new(SidecarSpawner::default(), engine_args.to_config()))
}

/// Creates a session over `engine` and loads ffmpeg.
pub(crate) fn open_session(engine: &CliEngine) -> CliResult<Session<SidecarSpawner>> {
    let session = Session::new(Arc::clone(engine));
    session.initialize()?;
    Ok(session)
}
