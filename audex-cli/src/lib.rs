// audex-cli/src/lib.rs
//
// Library portion of the Audex CLI application.
// Contains argument definitions and command logic.

pub mod cli;
pub mod commands;
pub mod error;
pub mod logging;
pub mod terminal;

// Re-export items needed by the binary or integration tests
pub use cli::{Cli, Commands, EngineArgs, ExtractArgs, ProbeArgs};
pub use commands::extract::run_extract;
pub use commands::{CliEngine, create_engine};
pub use commands::probe::run_probe;
