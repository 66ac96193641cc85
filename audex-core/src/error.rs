// ============================================================================
// audex-core/src/error.rs
// ============================================================================
//
// ERROR HANDLING: Error Types for the Transcode Session Manager
//
// Operation-level functions return `CoreResult<T>`. Parser functions never
// fail. The session converts every error into a single user-visible string.
//
// KEY COMPONENTS:
// - CoreError: All failure kinds raised by the engine and the operations
// - CoreResult: Result alias used across the crate
// - Helper constructors for command start/wait/exit failures

use std::io;
use std::process::ExitStatus;
use thiserror::Error;

/// Errors raised by the engine binding and the probe/extraction operations.
#[derive(Error, Debug)]
pub enum CoreError {
    /// The engine binary could not be fetched, located or started.
    /// Fatal: no further operations are possible.
    #[error("Failed to load the ffmpeg engine: {0}")]
    EngineLoad(String),

    /// An operation was attempted before `initialize()` completed.
    #[error("The ffmpeg engine is not loaded")]
    EngineNotLoaded,

    /// The command ran but exited non-zero. Expected for the info command.
    #[error("Command '{command}' failed with status {status}")]
    CommandExecution {
        command: String,
        status: ExitStatus,
        diagnostics: String,
    },

    #[error("Failed to start command '{0}': {1}")]
    CommandStart(String, #[source] io::Error),

    #[error("Failed waiting for command '{0}': {1}")]
    CommandWait(String, #[source] io::Error),

    /// Extraction found no requested streams and the fallback scan found none either.
    #[error("No audio tracks found or selected")]
    NoTracksFound,

    /// A single expected output could not be read back.
    #[error("Could not read output file '{name}': {source}")]
    OutputRead {
        name: String,
        #[source]
        source: io::Error,
    },

    #[error("Directory '{0}' already has a mounted input")]
    AlreadyMounted(String),

    #[error("Directory '{0}' has no mounted input")]
    NotMounted(String),

    #[error("Required dependency not found: {0}")]
    DependencyNotFound(String),

    #[error("Unsupported output format: {0}")]
    InvalidFormat(String),

    #[error("Invalid track selection: {0}")]
    InvalidSelection(String),

    #[error("Path error: {0}")]
    PathError(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Result type for audex-core operations.
pub type CoreResult<T> = std::result::Result<T, CoreError>;

impl CoreError {
    /// Returns true when the error is an "already exists" filesystem error.
    ///
    /// Creating a mount directory that survived an earlier run is benign.
    pub fn is_already_exists(&self) -> bool {
        matches!(self, CoreError::Io(e) if e.kind() == io::ErrorKind::AlreadyExists)
    }

    /// Diagnostics captured from a failed command, if any.
    pub fn diagnostics(&self) -> Option<&str> {
        match self {
            CoreError::CommandExecution { diagnostics, .. } => Some(diagnostics),
            _ => None,
        }
    }
}

pub fn command_failed_error(
    command: impl Into<String>,
    status: ExitStatus,
    diagnostics: impl Into<String>,
) -> CoreError {
    CoreError::CommandExecution {
        command: command.into(),
        status,
        diagnostics: diagnostics.into(),
    }
}

pub fn command_start_error(command: impl Into<String>, error: io::Error) -> CoreError {
    CoreError::CommandStart(command.into(), error)
}

pub fn command_wait_error(command: impl Into<String>, error: io::Error) -> CoreError {
    CoreError::CommandWait(command.into(), error)
}
