// ============================================================================
// audex-cli/src/error.rs
// ============================================================================
//
// CLI ERROR HANDLING: Result alias, input validation and exit codes
//
// The CLI reports every failure as a `CoreError`; this module adds the
// path checks done before the engine is touched and the mapping from error
// kind to process exit code.

use audex_core::{CoreError, CoreResult};
use std::path::{Path, PathBuf};

/// Type alias for CLI results using CoreError.
pub type CliResult<T> = CoreResult<T>;

/// Exit code for usage problems (bad paths, selections, formats).
pub const EXIT_USAGE: i32 = 2;
/// Exit code when ffmpeg cannot be loaded.
pub const EXIT_ENGINE: i32 = 3;
/// Exit code for any other failure.
pub const EXIT_FAILURE: i32 = 1;

pub fn exit_code(error: &CoreError) -> i32 {
    match error {
        CoreError::EngineLoad(_) | CoreError::DependencyNotFound(_) => EXIT_ENGINE,
        CoreError::PathError(_) | CoreError::InvalidSelection(_) | CoreError::InvalidFormat(_) => {
            EXIT_USAGE
        }
        _ => EXIT_FAILURE,
    }
}

/// Canonicalizes `path` and requires it to be a regular file.
pub fn validate_input_file(path: &Path) -> CliResult<PathBuf> {
    let input = path.canonicalize().map_err(|e| {
        CoreError::PathError(format!("Invalid input path '{}': {}", path.display(), e))
    })?;
    if !input.is_file() {
        return Err(CoreError::PathError(format!(
            "Input path '{}' is not a file",
            input.display()
        )));
    }
    Ok(input)
}
