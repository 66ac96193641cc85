//! Configuration structures and constants for the audex-core library.
//!
//! This module provides the configuration for the engine binding and the
//! session: where the ffmpeg binary lives, where the engine keeps its
//! working files, and the names of the per-operation mount directories.

mod builder;

use std::path::PathBuf;

use crate::extraction::OutputFormat;

pub use builder::EngineConfigBuilder;

// Default constants

/// Mount directory used by the probe operation.
pub const DEFAULT_PROBE_DIR: &str = "input_mnt_probe";

/// Mount directory used by the extraction operation.
/// Distinct from the probe directory so the two can run back-to-back.
pub const DEFAULT_EXTRACT_DIR: &str = "input_mnt";

/// Number of engine log lines retained by a session before the oldest are dropped.
pub const DEFAULT_LOG_HISTORY_LIMIT: usize = 1000;

/// Prefix of the engine working directory created under `work_dir`.
pub const ENGINE_DIR_PREFIX: &str = "audex_engine_";

/// Configuration for the engine binding and the session built on top of it.
///
/// # Examples
///
/// ```rust
/// use audex_core::config::EngineConfigBuilder;
/// use audex_core::OutputFormat;
///
/// let config = EngineConfigBuilder::new()
///     .auto_download(false)
///     .default_format(OutputFormat::Wav)
///     .build();
/// assert_eq!(config.default_format, OutputFormat::Wav);
/// ```
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Explicit ffmpeg binary. When unset, ffmpeg-sidecar's lookup is used.
    pub ffmpeg_path: Option<PathBuf>,

    /// Fetch an ffmpeg build when none is installed.
    pub auto_download: bool,

    /// Base directory for the engine working directory (defaults to the system temp dir).
    pub work_dir: Option<PathBuf>,

    /// Mount directory name used while probing.
    pub probe_dir: String,

    /// Mount directory name used while extracting.
    pub extract_dir: String,

    /// Maximum number of log lines kept in the session state.
    pub log_history_limit: usize,

    /// Output format selected when a session starts.
    pub default_format: OutputFormat,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: None,
            auto_download: false,
            work_dir: None,
            probe_dir: DEFAULT_PROBE_DIR.to_string(),
            extract_dir: DEFAULT_EXTRACT_DIR.to_string(),
            log_history_limit: DEFAULT_LOG_HISTORY_LIMIT,
            default_format: OutputFormat::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.probe_dir, DEFAULT_PROBE_DIR);
        assert_eq!(config.extract_dir, DEFAULT_EXTRACT_DIR);
        assert_ne!(config.probe_dir, config.extract_dir);
        assert_eq!(config.log_history_limit, DEFAULT_LOG_HISTORY_LIMIT);
        assert_eq!(config.default_format, OutputFormat::Mp3);
        assert!(!config.auto_download);
        assert!(config.ffmpeg_path.is_none());
    }
}
