// ============================================================================
// audex-core/src/config/builder.rs
// ============================================================================
//
// CONFIGURATION BUILDER: Builder Pattern for EngineConfig
//
// Fluent construction of EngineConfig, starting from the defaults.

// ---- Standard library imports ----
use std::path::PathBuf;

// ---- Internal crate imports ----
use super::EngineConfig;
use crate::extraction::OutputFormat;

/// Builder for creating EngineConfig instances.
#[derive(Debug, Clone, Default)]
pub struct EngineConfigBuilder {
    config: EngineConfig,
}

impl EngineConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ffmpeg_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.ffmpeg_path = Some(path.into());
        self
    }

    pub fn auto_download(mut self, enabled: bool) -> Self {
        self.config.auto_download = enabled;
        self
    }

    pub fn work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.work_dir = Some(dir.into());
        self
    }

    pub fn probe_dir(mut self, name: impl Into<String>) -> Self {
        self.config.probe_dir = name.into();
        self
    }

    pub fn extract_dir(mut self, name: impl Into<String>) -> Self {
        self.config.extract_dir = name.into();
        self
    }

    /// Sets the session log cap. Zero is treated as one line.
    pub fn log_history_limit(mut self, limit: usize) -> Self {
        self.config.log_history_limit = limit.max(1);
        self
    }

    pub fn default_format(mut self, format: OutputFormat) -> Self {
        self.config.default_format = format;
        self
    }

    pub fn build(self) -> EngineConfig {
        self.config
    }
}
