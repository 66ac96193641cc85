// ============================================================================
// audex-core/src/engine/spawner.rs
// ============================================================================
//
// FFMPEG EXECUTOR: FFmpeg Process Management and Abstraction
//
// Traits for loading the ffmpeg binary and spawning processes, plus the
// concrete implementation on top of ffmpeg-sidecar. The engine binding is
// generic over `FfmpegSpawner` so tests can script ffmpeg's behaviour.
//
// KEY COMPONENTS:
// - FfmpegProcess: Trait representing an active FFmpeg process
// - FfmpegSpawner: Trait for loading ffmpeg and creating processes
// - SidecarSpawner: Concrete implementation using ffmpeg-sidecar

use crate::config::EngineConfig;
use crate::error::{
    CoreError, CoreResult, command_failed_error, command_start_error, command_wait_error,
};
use ffmpeg_sidecar::child::FfmpegChild as SidecarChild;
use ffmpeg_sidecar::command::FfmpegCommand;
use ffmpeg_sidecar::event::FfmpegEvent;
use once_cell::sync::OnceCell;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};

// --- FFmpeg Execution Abstraction ---

/// Trait representing an active ffmpeg process instance.
pub trait FfmpegProcess {
    /// Processes events from the running command using a provided handler closure.
    fn handle_events<F>(&mut self, handler: F) -> CoreResult<()>
    where
        F: FnMut(FfmpegEvent) -> CoreResult<()>;

    /// Waits for the command to complete and returns its exit status.
    fn wait(&mut self) -> CoreResult<ExitStatus>;
}

/// Trait representing something that can load ffmpeg and spawn an FfmpegProcess.
pub trait FfmpegSpawner: Send + Sync {
    type Process: FfmpegProcess;

    /// Makes the ffmpeg binary available and checks that it runs.
    fn load(&self, config: &EngineConfig) -> CoreResult<()>;

    /// Spawns ffmpeg with `args`, running inside `working_dir`.
    fn spawn(&self, args: &[String], working_dir: &Path) -> CoreResult<Self::Process>;
}

// --- Concrete Implementation using ffmpeg-sidecar ---

/// Wrapper around `ffmpeg_sidecar::child::FfmpegChild` implementing `FfmpegProcess`.
pub struct SidecarProcess(SidecarChild);

impl FfmpegProcess for SidecarProcess {
    fn handle_events<F>(&mut self, mut handler: F) -> CoreResult<()>
    where
        F: FnMut(FfmpegEvent) -> CoreResult<()>,
    {
        let iterator = self.0.iter().map_err(|e| {
            log::error!("Failed to get ffmpeg event iterator: {}", e);
            command_failed_error("ffmpeg (event iterator)", ExitStatus::default(), e.to_string())
        })?;
        for event in iterator {
            handler(event)?;
        }
        Ok(())
    }

    fn wait(&mut self) -> CoreResult<ExitStatus> {
        self.0.wait().map_err(|e| command_wait_error("ffmpeg", e))
    }
}

/// Concrete implementation of `FfmpegSpawner` using `ffmpeg-sidecar`.
#[derive(Debug, Default)]
pub struct SidecarSpawner {
    ffmpeg_path: OnceCell<PathBuf>,
}

impl SidecarSpawner {
    /// The binary resolved by `load`, if loading has happened.
    pub fn ffmpeg_path(&self) -> Option<&Path> {
        self.ffmpeg_path.get().map(PathBuf::as_path)
    }
}

impl FfmpegSpawner for SidecarSpawner {
    type Process = SidecarProcess;

    fn load(&self, config: &EngineConfig) -> CoreResult<()> {
        if config.auto_download && config.ffmpeg_path.is_none() {
            log::info!("Making sure an ffmpeg build is available (auto-download enabled)");
            ffmpeg_sidecar::download::auto_download()
                .map_err(|e| CoreError::EngineLoad(format!("ffmpeg download failed: {e}")))?;
        }

        let path = config
            .ffmpeg_path
            .clone()
            .unwrap_or_else(ffmpeg_sidecar::paths::ffmpeg_path);
        check_dependency(&path)?;

        log::debug!("Using ffmpeg binary: {}", path.display());
        let _ = self.ffmpeg_path.set(path);
        Ok(())
    }

    fn spawn(&self, args: &[String], working_dir: &Path) -> CoreResult<Self::Process> {
        let path = self.ffmpeg_path.get().ok_or(CoreError::EngineNotLoaded)?;

        let mut cmd = FfmpegCommand::new_with_path(path);
        cmd.args(args);
        cmd.as_inner_mut().current_dir(working_dir);

        cmd.spawn()
            .map(SidecarProcess)
            .map_err(|e| command_start_error("ffmpeg", e))
    }
}

/// Checks that the ffmpeg binary exists and can be executed.
fn check_dependency(path: &Path) -> CoreResult<()> {
    let result = Command::new(path)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();

    match result {
        Ok(status) if status.success() => {
            log::debug!("Found dependency: {}", path.display());
            Ok(())
        }
        Ok(status) => Err(command_failed_error(
            format!("{} -version", path.display()),
            status,
            String::new(),
        )),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            log::warn!("Dependency '{}' not found.", path.display());
            Err(CoreError::DependencyNotFound(path.display().to_string()))
        }
        Err(e) => {
            log::error!(
                "Failed to start dependency check command '{}': {}",
                path.display(),
                e
            );
            Err(command_start_error(path.display().to_string(), e))
        }
    }
}
