// ============================================================================
// audex-core/src/engine/mod.rs
// ============================================================================
//
// ENGINE BINDING: Lifecycle and Primitives of the Resident ffmpeg Engine
//
// One engine per process, loaded lazily and kept for the process lifetime.
// It owns a private workspace (see `workspace`) and exposes the primitive
// operations the probe and extraction operations are built from: directory
// and mount management, command execution, output read/delete, and a
// subscribable diagnostic-line stream.
//
// KEY COMPONENTS:
// - Engine: the binding itself, generic over the process spawner
// - EngineState: Unloaded -> Loading -> Ready
// - MountedInput: scoped mount that unmounts and deletes its directory on drop
// - LogBus / LogSubscription: typed diagnostic stream with scoped handlers

pub mod log_bus;
pub mod spawner;
mod workspace;

pub use log_bus::{DiagnosticLine, LogBus, LogHandler, LogLevel, LogSubscription};
pub use spawner::{FfmpegProcess, FfmpegSpawner, SidecarProcess, SidecarSpawner};

use crate::config::EngineConfig;
use crate::error::{CoreError, CoreResult, command_failed_error};
use once_cell::sync::OnceCell;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use workspace::Workspace;

/// Lifecycle of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Unloaded,
    Loading,
    Ready,
}

/// Locks a mutex, recovering the data if a previous holder panicked.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

struct EngineInner {
    state: EngineState,
    workspace: Option<Workspace>,
}

/// Binding to a single resident ffmpeg engine.
pub struct Engine<S: FfmpegSpawner> {
    spawner: S,
    config: EngineConfig,
    inner: Mutex<EngineInner>,
    load_lock: Mutex<()>,
    bus: Arc<LogBus>,
}

static SHARED_ENGINE: OnceCell<Arc<Engine<SidecarSpawner>>> = OnceCell::new();

impl Engine<SidecarSpawner> {
    /// Returns the process-wide engine, creating it on first use.
    ///
    /// The configuration of the first call wins; later calls get the same
    /// instance. Statics are never dropped, so its workspace stays on disk
    /// until something removes it; short-lived programs should own an
    /// `Engine::new` instead.
    pub fn shared(config: EngineConfig) -> Arc<Self> {
        SHARED_ENGINE
            .get_or_init(|| Arc::new(Engine::new(SidecarSpawner::default(), config)))
            .clone()
    }
}

impl<S: FfmpegSpawner> Engine<S> {
    pub fn new(spawner: S, config: EngineConfig) -> Self {
        Self {
            spawner,
            config,
            inner: Mutex::new(EngineInner {
                state: EngineState::Unloaded,
                workspace: None,
            }),
            load_lock: Mutex::new(()),
            bus: LogBus::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn spawner(&self) -> &S {
        &self.spawner
    }

    pub fn state(&self) -> EngineState {
        lock(&self.inner).state
    }

    pub fn is_ready(&self) -> bool {
        self.state() == EngineState::Ready
    }

    /// Loads the engine once. Later calls return immediately.
    ///
    /// `on_log`, when given, is subscribed once the engine is ready and
    /// stays installed for as long as the returned subscription lives. A
    /// failed load installs nothing.
    pub fn initialize(&self, on_log: Option<LogHandler>) -> CoreResult<Option<LogSubscription>> {
        let _loading = lock(&self.load_lock);

        if self.is_ready() {
            log::debug!("Engine already loaded");
            return Ok(on_log.map(|handler| self.bus.subscribe(handler)));
        }

        self.set_state(EngineState::Loading);
        log::info!("Loading ffmpeg engine");

        let loaded = self
            .spawner
            .load(&self.config)
            .and_then(|()| Workspace::create(&self.config));

        match loaded {
            Ok(workspace) => {
                {
                    let mut inner = lock(&self.inner);
                    inner.workspace = Some(workspace);
                    inner.state = EngineState::Ready;
                }
                log::info!("ffmpeg engine ready");
                Ok(on_log.map(|handler| self.bus.subscribe(handler)))
            }
            Err(e) => {
                self.set_state(EngineState::Unloaded);
                log::error!("Failed to load ffmpeg engine: {}", e);
                if matches!(e, CoreError::EngineLoad(_)) {
                    Err(e)
                } else {
                    Err(CoreError::EngineLoad(e.to_string()))
                }
            }
        }
    }

    /// Fails with `EngineNotLoaded` unless the engine is ready.
    pub fn ensure_ready(&self) -> CoreResult<()> {
        if self.is_ready() {
            Ok(())
        } else {
            Err(CoreError::EngineNotLoaded)
        }
    }

    /// Root of the engine workspace.
    pub fn working_dir(&self) -> CoreResult<PathBuf> {
        self.with_workspace(|ws| Ok(ws.root().to_path_buf()))
    }

    pub fn create_dir(&self, dir: &str) -> CoreResult<()> {
        self.with_workspace(|ws| ws.create_dir(dir))
    }

    pub fn delete_dir(&self, dir: &str) -> CoreResult<()> {
        self.with_workspace(|ws| ws.delete_dir(dir))
    }

    /// Links `file` read-only into `dir`. The directory must exist and have no mount yet.
    pub fn mount(&self, dir: &str, file: &Path) -> CoreResult<MountedInput<'_, S>> {
        let mount = self.with_workspace(|ws| ws.mount(dir, file))?;
        log::debug!("Mounted {} at {}", file.display(), mount.input_path);
        Ok(MountedInput {
            engine: self,
            dir: dir.to_string(),
            input_path: mount.input_path,
            released: false,
        })
    }

    pub fn unmount(&self, dir: &str) -> CoreResult<()> {
        self.with_workspace(|ws| ws.unmount(dir))
    }

    pub fn is_mounted(&self, dir: &str) -> bool {
        self.with_workspace(|ws| Ok(ws.is_mounted(dir)))
            .unwrap_or(false)
    }

    /// Reads an output file written by a previous command.
    pub fn read_file(&self, name: &str) -> CoreResult<Vec<u8>> {
        self.with_workspace(|ws| ws.read_file(name))
    }

    pub fn delete_file(&self, name: &str) -> CoreResult<()> {
        self.with_workspace(|ws| ws.delete_file(name))
    }

    /// Installs a diagnostic-line handler for as long as the subscription lives.
    pub fn subscribe<F>(&self, handler: F) -> LogSubscription
    where
        F: Fn(&DiagnosticLine) + Send + Sync + 'static,
    {
        self.bus.subscribe(Arc::new(handler))
    }

    pub fn subscriber_count(&self) -> usize {
        self.bus.subscriber_count()
    }

    /// Runs ffmpeg with `args` inside the workspace.
    ///
    /// A non-zero exit becomes `CommandExecution` carrying every diagnostic
    /// line of the run.
    pub fn exec(&self, args: &[String]) -> CoreResult<()> {
        self.run(args, false)
    }

    /// Like `exec`, for commands whose non-zero exit is part of normal use
    /// (the info command). Their fatal and error lines are forwarded to the
    /// `log` facade at debug level instead of error.
    pub fn exec_expecting_failure(&self, args: &[String]) -> CoreResult<()> {
        self.run(args, true)
    }

    fn run(&self, args: &[String], failure_expected: bool) -> CoreResult<()> {
        let working_dir = self.working_dir()?;
        log::debug!("Running ffmpeg {}", args.join(" "));

        let mut process = self.spawner.spawn(args, &working_dir)?;
        let mut diagnostics = String::new();

        let events = process.handle_events(|event| {
            if let Some(line) = DiagnosticLine::from_event(&event) {
                let level = line.level.forwarded_level(failure_expected);
                log::log!(target: "ffmpeg_log", level, "{}", line.text);
                diagnostics.push_str(&line.text);
                diagnostics.push('\n');
                self.bus.publish(&line);
            }
            Ok(())
        });
        // Always reap the child, even if event handling failed.
        let status = process.wait();
        events?;
        let status = status?;

        if !status.success() {
            log::debug!("ffmpeg exited with {}", status);
            return Err(command_failed_error(args.join(" "), status, diagnostics));
        }
        Ok(())
    }

    fn set_state(&self, state: EngineState) {
        lock(&self.inner).state = state;
    }

    fn with_workspace<T>(&self, f: impl FnOnce(&mut Workspace) -> CoreResult<T>) -> CoreResult<T> {
        let mut inner = lock(&self.inner);
        if inner.state != EngineState::Ready {
            return Err(CoreError::EngineNotLoaded);
        }
        match inner.workspace.as_mut() {
            Some(ws) => f(ws),
            None => Err(CoreError::EngineNotLoaded),
        }
    }
}

/// A mounted input, owned by the operation that created it.
///
/// Releasing (explicitly or on drop) unmounts and deletes the directory.
/// Cleanup failures are logged and never propagated.
pub struct MountedInput<'e, S: FfmpegSpawner> {
    engine: &'e Engine<S>,
    dir: String,
    input_path: String,
    released: bool,
}

impl<S: FfmpegSpawner> MountedInput<'_, S> {
    /// Path to pass after `-i`.
    pub fn input_path(&self) -> &str {
        &self.input_path
    }

    pub fn dir(&self) -> &str {
        &self.dir
    }

    /// Unmounts and deletes the directory now.
    pub fn release(mut self) {
        self.cleanup();
    }

    fn cleanup(&mut self) {
        if self.released {
            return;
        }
        self.released = true;

        let result = self
            .engine
            .unmount(&self.dir)
            .and_then(|()| self.engine.delete_dir(&self.dir));
        match result {
            Ok(()) => log::debug!("Unmounted and removed {}", self.dir),
            Err(e) => log::error!("Cleanup error for {}: {}", self.dir, e),
        }
    }
}

impl<S: FfmpegSpawner> Drop for MountedInput<'_, S> {
    fn drop(&mut self) {
        self.cleanup();
    }
}
