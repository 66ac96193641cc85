// ============================================================================
// audex-core/src/session.rs
// ============================================================================
//
// SESSION STATE: Observable View-Model Driving Probe and Extraction
//
// Holds everything a front end displays: load/probe/extraction status, the
// status message, the accumulated ffmpeg log, the probed track list with
// its selection, the output format, progress and the extracted artifacts.
// Every mutation goes through `SessionStore::update`, which hands a fresh
// snapshot to the registered observer once the state lock is released.
//
// Operation failures are recorded as a single user-visible error string and
// also returned to the caller. In-flight statuses are always cleared before
// an operation returns.

use crate::artifacts::{ArtifactStore, ExtractedArtifact};
use crate::diagnostics::AudioTrackInfo;
use crate::engine::{DiagnosticLine, Engine, FfmpegSpawner, LogHandler, LogSubscription, lock};
use crate::error::{CoreError, CoreResult};
use crate::extraction::{ExtractedOutput, OutputFormat, ProgressCallback, extract};
use crate::messages::{EnglishCatalog, MessageCatalog, MessageId};
use crate::probe::probe;
use crate::utils::ratio_to_percent;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadStatus {
    #[default]
    Uninitialized,
    Loading,
    Ready,
    /// Terminal: the engine failed to load and is not retried.
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeStatus {
    #[default]
    Idle,
    Probing,
    Probed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionStatus {
    #[default]
    Idle,
    Extracting,
    Done,
    Failed,
}

/// A probed track plus the user's selection flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectableTrack {
    #[serde(flatten)]
    pub info: AudioTrackInfo,
    pub selected: bool,
}

/// Snapshot of everything a front end renders.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SessionState {
    pub load_status: LoadStatus,
    pub probe_status: ProbeStatus,
    pub extraction_status: ExtractionStatus,
    pub message: String,
    pub logs: Vec<String>,
    pub selected_file: Option<PathBuf>,
    pub tracks: Vec<SelectableTrack>,
    pub output_format: OutputFormat,
    /// Seconds; 0 when unknown.
    pub duration: f64,
    /// 0..=100.
    pub progress: u8,
    pub error: Option<String>,
    pub artifacts: Vec<ExtractedArtifact>,
}

impl SessionState {
    pub fn is_loaded(&self) -> bool {
        self.load_status == LoadStatus::Ready
    }

    pub fn is_probing(&self) -> bool {
        self.probe_status == ProbeStatus::Probing
    }

    pub fn is_processing(&self) -> bool {
        self.extraction_status == ExtractionStatus::Extracting
    }

    /// Global stream indices of the selected tracks, in track order.
    pub fn selected_indices(&self) -> Vec<u32> {
        self.tracks
            .iter()
            .filter(|t| t.selected)
            .map(|t| t.info.global_stream_index)
            .collect()
    }
}

pub type StateObserver = Arc<dyn Fn(&SessionState) + Send + Sync>;

struct StoreInner {
    state: Mutex<SessionState>,
    observer: Mutex<Option<StateObserver>>,
    log_limit: usize,
}

/// Shared, observable holder of a `SessionState`.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<StoreInner>,
}

impl SessionStore {
    pub fn new(initial: SessionState, log_limit: usize) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                state: Mutex::new(initial),
                observer: Mutex::new(None),
                log_limit: log_limit.max(1),
            }),
        }
    }

    pub fn set_observer(&self, observer: Option<StateObserver>) {
        *lock(&self.inner.observer) = observer;
    }

    pub fn snapshot(&self) -> SessionState {
        lock(&self.inner.state).clone()
    }

    /// Applies `f` and notifies the observer with the resulting state.
    pub fn update<R>(&self, f: impl FnOnce(&mut SessionState) -> R) -> R {
        let (result, snapshot) = {
            let mut state = lock(&self.inner.state);
            let result = f(&mut state);
            (result, state.clone())
        };
        self.notify(&snapshot);
        result
    }

    /// Appends a log line, dropping the oldest past the history limit.
    pub fn push_log(&self, line: String) {
        let limit = self.inner.log_limit;
        self.update(|state| {
            state.logs.push(line);
            if state.logs.len() > limit {
                let excess = state.logs.len() - limit;
                state.logs.drain(..excess);
            }
        });
    }

    /// Sets the progress percentage; observers are only told about changes.
    pub fn set_progress(&self, percent: u8) {
        let snapshot = {
            let mut state = lock(&self.inner.state);
            if state.progress == percent {
                return;
            }
            state.progress = percent;
            state.clone()
        };
        self.notify(&snapshot);
    }

    fn notify(&self, snapshot: &SessionState) {
        let observer = lock(&self.inner.observer).clone();
        if let Some(observer) = observer {
            observer(snapshot);
        }
    }
}

/// View-model coordinating one user's probe/select/extract workflow.
pub struct Session<S: FfmpegSpawner> {
    engine: Arc<Engine<S>>,
    store: SessionStore,
    artifacts: Arc<ArtifactStore>,
    catalog: Arc<dyn MessageCatalog>,
    /// Routes engine lines into the log; removed when the session is dropped.
    log_subscription: Mutex<Option<LogSubscription>>,
}

impl<S: FfmpegSpawner> Session<S> {
    pub fn new(engine: Arc<Engine<S>>) -> Self {
        Self::with_catalog(engine, Arc::new(EnglishCatalog))
    }

    pub fn with_catalog(engine: Arc<Engine<S>>, catalog: Arc<dyn MessageCatalog>) -> Self {
        let initial = SessionState {
            message: catalog.lookup(MessageId::LoadingEngine, &[]),
            output_format: engine.config().default_format,
            ..Default::default()
        };
        let store = SessionStore::new(initial, engine.config().log_history_limit);
        Self {
            engine,
            store,
            artifacts: Arc::new(ArtifactStore::new()),
            catalog,
            log_subscription: Mutex::new(None),
        }
    }

    /// Registers the state observer, replacing any previous one.
    pub fn on_change<F>(&self, observer: F)
    where
        F: Fn(&SessionState) + Send + Sync + 'static,
    {
        self.store.set_observer(Some(Arc::new(observer)));
    }

    pub fn state(&self) -> SessionState {
        self.store.snapshot()
    }

    pub fn engine(&self) -> &Arc<Engine<S>> {
        &self.engine
    }

    pub fn artifact_store(&self) -> &Arc<ArtifactStore> {
        &self.artifacts
    }

    pub fn artifacts(&self) -> Vec<ExtractedArtifact> {
        self.store.snapshot().artifacts
    }

    /// Loads the engine and routes its diagnostic lines into the log.
    ///
    /// A failed load is permanent for this session.
    pub fn initialize(&self) -> CoreResult<()> {
        let current = self.store.snapshot();
        match current.load_status {
            LoadStatus::Ready => return Ok(()),
            LoadStatus::Failed => {
                return Err(CoreError::EngineLoad(
                    current.error.unwrap_or_else(|| "engine failed to load".to_string()),
                ));
            }
            LoadStatus::Uninitialized | LoadStatus::Loading => {}
        }

        self.store.update(|state| {
            state.load_status = LoadStatus::Loading;
            state.message = self.message(MessageId::LoadingEngine, &[]);
        });

        let store = self.store.clone();
        let on_log: LogHandler =
            Arc::new(move |line: &DiagnosticLine| store.push_log(line.text.clone()));

        match self.engine.initialize(Some(on_log)) {
            Ok(subscription) => {
                *lock(&self.log_subscription) = subscription;
                self.store.update(|state| {
                    state.load_status = LoadStatus::Ready;
                    state.message = self.message(MessageId::Ready, &[]);
                });
                Ok(())
            }
            Err(e) => {
                log::error!("Engine load failed: {}", e);
                self.store.update(|state| {
                    state.load_status = LoadStatus::Failed;
                    state.error = Some(self.message(MessageId::EngineLoadFailed, &[]));
                });
                Err(e)
            }
        }
    }

    /// Resets all per-file state and probes `file`.
    ///
    /// A file without audio is not an error: the track list stays empty and
    /// an informational error message is shown. After a failed load the
    /// state is left untouched and the load error is returned.
    pub fn select_file(&self, file: &Path) -> CoreResult<()> {
        let current = self.store.snapshot();
        if current.load_status == LoadStatus::Failed {
            return Err(CoreError::EngineLoad(
                current.error.unwrap_or_else(|| "engine failed to load".to_string()),
            ));
        }

        self.release_artifacts();
        self.store.update(|state| {
            state.selected_file = Some(file.to_path_buf());
            state.tracks.clear();
            state.error = None;
            state.duration = 0.0;
            state.progress = 0;
            state.probe_status = ProbeStatus::Probing;
            state.extraction_status = ExtractionStatus::Idle;
            state.message = self.message(
                MessageId::Analyzing,
                &[("file", file.display().to_string())],
            );
        });

        match probe(&self.engine, file) {
            Ok(result) => {
                self.store.update(|state| {
                    state.tracks = result
                        .tracks
                        .into_iter()
                        .map(|info| SelectableTrack { info, selected: true })
                        .collect();
                    state.duration = result.duration;
                    state.probe_status = ProbeStatus::Probed;
                    if state.tracks.is_empty() {
                        state.error = Some(self.message(MessageId::NoAudioTracks, &[]));
                    } else {
                        state.message = self.message(
                            MessageId::Analyzed,
                            &[("count", state.tracks.len().to_string())],
                        );
                    }
                });
                Ok(())
            }
            Err(e) => {
                self.store.update(|state| {
                    state.probe_status = ProbeStatus::Idle;
                    state.error =
                        Some(self.message(MessageId::AnalyzeFailed, &[("error", e.to_string())]));
                });
                Err(e)
            }
        }
    }

    pub fn toggle_all(&self, select: bool) {
        self.store.update(|state| {
            for track in &mut state.tracks {
                track.selected = select;
            }
        });
    }

    /// Flips the selection of the track with the given local index.
    pub fn toggle_one(&self, local_index: usize) -> CoreResult<bool> {
        let toggled = self.store.update(|state| {
            let track = state
                .tracks
                .iter_mut()
                .find(|t| t.info.local_index == local_index)?;
            track.selected = !track.selected;
            Some(track.selected)
        });
        toggled.ok_or_else(|| CoreError::InvalidSelection(format!("no track with index {local_index}")))
    }

    pub fn set_output_format(&self, format: OutputFormat) {
        self.store.update(|state| state.output_format = format);
    }

    /// Extracts the selected tracks of the current file.
    ///
    /// Does nothing without a file. An empty selection records a
    /// validation error and never reaches the engine.
    pub fn run_extraction(&self) -> CoreResult<()> {
        let current = self.store.snapshot();
        let Some(file) = current.selected_file.clone() else {
            log::debug!("No file selected, nothing to extract");
            return Ok(());
        };

        let indices = current.selected_indices();
        if indices.is_empty() {
            let message = self.message(MessageId::SelectAtLeastOneTrack, &[]);
            self.store.update(|state| state.error = Some(message.clone()));
            return Err(CoreError::InvalidSelection(message));
        }

        self.release_artifacts();
        self.store.update(|state| {
            state.extraction_status = ExtractionStatus::Extracting;
            state.error = None;
            state.progress = 0;
            state.message =
                self.message(MessageId::Extracting, &[("count", indices.len().to_string())]);
        });

        let progress_store = self.store.clone();
        let on_progress: ProgressCallback =
            Box::new(move |ratio| progress_store.set_progress(ratio_to_percent(ratio)));

        let format = current.output_format;
        match extract(
            &self.engine,
            &file,
            format,
            &indices,
            current.duration,
            Some(on_progress),
        ) {
            Ok(outputs) => {
                let artifacts: Vec<ExtractedArtifact> = outputs
                    .into_iter()
                    .map(|output| self.wrap_output(output, format, &current.tracks))
                    .collect();
                self.store.update(|state| {
                    state.message = self.message(
                        MessageId::ExtractionComplete,
                        &[("count", artifacts.len().to_string())],
                    );
                    state.artifacts = artifacts;
                    state.extraction_status = ExtractionStatus::Done;
                    state.progress = 100;
                });
                Ok(())
            }
            Err(e) => {
                log::error!("Extraction failed: {}", e);
                self.store.update(|state| {
                    state.extraction_status = ExtractionStatus::Failed;
                    state.error =
                        Some(self.message(MessageId::ExtractionFailed, &[("error", e.to_string())]));
                });
                Err(e)
            }
        }
    }

    /// Revokes every artifact handle and clears the list. Idempotent.
    pub fn release_artifacts(&self) {
        let released = self.store.update(|state| std::mem::take(&mut state.artifacts));
        for artifact in &released {
            self.artifacts.revoke(&artifact.handle);
        }
        if !released.is_empty() {
            log::debug!("Released {} artifact(s)", released.len());
        }
    }

    /// Writes artifact `index` into `dir` under its display name.
    pub fn save_artifact(&self, index: usize, dir: &Path) -> CoreResult<PathBuf> {
        let artifact = self
            .artifacts()
            .into_iter()
            .nth(index)
            .ok_or_else(|| CoreError::InvalidSelection(format!("no artifact {index}")))?;
        let blob = self.artifacts.open(&artifact.handle).ok_or_else(|| {
            CoreError::InvalidSelection(format!("artifact {} was released", artifact.handle))
        })?;

        let path = dir.join(&artifact.display_name);
        fs::write(&path, &blob.data)?;
        log::info!("Saved {} ({} bytes)", path.display(), blob.data.len());
        Ok(path)
    }

    fn wrap_output(
        &self,
        output: ExtractedOutput,
        format: OutputFormat,
        tracks: &[SelectableTrack],
    ) -> ExtractedArtifact {
        let label = match tracks
            .iter()
            .find(|t| t.info.global_stream_index == output.stream_index)
        {
            Some(track) => self.message(
                MessageId::TrackLabel,
                &[
                    ("index", (track.info.local_index + 1).to_string()),
                    ("language", track.info.language.clone()),
                ],
            ),
            None => self.message(
                MessageId::TrackLabelFallback,
                &[("name", output.file_name.clone())],
            ),
        };
        let size = output.data.len();
        ExtractedArtifact {
            handle: self.artifacts.create(output.data, format.mime_type()),
            display_name: output.file_name,
            track_number: output.stream_index + 1,
            label,
            stream_index: output.stream_index,
            size,
            mime_type: format.mime_type().to_string(),
        }
    }

    fn message(&self, id: MessageId, args: &[(&str, String)]) -> String {
        self.catalog.lookup(id, args)
    }
}

impl<S: FfmpegSpawner> Drop for Session<S> {
    fn drop(&mut self) {
        self.release_artifacts();
    }
}
