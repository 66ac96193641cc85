//! Core library for extracting audio tracks from media files with ffmpeg.
//!
//! This crate drives a single resident ffmpeg engine: it probes a file for
//! audio streams by parsing ffmpeg's diagnostic output, extracts selected
//! streams in one multi-output transcode, and exposes an observable session
//! view-model that front ends bind to.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use audex_core::{Engine, EngineConfigBuilder, OutputFormat, Session};
//! use std::path::Path;
//!
//! let config = EngineConfigBuilder::new().auto_download(true).build();
//! let session = Session::new(Engine::shared(config));
//! session.initialize().unwrap();
//!
//! session.select_file(Path::new("/path/to/movie.mkv")).unwrap();
//! session.set_output_format(OutputFormat::Wav);
//! session.run_extraction().unwrap();
//!
//! for i in 0..session.artifacts().len() {
//!     session.save_artifact(i, Path::new("/path/to/output")).unwrap();
//! }
//! session.release_artifacts();
//! ```

pub mod artifacts;
pub mod config;
pub mod diagnostics;
pub mod engine;
pub mod error;
pub mod extraction;
pub mod messages;
pub mod mocks;
pub mod probe;
pub mod session;
pub mod utils;

// Re-exports for public API
pub use artifacts::{ArtifactHandle, ArtifactStore, ExtractedArtifact};
pub use config::{EngineConfig, EngineConfigBuilder};
pub use diagnostics::{AudioTrackInfo, parse_audio_streams, parse_duration};
pub use engine::{
    DiagnosticLine, Engine, EngineState, FfmpegProcess, FfmpegSpawner, LogLevel, LogSubscription,
    SidecarSpawner,
};
pub use error::{CoreError, CoreResult};
pub use extraction::{ExtractedOutput, OutputFormat, ProgressCallback, extract};
pub use messages::{EnglishCatalog, MessageCatalog, MessageId};
pub use probe::{ProbeResult, probe};
pub use session::{
    ExtractionStatus, LoadStatus, ProbeStatus, SelectableTrack, Session, SessionState,
};
pub use utils::{format_bytes, format_duration, parse_ffmpeg_time};
