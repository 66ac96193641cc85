// ============================================================================
// audex-core/src/extraction.rs
// ============================================================================
//
// EXTRACTION OPERATION: One Multi-Output Transcode per Run
//
// Every requested stream is mapped to its own output inside a single ffmpeg
// invocation, so the input is decoded once. Progress is sampled from the
// `time=` tokens ffmpeg prints. Once the command finishes, successfully or
// not, a cleanup phase reads back and deletes every expected output and
// unmounts the input; only after that is a transcode failure returned.

use crate::diagnostics::{audio_stream_indices, parse_progress_time};
use crate::engine::{DiagnosticLine, Engine, FfmpegSpawner, lock};
use crate::error::{CoreError, CoreResult};
use crate::probe::{collect_info_output, mount_input};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Mutex;

/// Target audio format. Each one carries a fixed codec and quality policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// libmp3lame, VBR quality 2.
    #[default]
    Mp3,
    /// ffmpeg's native AAC encoder.
    Aac,
    /// Uncompressed 16-bit PCM.
    Wav,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 3] = [OutputFormat::Mp3, OutputFormat::Aac, OutputFormat::Wav];

    /// Codec arguments appended after each output's `-map`.
    pub fn codec_args(self) -> &'static [&'static str] {
        match self {
            OutputFormat::Mp3 => &["-acodec", "libmp3lame", "-q:a", "2"],
            OutputFormat::Aac => &["-acodec", "aac"],
            OutputFormat::Wav => &["-acodec", "pcm_s16le"],
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Mp3 => "mp3",
            OutputFormat::Aac => "aac",
            OutputFormat::Wav => "wav",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            OutputFormat::Mp3 => "audio/mpeg",
            OutputFormat::Aac => "audio/aac",
            OutputFormat::Wav => "audio/wav",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OutputFormat::ALL
            .into_iter()
            .find(|format| format.extension().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| CoreError::InvalidFormat(s.to_string()))
    }
}

/// One output file of an extraction run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedOutput {
    pub file_name: String,
    pub data: Vec<u8>,
    /// Global stream index the output was mapped from.
    pub stream_index: u32,
}

/// Receives the completed ratio (0..=1) while a transcode runs.
pub type ProgressCallback = Box<dyn Fn(f64) + Send + Sync>;

/// An output the command is expected to write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedOutput {
    pub name: String,
    pub stream_index: u32,
}

/// Deterministic output names; the ordinal keeps repeated indices apart.
pub fn plan_outputs(stream_indices: &[u32], format: OutputFormat) -> Vec<PlannedOutput> {
    stream_indices
        .iter()
        .enumerate()
        .map(|(ordinal, &stream_index)| PlannedOutput {
            name: format!("track_{stream_index}_{ordinal}.{}", format.extension()),
            stream_index,
        })
        .collect()
}

/// Builds the single multi-output command.
pub fn build_extract_args(
    input_path: &str,
    outputs: &[PlannedOutput],
    format: OutputFormat,
) -> Vec<String> {
    let mut args: Vec<String> = vec!["-y".into(), "-i".into(), input_path.into()];
    for output in outputs {
        args.push("-map".into());
        args.push(format!("0:{}", output.stream_index));
        args.extend(format.codec_args().iter().map(|arg| arg.to_string()));
        args.push(output.name.clone());
    }
    args
}

/// Extracts `stream_indices` from `file` as `format`.
///
/// An empty `stream_indices` re-probes the mounted file and takes every
/// audio stream; `NoTracksFound` if there are none. Outputs that cannot be
/// read back are skipped with a warning.
pub fn extract<S: FfmpegSpawner>(
    engine: &Engine<S>,
    file: &Path,
    format: OutputFormat,
    stream_indices: &[u32],
    total_duration: f64,
    on_progress: Option<ProgressCallback>,
) -> CoreResult<Vec<ExtractedOutput>> {
    engine.ensure_ready()?;

    let mount = mount_input(engine, &engine.config().extract_dir, file)?;

    let indices = if stream_indices.is_empty() {
        log::info!("No streams requested, scanning {} for audio", file.display());
        audio_stream_indices(&collect_info_output(engine, mount.input_path())?)
    } else {
        stream_indices.to_vec()
    };
    if indices.is_empty() {
        mount.release();
        return Err(CoreError::NoTracksFound);
    }

    let outputs = plan_outputs(&indices, format);
    let args = build_extract_args(mount.input_path(), &outputs, format);
    log::info!(
        "Extracting {} track(s) from {} as {}",
        outputs.len(),
        file.display(),
        format
    );

    let progress_subscription = on_progress
        .filter(|_| total_duration > 0.0)
        .map(|callback| engine.subscribe(progress_reporter(callback, total_duration)));

    let transcode = engine.exec(&args);
    drop(progress_subscription);

    // Cleanup runs whatever the transcode did.
    let mut results = Vec::with_capacity(outputs.len());
    for output in &outputs {
        match engine.read_file(&output.name) {
            Ok(data) => {
                if let Err(e) = engine.delete_file(&output.name) {
                    log::warn!("Could not delete output {}: {}", output.name, e);
                }
                results.push(ExtractedOutput {
                    file_name: output.name.clone(),
                    data,
                    stream_index: output.stream_index,
                });
            }
            Err(e) => log::warn!("{}", e),
        }
    }
    mount.release();

    transcode?;
    log::info!("Extracted {} of {} track(s)", results.len(), outputs.len());
    Ok(results)
}

/// Log handler turning `time=` tokens into a non-decreasing, clamped ratio.
fn progress_reporter(
    callback: ProgressCallback,
    total_duration: f64,
) -> impl Fn(&DiagnosticLine) + Send + Sync + 'static {
    let reported = Mutex::new(0.0_f64);
    move |line: &DiagnosticLine| {
        let Some(current) = parse_progress_time(&line.text) else {
            return;
        };
        let ratio = (current / total_duration).clamp(0.0, 1.0);
        let ratio = {
            let mut reported = lock(&reported);
            *reported = reported.max(ratio);
            *reported
        };
        callback(ratio);
    }
}
