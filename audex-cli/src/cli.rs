// audex-cli/src/cli.rs
//
// Defines the command-line argument structures using clap.

use audex_core::{EngineConfig, EngineConfigBuilder, OutputFormat};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

// --- CLI Argument Definition ---

#[derive(Parser, Debug)]
#[command(
    author,
    version, // Reads from Cargo.toml via "cargo" feature in clap
    about = "Audex: Audio track extractor",
    long_about = "Lists the audio tracks of a media file and exports selected tracks as standalone audio files using ffmpeg via audex-core."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub engine: EngineArgs,

    /// Enable debug output, including every ffmpeg diagnostic line
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Lists the audio tracks and duration of a media file
    Probe(ProbeArgs),
    /// Extracts audio tracks from a media file into a directory
    Extract(ExtractArgs),
}

/// Options controlling how the ffmpeg engine is loaded.
#[derive(Args, Debug, Clone)]
pub struct EngineArgs {
    /// Path to the ffmpeg binary (defaults to the one on PATH or next to the executable)
    #[arg(long = "ffmpeg", global = true, value_name = "FFMPEG_PATH", env = "AUDEX_FFMPEG")]
    pub ffmpeg_path: Option<PathBuf>,

    /// Download a static ffmpeg build if none is installed
    #[arg(long, global = true, default_value_t = false)]
    pub auto_download: bool,

    /// Directory under which the engine creates its working directory
    #[arg(long, global = true, value_name = "DIR")]
    pub work_dir: Option<PathBuf>,
}

impl EngineArgs {
    pub fn to_config(&self) -> EngineConfig {
        let mut builder = EngineConfigBuilder::new().auto_download(self.auto_download);
        if let Some(path) = &self.ffmpeg_path {
            builder = builder.ffmpeg_path(path.clone());
        }
        if let Some(dir) = &self.work_dir {
            builder = builder.work_dir(dir.clone());
        }
        builder.build()
    }
}

#[derive(Parser, Debug)]
pub struct ProbeArgs {
    /// Media file to inspect
    #[arg(short = 'i', long = "input", required = true, value_name = "INPUT_FILE")]
    pub input_path: PathBuf,

    /// Print the result as JSON instead of a table
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Parser, Debug)]
pub struct ExtractArgs {
    /// Media file to extract audio from
    #[arg(short = 'i', long = "input", required = true, value_name = "INPUT_FILE")]
    pub input_path: PathBuf,

    /// Directory where extracted tracks will be saved
    #[arg(short = 'o', long = "output", required = true, value_name = "OUTPUT_DIR")]
    pub output_dir: PathBuf,

    /// Output format: mp3, aac or wav
    #[arg(short, long, default_value = "mp3", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Comma-separated global stream indices to extract (e.g., 1,3). Defaults to every audio track.
    #[arg(long, value_delimiter = ',', value_name = "INDICES")]
    pub tracks: Option<Vec<u32>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_extract_args() {
        let cli = Cli::parse_from([
            "audex", "extract", "-i", "movie.mkv", "-o", "out", "--format", "WAV", "--tracks",
            "1,3",
        ]);
        match cli.command {
            Commands::Extract(args) => {
                assert_eq!(args.format, OutputFormat::Wav);
                assert_eq!(args.tracks, Some(vec![1, 3]));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_engine_args_to_config() {
        let cli = Cli::parse_from([
            "audex", "probe", "-i", "movie.mkv", "--ffmpeg", "/opt/ffmpeg", "--work-dir", "/tmp/w",
        ]);
        let config = cli.engine.to_config();
        assert_eq!(config.ffmpeg_path, Some(PathBuf::from("/opt/ffmpeg")));
        assert_eq!(config.work_dir, Some(PathBuf::from("/tmp/w")));
        assert!(!config.auto_download);
    }
}
