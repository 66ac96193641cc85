// ============================================================================
// audex-core/src/diagnostics.rs
// ============================================================================
//
// DIAGNOSTIC PARSER: Facts Scraped from ffmpeg's Free-Text Output
//
// ffmpeg prints container metadata (duration, stream table) while running
// an info invocation that fails on purpose, and prints `time=` progress
// tokens while transcoding. The functions here turn that text into
// structured values. They are pure and never fail: absent facts become
// 0, None or an empty list.
//
// Everything that knows the shape of ffmpeg's text lives in this module so
// it can be swapped for a structured metadata query without touching the
// probe and extraction operations.

use crate::utils::parse_ffmpeg_time;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Language reported when a stream carries no language tag.
pub const UNDETERMINED_LANGUAGE: &str = "und";

static DURATION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Duration: (\d{2,}:\d{2}:\d{2}\.\d+)").expect("valid duration regex")
});

// Stream marker, global index, any annotation (`[0x1100]`, `(jpn)`, both or
// none), then the Audio kind and its detail string.
static AUDIO_STREAM_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Stream #0:(\d+)([^:\r\n]*): Audio: ([^\r\n]*)").expect("valid stream regex")
});

static LANGUAGE_TAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\(([^)]*)\)").expect("valid language regex"));

static AUDIO_INDEX_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Stream #0:(\d+)[^\r\n]*?: Audio:").expect("valid audio index regex")
});

static PROGRESS_TIME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"time=(\d{2,}:\d{2}:\d{2}\.\d+)").expect("valid progress regex")
});

/// One audio stream found in a probe's diagnostic output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioTrackInfo {
    /// 0-based ordinal among the audio streams, in first-seen order.
    pub local_index: usize,
    /// Container-global stream number, used for `-map 0:<n>`.
    pub global_stream_index: u32,
    /// Language tag, or "und" when the stream has none.
    pub language: String,
    /// Short codec name (e.g. `aac`, `mp3`, `pcm_s16le`).
    pub codec: String,
    /// Raw detail string following `Audio:`.
    pub description: String,
}

/// Extracts the container duration in seconds. Returns 0 when absent.
pub fn parse_duration(text: &str) -> f64 {
    DURATION_RE
        .captures(text)
        .and_then(|caps| parse_ffmpeg_time(&caps[1]))
        .unwrap_or(0.0)
}

/// Extracts every audio stream declaration, in the order they appear.
pub fn parse_audio_streams(text: &str) -> Vec<AudioTrackInfo> {
    AUDIO_STREAM_RE
        .captures_iter(text)
        .filter_map(|caps| {
            let global_stream_index = caps[1].parse::<u32>().ok()?;
            let language = LANGUAGE_TAG_RE
                .captures(&caps[2])
                .map(|tag| tag[1].trim().to_string())
                .filter(|tag| !tag.is_empty())
                .unwrap_or_else(|| UNDETERMINED_LANGUAGE.to_string());
            let description = caps[3].trim_end().to_string();
            let codec = description
                .split_whitespace()
                .next()
                .unwrap_or_default()
                .trim_end_matches(',')
                .to_string();
            Some((global_stream_index, language, codec, description))
        })
        .enumerate()
        .map(
            |(local_index, (global_stream_index, language, codec, description))| AudioTrackInfo {
                local_index,
                global_stream_index,
                language,
                codec,
                description,
            },
        )
        .collect()
}

/// Global indices of every audio stream. Looser than `parse_audio_streams`;
/// only the stream marker and the Audio kind have to be present.
pub fn audio_stream_indices(text: &str) -> Vec<u32> {
    AUDIO_INDEX_RE
        .captures_iter(text)
        .filter_map(|caps| caps[1].parse::<u32>().ok())
        .collect()
}

/// Extracts the `time=` token of a single progress line, in seconds.
pub fn parse_progress_time(line: &str) -> Option<f64> {
    PROGRESS_TIME_RE
        .captures(line)
        .and_then(|caps| parse_ffmpeg_time(&caps[1]))
}
