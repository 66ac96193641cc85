//! Utility functions for time and size formatting.
//!
//! Shared by the diagnostic parser (clock strings to seconds) and by
//! consumers that render durations and artifact sizes.

/// Parses an ffmpeg clock string (`HH:MM:SS.ff`) into seconds. Returns None if malformed.
#[must_use]
pub fn parse_ffmpeg_time(time: &str) -> Option<f64> {
    let mut parts = time.split(':');
    let hours = parts.next()?.parse::<f64>().ok()?;
    let minutes = parts.next()?.parse::<f64>().ok()?;
    let seconds = parts.next()?.parse::<f64>().ok()?;
    if parts.next().is_some() || hours < 0.0 || minutes < 0.0 || seconds < 0.0 {
        return None;
    }
    Some(hours * 3600.0 + minutes * 60.0 + seconds)
}

/// Formats seconds as HH:MM:SS (e.g., 582.57 -> "00:09:42"). Returns "??:??:??" for invalid inputs.
#[must_use]
pub fn format_duration(seconds: f64) -> String {
    if seconds < 0.0 || !seconds.is_finite() {
        return "??:??:??".to_string();
    }

    let total_seconds = seconds as u64;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;
    format!("{hours:02}:{minutes:02}:{secs:02}")
}

/// Formats bytes with binary units (B, KiB, MiB, GiB).
#[must_use]
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 3] = ["KiB", "MiB", "GiB"];

    let mut value = bytes as f64;
    let mut unit = None;
    for candidate in UNITS {
        if value < 1024.0 {
            break;
        }
        value /= 1024.0;
        unit = Some(candidate);
    }

    match unit {
        Some(unit) => format!("{value:.2} {unit}"),
        None => format!("{bytes} B"),
    }
}

/// Converts a 0..=1 ratio into a rounded whole percentage.
#[must_use]
pub fn ratio_to_percent(ratio: f64) -> u8 {
    if !ratio.is_finite() {
        return 0;
    }
    (ratio.clamp(0.0, 1.0) * 100.0).round() as u8
}
