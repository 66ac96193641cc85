//! Terminal output for the CLI.
//!
//! Keeps the section / status / success hierarchy: sections in cyan
//! capitals, status lines as padded key-value pairs, and an indicatif bar
//! while a transcode runs.

use audex_core::{ExtractedArtifact, SelectableTrack, format_bytes, format_duration};
use console::style;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use log::info;
use std::io::IsTerminal;
use std::time::Duration;

/// Check if color should be used (respects NO_COLOR environment variable)
fn should_use_color() -> bool {
    std::env::var_os("NO_COLOR").is_none()
}

/// Print a section header
pub fn print_section(title: &str) {
    info!("");
    if should_use_color() {
        info!("===== {} =====", style(title.to_uppercase()).cyan().bold());
    } else {
        info!("===== {} =====", title.to_uppercase());
    }
    info!("");
}

/// Print a status line (label padded to a fixed width)
pub fn print_status(label: &str, value: &str, highlight: bool) {
    let label_width: usize = 15;
    let padding = label_width.saturating_sub(label.len()).max(1);

    if should_use_color() && highlight {
        info!("  {}:{} {}", label, " ".repeat(padding), style(value).bold());
    } else {
        info!("  {}:{} {}", label, " ".repeat(padding), value);
    }
}

pub fn print_success(message: &str) {
    if should_use_color() {
        info!("  {} {}", style("✓").green().bold(), message);
    } else {
        info!("  ✓ {}", message);
    }
}

/// Print an informational notice that is not a failure.
pub fn print_notice(message: &str) {
    info!("  » {}", message);
}

/// One line per track: local ordinal, global index, language, codec, details.
pub fn print_track_table(tracks: &[SelectableTrack]) {
    for track in tracks {
        let info = &track.info;
        info!(
            "  {:>2}. stream #{:<3} [{}] {:<10} {}",
            info.local_index + 1,
            info.global_stream_index,
            info.language,
            info.codec,
            info.description
        );
    }
}

pub fn print_duration(seconds: f64) {
    let value = if seconds > 0.0 {
        format_duration(seconds)
    } else {
        "unknown".to_string()
    };
    print_status("Duration", &value, false);
}

pub fn print_artifact(artifact: &ExtractedArtifact, saved_as: &str) {
    info!(
        "  {} {} -> {} ({})",
        style("♪").cyan(),
        artifact.label,
        saved_as,
        format_bytes(artifact.size as u64)
    );
}

/// Progress bar over 0..=100 for a running extraction.
///
/// Hidden when stderr is not a terminal.
pub fn extraction_progress_bar() -> ProgressBar {
    let pb = ProgressBar::new(100);
    let style = ProgressStyle::default_bar()
        .template("  Extracting: {percent:>3}% [{bar:30}] ({elapsed})")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("##.");
    pb.set_style(style);

    if !std::io::stderr().is_terminal() {
        pb.set_draw_target(ProgressDrawTarget::hidden());
    }
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}
