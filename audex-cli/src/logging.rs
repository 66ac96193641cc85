// ============================================================================
// audex-cli/src/logging.rs
// ============================================================================
//
// LOGGING SETUP: env_logger Backend for the `log` Facade
//
// The core library only uses `log` macros; this module installs the
// backend. Info lines are printed bare so they read as normal CLI output,
// other levels get a colored level tag.
//
// USAGE:
// - default: info
// - --verbose: debug (includes every ffmpeg line, target `ffmpeg_log`)
// - RUST_LOG overrides both, e.g. RUST_LOG=audex_core=trace

use console::style;
use env_logger::Env;
use log::Level;
use std::io::Write;

/// Initializes the global logger. Safe to call once per process.
pub fn init(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };

    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter))
        .format(|buf, record| match record.level() {
            Level::Info => writeln!(buf, "{}", record.args()),
            level => writeln!(buf, "{} {}", level_tag(level), record.args()),
        })
        .init();

    log::debug!("Logger initialized (default filter: {})", default_filter);
}

fn level_tag(level: Level) -> String {
    match level {
        Level::Error => style("ERROR").red().bold().to_string(),
        Level::Warn => style("WARN ").yellow().to_string(),
        Level::Info => style("INFO ").green().to_string(),
        Level::Debug => style("DEBUG").blue().to_string(),
        Level::Trace => style("TRACE").magenta().to_string(),
    }
}
