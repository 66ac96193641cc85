// ============================================================================
// audex-core/src/engine/log_bus.rs
// ============================================================================
//
// DIAGNOSTIC STREAM: Typed Publish/Subscribe for ffmpeg Log Lines
//
// Every line ffmpeg emits while a command runs is published here. Each
// operation installs its own handler and gets back a `LogSubscription`;
// dropping the subscription removes the handler, so a collector installed
// by one operation can never observe lines from a later one.

use crate::engine::lock;
use ffmpeg_sidecar::event::{FfmpegEvent, LogLevel as FfmpegLogLevel};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

/// Severity attached to each diagnostic line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warning,
    Error,
    Fatal,
    Unknown,
}

impl LogLevel {
    /// Level used when forwarding the line to the `log` facade.
    pub fn as_log_level(self) -> log::Level {
        match self {
            LogLevel::Fatal | LogLevel::Error => log::Level::Error,
            LogLevel::Warning => log::Level::Warn,
            LogLevel::Info => log::Level::Debug,
            LogLevel::Unknown => log::Level::Trace,
        }
    }

    /// Level for the `ffmpeg_log` target. When the command is expected to
    /// fail, nothing is forwarded above debug.
    pub fn forwarded_level(self, failure_expected: bool) -> log::Level {
        let level = self.as_log_level();
        if failure_expected {
            level.max(log::Level::Debug)
        } else {
            level
        }
    }
}

impl From<&FfmpegLogLevel> for LogLevel {
    fn from(level: &FfmpegLogLevel) -> Self {
        match level {
            FfmpegLogLevel::Info => LogLevel::Info,
            FfmpegLogLevel::Warning => LogLevel::Warning,
            FfmpegLogLevel::Error => LogLevel::Error,
            FfmpegLogLevel::Fatal => LogLevel::Fatal,
            _ => LogLevel::Unknown,
        }
    }
}

/// One line of ffmpeg diagnostic output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticLine {
    pub text: String,
    pub level: LogLevel,
}

impl DiagnosticLine {
    pub fn new(text: impl Into<String>, level: LogLevel) -> Self {
        Self {
            text: text.into(),
            level,
        }
    }

    /// Recovers the raw text line behind an ffmpeg-sidecar event.
    ///
    /// The sidecar parses some stderr lines (duration, stream table,
    /// progress) into structured events; their raw text is kept so the
    /// diagnostic parser always sees the full stream.
    pub fn from_event(event: &FfmpegEvent) -> Option<Self> {
        match event {
            FfmpegEvent::Log(level, message) => Some(Self::new(message.as_str(), level.into())),
            FfmpegEvent::Error(message) => Some(Self::new(message.as_str(), LogLevel::Error)),
            FfmpegEvent::ParsedVersion(version) => {
                Some(Self::new(version.raw_log_message.as_str(), LogLevel::Info))
            }
            FfmpegEvent::ParsedConfiguration(configuration) => {
                Some(Self::new(configuration.raw_log_message.as_str(), LogLevel::Info))
            }
            FfmpegEvent::ParsedInput(input) => {
                Some(Self::new(input.raw_log_message.as_str(), LogLevel::Info))
            }
            FfmpegEvent::ParsedOutput(output) => {
                Some(Self::new(output.raw_log_message.as_str(), LogLevel::Info))
            }
            FfmpegEvent::ParsedDuration(duration) => {
                Some(Self::new(duration.raw_log_message.as_str(), LogLevel::Info))
            }
            FfmpegEvent::ParsedInputStream(stream) | FfmpegEvent::ParsedOutputStream(stream) => {
                Some(Self::new(stream.raw_log_message.as_str(), LogLevel::Info))
            }
            FfmpegEvent::ParsedStreamMapping(mapping) => {
                Some(Self::new(mapping.as_str(), LogLevel::Info))
            }
            FfmpegEvent::Progress(progress) => {
                Some(Self::new(progress.raw_log_message.as_str(), LogLevel::Info))
            }
            _ => None,
        }
    }
}

/// Handler invoked for every published line.
pub type LogHandler = Arc<dyn Fn(&DiagnosticLine) + Send + Sync>;

/// Fan-out of diagnostic lines to any number of subscribers.
#[derive(Default)]
pub struct LogBus {
    next_id: AtomicU64,
    subscribers: Mutex<Vec<(u64, LogHandler)>>,
}

impl LogBus {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Installs a handler. It stays installed until the returned subscription is dropped.
    pub fn subscribe(self: &Arc<Self>, handler: LogHandler) -> LogSubscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        lock(&self.subscribers).push((id, handler));
        LogSubscription {
            bus: Arc::downgrade(self),
            id,
        }
    }

    /// Delivers a line to every current subscriber.
    pub fn publish(&self, line: &DiagnosticLine) {
        // Handlers run outside the lock so they may subscribe or unsubscribe.
        let handlers: Vec<LogHandler> = lock(&self.subscribers)
            .iter()
            .map(|(_, handler)| Arc::clone(handler))
            .collect();
        for handler in handlers {
            handler(line);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        lock(&self.subscribers).len()
    }

    fn unsubscribe(&self, id: u64) {
        lock(&self.subscribers).retain(|(sub_id, _)| *sub_id != id);
    }
}

/// Scoped handle for an installed handler. Dropping it unsubscribes.
#[must_use = "dropping a LogSubscription immediately removes its handler"]
pub struct LogSubscription {
    bus: Weak<LogBus>,
    id: u64,
}

impl LogSubscription {
    /// Removes the handler now.
    pub fn unsubscribe(self) {}
}

impl Drop for LogSubscription {
    fn drop(&mut self) {
        if let Some(bus) = self.bus.upgrade() {
            bus.unsubscribe(self.id);
        }
    }
}
