// audex-core/src/messages.rs
//
// User-facing text. The session never formats display strings itself; it
// asks a `MessageCatalog` for a message id plus named parameters.

use std::fmt;

/// Identifies a user-facing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageId {
    LoadingEngine,
    Ready,
    EngineLoadFailed,
    Analyzing,
    Analyzed,
    NoAudioTracks,
    AnalyzeFailed,
    SelectAtLeastOneTrack,
    Extracting,
    ExtractionComplete,
    ExtractionFailed,
    /// Params: `index`, `language`.
    TrackLabel,
    /// Params: `name`.
    TrackLabelFallback,
}

impl MessageId {
    /// Stable key for external catalogs.
    pub fn key(self) -> &'static str {
        match self {
            MessageId::LoadingEngine => "status.loading_engine",
            MessageId::Ready => "status.ready",
            MessageId::EngineLoadFailed => "error.engine_load_failed",
            MessageId::Analyzing => "status.analyzing",
            MessageId::Analyzed => "status.analyzed",
            MessageId::NoAudioTracks => "error.no_audio_tracks",
            MessageId::AnalyzeFailed => "error.analyze_failed",
            MessageId::SelectAtLeastOneTrack => "error.select_at_least_one_track",
            MessageId::Extracting => "status.extracting",
            MessageId::ExtractionComplete => "status.extraction_complete",
            MessageId::ExtractionFailed => "error.extraction_failed",
            MessageId::TrackLabel => "label.track",
            MessageId::TrackLabelFallback => "label.track_fallback",
        }
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Looks up display text for a message id.
pub trait MessageCatalog: Send + Sync {
    fn lookup(&self, id: MessageId, args: &[(&str, String)]) -> String;
}

/// Built-in English messages.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnglishCatalog;

impl EnglishCatalog {
    fn template(id: MessageId) -> &'static str {
        match id {
            MessageId::LoadingEngine => "Loading FFmpeg...",
            MessageId::Ready => "Ready",
            MessageId::EngineLoadFailed => {
                "Failed to load FFmpeg. Please check the installation or enable auto-download."
            }
            MessageId::Analyzing => "Analyzing {file}...",
            MessageId::Analyzed => "Found {count} audio tracks.",
            MessageId::NoAudioTracks => "No audio tracks found in this file.",
            MessageId::AnalyzeFailed => "Failed to analyze file: {error}",
            MessageId::SelectAtLeastOneTrack => "Please select at least one track to extract.",
            MessageId::Extracting => "Extracting {count} tracks...",
            MessageId::ExtractionComplete => "Extraction complete! Extracted {count} tracks.",
            MessageId::ExtractionFailed => "{error}",
            MessageId::TrackLabel => "Track {index} ({language})",
            MessageId::TrackLabelFallback => "Track {name}",
        }
    }
}

impl MessageCatalog for EnglishCatalog {
    fn lookup(&self, id: MessageId, args: &[(&str, String)]) -> String {
        render(Self::template(id), args)
    }
}

/// Replaces every `{name}` in `template` with its argument. Unknown
/// placeholders are left as they are.
pub fn render(template: &str, args: &[(&str, String)]) -> String {
    let mut text = template.to_string();
    for (name, value) in args {
        text = text.replace(&format!("{{{name}}}"), value);
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_english_messages() {
        let catalog = EnglishCatalog;
        assert_eq!(catalog.lookup(MessageId::Ready, &[]), "Ready");
        assert_eq!(
            catalog.lookup(MessageId::ExtractionComplete, &[("count", 3.to_string())]),
            "Extraction complete! Extracted 3 tracks."
        );
        assert_eq!(
            catalog.lookup(
                MessageId::TrackLabel,
                &[("index", "2".into()), ("language", "jpn".into())]
            ),
            "Track 2 (jpn)"
        );
        assert_eq!(
            catalog.lookup(MessageId::AnalyzeFailed, &[("error", "boom".into())]),
            "Failed to analyze file: boom"
        );
    }

    #[test]
    fn test_render_leaves_unknown_placeholders() {
        assert_eq!(render("{a} and {b}", &[("a", "x".into())]), "x and {b}");
    }

    #[test]
    fn test_keys_are_distinct() {
        let ids = [
            MessageId::LoadingEngine,
            MessageId::Ready,
            MessageId::EngineLoadFailed,
            MessageId::Analyzing,
            MessageId::Analyzed,
            MessageId::NoAudioTracks,
            MessageId::AnalyzeFailed,
            MessageId::SelectAtLeastOneTrack,
            MessageId::Extracting,
            MessageId::ExtractionComplete,
            MessageId::ExtractionFailed,
            MessageId::TrackLabel,
            MessageId::TrackLabelFallback,
        ];
        let keys: std::collections::HashSet<_> = ids.iter().map(|id| id.key()).collect();
        assert_eq!(keys.len(), ids.len());
    }
}
