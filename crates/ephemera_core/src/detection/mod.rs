//! Language detection for untagged pastes.

mod heuristic;

#[cfg(test)]
mod tests;

use crate::constants::UNKNOWN_LANGUAGE;

/// Maps paste content to a language tag.
///
/// Detection is best effort and never fails; ambiguous content yields
/// [`UNKNOWN_LANGUAGE`].
pub trait LanguageDetector: Send + Sync {
    fn detect(&self, content: &str) -> String;
}

/// Detector built from structural checks and keyword scoring.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeuristicDetector;

impl LanguageDetector for HeuristicDetector {
    fn detect(&self, content: &str) -> String {
        heuristic::detect(content)
            .unwrap_or(UNKNOWN_LANGUAGE)
            .to_string()
    }
}

/// Run `detector` and coerce a blank answer to [`UNKNOWN_LANGUAGE`].
pub fn detect_or_unknown(detector: &dyn LanguageDetector, content: &str) -> String {
    let detected = detector.detect(content);
    let detected = detected.trim();
    if detected.is_empty() {
        UNKNOWN_LANGUAGE.to_string()
    } else {
        detected.to_ascii_lowercase()
    }
}
