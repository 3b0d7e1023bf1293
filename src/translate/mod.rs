// Translation collaborators
//
// Used when the reference track is in a different language than the
// subtitle being synchronized: the reference is translated first so the
// fuzzy matcher compares like with like.

pub mod ollama;

use async_trait::async_trait;

pub use ollama::OllamaTranslator;
use crate::track::Track;
use crate::error::Result;

/// Translates the text of a track, keeping its timings
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate_track(&self, track: &Track, target_language: &str) -> Result<Track>;
}

/// Languages named explicitly in translation prompts
const LANGUAGE_NAMES: [(&str, &str); 10] = [
    ("en", "English"),
    ("ja", "Japanese"),
    ("ko", "Korean"),
    ("zh", "Chinese"),
    ("fr", "French"),
    ("de", "German"),
    ("es", "Spanish"),
    ("it", "Italian"),
    ("pt", "Portuguese"),
    ("ru", "Russian"),
];

/// Full language name for a two-letter code; unknown codes pass through
pub fn language_name(code: &str) -> String {
    LANGUAGE_NAMES
        .iter()
        .find(|(known, _)| known.eq_ignore_ascii_case(code))
        .map(|(_, name)| name.to_string())
        .unwrap_or_else(|| code.to_string())
}
