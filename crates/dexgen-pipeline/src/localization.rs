use dexgen_core::{LocalizationConfig, LocalizedText};

/// Language of the `enName` slot, independent of the configured preferences.
pub const ENGLISH: &str = "en";

/// Ordered language preferences: every preferred language in turn, then the fallback.
///
/// Callers apply their own raw fallback when nothing matches, since each field
/// has a different one (resource name, empty string, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguagePreference {
    preferred: Vec<String>,
    fallback: String,
}

impl LanguagePreference {
    pub fn new(preferred: Vec<String>, fallback: impl Into<String>) -> Self {
        Self {
            preferred,
            fallback: fallback.into(),
        }
    }

    /// A single language with no alternatives.
    pub fn only(language: impl Into<String>) -> Self {
        Self::new(Vec::new(), language)
    }

    pub fn languages(&self) -> impl Iterator<Item = &str> {
        self.preferred
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(self.fallback.as_str()))
    }

    /// First non-blank text in the most preferred available language.
    pub fn pick<'a, T: LocalizedText>(&self, entries: &'a [T]) -> Option<&'a str> {
        self.languages().find_map(|language| {
            entries
                .iter()
                .find(|e| e.language() == language && !e.text().trim().is_empty())
                .map(|e| e.text())
        })
    }
}

impl From<&LocalizationConfig> for LanguagePreference {
    fn from(config: &LocalizationConfig) -> Self {
        Self::new(config.preferred.clone(), config.fallback.clone())
    }
}

/// Flavor text comes with hard line breaks and form feeds; flatten to one line.
pub fn normalize_flavor_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// `grass` -> `Grass`
pub fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
