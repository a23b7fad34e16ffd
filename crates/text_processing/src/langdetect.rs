//! Input language detection
//!
//! Script-range counting with an ASCII-ratio fallback for Latin text. This
//! is a routing heuristic, not a linguistic guarantee: ambiguous cases fall
//! back to configurable defaults rather than a hardcoded language, so the
//! policy can change without touching the engine.

use polyglot_core::Language;
use serde::{Deserialize, Serialize};

/// Detection policy knobs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Latin text at or above this ASCII ratio resolves to `latin_default`
    pub ascii_threshold: f32,
    /// Default for mostly-ASCII Latin text
    pub latin_default: Language,
    /// Default when no script dominates and the text is not mostly ASCII
    pub non_latin_default: Language,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            ascii_threshold: 0.85,
            latin_default: Language::English,
            non_latin_default: Language::Hindi,
        }
    }
}

/// Script-based language detector
#[derive(Debug, Clone, Default)]
pub struct LanguageDetector {
    config: DetectorConfig,
}

impl LanguageDetector {
    pub fn new(config: DetectorConfig) -> Self {
        Self { config }
    }

    /// Detect the language of `text`; total, always returns a language
    pub fn detect(&self, text: &str) -> Language {
        let mut script_counts: [(Language, usize); 9] = [
            (Language::Hindi, 0),    // Devanagari (also Marathi; Hindi wins)
            (Language::Bengali, 0),
            (Language::Punjabi, 0),  // Gurmukhi
            (Language::Gujarati, 0),
            (Language::Tamil, 0),
            (Language::Telugu, 0),
            (Language::Kannada, 0),
            (Language::Arabic, 0),   // Arabic script (also Urdu; Arabic wins)
            (Language::Chinese, 0),  // CJK ideographs
        ];
        let mut kana = 0usize;
        let mut ascii = 0usize;
        let mut total = 0usize;

        for c in text.chars() {
            if c.is_whitespace() {
                continue;
            }
            total += 1;
            if c.is_ascii() {
                ascii += 1;
            }
            match c as u32 {
                0x0900..=0x097F => script_counts[0].1 += 1,
                0x0980..=0x09FF => script_counts[1].1 += 1,
                0x0A00..=0x0A7F => script_counts[2].1 += 1,
                0x0A80..=0x0AFF => script_counts[3].1 += 1,
                0x0B80..=0x0BFF => script_counts[4].1 += 1,
                0x0C00..=0x0C7F => script_counts[5].1 += 1,
                0x0C80..=0x0CFF => script_counts[6].1 += 1,
                0x0600..=0x06FF | 0x0750..=0x077F => script_counts[7].1 += 1,
                0x4E00..=0x9FFF => script_counts[8].1 += 1,
                0x3040..=0x30FF => kana += 1,
                _ => {}
            }
        }

        if total == 0 {
            return self.config.latin_default;
        }
        // Any kana marks Japanese even when kanji dominate the count
        if kana > 0 {
            return Language::Japanese;
        }
        if let Some((lang, count)) = script_counts.iter().max_by_key(|(_, c)| *c) {
            if *count > 0 {
                return *lang;
            }
        }
        if ascii as f32 / total as f32 >= self.config.ascii_threshold {
            self.config.latin_default
        } else {
            self.config.non_latin_default
        }
    }
}
