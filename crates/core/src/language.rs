//! Supported languages
//!
//! Closed set of the 16 languages the assistant handles. Serialized as the
//! ISO 639-1 code so persisted records and API payloads stay compact.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A supported language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Language {
    English,
    Hindi,
    Kannada,
    Tamil,
    Telugu,
    Marathi,
    Bengali,
    Gujarati,
    Punjabi,
    Urdu,
    Spanish,
    French,
    German,
    Japanese,
    Chinese,
    Arabic,
}

impl Language {
    /// All supported languages, in display order
    pub const ALL: [Language; 16] = [
        Language::English,
        Language::Hindi,
        Language::Kannada,
        Language::Tamil,
        Language::Telugu,
        Language::Marathi,
        Language::Bengali,
        Language::Gujarati,
        Language::Punjabi,
        Language::Urdu,
        Language::Spanish,
        Language::French,
        Language::German,
        Language::Japanese,
        Language::Chinese,
        Language::Arabic,
    ];

    /// ISO 639-1 code
    pub fn code(&self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Hindi => "hi",
            Language::Kannada => "kn",
            Language::Tamil => "ta",
            Language::Telugu => "te",
            Language::Marathi => "mr",
            Language::Bengali => "bn",
            Language::Gujarati => "gu",
            Language::Punjabi => "pa",
            Language::Urdu => "ur",
            Language::Spanish => "es",
            Language::French => "fr",
            Language::German => "de",
            Language::Japanese => "ja",
            Language::Chinese => "zh",
            Language::Arabic => "ar",
        }
    }

    /// English display name
    pub fn display_name(&self) -> &'static str {
        match self {
            Language::English => "English",
            Language::Hindi => "Hindi",
            Language::Kannada => "Kannada",
            Language::Tamil => "Tamil",
            Language::Telugu => "Telugu",
            Language::Marathi => "Marathi",
            Language::Bengali => "Bengali",
            Language::Gujarati => "Gujarati",
            Language::Punjabi => "Punjabi",
            Language::Urdu => "Urdu",
            Language::Spanish => "Spanish",
            Language::French => "French",
            Language::German => "German",
            Language::Japanese => "Japanese",
            Language::Chinese => "Chinese",
            Language::Arabic => "Arabic",
        }
    }

    /// Parse a language from its ISO code or English name (case-insensitive)
    pub fn parse(s: &str) -> Option<Language> {
        let needle = s.trim().to_lowercase();
        Language::ALL.iter().copied().find(|lang| {
            lang.code() == needle || lang.display_name().to_lowercase() == needle
        })
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.display_name(), self.code())
    }
}

impl FromStr for Language {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Language::parse(s)
            .ok_or_else(|| crate::Error::InvalidInput(format!("unknown language: {}", s)))
    }
}

impl From<Language> for String {
    fn from(lang: Language) -> String {
        lang.code().to_string()
    }
}

impl TryFrom<String> for Language {
    type Error = crate::Error;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_round_trip() {
        for lang in Language::ALL {
            assert_eq!(Language::parse(lang.code()), Some(lang));
        }
    }

    #[test]
    fn test_parse_by_name() {
        assert_eq!(Language::parse("Hindi"), Some(Language::Hindi));
        assert_eq!(Language::parse("french"), Some(Language::French));
        assert_eq!(Language::parse("klingon"), None);
    }

    #[test]
    fn test_serde_as_code() {
        let json = serde_json::to_string(&Language::Tamil).unwrap();
        assert_eq!(json, "\"ta\"");
        let back: Language = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Language::Tamil);
    }
}
