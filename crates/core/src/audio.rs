//! Opaque audio payloads
//!
//! The core never inspects audio content; clips are carried between the
//! presentation layer and the speech backends as tagged byte buffers.

use crate::language::Language;
use serde::{Deserialize, Serialize};

/// Container format of an audio clip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioFormat {
    Wav,
    Mp3,
    /// Raw 16-bit little-endian PCM at 16 kHz mono
    Pcm16,
}

/// An audio payload with just enough metadata to hand to a backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioClip {
    pub format: AudioFormat,
    /// Hint for recognizers; synthesizers set this to the spoken language
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<Language>,
    #[serde(with = "base64_bytes")]
    pub data: Vec<u8>,
}

impl AudioClip {
    pub fn new(format: AudioFormat, data: Vec<u8>) -> Self {
        Self {
            format,
            language: None,
            data,
        }
    }

    pub fn with_language(mut self, language: Language) -> Self {
        self.language = Some(language);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Serde helper: audio bytes travel as base64 in JSON payloads
mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(data: &[u8], ser: S) -> Result<S::Ok, S::Error> {
        ser.serialize_str(&STANDARD.encode(data))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(de)?;
        STANDARD.decode(s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clip_json_round_trip() {
        let clip = AudioClip::new(AudioFormat::Pcm16, vec![1, 2, 3, 250, 251])
            .with_language(Language::Hindi);
        let json = serde_json::to_string(&clip).unwrap();
        let back: AudioClip = serde_json::from_str(&json).unwrap();
        assert_eq!(back, clip);
    }
}
