//! Voice configuration types for speech synthesis

use serde::{Deserialize, Serialize};

use crate::language::Language;

pub const MIN_RATE: f32 = 0.5;
pub const MAX_RATE: f32 = 2.0;
pub const MIN_PITCH: f32 = 0.5;
pub const MAX_PITCH: f32 = 2.0;

/// User-adjustable voice settings
///
/// Written by the settings consumer; combined with the conversation language
/// into [`VoiceParams`] for every utterance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceSettings {
    /// Preferred voice identifier, if the user picked one
    #[serde(default)]
    pub voice_id: Option<String>,
    /// Speech rate (0.5 - 2.0, default 1.0)
    #[serde(default = "default_unit")]
    pub rate: f32,
    /// Voice pitch (0.5 - 2.0, default 1.0)
    #[serde(default = "default_unit")]
    pub pitch: f32,
}

fn default_unit() -> f32 {
    1.0
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            voice_id: None,
            rate: 1.0,
            pitch: 1.0,
        }
    }
}

impl VoiceSettings {
    /// Set the voice ID
    pub fn with_voice_id(mut self, voice_id: impl Into<String>) -> Self {
        self.voice_id = Some(voice_id.into());
        self
    }

    /// Set the speech rate
    pub fn with_rate(mut self, rate: f32) -> Self {
        self.rate = rate.clamp(MIN_RATE, MAX_RATE);
        self
    }

    /// Set the pitch
    pub fn with_pitch(mut self, pitch: f32) -> Self {
        self.pitch = pitch.clamp(MIN_PITCH, MAX_PITCH);
        self
    }

    /// Copy with rate and pitch forced into range
    pub fn clamped(&self) -> Self {
        Self {
            voice_id: self.voice_id.clone(),
            rate: self.rate.clamp(MIN_RATE, MAX_RATE),
            pitch: self.pitch.clamp(MIN_PITCH, MAX_PITCH),
        }
    }
}

/// Parameters for a single synthesis request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceParams {
    pub voice_id: Option<String>,
    pub rate: f32,
    pub pitch: f32,
    pub language: Language,
}

impl VoiceParams {
    pub fn new(language: Language, settings: &VoiceSettings) -> Self {
        let settings = settings.clamped();
        Self {
            voice_id: settings.voice_id,
            rate: settings.rate,
            pitch: settings.pitch,
            language,
        }
    }

    /// BCP-47 tag for the synthesis request
    pub fn language_tag(&self) -> &'static str {
        self.language.locale_tag()
    }
}

/// A voice offered by the synthesis adapter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceInfo {
    /// Voice identifier
    pub id: String,
    /// Human-readable name
    pub name: String,
    /// Locale tag such as `hi-IN`
    pub locale: String,
    /// Rendered on-device rather than by a remote service
    #[serde(default)]
    pub local_service: bool,
}

/// Pick a voice for `language`
///
/// Prefers an on-device voice for the language, then any voice for the
/// language, then whatever voice comes first.
pub fn select_voice(voices: &[VoiceInfo], language: Language) -> Option<&VoiceInfo> {
    let prefix = format!("{}-", language.code());
    let matches_language = |v: &&VoiceInfo| v.locale.to_lowercase().starts_with(&prefix);

    voices
        .iter()
        .filter(matches_language)
        .find(|v| v.local_service)
        .or_else(|| voices.iter().find(matches_language))
        .or_else(|| voices.first())
}
