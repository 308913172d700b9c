//! Speech capability contracts
//!
//! Requests made through these traits never block. Their effects are observed
//! later as [`RecognitionEvent`]s and [`SynthesisEvent`]s which the adapter
//! publishes onto the turn controller's input channel.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{Language, SpeechError, VoiceInfo, VoiceParams};

/// Failure reported synchronously by [`RecognitionAdapter::start`]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecognitionStartError {
    /// A session is already running (typically a rapid repeat start)
    #[error("recognition already started")]
    AlreadyStarted,

    /// The host has no recognition capability at all
    #[error("recognition unsupported")]
    Unsupported,

    #[error("recognition start failed: {0}")]
    Failed(String),
}

impl RecognitionStartError {
    /// Whether stopping and starting again can succeed
    pub fn is_retriable(&self) -> bool {
        !matches!(self, Self::Unsupported)
    }
}

/// Recognition error categories reported by the adapter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecognitionErrorKind {
    NoSpeech,
    AudioCapture,
    NotAllowed,
    LanguageNotSupported,
    Other(String),
}

impl RecognitionErrorKind {
    /// Parse the wire name used by speech recognition hosts
    pub fn parse(kind: &str) -> Self {
        match kind {
            "no-speech" => Self::NoSpeech,
            "audio-capture" => Self::AudioCapture,
            "not-allowed" => Self::NotAllowed,
            "language-not-supported" => Self::LanguageNotSupported,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::NoSpeech => "no-speech",
            Self::AudioCapture => "audio-capture",
            Self::NotAllowed => "not-allowed",
            Self::LanguageNotSupported => "language-not-supported",
            Self::Other(kind) => kind,
        }
    }

    /// Map onto the error taxonomy; `language` is the locale being recognized
    pub fn into_speech_error(self, language: Language) -> SpeechError {
        match self {
            Self::NoSpeech => SpeechError::TransientNoSpeech,
            Self::AudioCapture => SpeechError::NoMicrophone,
            Self::NotAllowed => SpeechError::PermissionDenied,
            Self::LanguageNotSupported => SpeechError::LanguageUnsupported(language),
            Self::Other(kind) => SpeechError::Recognition(kind),
        }
    }
}

/// Events published by a recognition adapter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RecognitionEvent {
    /// Microphone is open
    Start,
    /// Transcript update; interim results have `is_final = false`
    Result { text: String, is_final: bool },
    Error { kind: RecognitionErrorKind },
    /// Session closed (after stop, abort, or an error)
    End,
}

impl RecognitionEvent {
    pub fn interim(text: impl Into<String>) -> Self {
        Self::Result {
            text: text.into(),
            is_final: false,
        }
    }

    pub fn final_result(text: impl Into<String>) -> Self {
        Self::Result {
            text: text.into(),
            is_final: true,
        }
    }

    pub fn error(kind: RecognitionErrorKind) -> Self {
        Self::Error { kind }
    }
}

/// Events published by a synthesis adapter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SynthesisEvent {
    Start,
    End,
    Error { message: String },
}

/// Speech-to-text capability
///
/// # Example
///
/// ```ignore
/// recognizer.configure(Language::Hindi);
/// recognizer.start()?;
/// // ... RecognitionEvent::Start, Result, End arrive on the controller channel
/// ```
pub trait RecognitionAdapter: Send + 'static {
    /// Set the locale for the next session
    fn configure(&mut self, language: Language);

    /// Request a new recognition session
    fn start(&mut self) -> Result<(), RecognitionStartError>;

    /// Stop gracefully; pending results are still delivered before `End`
    fn stop(&mut self);

    /// Stop immediately, discarding pending results
    fn abort(&mut self);

    /// Get adapter name for logging
    fn name(&self) -> &str {
        "recognizer"
    }
}

/// Text-to-speech capability
pub trait SynthesisAdapter: Send + 'static {
    /// Queue `text` for speaking
    fn speak(&mut self, text: &str, params: &VoiceParams) -> Result<(), SpeechError>;

    /// Drop the current and all queued utterances
    fn cancel(&mut self);

    /// Get available voices
    fn voices(&self) -> Vec<VoiceInfo> {
        Vec::new()
    }

    /// Get adapter name for logging
    fn name(&self) -> &str {
        "synthesizer"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_kinds() {
        assert_eq!(RecognitionErrorKind::parse("no-speech"), RecognitionErrorKind::NoSpeech);
        assert_eq!(
            RecognitionErrorKind::parse("not-allowed"),
            RecognitionErrorKind::NotAllowed
        );
        assert_eq!(
            RecognitionErrorKind::parse("network"),
            RecognitionErrorKind::Other("network".to_string())
        );
        assert_eq!(RecognitionErrorKind::parse("audio-capture").as_str(), "audio-capture");
    }

    #[test]
    fn test_error_kind_mapping() {
        let lang = Language::Hindi;
        assert!(RecognitionErrorKind::NotAllowed.into_speech_error(lang).is_fatal());
        assert!(RecognitionErrorKind::AudioCapture.into_speech_error(lang).is_fatal());
        assert_eq!(
            RecognitionErrorKind::LanguageNotSupported.into_speech_error(lang),
            SpeechError::LanguageUnsupported(Language::Hindi)
        );
        assert!(!RecognitionErrorKind::NoSpeech.into_speech_error(lang).is_fatal());
        assert!(!RecognitionErrorKind::Other("aborted".into())
            .into_speech_error(lang)
            .is_fatal());
    }

    #[test]
    fn test_start_error_retriable() {
        assert!(RecognitionStartError::AlreadyStarted.is_retriable());
        assert!(RecognitionStartError::Failed("busy".into()).is_retriable());
        assert!(!RecognitionStartError::Unsupported.is_retriable());
    }

    // Mock implementation for testing
    struct MockSynth {
        spoken: Vec<String>,
    }

    impl SynthesisAdapter for MockSynth {
        fn speak(&mut self, text: &str, _params: &VoiceParams) -> Result<(), SpeechError> {
            self.spoken.push(text.to_string());
            Ok(())
        }

        fn cancel(&mut self) {
            self.spoken.clear();
        }
    }

    #[test]
    fn test_default_voices_empty() {
        let mut synth = MockSynth { spoken: Vec::new() };
        assert!(synth.voices().is_empty());
        assert_eq!(synth.name(), "synthesizer");

        let params = VoiceParams::new(Language::English, &Default::default());
        synth.speak("hello", &params).unwrap();
        synth.cancel();
        assert!(synth.spoken.is_empty());
    }
}
