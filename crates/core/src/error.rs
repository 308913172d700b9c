//! Error types shared across the voice agent

use thiserror::Error;

use crate::i18n::{localize, MessageKey};
use crate::language::Language;

/// How a failure affects the conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Blocks listening until the host environment is corrected
    Fatal,
    /// Reported to the user, conversation continues
    Recoverable,
    /// Expected condition, never shown to the user
    Silent,
}

/// Speech capability failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SpeechError {
    #[error("speech recognition is not available in this environment")]
    EnvironmentUnsupported,

    #[error("microphone permission denied")]
    PermissionDenied,

    #[error("no microphone detected")]
    NoMicrophone,

    #[error("speech recognition does not support {0}")]
    LanguageUnsupported(Language),

    #[error("speech recognition failed to start after {attempts} attempts")]
    RecognitionStartFailed { attempts: u32 },

    #[error("no speech detected")]
    TransientNoSpeech,

    #[error("speech recognition error: {0}")]
    Recognition(String),

    #[error("speech synthesis failed: {0}")]
    SynthesisFailure(String),
}

impl SpeechError {
    pub fn severity(&self) -> Severity {
        match self {
            Self::EnvironmentUnsupported
            | Self::PermissionDenied
            | Self::NoMicrophone
            | Self::LanguageUnsupported(_)
            | Self::RecognitionStartFailed { .. } => Severity::Fatal,
            Self::Recognition(_) | Self::SynthesisFailure(_) => Severity::Recoverable,
            Self::TransientNoSpeech => Severity::Silent,
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }

    /// Whether an explicit reset can bring the conversation back to idle
    pub fn is_resettable(&self) -> bool {
        !matches!(self, Self::EnvironmentUnsupported)
    }

    /// Localized message shown to the user, in `ui` language
    pub fn user_message(&self, ui: Language) -> String {
        match self {
            Self::EnvironmentUnsupported => localize(MessageKey::RecognitionUnsupported, ui).into(),
            Self::PermissionDenied => localize(MessageKey::PermissionDenied, ui).into(),
            Self::NoMicrophone => localize(MessageKey::NoMicrophone, ui).into(),
            Self::LanguageUnsupported(lang) => localize(MessageKey::LanguageNotSupported, ui)
                .replace("{language}", lang.display_name(ui)),
            Self::RecognitionStartFailed { .. } => {
                localize(MessageKey::RecognitionStartFailed, ui).into()
            },
            Self::TransientNoSpeech => String::new(),
            Self::Recognition(_) => localize(MessageKey::RecognitionFailed, ui).into(),
            Self::SynthesisFailure(_) => localize(MessageKey::SynthesisFailed, ui).into(),
        }
    }
}

/// Core error type
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Speech(#[from] SpeechError),

    #[error("unsupported language: {0}")]
    UnsupportedLanguage(String),

    #[error("invalid voice parameter {name}: {value}")]
    InvalidVoiceParameter { name: &'static str, value: f32 },
}

pub type Result<T> = std::result::Result<T, Error>;
