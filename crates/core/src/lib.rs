//! Core traits and types for the barista voice agent
//!
//! This crate provides foundational types used across all other crates:
//! - Language definitions (English and Hindi)
//! - Localized user-facing text
//! - Error types
//! - Conversation types (messages, turn states, conversation sink)
//! - Voice parameters for synthesis
//! - Speech adapter contracts (recognition and synthesis)

pub mod conversation;
pub mod error;
pub mod i18n;
pub mod language;
pub mod traits;
pub mod voice_config;

pub use conversation::{ConversationSink, ConversationState, Message, MessageLog, MessageRole};
pub use error::{Error, Result, Severity, SpeechError};
pub use i18n::{localize, MessageKey};
pub use language::Language;
pub use voice_config::{select_voice, VoiceInfo, VoiceParams, VoiceSettings};

pub use traits::{
    RecognitionAdapter, RecognitionErrorKind, RecognitionEvent, RecognitionStartError,
    SynthesisAdapter, SynthesisEvent,
};
