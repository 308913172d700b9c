//! Intent understanding for the barista voice agent
//!
//! This crate provides the language-indexed intent model:
//! - **Corpus**: YAML intent definitions with entity expansion
//! - **Classification**: weighted token overlap against trained examples
//! - **Entity Extraction**: coffee type surface forms to canonical values
//! - **Answer Templates**: localized replies with a single slot placeholder
//!
//! # Example
//!
//! ```ignore
//! use barista_core::Language;
//! use barista_text_processing::{Corpus, IntentModel};
//!
//! let model = IntentModel::train(&Corpus::builtin()?, 0.5)?;
//! let result = model.classify(Language::English, "I want Latte");
//! assert_eq!(result.intent_id().map(|id| id.as_str()), Some("order.coffee.type.Latte"));
//! ```

pub mod entities;
pub mod intent;
pub mod tokens;

pub use entities::{Entity, EntityExtractor, COFFEE_TYPE};
pub use intent::{AnswerTemplate, Classification, Corpus, IntentId, IntentMatch, IntentModel};

use barista_core::Language;
use thiserror::Error;

/// Intent corpus errors
///
/// All of these are configuration defects detected while loading or training,
/// never conditions raised by classification itself.
#[derive(Error, Debug)]
pub enum NluError {
    #[error("Failed to read corpus {path}: {message}")]
    Io { path: String, message: String },

    #[error("Failed to parse corpus: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Corpus defines no intents")]
    EmptyCorpus,

    #[error("Intent '{intent}' has no examples")]
    NoExamples { intent: String },

    #[error("Intent '{intent}' has no answer for {language}")]
    MissingAnswer { intent: String, language: Language },

    #[error("Entity value '{value}' has no display name for {language}")]
    MissingDisplayName { value: String, language: Language },

    #[error("Intent '{intent}' expands unknown entity '{entity}'")]
    UnknownEntity { intent: String, entity: String },

    #[error("Invalid placeholder in '{text}': {message}")]
    BadPlaceholder { text: String, message: String },

    #[error("Example '{example}' ({language}) is ambiguous between '{first}' and '{second}'")]
    DuplicateExample {
        language: Language,
        example: String,
        first: String,
        second: String,
    },
}

pub type Result<T> = std::result::Result<T, NluError>;
