//! Configuration management for the barista voice agent
//!
//! Supports loading configuration from:
//! - YAML files (`config/default.yaml`, `config/{env}.yaml`)
//! - Environment variables (`BARISTA__` prefix, `__` separator)
//!
//! Sections:
//! - `agent`: conversation language, classifier threshold, intent corpus
//! - `turn`: turn controller retry policy
//! - `voice`: synthesis voice, rate and pitch
//! - `observability`: log level and format

pub mod agent;
pub mod settings;

pub use agent::{AgentConfig, RetryPolicy, TurnConfig};
pub use settings::{load_settings, load_settings_from, ObservabilityConfig, RuntimeEnvironment, Settings};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl ConfigError {
    pub(crate) fn invalid(field: &str, message: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}
