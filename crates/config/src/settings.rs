//! Main settings module

use std::path::Path;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use barista_core::voice_config::{MAX_PITCH, MAX_RATE, MIN_PITCH, MIN_RATE};
use barista_core::VoiceSettings;

use crate::{AgentConfig, ConfigError, TurnConfig};

/// Runtime environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeEnvironment {
    /// Development mode - relaxed validation, warnings only
    #[default]
    Development,
    /// Production mode - all validations enforced
    Production,
}

impl RuntimeEnvironment {
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub environment: RuntimeEnvironment,

    /// Dialogue agent configuration
    #[serde(default)]
    pub agent: AgentConfig,

    /// Turn controller configuration
    #[serde(default)]
    pub turn: TurnConfig,

    /// Initial voice settings
    #[serde(default)]
    pub voice: VoiceSettings,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub log_json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_json: false,
        }
    }
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_agent()?;
        self.validate_turn()?;
        self.validate_voice()?;
        self.validate_observability()?;
        Ok(())
    }

    fn validate_agent(&self) -> Result<(), ConfigError> {
        let threshold = self.agent.min_confidence;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(ConfigError::invalid(
                "agent.min_confidence",
                format!("must be between 0.0 and 1.0, got {threshold}"),
            ));
        }

        if let Some(path) = &self.agent.corpus_path {
            if !path.exists() {
                return Err(ConfigError::FileNotFound(path.display().to_string()));
            }
        }
        Ok(())
    }

    fn validate_turn(&self) -> Result<(), ConfigError> {
        let retry = &self.turn.retry;
        if retry.max_attempts == 0 {
            return Err(ConfigError::invalid(
                "turn.retry.max_attempts",
                "at least one attempt is required",
            ));
        }
        if retry.delay_ms > 5_000 {
            return Err(ConfigError::invalid(
                "turn.retry.delay_ms",
                format!("retry delay too long ({}ms, maximum 5000ms)", retry.delay_ms),
            ));
        }
        Ok(())
    }

    fn validate_voice(&self) -> Result<(), ConfigError> {
        if !(MIN_RATE..=MAX_RATE).contains(&self.voice.rate) {
            return Err(ConfigError::invalid(
                "voice.rate",
                format!("must be between {MIN_RATE} and {MAX_RATE}"),
            ));
        }
        if !(MIN_PITCH..=MAX_PITCH).contains(&self.voice.pitch) {
            return Err(ConfigError::invalid(
                "voice.pitch",
                format!("must be between {MIN_PITCH} and {MAX_PITCH}"),
            ));
        }
        Ok(())
    }

    fn validate_observability(&self) -> Result<(), ConfigError> {
        const LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
        let level = self.observability.log_level.to_lowercase();
        if !LEVELS.contains(&level.as_str()) {
            return Err(ConfigError::invalid(
                "observability.log_level",
                format!("unknown level '{}'", self.observability.log_level),
            ));
        }
        Ok(())
    }
}

/// Load settings from `config/` relative to the working directory
///
/// Priority (highest to lowest):
/// 1. Environment variables (BARISTA__ prefix)
/// 2. config/{env}.yaml (if env specified)
/// 3. config/default.yaml
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    load_settings_from("config", env)
}

/// Load settings from an explicit configuration directory
pub fn load_settings_from(dir: impl AsRef<Path>, env: Option<&str>) -> Result<Settings, ConfigError> {
    let dir = dir.as_ref();
    let mut builder = Config::builder();

    builder = builder.add_source(File::from(dir.join("default")).required(false));

    if let Some(env_name) = env {
        builder = builder.add_source(File::from(dir.join(env_name)).required(false));
    }

    builder = builder.add_source(
        Environment::with_prefix("BARISTA")
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;
    let settings: Settings = config.try_deserialize()?;

    settings.validate()?;

    tracing::debug!(dir = %dir.display(), env = env.unwrap_or("default"), "Settings loaded");
    Ok(settings)
}
