//! Agent and turn-taking configuration

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use barista_core::Language;

/// Dialogue agent configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Conversation language at session start
    #[serde(default)]
    pub language: Language,

    /// Minimum classifier score for an intent to count as understood
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f32,

    /// Intent corpus override; the built-in coffee corpus is used when unset
    #[serde(default)]
    pub corpus_path: Option<PathBuf>,
}

fn default_min_confidence() -> f32 {
    0.5
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            language: Language::English,
            min_confidence: default_min_confidence(),
            corpus_path: None,
        }
    }
}

/// Retry policy for starting speech recognition
///
/// `max_attempts` counts the first try, so the default of 2 means one retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Fixed delay between attempts
    #[serde(default = "default_retry_delay_ms")]
    pub delay_ms: u64,
}

fn default_max_attempts() -> u32 {
    2
}
fn default_retry_delay_ms() -> u64 {
    100
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            delay_ms: default_retry_delay_ms(),
        }
    }
}

impl RetryPolicy {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    /// Whether another attempt is allowed after `attempt` (1-based) failed
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }
}

/// Turn controller configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TurnConfig {
    /// Recognition start retry policy
    #[serde(default)]
    pub retry: RetryPolicy,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_policy_defaults() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 2);
        assert_eq!(policy.delay(), Duration::from_millis(100));
        assert!(policy.should_retry(1));
        assert!(!policy.should_retry(2));
    }

    #[test]
    fn test_agent_defaults() {
        let config = AgentConfig::default();
        assert_eq!(config.language, Language::English);
        assert_eq!(config.min_confidence, 0.5);
        assert!(config.corpus_path.is_none());
    }
}
