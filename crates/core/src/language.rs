//! Supported conversation languages
//!
//! The agent speaks exactly two languages. Every user-facing string and every
//! answer template must exist for both of them.

use serde::{Deserialize, Serialize};

/// Supported languages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub enum Language {
    #[default]
    #[serde(rename = "en", alias = "english")]
    English,
    #[serde(rename = "hi", alias = "hindi")]
    Hindi,
}

impl Language {
    /// Get ISO 639-1 code
    pub fn code(&self) -> &'static str {
        match self {
            Self::English => "en",
            Self::Hindi => "hi",
        }
    }

    /// BCP-47 locale tag handed to recognition and synthesis adapters
    pub fn locale_tag(&self) -> &'static str {
        match self {
            Self::English => "en-US",
            Self::Hindi => "hi-IN",
        }
    }

    /// Get human-readable English name
    pub fn name(&self) -> &'static str {
        match self {
            Self::English => "English",
            Self::Hindi => "Hindi",
        }
    }

    /// Name of this language as written in `ui` language
    pub fn display_name(&self, ui: Language) -> &'static str {
        match (self, ui) {
            (Self::English, Language::English) => "English",
            (Self::Hindi, Language::English) => "Hindi",
            (Self::English, Language::Hindi) => "अंग्रेज़ी",
            (Self::Hindi, Language::Hindi) => "हिन्दी",
        }
    }

    /// Parse from string (case-insensitive)
    pub fn from_str_loose(s: &str) -> Option<Self> {
        let s = s.trim().to_lowercase();
        match s.as_str() {
            "en" | "eng" | "english" | "en-us" | "en-in" => Some(Self::English),
            "hi" | "hin" | "hindi" | "hi-in" => Some(Self::Hindi),
            _ => None,
        }
    }

    /// Get all supported languages
    pub fn all() -> &'static [Language] {
        &[Self::English, Self::Hindi]
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl std::str::FromStr for Language {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_str_loose(s).ok_or_else(|| crate::Error::UnsupportedLanguage(s.to_string()))
    }
}
