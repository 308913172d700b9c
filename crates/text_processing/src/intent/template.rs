//! Answer templates
//!
//! An answer is plain text with at most one `{{name}}` placeholder, where
//! `name` is an entity type such as `coffeeType`.

use crate::{NluError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
struct Placeholder {
    /// Text as written, including braces
    raw: String,
    name: String,
}

/// Localized reply text for one intent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerTemplate {
    text: String,
    placeholder: Option<Placeholder>,
}

impl AnswerTemplate {
    pub fn parse(text: &str) -> Result<Self> {
        let bad = |message: &str| NluError::BadPlaceholder {
            text: text.to_string(),
            message: message.to_string(),
        };

        let Some(open) = text.find("{{") else {
            if text.contains("}}") {
                return Err(bad("closing braces without opening braces"));
            }
            return Ok(Self {
                text: text.to_string(),
                placeholder: None,
            });
        };

        let after_open = &text[open + 2..];
        let close = after_open.find("}}").ok_or_else(|| bad("unterminated placeholder"))?;
        let name = after_open[..close].trim();

        if name.is_empty() {
            return Err(bad("empty placeholder name"));
        }
        if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(bad("placeholder name must be alphanumeric"));
        }

        let rest = &after_open[close + 2..];
        if rest.contains("{{") || rest.contains("}}") {
            return Err(bad("at most one placeholder is allowed"));
        }

        Ok(Self {
            text: text.to_string(),
            placeholder: Some(Placeholder {
                raw: text[open..open + 2 + close + 2].to_string(),
                name: name.to_string(),
            }),
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Entity type referenced by the placeholder, if any
    pub fn placeholder(&self) -> Option<&str> {
        self.placeholder.as_ref().map(|p| p.name.as_str())
    }

    pub fn has_placeholder(&self) -> bool {
        self.placeholder.is_some()
    }

    /// Fill the placeholder; a missing value renders as an empty string
    pub fn render(&self, value: Option<&str>) -> String {
        match &self.placeholder {
            Some(placeholder) => self.text.replace(&placeholder.raw, value.unwrap_or("")),
            None => self.text.clone(),
        }
    }
}
