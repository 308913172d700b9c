//! Entity Extraction
//!
//! Matches known surface forms ("latte", "कैप्युचीनो") inside an utterance and
//! maps them to canonical entity values ("Latte", "Cappuccino").
//!
//! # Example
//!
//! ```
//! use barista_text_processing::entities::{Entity, EntityExtractor, COFFEE_TYPE};
//!
//! let mut extractor = EntityExtractor::new();
//! extractor.add_surface_form(COFFEE_TYPE, "Latte", "latte");
//!
//! let found = extractor.extract("one latte please");
//! assert_eq!(found, vec![Entity::coffee_type("Latte")]);
//! ```

use serde::{Deserialize, Serialize};

use crate::tokens::tokenize;

/// Entity type of the single conversation slot
pub const COFFEE_TYPE: &str = "coffeeType";

/// Extracted entity with its canonical value
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Entity {
    pub entity_type: String,
    pub value: String,
}

impl Entity {
    pub fn new(entity_type: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            entity_type: entity_type.into(),
            value: value.into(),
        }
    }

    pub fn coffee_type(value: impl Into<String>) -> Self {
        Self::new(COFFEE_TYPE, value)
    }
}

#[derive(Debug, Clone, PartialEq)]
struct SurfaceRule {
    tokens: Vec<String>,
    entity: Entity,
}

/// Surface-form matcher for one language
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityExtractor {
    rules: Vec<SurfaceRule>,
}

impl EntityExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `surface` as a way of saying `value`
    pub fn add_surface_form(&mut self, entity_type: &str, value: &str, surface: &str) {
        let tokens = tokenize(surface);
        if tokens.is_empty() {
            return;
        }

        let entity = Entity::new(entity_type, value);
        let exists = self
            .rules
            .iter()
            .any(|rule| rule.tokens == tokens && rule.entity == entity);
        if !exists {
            self.rules.push(SurfaceRule { tokens, entity });
        }
    }

    /// Number of registered surface forms
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Extract entities from raw text
    pub fn extract(&self, text: &str) -> Vec<Entity> {
        self.extract_tokens(&tokenize(text))
    }

    /// Extract entities from an already tokenized utterance
    ///
    /// Entities are returned in order of first appearance; a value mentioned
    /// twice is reported once.
    pub fn extract_tokens(&self, tokens: &[String]) -> Vec<Entity> {
        let mut hits: Vec<(usize, usize, &Entity)> = Vec::new();

        for rule in &self.rules {
            let width = rule.tokens.len();
            if width > tokens.len() {
                continue;
            }
            if let Some(pos) = tokens
                .windows(width)
                .position(|window| window == rule.tokens.as_slice())
            {
                hits.push((pos, width, &rule.entity));
            }
        }

        // Earliest first; longer surface forms win at the same position
        hits.sort_by(|a, b| a.0.cmp(&b.0).then(b.1.cmp(&a.1)));

        let mut entities: Vec<Entity> = Vec::new();
        for (_, _, entity) in hits {
            if !entities.contains(entity) {
                entities.push(entity.clone());
            }
        }
        entities
    }
}
