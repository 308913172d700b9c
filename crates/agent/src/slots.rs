//! Per-conversation slot memory
//!
//! One `SlotMemory` belongs to exactly one conversation. The turn controller
//! owns it and lends it to the dialogue engine for the duration of a single
//! `respond` call.

use serde::{Deserialize, Serialize};

use barista_text_processing::COFFEE_TYPE;

/// Remembered conversation state: the ordered coffee type
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotMemory {
    coffee_type: Option<String>,
}

impl SlotMemory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn coffee_type(&self) -> Option<&str> {
        self.coffee_type.as_deref()
    }

    /// Overwrite the coffee type, returning the previous value
    pub fn set_coffee_type(&mut self, value: impl Into<String>) -> Option<String> {
        self.coffee_type.replace(value.into())
    }

    /// Look up a slot by entity type
    pub fn get(&self, slot: &str) -> Option<&str> {
        match slot {
            COFFEE_TYPE => self.coffee_type(),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.coffee_type.is_none()
    }

    pub fn clear(&mut self) {
        self.coffee_type = None;
    }
}
