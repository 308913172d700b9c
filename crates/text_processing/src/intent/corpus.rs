//! Intent corpus definitions
//!
//! The corpus is loaded from YAML and expanded into flat intents before
//! training. See `data/coffee.yaml` for the built-in coffee ordering corpus.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use barista_core::Language;

use super::template::AnswerTemplate;
use crate::{NluError, Result};

const BUILTIN_CORPUS: &str = include_str!("../../data/coffee.yaml");

/// One value of an entity, e.g. `Latte` of `coffeeType`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityValue {
    /// Canonical value, used in intent ids and slot memory
    pub value: String,

    /// Localized name used when rendering answers
    #[serde(default)]
    pub names: BTreeMap<Language, String>,

    /// Per-language surface forms recognized in utterances
    #[serde(default)]
    pub synonyms: BTreeMap<Language, Vec<String>>,
}

impl EntityValue {
    /// Surface forms for `language`, including the display name
    pub fn surface_forms(&self, language: Language) -> Vec<&str> {
        let mut forms: Vec<&str> = Vec::new();
        let synonyms = self.synonyms.get(&language).into_iter().flatten();
        for form in self.names.get(&language).into_iter().chain(synonyms) {
            if !forms.contains(&form.as_str()) {
                forms.push(form.as_str());
            }
        }
        forms
    }
}

/// Intent as written in the corpus file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentDefinition {
    pub id: String,

    /// Entity to instantiate this intent over
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expand: Option<String>,

    #[serde(default)]
    pub examples: BTreeMap<Language, Vec<String>>,

    #[serde(default)]
    pub answers: BTreeMap<Language, String>,
}

/// Intent after entity expansion, ready for training
#[derive(Debug, Clone, PartialEq)]
pub struct ExpandedIntent {
    pub id: String,
    pub examples: BTreeMap<Language, Vec<String>>,
    pub answers: BTreeMap<Language, AnswerTemplate>,
}

/// Intent corpus
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Corpus {
    #[serde(default)]
    pub entities: BTreeMap<String, Vec<EntityValue>>,

    #[serde(default)]
    pub intents: Vec<IntentDefinition>,
}

impl Corpus {
    /// The coffee ordering corpus compiled into the crate
    pub fn builtin() -> Result<Self> {
        Self::from_yaml(BUILTIN_CORPUS)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|e| NluError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let corpus = Self::from_yaml(&yaml)?;
        tracing::debug!(path = %path.display(), intents = corpus.intents.len(), "Loaded intent corpus");
        Ok(corpus)
    }

    /// Values of an entity type
    pub fn entity_values(&self, entity_type: &str) -> Option<&[EntityValue]> {
        self.entities.get(entity_type).map(Vec::as_slice)
    }

    /// Validate the corpus and flatten `expand` intents
    ///
    /// Intent order is preserved; expanded intents take the position of their
    /// definition, in entity value order.
    pub fn expand(&self) -> Result<Vec<ExpandedIntent>> {
        if self.intents.is_empty() {
            return Err(NluError::EmptyCorpus);
        }
        self.validate_entities()?;

        let mut expanded = Vec::new();
        for definition in &self.intents {
            let answers = self.parse_answers(definition)?;

            if definition.examples.values().all(Vec::is_empty) {
                return Err(NluError::NoExamples {
                    intent: definition.id.clone(),
                });
            }

            match &definition.expand {
                None => {
                    for example in definition.examples.values().flatten() {
                        reject_braces(example)?;
                    }
                    expanded.push(ExpandedIntent {
                        id: definition.id.clone(),
                        examples: definition.examples.clone(),
                        answers,
                    });
                }
                Some(entity_type) => {
                    let values = self.entity_values(entity_type).ok_or_else(|| {
                        NluError::UnknownEntity {
                            intent: definition.id.clone(),
                            entity: entity_type.clone(),
                        }
                    })?;
                    for value in values {
                        expanded.push(ExpandedIntent {
                            id: format!("{}.{}", definition.id, value.value),
                            examples: expand_examples(definition, entity_type, value)?,
                            answers: answers.clone(),
                        });
                    }
                }
            }
        }

        Ok(expanded)
    }

    fn validate_entities(&self) -> Result<()> {
        for value in self.entities.values().flatten() {
            for &language in Language::all() {
                if value.names.get(&language).map_or(true, |n| n.trim().is_empty()) {
                    return Err(NluError::MissingDisplayName {
                        value: value.value.clone(),
                        language,
                    });
                }
            }
        }
        Ok(())
    }

    fn parse_answers(
        &self,
        definition: &IntentDefinition,
    ) -> Result<BTreeMap<Language, AnswerTemplate>> {
        let mut answers = BTreeMap::new();
        for &language in Language::all() {
            let text = definition
                .answers
                .get(&language)
                .filter(|text| !text.trim().is_empty())
                .ok_or_else(|| NluError::MissingAnswer {
                    intent: definition.id.clone(),
                    language,
                })?;

            let template = AnswerTemplate::parse(text)?;
            if let Some(name) = template.placeholder() {
                if !self.entities.contains_key(name) {
                    return Err(NluError::BadPlaceholder {
                        text: text.clone(),
                        message: format!("unknown slot '{name}'"),
                    });
                }
            }
            answers.insert(language, template);
        }
        Ok(answers)
    }
}

fn reject_braces(example: &str) -> Result<()> {
    if example.contains('{') || example.contains('}') {
        return Err(NluError::BadPlaceholder {
            text: example.to_string(),
            message: "placeholder in an intent without `expand`".to_string(),
        });
    }
    Ok(())
}

fn expand_examples(
    definition: &IntentDefinition,
    entity_type: &str,
    value: &EntityValue,
) -> Result<BTreeMap<Language, Vec<String>>> {
    let marker = format!("{{{entity_type}}}");
    let mut examples = BTreeMap::new();

    for (&language, patterns) in &definition.examples {
        let forms = value.surface_forms(language);
        let mut out: Vec<String> = Vec::new();
        for pattern in patterns {
            let instances: Vec<String> = if pattern.contains(&marker) {
                forms.iter().map(|form| pattern.replace(&marker, form)).collect()
            } else {
                vec![pattern.clone()]
            };
            for instance in instances {
                reject_braces(&instance)?;
                if !out.contains(&instance) {
                    out.push(instance);
                }
            }
        }
        examples.insert(language, out);
    }

    Ok(examples)
}
