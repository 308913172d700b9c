//! Intent Detection
//!
//! Classifies an utterance against a language-indexed intent corpus and
//! extracts the coffee type entity.
//!
//! # Features
//!
//! - YAML corpus with entity expansion (`order.coffee.type.<Value>`)
//! - Weighted token overlap with Unicode word boundaries (Devanagari safe)
//! - Strict language isolation: each language is trained and matched alone
//! - Ties resolved by corpus order
//!
//! # Example
//!
//! ```
//! use barista_core::Language;
//! use barista_text_processing::intent::{Corpus, IntentModel};
//!
//! let model = IntentModel::train(&Corpus::builtin().unwrap(), 0.5).unwrap();
//! let result = model.classify(Language::English, "Latte please");
//!
//! assert_eq!(result.intent_id().unwrap().as_str(), "order.coffee.type.Latte");
//! ```

mod corpus;
mod template;

pub use corpus::{Corpus, EntityValue, ExpandedIntent, IntentDefinition};
pub use template::AnswerTemplate;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use barista_core::Language;

use crate::entities::{Entity, EntityExtractor};
use crate::tokens::tokenize;
use crate::{NluError, Result};

/// Prefix of the intents that carry a coffee type
pub const COFFEE_TYPE_INTENT_PREFIX: &str = "order.coffee.type.";

/// Hierarchical intent identifier, e.g. `order.coffee.confirm`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IntentId(String);

impl IntentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Coffee type carried by an `order.coffee.type.<Value>` intent
    pub fn coffee_type(&self) -> Option<&str> {
        self.0
            .strip_prefix(COFFEE_TYPE_INTENT_PREFIX)
            .filter(|value| !value.is_empty())
    }
}

impl fmt::Display for IntentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Scored intent candidate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentMatch {
    pub id: IntentId,
    pub confidence: f32,
}

/// Result of classifying one utterance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub language: Language,
    /// Winning intent, absent when nothing scored above the threshold
    pub intent: Option<IntentMatch>,
    /// Runner-up candidates, best first
    pub alternatives: Vec<IntentMatch>,
    pub entities: Vec<Entity>,
}

impl Classification {
    pub fn no_match(language: Language) -> Self {
        Self {
            language,
            intent: None,
            alternatives: Vec::new(),
            entities: Vec::new(),
        }
    }

    pub fn intent_id(&self) -> Option<&IntentId> {
        self.intent.as_ref().map(|m| &m.id)
    }

    pub fn confidence(&self) -> f32 {
        self.intent.as_ref().map_or(0.0, |m| m.confidence)
    }

    pub fn is_match(&self) -> bool {
        self.intent.is_some()
    }

    /// First entity of the given type
    pub fn entity(&self, entity_type: &str) -> Option<&Entity> {
        self.entities.iter().find(|e| e.entity_type == entity_type)
    }
}

#[derive(Debug, Clone, PartialEq)]
struct TrainedIntent {
    id: IntentId,
    examples: Vec<BTreeSet<String>>,
    answer: AnswerTemplate,
    /// Entity implied by an expanded intent
    entity: Option<Entity>,
}

#[derive(Debug, Clone, PartialEq)]
struct LanguageModel {
    intents: Vec<TrainedIntent>,
    weights: BTreeMap<String, f32>,
    unknown_weight: f32,
    extractor: EntityExtractor,
}

impl LanguageModel {
    fn weight(&self, token: &str) -> f32 {
        self.weights.get(token).copied().unwrap_or(self.unknown_weight)
    }

    /// Weighted Jaccard overlap of two token sets
    fn similarity(&self, utterance: &BTreeSet<String>, example: &BTreeSet<String>) -> f32 {
        let shared: f32 = utterance.intersection(example).map(|t| self.weight(t)).sum();
        if shared == 0.0 {
            return 0.0;
        }
        let total: f32 = utterance.union(example).map(|t| self.weight(t)).sum();
        shared / total
    }

    fn score(&self, utterance: &BTreeSet<String>, intent: &TrainedIntent) -> f32 {
        intent
            .examples
            .iter()
            .map(|example| self.similarity(utterance, example))
            .fold(0.0, f32::max)
    }
}

/// Trained, immutable intent model for all supported languages
#[derive(Debug, Clone, PartialEq)]
pub struct IntentModel {
    languages: BTreeMap<Language, LanguageModel>,
    entities: BTreeMap<String, Vec<EntityValue>>,
    min_confidence: f32,
}

impl IntentModel {
    /// Validate `corpus` and train one model per language
    ///
    /// Training is deterministic: the same corpus always yields an equal model.
    pub fn train(corpus: &Corpus, min_confidence: f32) -> Result<Self> {
        let expanded = corpus.expand()?;
        let mut languages = BTreeMap::new();

        for &language in Language::all() {
            let model = train_language(corpus, &expanded, language)?;
            tracing::debug!(
                language = %language,
                intents = model.intents.len(),
                vocabulary = model.weights.len(),
                "Trained language model"
            );
            languages.insert(language, model);
        }

        tracing::info!(
            intents = expanded.len(),
            languages = languages.len(),
            "Intent model trained"
        );

        Ok(Self {
            languages,
            entities: corpus.entities.clone(),
            min_confidence: min_confidence.clamp(0.0, 1.0),
        })
    }

    pub fn min_confidence(&self) -> f32 {
        self.min_confidence
    }

    /// Number of intents trained for `language`
    pub fn intent_count(&self, language: Language) -> usize {
        self.languages.get(&language).map_or(0, |m| m.intents.len())
    }

    /// Classify `text` using only the examples of `language`
    pub fn classify(&self, language: Language, text: &str) -> Classification {
        let Some(model) = self.languages.get(&language) else {
            return Classification::no_match(language);
        };

        let tokens = tokenize(text);
        let utterance: BTreeSet<String> = tokens.iter().cloned().collect();

        let mut scores: Vec<(&TrainedIntent, f32)> = model
            .intents
            .iter()
            .map(|intent| (intent, model.score(&utterance, intent)))
            .filter(|(_, score)| *score > 0.0)
            .collect();

        // Stable sort keeps corpus order among equal scores
        scores.sort_by(|a, b| b.1.total_cmp(&a.1));

        let best = scores
            .first()
            .filter(|(_, score)| *score >= self.min_confidence);

        let mut entities: Vec<Entity> = Vec::new();
        if let Some(entity) = best.and_then(|(intent, _)| intent.entity.clone()) {
            entities.push(entity);
        }
        for entity in model.extractor.extract_tokens(&tokens) {
            if !entities.contains(&entity) {
                entities.push(entity);
            }
        }

        let to_match = |(intent, score): &(&TrainedIntent, f32)| IntentMatch {
            id: intent.id.clone(),
            confidence: *score,
        };

        let classification = Classification {
            language,
            intent: best.map(to_match),
            alternatives: scores.iter().skip(1).take(3).map(to_match).collect(),
            entities,
        };

        tracing::debug!(
            language = %language,
            intent = classification.intent_id().map(IntentId::as_str).unwrap_or("none"),
            confidence = classification.confidence(),
            entities = classification.entities.len(),
            "Classified utterance"
        );

        classification
    }

    /// Answer template of an intent in `language`
    pub fn answer(&self, language: Language, id: &IntentId) -> Option<&AnswerTemplate> {
        self.languages
            .get(&language)?
            .intents
            .iter()
            .find(|intent| &intent.id == id)
            .map(|intent| &intent.answer)
    }

    /// Localized display name of an entity value (`Latte` is `लाते` in Hindi)
    pub fn display_name(&self, language: Language, entity_type: &str, value: &str) -> Option<&str> {
        self.entities
            .get(entity_type)?
            .iter()
            .find(|v| v.value == value)?
            .names
            .get(&language)
            .map(String::as_str)
    }
}

fn train_language(
    corpus: &Corpus,
    expanded: &[ExpandedIntent],
    language: Language,
) -> Result<LanguageModel> {
    let mut intents: Vec<TrainedIntent> = Vec::new();
    let mut seen: BTreeMap<BTreeSet<String>, IntentId> = BTreeMap::new();

    for definition in expanded {
        let id = IntentId::new(definition.id.clone());
        let mut examples: Vec<BTreeSet<String>> = Vec::new();

        for example in definition.examples.get(&language).into_iter().flatten() {
            let set: BTreeSet<String> = tokenize(example).into_iter().collect();
            if set.is_empty() {
                continue;
            }
            if let Some(owner) = seen.get(&set) {
                if owner != &id {
                    return Err(NluError::DuplicateExample {
                        language,
                        example: example.clone(),
                        first: owner.to_string(),
                        second: id.to_string(),
                    });
                }
                continue;
            }
            seen.insert(set.clone(), id.clone());
            examples.push(set);
        }

        if examples.is_empty() {
            continue;
        }

        let answer = definition
            .answers
            .get(&language)
            .cloned()
            .ok_or_else(|| NluError::MissingAnswer {
                intent: definition.id.clone(),
                language,
            })?;

        intents.push(TrainedIntent {
            entity: implied_entity(corpus, &definition.id),
            id,
            examples,
            answer,
        });
    }

    // Document frequency counts intents, not examples
    let mut document_frequency: BTreeMap<String, usize> = BTreeMap::new();
    for intent in &intents {
        let vocabulary: BTreeSet<&String> = intent.examples.iter().flatten().collect();
        for token in vocabulary {
            *document_frequency.entry(token.clone()).or_default() += 1;
        }
    }

    let total = intents.len().max(1) as f32;
    let weights = document_frequency
        .into_iter()
        .map(|(token, df)| (token, (1.0 + total / df as f32).ln()))
        .collect();

    let mut extractor = EntityExtractor::new();
    for (entity_type, values) in &corpus.entities {
        for value in values {
            for form in value.surface_forms(language) {
                extractor.add_surface_form(entity_type, &value.value, form);
            }
        }
    }

    Ok(LanguageModel {
        intents,
        weights,
        unknown_weight: std::f32::consts::LN_2,
        extractor,
    })
}

/// Entity carried by an expanded intent id (`<base>.<Value>`)
fn implied_entity(corpus: &Corpus, id: &str) -> Option<Entity> {
    corpus
        .intents
        .iter()
        .filter_map(|definition| {
            let entity_type = definition.expand.as_ref()?;
            let value = id.strip_prefix(definition.id.as_str())?.strip_prefix('.')?;
            corpus
                .entity_values(entity_type)?
                .iter()
                .any(|v| v.value == value)
                .then(|| Entity::new(entity_type.as_str(), value))
        })
        .next()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::COFFEE_TYPE;

    fn model() -> IntentModel {
        IntentModel::train(&Corpus::builtin().unwrap(), 0.5).unwrap()
    }

    fn intent_of(model: &IntentModel, language: Language, text: &str) -> Option<String> {
        model
            .classify(language, text)
            .intent_id()
            .map(|id| id.as_str().to_string())
    }

    #[test]
    fn test_every_example_classifies_to_its_intent() {
        let corpus = Corpus::builtin().unwrap();
        let model = IntentModel::train(&corpus, 0.5).unwrap();

        for intent in corpus.expand().unwrap() {
            for (&language, examples) in &intent.examples {
                for example in examples {
                    assert_eq!(
                        intent_of(&model, language, example).as_deref(),
                        Some(intent.id.as_str()),
                        "{language}: '{example}'"
                    );
                }
            }
        }
    }

    #[test]
    fn test_coffee_type_intent() {
        let model = model();
        let result = model.classify(Language::English, "I want Latte");
        let id = result.intent_id().unwrap();

        assert_eq!(id.as_str(), "order.coffee.type.Latte");
        assert_eq!(id.coffee_type(), Some("Latte"));
        assert_eq!(result.entity(COFFEE_TYPE), Some(&Entity::coffee_type("Latte")));
        assert!((result.confidence() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_hindi_detect() {
        let model = model();
        assert_eq!(
            intent_of(&model, Language::Hindi, "मुझे कॉफ़ी चाहिए").as_deref(),
            Some("order.coffee.detect")
        );
    }

    #[test]
    fn test_hindi_spelling_variant_maps_to_canonical() {
        let model = model();
        let result = model.classify(Language::Hindi, "मुझे कैप्युचीनो चाहिए");
        assert_eq!(
            result.intent_id().map(IntentId::as_str),
            Some("order.coffee.type.Cappuccino")
        );
        assert_eq!(model.display_name(Language::Hindi, COFFEE_TYPE, "Cappuccino"), Some("कैपुचीनो"));
    }

    #[test]
    fn test_gibberish_has_no_intent() {
        let model = model();
        let result = model.classify(Language::English, "asdkj qwlekj");
        assert!(!result.is_match());
        assert!(result.alternatives.is_empty());
        assert!(result.entities.is_empty());

        assert!(!model.classify(Language::English, "").is_match());
    }

    #[test]
    fn test_language_isolation() {
        let model = model();
        // Hindi examples never match when classifying English, and vice versa
        assert!(!model.classify(Language::English, "मुझे कॉफ़ी चाहिए").is_match());
        assert!(!model.classify(Language::Hindi, "howdy").is_match());
    }

    #[test]
    fn test_fuzzy_match_above_threshold() {
        let model = model();
        assert_eq!(
            intent_of(&model, Language::English, "I want a latte please").as_deref(),
            Some("order.coffee.type.Latte")
        );
        assert_eq!(
            intent_of(&model, Language::English, "yes that's correct").as_deref(),
            Some("order.coffee.confirm")
        );
    }

    #[test]
    fn test_alternatives_ranked() {
        let model = model();
        let result = model.classify(Language::English, "I want a Latte");
        assert!(result.alternatives.len() <= 3);
        for pair in result.alternatives.windows(2) {
            assert!(pair[0].confidence >= pair[1].confidence);
        }
        if let Some(first) = result.alternatives.first() {
            assert!(first.confidence <= result.confidence());
        }
    }

    #[test]
    fn test_threshold_hides_weak_matches() {
        let strict = IntentModel::train(&Corpus::builtin().unwrap(), 1.0).unwrap();
        assert!(!strict.classify(Language::English, "I want a latte please").is_match());
        assert!(strict.classify(Language::English, "latte please").is_match());
    }

    #[test]
    fn test_ties_resolved_by_corpus_order() {
        let yaml = r#"
intents:
  - id: first
    examples:
      en: [alpha beta]
    answers: { en: one, hi: एक }
  - id: second
    examples:
      en: [alpha gamma]
    answers: { en: two, hi: दो }
"#;
        let model = IntentModel::train(&Corpus::from_yaml(yaml).unwrap(), 0.1).unwrap();
        let result = model.classify(Language::English, "alpha");
        assert_eq!(result.intent_id().map(IntentId::as_str), Some("first"));
        assert_eq!(result.alternatives[0].id.as_str(), "second");
    }

    #[test]
    fn test_duplicate_examples_rejected() {
        let yaml = r#"
intents:
  - id: greetings.hello
    examples:
      en: [hello there]
    answers: { en: Hi, hi: नमस्ते }
  - id: greetings.other
    examples:
      en: [There hello]
    answers: { en: Hey, hi: हाय }
"#;
        let err = IntentModel::train(&Corpus::from_yaml(yaml).unwrap(), 0.5).unwrap_err();
        assert!(matches!(
            err,
            NluError::DuplicateExample { language: Language::English, .. }
        ));
    }

    #[test]
    fn test_training_is_deterministic() {
        assert_eq!(model(), model());
    }

    #[test]
    fn test_answers_and_display_names() {
        let model = model();
        let id = IntentId::new("order.coffee.confirm");
        let answer = model.answer(Language::English, &id).unwrap();
        assert_eq!(answer.placeholder(), Some(COFFEE_TYPE));
        assert!(model.answer(Language::Hindi, &IntentId::new("order.tea")).is_none());

        assert_eq!(model.display_name(Language::Hindi, COFFEE_TYPE, "Latte"), Some("लाते"));
        assert_eq!(model.display_name(Language::English, COFFEE_TYPE, "Mocha"), None);
    }

    #[test]
    fn test_intent_id_coffee_type() {
        assert_eq!(IntentId::new("order.coffee.type.Espresso").coffee_type(), Some("Espresso"));
        assert_eq!(IntentId::new("order.coffee.type.").coffee_type(), None);
        assert_eq!(IntentId::new("order.coffee.confirm").coffee_type(), None);
    }
}
