//! Dialogue Engine
//!
//! Turns a finalized utterance into a localized reply:
//! 1. classify against the intent model of the conversation language
//! 2. remember a freshly ordered coffee type in the slot memory
//! 3. render the intent's answer, filling `{{coffeeType}}` from the fresh
//!    value or, failing that, from slot memory
//!
//! `respond` never fails. Unknown input yields the "didn't understand" reply
//! and internal failures yield the generic processing failure reply.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use barista_config::AgentConfig;
use barista_core::{localize, Language, MessageKey};
use barista_text_processing::{Classification, Corpus, IntentModel, COFFEE_TYPE};

use crate::{AgentError, SlotMemory};

/// Produces the bot reply for one user utterance
#[async_trait]
pub trait ResponseEngine: Send + Sync {
    /// Reply to `text`, updating `slots` as a side effect
    async fn respond(&self, language: Language, text: &str, slots: &mut SlotMemory) -> String;
}

/// Result of a training request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrainOutcome {
    Trained,
    AlreadyTrained,
}

/// Where the intent corpus comes from
#[derive(Debug, Clone)]
enum CorpusSource {
    Builtin,
    File(PathBuf),
    Inline(Box<Corpus>),
}

impl CorpusSource {
    fn load(&self) -> Result<Corpus, AgentError> {
        let corpus = match self {
            Self::Builtin => Corpus::builtin()?,
            Self::File(path) => Corpus::from_path(path)?,
            Self::Inline(corpus) => corpus.as_ref().clone(),
        };
        Ok(corpus)
    }
}

/// Intent-model backed dialogue engine with lazy training
pub struct DialogueEngine {
    source: CorpusSource,
    min_confidence: f32,
    model: Mutex<Option<Arc<IntentModel>>>,
}

impl DialogueEngine {
    /// Engine over the built-in coffee corpus
    pub fn new(min_confidence: f32) -> Self {
        Self::with_source(CorpusSource::Builtin, min_confidence)
    }

    pub fn from_config(config: &AgentConfig) -> Self {
        let source = match &config.corpus_path {
            Some(path) => CorpusSource::File(path.clone()),
            None => CorpusSource::Builtin,
        };
        Self::with_source(source, config.min_confidence)
    }

    pub fn with_corpus(corpus: Corpus, min_confidence: f32) -> Self {
        Self::with_source(CorpusSource::Inline(Box::new(corpus)), min_confidence)
    }

    pub fn from_path(path: impl Into<PathBuf>, min_confidence: f32) -> Self {
        Self::with_source(CorpusSource::File(path.into()), min_confidence)
    }

    fn with_source(source: CorpusSource, min_confidence: f32) -> Self {
        Self {
            source,
            min_confidence,
            model: Mutex::new(None),
        }
    }

    /// Train the intent model unless it already is
    pub async fn train(&self) -> Result<TrainOutcome, AgentError> {
        let mut guard = self.model.lock().await;
        if guard.is_some() {
            tracing::info!("Intent model is already trained");
            return Ok(TrainOutcome::AlreadyTrained);
        }
        *guard = Some(Arc::new(self.build()?));
        Ok(TrainOutcome::Trained)
    }

    pub async fn is_trained(&self) -> bool {
        self.model.lock().await.is_some()
    }

    /// The trained model, if training has happened
    pub async fn trained_model(&self) -> Option<Arc<IntentModel>> {
        self.model.lock().await.clone()
    }

    fn build(&self) -> Result<IntentModel, AgentError> {
        let corpus = self.source.load()?;
        let model = IntentModel::train(&corpus, self.min_confidence)?;
        Ok(model)
    }

    async fn model(&self) -> Result<Arc<IntentModel>, AgentError> {
        let mut guard = self.model.lock().await;
        if let Some(model) = guard.as_ref() {
            return Ok(Arc::clone(model));
        }
        let model = Arc::new(self.build()?);
        *guard = Some(Arc::clone(&model));
        Ok(model)
    }

    /// Classify `text`, training first if needed
    pub async fn classify(&self, language: Language, text: &str) -> Result<Classification, AgentError> {
        let model = self.model().await?;
        Ok(model.classify(language, text))
    }

    /// Render the answer of a classification without touching slot memory
    ///
    /// Falls back to the "didn't understand" reply when nothing matched.
    pub async fn render(
        &self,
        language: Language,
        classification: &Classification,
        slots: &SlotMemory,
    ) -> Result<String, AgentError> {
        let model = self.model().await?;
        Ok(render_answer(&model, language, classification, slots)
            .unwrap_or_else(|| localize(MessageKey::DidntUnderstand, language).to_string()))
    }

    async fn try_respond(
        &self,
        language: Language,
        text: &str,
        slots: &mut SlotMemory,
    ) -> Result<Option<String>, AgentError> {
        let model = self.model().await?;
        let classification = model.classify(language, text);

        let Some(intent) = classification.intent_id() else {
            return Ok(None);
        };

        if let Some(value) = intent.coffee_type() {
            let previous = slots.set_coffee_type(value);
            tracing::info!(
                coffee_type = value,
                previous = previous.as_deref().unwrap_or("none"),
                "Coffee type remembered"
            );
        }

        Ok(render_answer(&model, language, &classification, slots))
    }
}

#[async_trait]
impl ResponseEngine for DialogueEngine {
    async fn respond(&self, language: Language, text: &str, slots: &mut SlotMemory) -> String {
        match self.try_respond(language, text, slots).await {
            Ok(Some(reply)) => reply,
            Ok(None) => {
                tracing::debug!(language = %language, text, "No intent matched");
                metrics::counter!("barista_dialogue_fallbacks_total", "reason" => "no_match")
                    .increment(1);
                localize(MessageKey::DidntUnderstand, language).to_string()
            }
            Err(e) => {
                tracing::error!(error = %e, language = %language, "Failed to generate response");
                metrics::counter!("barista_dialogue_fallbacks_total", "reason" => "error")
                    .increment(1);
                localize(MessageKey::ProcessingFailed, language).to_string()
            }
        }
    }
}

/// Answer text for the winning intent, `None` when there is nothing to say
fn render_answer(
    model: &IntentModel,
    language: Language,
    classification: &Classification,
    slots: &SlotMemory,
) -> Option<String> {
    let intent = classification.intent_id()?;
    let template = model.answer(language, intent)?;

    let value = template.placeholder().and_then(|slot| {
        // A coffee type carried by this very intent beats the remembered one
        let canonical = if slot == COFFEE_TYPE && intent.coffee_type().is_some() {
            classification
                .entity(COFFEE_TYPE)
                .map(|e| e.value.as_str())
                .or_else(|| intent.coffee_type())
        } else {
            slots.get(slot)
        }?;
        Some(model.display_name(language, slot, canonical).unwrap_or(canonical))
    });

    let reply = template.render(value);
    (!reply.trim().is_empty()).then_some(reply)
}
