//! Conversational core of the barista voice agent
//!
//! Features:
//! - Turn controller: the Idle → Listening → Processing → Speaking state machine
//!   arbitrating microphone and voice output
//! - Dialogue engine: intent classification, slot memory, localized answers
//! - Per-conversation slot memory
//!
//! Adapters publish events onto a single ordered channel; the controller task
//! handles them one at a time.

pub mod dialogue;
pub mod slots;
pub mod turn_controller;

pub use dialogue::{DialogueEngine, ResponseEngine, TrainOutcome};
pub use slots::SlotMemory;
pub use turn_controller::{
    input_channel, ControllerInput, InputSender, TurnCommand, TurnController, TurnEvent, TurnHandle,
};

use barista_text_processing::NluError;
use thiserror::Error;

/// Agent errors
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Training error: {0}")]
    Training(#[from] NluError),

    #[error("Controller task failed: {0}")]
    TaskFailed(String),

    #[error("Controller channel closed")]
    ChannelClosed,
}
