//! Core traits for the voice agent system
//!
//! Speech devices are external capabilities. The agent only talks to them
//! through these contracts, which keeps the turn controller testable with
//! recording mocks and lets hosts plug in browser, desktop or console
//! implementations.
//!
//! # Trait Hierarchy
//!
//! ```text
//! Speech Processing:
//!   - RecognitionAdapter: microphone → RecognitionEvent stream
//!   - SynthesisAdapter: reply text → spoken audio, SynthesisEvent stream
//! ```

mod speech;

pub use speech::{
    RecognitionAdapter, RecognitionErrorKind, RecognitionEvent, RecognitionStartError,
    SynthesisAdapter, SynthesisEvent,
};
