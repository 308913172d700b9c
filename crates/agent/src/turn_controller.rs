//! Turn Controller
//!
//! Owns the conversation state machine and arbitrates exclusive use of the
//! microphone and the voice output.
//!
//! ## Flow
//!
//! ```text
//!            StartListening        Start event
//!   Idle ──────────────────▶ (recognizer.start) ──────────▶ Listening
//!    ▲                                                        │ End event
//!    │ Synthesis End/Error                                    ▼
//!   Speaking ◀──── speak(reply) ◀──── respond() ◀──────── Processing
//! ```
//!
//! All inputs (user commands, recognition events, synthesis events) arrive on
//! one unbounded channel and are handled strictly one at a time, so the
//! dialogue engine is never entered twice and slot memory is never shared.

use std::ops::ControlFlow;
use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::Instrument;

use barista_config::RetryPolicy;
use barista_core::{
    select_voice, ConversationSink, ConversationState, Language, RecognitionAdapter,
    RecognitionErrorKind, RecognitionEvent, RecognitionStartError, Severity, SpeechError,
    SynthesisAdapter, SynthesisEvent, VoiceParams, VoiceSettings,
};

use crate::{AgentError, ResponseEngine, SlotMemory};

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// User and settings commands
#[derive(Debug, Clone, PartialEq)]
pub enum TurnCommand {
    StartListening,
    StopListening,
    SetLanguage(Language),
    UpdateVoice(VoiceSettings),
    /// Leave the error state after the user fixed the environment
    Reset,
    Shutdown,
}

impl TurnCommand {
    pub fn name(&self) -> &'static str {
        match self {
            Self::StartListening => "start_listening",
            Self::StopListening => "stop_listening",
            Self::SetLanguage(_) => "set_language",
            Self::UpdateVoice(_) => "update_voice",
            Self::Reset => "reset",
            Self::Shutdown => "shutdown",
        }
    }
}

/// Everything the controller reacts to
#[derive(Debug, Clone, PartialEq)]
pub enum ControllerInput {
    Command(TurnCommand),
    Recognition(RecognitionEvent),
    Synthesis(SynthesisEvent),
}

impl From<TurnCommand> for ControllerInput {
    fn from(command: TurnCommand) -> Self {
        Self::Command(command)
    }
}

impl From<RecognitionEvent> for ControllerInput {
    fn from(event: RecognitionEvent) -> Self {
        Self::Recognition(event)
    }
}

impl From<SynthesisEvent> for ControllerInput {
    fn from(event: SynthesisEvent) -> Self {
        Self::Synthesis(event)
    }
}

/// Events published by the controller
#[derive(Debug, Clone, PartialEq)]
pub enum TurnEvent {
    StateChanged {
        old: ConversationState,
        new: ConversationState,
    },
    /// Live, non-final transcript
    InterimTranscript { text: String },
    FinalTranscript { text: String },
    /// Reply handed to the synthesizer
    Reply { text: String },
    /// User-visible error; `message` is localized
    Error { error: SpeechError, message: String },
    /// Command not valid in the current state
    CommandRejected {
        command: &'static str,
        state: ConversationState,
    },
}

/// Cloneable producer side of the controller's input channel
///
/// Adapters hold one of these to publish their events.
#[derive(Debug, Clone)]
pub struct InputSender {
    tx: mpsc::UnboundedSender<ControllerInput>,
}

impl InputSender {
    pub fn send(&self, input: impl Into<ControllerInput>) -> Result<(), AgentError> {
        self.tx.send(input.into()).map_err(|_| AgentError::ChannelClosed)
    }

    pub fn command(&self, command: TurnCommand) -> Result<(), AgentError> {
        self.send(command)
    }

    pub fn recognition(&self, event: RecognitionEvent) -> Result<(), AgentError> {
        self.send(event)
    }

    pub fn synthesis(&self, event: SynthesisEvent) -> Result<(), AgentError> {
        self.send(event)
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Create the controller input channel
pub fn input_channel() -> (InputSender, mpsc::UnboundedReceiver<ControllerInput>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (InputSender { tx }, rx)
}

/// Conversation state machine for one session
pub struct TurnController {
    session_id: String,
    recognizer: Option<Box<dyn RecognitionAdapter>>,
    synthesizer: Box<dyn SynthesisAdapter>,
    sink: Box<dyn ConversationSink>,
    engine: Arc<dyn ResponseEngine>,
    slots: SlotMemory,
    language: Language,
    voice: VoiceSettings,
    /// Voice picked for the current language when the user chose none
    selected_voice: Option<String>,
    retry: RetryPolicy,
    interim: String,
    transcript: Option<String>,
    /// End event of an aborted session that must not complete a turn
    discard_end: bool,
    /// Blocking error while in `Error`
    error: Option<SpeechError>,
    /// Fatal error raised mid-turn, applied once the turn is over
    pending_error: Option<SpeechError>,
    state_tx: watch::Sender<ConversationState>,
    event_tx: broadcast::Sender<TurnEvent>,
}

impl TurnController {
    /// Create a controller
    ///
    /// A missing recognizer means the host has no recognition capability; the
    /// controller then starts in `Error` and can never leave it.
    pub fn new(
        recognizer: Option<Box<dyn RecognitionAdapter>>,
        synthesizer: Box<dyn SynthesisAdapter>,
        sink: Box<dyn ConversationSink>,
        engine: Arc<dyn ResponseEngine>,
    ) -> Self {
        let (error, initial) = match recognizer {
            Some(_) => (None, ConversationState::Idle),
            None => (
                Some(SpeechError::EnvironmentUnsupported),
                ConversationState::Error,
            ),
        };
        let (state_tx, _) = watch::channel(initial);
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        let mut controller = Self {
            session_id: uuid::Uuid::new_v4().to_string(),
            recognizer,
            synthesizer,
            sink,
            engine,
            slots: SlotMemory::new(),
            language: Language::default(),
            voice: VoiceSettings::default(),
            selected_voice: None,
            retry: RetryPolicy::default(),
            interim: String::new(),
            transcript: None,
            discard_end: false,
            error,
            pending_error: None,
            state_tx,
            event_tx,
        };
        controller.select_voice();
        controller
    }

    pub fn with_language(mut self, language: Language) -> Self {
        self.language = language;
        self.select_voice();
        self
    }

    pub fn with_voice(mut self, voice: VoiceSettings) -> Self {
        self.voice = voice.clamped();
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = session_id.into();
        self
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn state(&self) -> ConversationState {
        *self.state_tx.borrow()
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn slots(&self) -> &SlotMemory {
        &self.slots
    }

    /// Current blocking error, if in `Error`
    pub fn error(&self) -> Option<&SpeechError> {
        self.error.as_ref()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TurnEvent> {
        self.event_tx.subscribe()
    }

    pub fn watch_state(&self) -> watch::Receiver<ConversationState> {
        self.state_tx.subscribe()
    }

    /// Parameters for the next utterance
    pub fn voice_params(&self) -> VoiceParams {
        let mut params = VoiceParams::new(self.language, &self.voice);
        if params.voice_id.is_none() {
            params.voice_id = self.selected_voice.clone();
        }
        params
    }

    /// Run the controller on its own task
    pub fn spawn(
        self,
        input: InputSender,
        rx: mpsc::UnboundedReceiver<ControllerInput>,
    ) -> TurnHandle {
        let state = self.watch_state();
        let events = self.event_tx.clone();
        let task = tokio::spawn(self.run(rx));
        TurnHandle {
            input,
            state,
            events,
            task,
        }
    }

    /// Consume inputs until shutdown or until every sender is dropped
    pub async fn run(mut self, mut rx: mpsc::UnboundedReceiver<ControllerInput>) {
        let span = tracing::info_span!("turn_controller", session_id = %self.session_id);
        async move {
            tracing::info!(language = %self.language, "Turn controller started");
            if let Some(error) = self.error.clone() {
                tracing::error!(error = %error, "Speech recognition unavailable");
                self.report(&error);
            }

            while let Some(input) = rx.recv().await {
                if self.handle(input).await.is_break() {
                    break;
                }
            }

            self.teardown();
            tracing::info!("Turn controller stopped");
        }
        .instrument(span)
        .await
    }

    /// Handle one input to completion
    pub async fn handle(&mut self, input: ControllerInput) -> ControlFlow<()> {
        match input {
            ControllerInput::Command(command) => return self.handle_command(command).await,
            ControllerInput::Recognition(event) => self.handle_recognition(event).await,
            ControllerInput::Synthesis(event) => self.handle_synthesis(event),
        }
        ControlFlow::Continue(())
    }

    async fn handle_command(&mut self, command: TurnCommand) -> ControlFlow<()> {
        tracing::debug!(command = command.name(), state = %self.state(), "Command received");

        match command {
            TurnCommand::StartListening => self.start_listening().await,
            TurnCommand::StopListening => self.stop_listening(),
            TurnCommand::SetLanguage(language) => self.set_language(language).await,
            TurnCommand::UpdateVoice(voice) => {
                self.voice = voice.clamped();
                tracing::info!(
                    voice_id = self.voice.voice_id.as_deref().unwrap_or("auto"),
                    rate = self.voice.rate,
                    pitch = self.voice.pitch,
                    "Voice settings updated"
                );
            }
            TurnCommand::Reset => self.reset(),
            TurnCommand::Shutdown => {
                self.teardown();
                return ControlFlow::Break(());
            }
        }
        ControlFlow::Continue(())
    }

    async fn start_listening(&mut self) {
        if self.state() != ConversationState::Idle {
            self.reject(&TurnCommand::StartListening);
            return;
        }

        match self.request_recognition().await {
            Ok(()) => tracing::debug!(language = %self.language, "Recognition requested"),
            Err(error) => self.fail(error),
        }
    }

    /// Start the recognizer, applying the retry policy
    async fn request_recognition(&mut self) -> Result<(), SpeechError> {
        let retry = self.retry;
        let language = self.language;
        let recognizer = self
            .recognizer
            .as_mut()
            .ok_or(SpeechError::EnvironmentUnsupported)?;

        recognizer.configure(language);

        let mut attempt = 1;
        loop {
            match recognizer.start() {
                Ok(()) => return Ok(()),
                Err(RecognitionStartError::Unsupported) => {
                    return Err(SpeechError::EnvironmentUnsupported)
                }
                Err(e) if e.is_retriable() && retry.should_retry(attempt) => {
                    tracing::warn!(
                        attempt,
                        error = %e,
                        delay_ms = retry.delay_ms,
                        "Recognition start failed, retrying"
                    );
                    recognizer.stop();
                    tokio::time::sleep(retry.delay()).await;
                    attempt += 1;
                }
                Err(e) => {
                    tracing::error!(attempt, error = %e, "Recognition start failed");
                    return Err(SpeechError::RecognitionStartFailed { attempts: attempt });
                }
            }
        }
    }

    fn stop_listening(&mut self) {
        if self.state() != ConversationState::Listening {
            self.reject(&TurnCommand::StopListening);
            return;
        }
        // The End event completes the turn
        if let Some(recognizer) = self.recognizer.as_mut() {
            recognizer.stop();
        }
    }

    async fn set_language(&mut self, language: Language) {
        let previous = self.language;
        self.language = language;
        // A voice chosen for the old language would mispronounce the new one
        self.voice.voice_id = None;
        self.select_voice();
        tracing::info!(from = %previous, to = %language, "Conversation language changed");

        if self.state() != ConversationState::Listening {
            return;
        }

        if let Some(recognizer) = self.recognizer.as_mut() {
            recognizer.abort();
        }
        self.discard_end = true;

        // The utterance was spoken in the old language
        self.finish_turn(previous).await;

        if let Some(recognizer) = self.recognizer.as_mut() {
            recognizer.configure(language);
        }
    }

    fn reset(&mut self) {
        if self.state() != ConversationState::Error {
            self.pending_error = None;
            tracing::debug!("Reset outside error state");
            return;
        }

        match self.error.clone() {
            Some(error) if !error.is_resettable() => {
                tracing::warn!(error = %error, "Error cannot be reset");
                self.report(&error);
                self.reject(&TurnCommand::Reset);
            }
            _ => {
                self.error = None;
                self.pending_error = None;
                tracing::info!("Recovered from error state");
                self.set_state(ConversationState::Idle);
            }
        }
    }

    async fn handle_recognition(&mut self, event: RecognitionEvent) {
        match event {
            RecognitionEvent::Start => self.on_recognition_start(),
            RecognitionEvent::Result { text, is_final } => self.on_result(text, is_final),
            RecognitionEvent::Error { kind } => self.on_recognition_error(kind),
            RecognitionEvent::End => {
                if std::mem::take(&mut self.discard_end) {
                    tracing::debug!("Ignoring end of aborted recognition session");
                    return;
                }
                if self.state() == ConversationState::Listening {
                    self.finish_turn(self.language).await;
                }
            }
        }
    }

    fn on_recognition_start(&mut self) {
        self.discard_end = false;
        match self.state() {
            ConversationState::Idle => {
                self.interim.clear();
                self.transcript = None;
                self.set_state(ConversationState::Listening);
            }
            ConversationState::Listening => {}
            state => {
                // Never keep the microphone open while busy or speaking
                tracing::warn!(state = %state, "Unexpected recognition start, aborting");
                if let Some(recognizer) = self.recognizer.as_mut() {
                    recognizer.abort();
                }
                self.discard_end = true;
            }
        }
    }

    fn on_result(&mut self, text: String, is_final: bool) {
        if self.state() != ConversationState::Listening {
            tracing::debug!(is_final, "Dropping transcript outside listening state");
            return;
        }

        if is_final {
            tracing::debug!(text = %text, "Final transcript");
            self.interim.clear();
            self.transcript = Some(text.clone());
            let _ = self.event_tx.send(TurnEvent::FinalTranscript { text });
        } else {
            self.interim.clone_from(&text);
            let _ = self.event_tx.send(TurnEvent::InterimTranscript { text });
        }
    }

    fn on_recognition_error(&mut self, kind: RecognitionErrorKind) {
        metrics::counter!("barista_recognition_errors_total", "kind" => kind.as_str().to_string())
            .increment(1);

        let error = kind.into_speech_error(self.language);
        match error.severity() {
            Severity::Silent => tracing::debug!(error = %error, "Ignoring recognition error"),
            Severity::Fatal => self.fail(error),
            Severity::Recoverable => {
                tracing::warn!(error = %error, "Recognition error");
                self.report(&error);
            }
        }
    }

    fn handle_synthesis(&mut self, event: SynthesisEvent) {
        match event {
            SynthesisEvent::Start => tracing::debug!("Synthesis started"),
            SynthesisEvent::End => {
                if self.state() == ConversationState::Speaking {
                    self.return_to_idle();
                }
            }
            SynthesisEvent::Error { message } => {
                metrics::counter!("barista_synthesis_errors_total").increment(1);
                tracing::warn!(error = %message, "Synthesis error");
                if self.state() == ConversationState::Speaking {
                    self.report(&SpeechError::SynthesisFailure(message));
                    self.return_to_idle();
                }
            }
        }
    }

    /// Close the listening phase: reply to a final transcript or go idle
    async fn finish_turn(&mut self, language: Language) {
        self.interim.clear();
        let transcript = self
            .transcript
            .take()
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty());

        let Some(text) = transcript else {
            tracing::debug!("Recognition ended without transcript");
            self.set_state(ConversationState::Idle);
            return;
        };

        metrics::counter!("barista_turns_total").increment(1);
        self.sink.append_user_message(&text);
        self.set_state(ConversationState::Processing);

        let reply = self.engine.respond(language, &text, &mut self.slots).await;
        tracing::info!(language = %language, user = %text, reply = %reply, "Turn processed");

        self.sink.append_bot_message(&reply);
        self.speak(reply);
    }

    fn speak(&mut self, reply: String) {
        self.set_state(ConversationState::Speaking);

        let params = self.voice_params();
        self.synthesizer.cancel();
        let result = self.synthesizer.speak(&reply, &params);
        let _ = self.event_tx.send(TurnEvent::Reply { text: reply });

        if let Err(e) = result {
            metrics::counter!("barista_synthesis_errors_total").increment(1);
            let error = match e {
                SpeechError::SynthesisFailure(_) => e,
                other => SpeechError::SynthesisFailure(other.to_string()),
            };
            tracing::warn!(error = %error, synthesizer = self.synthesizer.name(), "Failed to speak reply");
            self.report(&error);
            self.return_to_idle();
        }
    }

    fn return_to_idle(&mut self) {
        self.set_state(ConversationState::Idle);
        if let Some(error) = self.pending_error.take() {
            self.fail(error);
        }
    }

    /// Enter `Error` for a fatal speech failure
    fn fail(&mut self, error: SpeechError) {
        match self.state() {
            ConversationState::Processing | ConversationState::Speaking => {
                tracing::warn!(error = %error, "Deferring fatal error until the turn ends");
                self.pending_error = Some(error);
                return;
            }
            ConversationState::Listening => {
                if let Some(recognizer) = self.recognizer.as_mut() {
                    recognizer.abort();
                }
                self.interim.clear();
                self.transcript = None;
            }
            ConversationState::Idle | ConversationState::Error => {}
        }

        tracing::error!(error = %error, "Speech capability failure");
        self.report(&error);
        if self.error.as_ref().map_or(true, SpeechError::is_resettable) {
            self.error = Some(error);
        }
        self.set_state(ConversationState::Error);
    }

    fn report(&self, error: &SpeechError) {
        let _ = self.event_tx.send(TurnEvent::Error {
            error: error.clone(),
            message: error.user_message(self.language),
        });
    }

    fn reject(&self, command: &TurnCommand) {
        let state = self.state();
        tracing::debug!(command = command.name(), state = %state, "Command rejected");
        let _ = self.event_tx.send(TurnEvent::CommandRejected {
            command: command.name(),
            state,
        });
    }

    fn select_voice(&mut self) {
        let voices = self.synthesizer.voices();
        self.selected_voice = select_voice(&voices, self.language).map(|v| v.id.clone());
        tracing::debug!(
            language = %self.language,
            voice = self.selected_voice.as_deref().unwrap_or("default"),
            "Voice selected"
        );
    }

    fn set_state(&mut self, new: ConversationState) {
        let old = self.state();
        if old == new {
            return;
        }
        if !old.can_transition_to(new) {
            tracing::warn!(from = %old, to = %new, "Unexpected state transition");
        }

        self.state_tx.send_replace(new);
        tracing::debug!(from = %old, to = %new, "State changed");
        let _ = self.event_tx.send(TurnEvent::StateChanged { old, new });
    }

    fn teardown(&mut self) {
        if let Some(recognizer) = self.recognizer.as_mut() {
            recognizer.abort();
        }
        self.synthesizer.cancel();
    }
}

/// Handle to a spawned controller task
pub struct TurnHandle {
    input: InputSender,
    state: watch::Receiver<ConversationState>,
    events: broadcast::Sender<TurnEvent>,
    task: JoinHandle<()>,
}

impl TurnHandle {
    pub fn sender(&self) -> InputSender {
        self.input.clone()
    }

    pub fn send(&self, command: TurnCommand) -> Result<(), AgentError> {
        self.input.command(command)
    }

    pub fn state(&self) -> ConversationState {
        *self.state.borrow()
    }

    pub fn watch_state(&self) -> watch::Receiver<ConversationState> {
        self.state.clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TurnEvent> {
        self.events.subscribe()
    }

    /// Wait until the controller reaches `target`
    pub async fn wait_for(&self, target: ConversationState) -> Result<(), AgentError> {
        let mut state = self.state.clone();
        state
            .wait_for(|s| *s == target)
            .await
            .map(|_| ())
            .map_err(|_| AgentError::ChannelClosed)
    }

    /// Stop the controller and wait for its task to finish
    pub async fn shutdown(self) -> Result<(), AgentError> {
        // The task may already have exited
        let _ = self.input.command(TurnCommand::Shutdown);
        self.task
            .await
            .map_err(|e| AgentError::TaskFailed(e.to_string()))
    }
}
