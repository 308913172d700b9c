//! Integration tests for full conversation turns (recognition -> dialogue -> synthesis)
//!
//! The adapters loop their events back into the controller channel the way a
//! real speech host would.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::broadcast;
use tokio::time::timeout;

use barista_agent::{
    input_channel, DialogueEngine, InputSender, TurnCommand, TurnController, TurnEvent, TurnHandle,
};
use barista_core::{
    localize, ConversationState, Language, MessageKey, MessageLog, MessageRole, RecognitionAdapter, RecognitionErrorKind,
    RecognitionEvent, RecognitionStartError, SpeechError, SynthesisAdapter, SynthesisEvent,
    VoiceInfo, VoiceParams,
};

const WAIT: Duration = Duration::from_secs(2);

/// Recognizer that "hears" scripted utterances
struct ScriptedRecognizer {
    input: InputSender,
    utterances: Arc<Mutex<VecDeque<RecognitionEvent>>>,
    languages: Arc<Mutex<Vec<Language>>>,
}

impl RecognitionAdapter for ScriptedRecognizer {
    fn configure(&mut self, language: Language) {
        self.languages.lock().push(language);
    }

    fn start(&mut self) -> Result<(), RecognitionStartError> {
        self.input
            .recognition(RecognitionEvent::Start)
            .map_err(|e| RecognitionStartError::Failed(e.to_string()))?;
        if let Some(event) = self.utterances.lock().pop_front() {
            let _ = self.input.recognition(event);
        }
        Ok(())
    }

    fn stop(&mut self) {
        let _ = self.input.recognition(RecognitionEvent::End);
    }

    fn abort(&mut self) {
        let _ = self.input.recognition(RecognitionEvent::End);
    }
}

/// Synthesizer that finishes speaking immediately
struct InstantSynthesizer {
    input: InputSender,
    spoken: Arc<Mutex<Vec<(String, VoiceParams)>>>,
}

impl SynthesisAdapter for InstantSynthesizer {
    fn speak(&mut self, text: &str, params: &VoiceParams) -> Result<(), SpeechError> {
        self.spoken.lock().push((text.to_string(), params.clone()));
        let _ = self.input.synthesis(SynthesisEvent::Start);
        let _ = self.input.synthesis(SynthesisEvent::End);
        Ok(())
    }

    fn cancel(&mut self) {}

    fn voices(&self) -> Vec<VoiceInfo> {
        vec![
            VoiceInfo {
                id: "google-hi".into(),
                name: "Google हिन्दी".into(),
                locale: "hi-IN".into(),
                local_service: false,
            },
            VoiceInfo {
                id: "samantha".into(),
                name: "Samantha".into(),
                locale: "en-US".into(),
                local_service: true,
            },
        ]
    }
}

struct Session {
    handle: TurnHandle,
    events: broadcast::Receiver<TurnEvent>,
    utterances: Arc<Mutex<VecDeque<RecognitionEvent>>>,
    languages: Arc<Mutex<Vec<Language>>>,
    spoken: Arc<Mutex<Vec<(String, VoiceParams)>>>,
    log: MessageLog,
}

impl Session {
    fn start() -> Self {
        let (input, rx) = input_channel();
        let utterances = Arc::new(Mutex::new(VecDeque::new()));
        let languages = Arc::new(Mutex::new(Vec::new()));
        let spoken = Arc::new(Mutex::new(Vec::new()));
        let log = MessageLog::new();

        let controller = TurnController::new(
            Some(Box::new(ScriptedRecognizer {
                input: input.clone(),
                utterances: Arc::clone(&utterances),
                languages: Arc::clone(&languages),
            })),
            Box::new(InstantSynthesizer {
                input: input.clone(),
                spoken: Arc::clone(&spoken),
            }),
            Box::new(log.clone()),
            Arc::new(DialogueEngine::new(0.5)),
        );
        let events = controller.subscribe();
        let handle = controller.spawn(input, rx);

        Self {
            handle,
            events,
            utterances,
            languages,
            spoken,
            log,
        }
    }

    /// Speak one utterance and return the agent's reply
    async fn say(&mut self, text: &str) -> String {
        self.utterances
            .lock()
            .push_back(RecognitionEvent::final_result(text));

        self.handle.send(TurnCommand::StartListening).unwrap();
        timeout(WAIT, self.handle.wait_for(ConversationState::Listening))
            .await
            .unwrap()
            .unwrap();
        self.handle.send(TurnCommand::StopListening).unwrap();

        let mut reply = None;
        loop {
            let event = timeout(WAIT, self.events.recv()).await.unwrap().unwrap();
            match event {
                TurnEvent::Reply { text } => reply = Some(text),
                TurnEvent::StateChanged {
                    new: ConversationState::Idle,
                    ..
                } if reply.is_some() => break,
                _ => {}
            }
        }
        reply.unwrap()
    }
}

#[tokio::test]
async fn test_english_order_conversation() {
    let mut session = Session::start();

    let reply = session.say("Hello").await;
    assert_eq!(reply, "Hello there! How can I help you today?");

    let reply = session.say("I want coffee").await;
    assert!(reply.contains("What type of coffee"));

    let reply = session.say("I want Latte").await;
    assert_eq!(reply, "Got it! A Latte. Is that correct?");

    let reply = session.say("Yes").await;
    assert!(reply.contains("Latte"));

    let messages = session.log.messages();
    assert_eq!(messages.len(), 8);
    assert_eq!(messages[4].role, MessageRole::User);
    assert_eq!(messages[4].text, "I want Latte");
    assert_eq!(messages[5].role, MessageRole::Bot);

    let spoken = session.spoken.lock().clone();
    assert_eq!(spoken.len(), 4);
    assert_eq!(spoken[0].1.voice_id.as_deref(), Some("samantha"));

    session.handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_hindi_conversation_after_language_switch() {
    let mut session = Session::start();

    session.handle.send(TurnCommand::SetLanguage(Language::Hindi)).unwrap();

    let reply = session.say("मुझे लाते चाहिए").await;
    assert_eq!(reply, "आपने लाते कॉफ़ी ऑर्डर की है। क्या यह सही है?");

    let reply = session.say("हां").await;
    assert!(reply.contains("लाते"));

    assert_eq!(session.languages.lock().clone(), vec![Language::Hindi, Language::Hindi]);
    let spoken = session.spoken.lock().clone();
    assert_eq!(spoken[0].1.language, Language::Hindi);
    assert_eq!(spoken[0].1.voice_id.as_deref(), Some("google-hi"));

    session.handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_unknown_utterance_gets_localized_fallback() {
    let mut session = Session::start();

    let reply = session.say("asdkj qwlekj").await;
    assert_eq!(reply, localize(MessageKey::DidntUnderstand, Language::English));
    assert_eq!(session.handle.state(), ConversationState::Idle);

    session.handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_permission_denied_blocks_until_reset() {
    let mut session = Session::start();
    session
        .utterances
        .lock()
        .push_back(RecognitionEvent::error(RecognitionErrorKind::NotAllowed));

    session.handle.send(TurnCommand::StartListening).unwrap();
    timeout(WAIT, session.handle.wait_for(ConversationState::Error))
        .await
        .unwrap()
        .unwrap();

    let mut saw_error = false;
    while let Ok(Ok(event)) = timeout(Duration::from_millis(50), session.events.recv()).await {
        if let TurnEvent::Error { error, message } = event {
            assert_eq!(error, SpeechError::PermissionDenied);
            assert!(!message.is_empty());
            saw_error = true;
        }
    }
    assert!(saw_error);

    session.handle.send(TurnCommand::StartListening).unwrap();
    let rejected = timeout(WAIT, session.events.recv()).await.unwrap().unwrap();
    assert_eq!(
        rejected,
        TurnEvent::CommandRejected {
            command: "start_listening",
            state: ConversationState::Error,
        }
    );

    session.handle.send(TurnCommand::Reset).unwrap();
    timeout(WAIT, session.handle.wait_for(ConversationState::Idle))
        .await
        .unwrap()
        .unwrap();

    let reply = session.say("bye").await;
    assert!(!reply.is_empty());

    session.handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_unsupported_environment_reports_on_start() {
    let (input, rx) = input_channel();
    let controller = TurnController::new(
        None,
        Box::new(InstantSynthesizer {
            input: input.clone(),
            spoken: Arc::new(Mutex::new(Vec::new())),
        }),
        Box::new(MessageLog::new()),
        Arc::new(DialogueEngine::new(0.5)),
    );
    let mut events = controller.subscribe();
    let handle = controller.spawn(input, rx);

    let event = timeout(WAIT, events.recv()).await.unwrap().unwrap();
    assert!(matches!(
        event,
        TurnEvent::Error {
            error: SpeechError::EnvironmentUnsupported,
            ..
        }
    ));
    assert_eq!(handle.state(), ConversationState::Error);

    handle.shutdown().await.unwrap();
}
