//! Console speech adapters
//!
//! Stdin stands in for the microphone and stdout for the speaker. Each
//! non-command input line is delivered to the controller as one final
//! transcript.

use std::io::Write;

use barista_agent::{InputSender, TurnCommand};
use barista_core::{
    Language, RecognitionAdapter, RecognitionEvent, RecognitionStartError, SpeechError,
    SynthesisAdapter, SynthesisEvent, VoiceInfo, VoiceParams,
};

/// Recognizer whose sessions open and close instantly
pub struct ConsoleRecognizer {
    input: InputSender,
    language: Language,
    active: bool,
}

impl ConsoleRecognizer {
    pub fn new(input: InputSender) -> Self {
        Self {
            input,
            language: Language::default(),
            active: false,
        }
    }

    fn close(&mut self) {
        if std::mem::take(&mut self.active) {
            let _ = self.input.recognition(RecognitionEvent::End);
        }
    }
}

impl RecognitionAdapter for ConsoleRecognizer {
    fn configure(&mut self, language: Language) {
        self.language = language;
    }

    fn start(&mut self) -> Result<(), RecognitionStartError> {
        if self.active {
            return Err(RecognitionStartError::AlreadyStarted);
        }
        self.input
            .recognition(RecognitionEvent::Start)
            .map_err(|e| RecognitionStartError::Failed(e.to_string()))?;
        self.active = true;
        tracing::trace!(language = %self.language, "Console recognition started");
        Ok(())
    }

    fn stop(&mut self) {
        self.close();
    }

    fn abort(&mut self) {
        self.close();
    }

    fn name(&self) -> &str {
        "console"
    }
}

/// Synthesizer that prints replies
pub struct ConsoleSynthesizer {
    input: InputSender,
}

impl ConsoleSynthesizer {
    pub fn new(input: InputSender) -> Self {
        Self { input }
    }
}

impl SynthesisAdapter for ConsoleSynthesizer {
    fn speak(&mut self, text: &str, params: &VoiceParams) -> Result<(), SpeechError> {
        let _ = self.input.synthesis(SynthesisEvent::Start);

        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "barista> {text}")
            .and_then(|()| stdout.flush())
            .map_err(|e| SpeechError::SynthesisFailure(e.to_string()))?;
        tracing::trace!(
            voice = params.voice_id.as_deref().unwrap_or("default"),
            rate = params.rate,
            pitch = params.pitch,
            "Reply printed"
        );

        let _ = self.input.synthesis(SynthesisEvent::End);
        Ok(())
    }

    fn cancel(&mut self) {}

    fn voices(&self) -> Vec<VoiceInfo> {
        Language::all()
            .iter()
            .map(|language| VoiceInfo {
                id: format!("console-{}", language.code()),
                name: format!("Console {}", language.name()),
                locale: language.locale_tag().to_string(),
                local_service: true,
            })
            .collect()
    }

    fn name(&self) -> &str {
        "console"
    }
}

/// One line of console input
#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleLine {
    Utterance(String),
    Command(TurnCommand),
    Help,
    Quit,
    Invalid(String),
}

/// Parse a console input line; `None` for blank lines
pub fn parse_line(line: &str) -> Option<ConsoleLine> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let Some(command) = line.strip_prefix('/') else {
        return Some(ConsoleLine::Utterance(line.to_string()));
    };

    let mut parts = command.split_whitespace();
    let parsed = match (parts.next(), parts.next()) {
        (Some("quit" | "exit"), None) => ConsoleLine::Quit,
        (Some("help"), None) => ConsoleLine::Help,
        (Some("reset"), None) => ConsoleLine::Command(TurnCommand::Reset),
        (Some("lang"), Some(code)) => match Language::from_str_loose(code) {
            Some(language) => ConsoleLine::Command(TurnCommand::SetLanguage(language)),
            None => ConsoleLine::Invalid(format!("unsupported language '{code}'")),
        },
        _ => ConsoleLine::Invalid(format!("unknown command '/{command}'")),
    };
    Some(parsed)
}

pub const HELP: &str = "\
Type what you would say to the barista.
Commands:
  /lang en|hi   switch conversation language
  /reset        recover after a speech error
  /help         show this help
  /quit         leave";

#[cfg(test)]
mod tests {
    use super::*;
    use barista_agent::ControllerInput;

    #[test]
    fn test_parse_utterance() {
        assert_eq!(
            parse_line("  I want Latte "),
            Some(ConsoleLine::Utterance("I want Latte".into()))
        );
        assert_eq!(parse_line("   "), None);
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            parse_line("/lang hi"),
            Some(ConsoleLine::Command(TurnCommand::SetLanguage(Language::Hindi)))
        );
        assert_eq!(
            parse_line("/lang English"),
            Some(ConsoleLine::Command(TurnCommand::SetLanguage(Language::English)))
        );
        assert_eq!(parse_line("/reset"), Some(ConsoleLine::Command(TurnCommand::Reset)));
        assert_eq!(parse_line("/quit"), Some(ConsoleLine::Quit));
        assert_eq!(parse_line("/help"), Some(ConsoleLine::Help));
    }

    #[test]
    fn test_parse_invalid_commands() {
        assert!(matches!(parse_line("/lang fr"), Some(ConsoleLine::Invalid(_))));
        assert!(matches!(parse_line("/lang"), Some(ConsoleLine::Invalid(_))));
        assert!(matches!(parse_line("/order latte"), Some(ConsoleLine::Invalid(_))));
    }

    #[test]
    fn test_console_voices_cover_languages() {
        let (input, _rx) = barista_agent::input_channel();
        let synth = ConsoleSynthesizer::new(input);
        let voices = synth.voices();
        assert_eq!(voices.len(), Language::all().len());
        assert_eq!(
            barista_core::select_voice(&voices, Language::Hindi).map(|v| v.id.as_str()),
            Some("console-hi")
        );
    }

    #[test]
    fn test_recognizer_session_lifecycle() {
        let (input, mut rx) = barista_agent::input_channel();
        let mut recognizer = ConsoleRecognizer::new(input);

        recognizer.start().unwrap();
        assert_eq!(recognizer.start(), Err(RecognitionStartError::AlreadyStarted));
        recognizer.stop();
        recognizer.abort();

        let events: Vec<_> = std::iter::from_fn(|| rx.try_recv().ok()).collect();
        assert_eq!(
            events,
            vec![
                ControllerInput::Recognition(RecognitionEvent::Start),
                ControllerInput::Recognition(RecognitionEvent::End),
            ]
        );
    }
}
