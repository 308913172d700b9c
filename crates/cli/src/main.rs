//! Barista console entry point
//!
//! Runs one spoken-style conversation over stdin/stdout using the same turn
//! controller and dialogue engine as a voice front end.

mod console;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use barista_agent::{
    input_channel, DialogueEngine, InputSender, TurnCommand, TurnController, TurnEvent, TurnHandle,
};
use barista_config::{load_settings, Settings};
use barista_core::{localize, ConversationState, MessageKey, MessageLog, RecognitionEvent};

use console::{parse_line, ConsoleLine, ConsoleRecognizer, ConsoleSynthesizer, HELP};

/// Upper bound for one turn to settle back to idle
const TURN_TIMEOUT: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Priority: env vars > config/{env}.yaml > config/default.yaml > defaults
    let env = std::env::var("BARISTA_ENV").ok();
    let config = match load_settings(env.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            // Tracing not yet initialized
            eprintln!("Warning: Failed to load config: {}. Using defaults.", e);
            Settings::default()
        }
    };

    init_tracing(&config);

    tracing::info!("Starting Barista v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        environment = ?config.environment,
        config_env = env.as_deref().unwrap_or("default"),
        language = %config.agent.language,
        min_confidence = config.agent.min_confidence,
        "Configuration loaded"
    );

    let engine = Arc::new(DialogueEngine::from_config(&config.agent));
    if let Err(e) = engine.train().await {
        // Replies degrade to the generic failure message
        tracing::error!(error = %e, "Failed to train intent model");
    }

    let (input, rx) = input_channel();
    let log = MessageLog::new();
    let controller = TurnController::new(
        Some(Box::new(ConsoleRecognizer::new(input.clone()))),
        Box::new(ConsoleSynthesizer::new(input.clone())),
        Box::new(log.clone()),
        engine,
    )
    .with_language(config.agent.language)
    .with_voice(config.voice.clone())
    .with_retry_policy(config.turn.retry);

    let printer = tokio::spawn(print_events(controller.subscribe()));
    let handle = controller.spawn(input.clone(), rx);

    let language = config.agent.language;
    println!("{}", localize(MessageKey::Welcome, language));
    println!("{}", localize(MessageKey::WelcomeInstructions, language));
    println!("{HELP}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        let Some(parsed) = parse_line(&line) else {
            continue;
        };
        match parsed {
            ConsoleLine::Utterance(text) => run_turn(&handle, &input, text).await?,
            ConsoleLine::Command(command) => handle.send(command)?,
            ConsoleLine::Help => println!("{HELP}"),
            ConsoleLine::Quit => break,
            ConsoleLine::Invalid(message) => eprintln!("{message}"),
        }
    }

    tracing::info!(messages = log.len(), "Conversation finished");
    handle.shutdown().await?;
    printer.abort();
    Ok(())
}

/// Deliver one utterance as a complete listening turn
async fn run_turn(handle: &TurnHandle, input: &InputSender, text: String) -> anyhow::Result<()> {
    let mut state = handle.watch_state();
    let settled =
        |s: &ConversationState| matches!(s, ConversationState::Idle | ConversationState::Error);

    // A previous reply may still be in flight
    tokio::time::timeout(TURN_TIMEOUT, state.wait_for(settled))
        .await
        .context("Timed out waiting for the previous turn")??;

    handle.send(TurnCommand::StartListening)?;
    let opened = tokio::time::timeout(
        TURN_TIMEOUT,
        state.wait_for(|s| matches!(s, ConversationState::Listening | ConversationState::Error)),
    )
    .await
    .context("Timed out waiting for the microphone")??;
    if *opened != ConversationState::Listening {
        return Ok(());
    }
    drop(opened);

    input.recognition(RecognitionEvent::final_result(text))?;
    handle.send(TurnCommand::StopListening)?;

    tokio::time::timeout(TURN_TIMEOUT, state.wait_for(settled))
        .await
        .context("Timed out waiting for the reply")??;
    Ok(())
}

/// Print user-visible controller events
async fn print_events(mut events: broadcast::Receiver<TurnEvent>) {
    loop {
        match events.recv().await {
            Ok(TurnEvent::Error { message, .. }) => eprintln!("! {message}"),
            Ok(TurnEvent::CommandRejected { command, state }) => {
                eprintln!("! '{command}' is not available while {state}")
            }
            Ok(_) => {}
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Event printer lagged");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

/// Initialize tracing to stderr so replies on stdout stay readable
fn init_tracing(config: &Settings) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = &config.observability.log_level;
        format!("barista={}", level).into()
    });

    let subscriber = tracing_subscriber::registry().with(env_filter);
    let fmt_layer = if config.observability.log_json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .boxed()
    };
    subscriber.with(fmt_layer).init();
}
