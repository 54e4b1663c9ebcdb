//! Console runtime for the I Spy robot.
//!
//! This binary is responsible for:
//! 1. Loading configuration from the environment.
//! 2. Building the Oracle for the configured provider.
//! 3. Wiring stdin/stdout in place of the microphone, speaker and motors.
//! 4. Running the game controller until the player says goodbye or Ctrl+C.

use anyhow::Context;
use async_openai::config::OpenAIConfig;
use ispy_core::{
    controller::GameController,
    listen::{DEFAULT_MAILBOX_CAPACITY, mailbox},
    llm_client::OpenAICompatibleClient,
    llm_oracle::{LlmOracle, PROMPT_KEYS},
    oracle::{Oracle, ResilientOracle},
    session::GameServices,
    speech::Dialogue,
    turn::TurnCoordinator,
};
use ispy_robot::{
    config::{Config, Provider},
    console::{ConsoleGestures, ConsoleLifecycle, ConsoleSpeech, spawn_line_listener},
    offline::OfflineOracle,
    prompts::{load_prompts, missing_prompts},
    scene::SceneScanner,
};
use std::{sync::Arc, time::Duration};
use tokio::io::BufReader;
use tracing::{info, warn};

/// Simulated speaking time per word for console speech.
const SPEECH_PACE: Duration = Duration::from_millis(150);

fn build_oracle(config: &Config) -> anyhow::Result<Arc<dyn Oracle>> {
    let Some(api_base) = config.provider.api_base() else {
        info!("Running offline; every oracle call uses its fallback.");
        return Ok(Arc::new(OfflineOracle));
    };

    let prompts = load_prompts(&config.prompts_path)?;
    let missing = missing_prompts(&prompts, PROMPT_KEYS);
    if !missing.is_empty() {
        warn!(?missing, "Prompt templates missing; those calls will use fallbacks.");
    }

    let api_key = config
        .api_key()
        .context("API key missing for the configured provider")?;
    info!(provider = ?config.provider, "Using chat-completion provider.");
    let openai_config = OpenAIConfig::new()
        .with_api_key(api_key)
        .with_api_base(api_base);
    let client = OpenAICompatibleClient::new(openai_config, config.chat_model.clone());
    Ok(Arc::new(LlmOracle::new(Arc::new(client), prompts)))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // --- 1. Load Configuration ---
    let config = Config::from_env().context("Failed to load configuration")?;

    // --- 2. Initialize Logging ---
    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339())
        .with_writer(std::io::stderr)
        .init();
    info!("Configuration loaded. Initializing game services...");

    // --- 3. Initialize Shared Services ---
    let services = GameServices {
        oracle: ResilientOracle::new(build_oracle(&config)?),
        scanner: Arc::new(SceneScanner::new(config.scene_path.clone())),
        settings: Arc::new(config.game.clone()),
    };

    // --- 4. Wire the Console Body ---
    let (sender, words) = mailbox(DEFAULT_MAILBOX_CAPACITY);
    let listener = spawn_line_listener(BufReader::new(tokio::io::stdin()), sender);
    let dialogue = Dialogue::new(
        Arc::new(ConsoleSpeech::new(SPEECH_PACE)),
        Arc::new(ConsoleGestures),
    );
    let turn = TurnCoordinator::new(dialogue, Box::new(words), config.game.listen_timing());
    let mut controller =
        GameController::new(turn, services, Arc::new(ConsoleLifecycle::new(listener)));

    // --- 5. Play ---
    info!(
        provider = ?config.provider,
        model = %config.chat_model,
        scene = ?config.scene_path,
        "Robot ready. Type your replies and press Enter."
    );
    tokio::select! {
        summary = controller.run() => {
            info!(
                player = %summary.player_name,
                matches = summary.results.len(),
                wins = summary.wins(),
                "Game over."
            );
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal. Shutting down...");
        }
    }

    Ok(())
}
