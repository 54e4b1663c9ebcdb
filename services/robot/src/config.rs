use ispy_core::round::Difficulty;
use ispy_core::settings::GameSettings;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(String),
    #[error("Invalid value for environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Which backend answers Oracle requests.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Provider {
    OpenAI,
    Gemini,
    /// No model at all; every Oracle call takes its fallback.
    Offline,
}

impl Provider {
    /// Base URL of the provider's OpenAI-compatible endpoint.
    pub fn api_base(&self) -> Option<&'static str> {
        match self {
            Provider::OpenAI => Some("https://api.openai.com/v1/"),
            Provider::Gemini => Some("https://generativelanguage.googleapis.com/v1beta/openai"),
            Provider::Offline => None,
        }
    }
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub provider: Provider,
    pub openai_api_key: Option<String>,
    pub gemini_api_key: Option<String>,
    pub chat_model: String,
    pub log_level: Level,
    pub prompts_path: PathBuf,
    pub scene_path: Option<PathBuf>,
    pub game: GameSettings,
}

/// Reads `name` and parses it, keeping `default` when it is unset.
fn parsed_var<T: FromStr>(name: &str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidValue(name.to_string(), e.to_string())),
        Err(_) => Ok(default),
    }
}

fn game_settings_from_env() -> Result<GameSettings, ConfigError> {
    let defaults = GameSettings::default();
    let level = parsed_var("START_DIFFICULTY", defaults.start_difficulty.level())?;
    let start_difficulty = Difficulty::try_from(level)
        .map_err(|e| ConfigError::InvalidValue("START_DIFFICULTY".to_string(), e))?;

    let settings = GameSettings {
        listen_timeout_secs: parsed_var("LISTEN_TIMEOUT_SECS", defaults.listen_timeout_secs)?,
        poll_interval_secs: parsed_var("POLL_INTERVAL_SECS", defaults.poll_interval_secs)?,
        silence_window_secs: parsed_var("SILENCE_WINDOW_SECS", defaults.silence_window_secs)?,
        name_timeout_secs: parsed_var("NAME_TIMEOUT_SECS", defaults.name_timeout_secs)?,
        guess_timeout_secs: parsed_var("GUESS_TIMEOUT_SECS", defaults.guess_timeout_secs)?,
        think_pause_secs: parsed_var("THINK_PAUSE_SECS", defaults.think_pause_secs)?,
        reprompt_attempts: parsed_var("REPROMPT_ATTEMPTS", defaults.reprompt_attempts)?,
        engine_max_rounds: parsed_var("ENGINE_MAX_ROUNDS", defaults.engine_max_rounds)?,
        player_max_rounds: parsed_var("PLAYER_MAX_ROUNDS", defaults.player_max_rounds)?,
        start_difficulty,
    };

    if settings.poll_interval_secs.is_nan() || settings.poll_interval_secs <= 0.0 {
        return Err(ConfigError::InvalidValue(
            "POLL_INTERVAL_SECS".to_string(),
            "must be greater than zero".to_string(),
        ));
    }
    if settings.reprompt_attempts == 0 {
        return Err(ConfigError::InvalidValue(
            "REPROMPT_ATTEMPTS".to_string(),
            "must be at least 1".to_string(),
        ));
    }
    Ok(settings)
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        let provider_str = std::env::var("LLM_PROVIDER").unwrap_or_else(|_| "openai".to_string());
        let provider = match provider_str.to_lowercase().as_str() {
            "gemini" => Provider::Gemini,
            "offline" => Provider::Offline,
            _ => Provider::OpenAI,
        };

        let openai_api_key = std::env::var("OPENAI_API_KEY").ok();
        let gemini_api_key = std::env::var("GEMINI_API_KEY").ok();

        let chat_model =
            std::env::var("CHAT_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string());

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let prompts_path = std::env::var("PROMPTS_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./prompts"));
        let scene_path = std::env::var("SCENE_PATH").ok().map(PathBuf::from);

        match provider {
            Provider::OpenAI if openai_api_key.is_none() => {
                return Err(ConfigError::MissingVar(
                    "OPENAI_API_KEY must be set for 'openai' provider".to_string(),
                ));
            }
            Provider::Gemini if gemini_api_key.is_none() => {
                return Err(ConfigError::MissingVar(
                    "GEMINI_API_KEY must be set for 'gemini' provider".to_string(),
                ));
            }
            _ => {}
        }

        Ok(Self {
            provider,
            openai_api_key,
            gemini_api_key,
            chat_model,
            log_level,
            prompts_path,
            scene_path,
            game: game_settings_from_env()?,
        })
    }

    /// The API key for the configured provider, if it needs one.
    pub fn api_key(&self) -> Option<&str> {
        match self.provider {
            Provider::OpenAI => self.openai_api_key.as_deref(),
            Provider::Gemini => self.gemini_api_key.as_deref(),
            Provider::Offline => None,
        }
    }
}
