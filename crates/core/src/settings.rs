use crate::round::Difficulty;
use crate::turn::ListenTiming;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tuning for a game, fixed for the lifetime of a controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameSettings {
    pub listen_timeout_secs: f64,
    pub poll_interval_secs: f64,
    pub silence_window_secs: f64,
    /// Shorter timeout while waiting for the player's name.
    pub name_timeout_secs: f64,
    pub guess_timeout_secs: f64,
    /// How long the player gets to think of a word before the readiness check.
    pub think_pause_secs: f64,
    pub reprompt_attempts: usize,
    pub engine_max_rounds: usize,
    pub player_max_rounds: usize,
    pub start_difficulty: Difficulty,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            listen_timeout_secs: 15.0,
            poll_interval_secs: 1.0,
            silence_window_secs: 2.0,
            name_timeout_secs: 8.0,
            guess_timeout_secs: 12.0,
            think_pause_secs: 5.0,
            reprompt_attempts: 3,
            engine_max_rounds: 15,
            player_max_rounds: 8,
            start_difficulty: Difficulty::EASY,
        }
    }
}

impl GameSettings {
    pub fn listen_timing(&self) -> ListenTiming {
        ListenTiming::from_secs(
            self.listen_timeout_secs,
            self.poll_interval_secs,
            self.silence_window_secs,
        )
    }

    pub fn name_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.name_timeout_secs.max(0.0))
    }

    pub fn guess_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.guess_timeout_secs.max(0.0))
    }

    pub fn think_pause(&self) -> Duration {
        Duration::from_secs_f64(self.think_pause_secs.max(0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_settings_fill_defaults() {
        let settings: GameSettings =
            serde_json::from_str(r#"{"player_max_rounds": 4, "start_difficulty": 3}"#).unwrap();
        assert_eq!(settings.player_max_rounds, 4);
        assert_eq!(settings.start_difficulty, Difficulty::HARD);
        assert_eq!(settings.engine_max_rounds, 15);
        assert_eq!(settings.listen_timing(), ListenTiming::default());
    }

    #[test]
    fn test_out_of_range_difficulty_is_rejected() {
        assert!(serde_json::from_str::<GameSettings>(r#"{"start_difficulty": 5}"#).is_err());
    }
}
