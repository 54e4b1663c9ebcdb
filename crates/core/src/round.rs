//! Per-session records: rounds, difficulty and the final result.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Feedback recorded for a round in which the player said nothing.
pub const NO_RESPONSE: &str = "No response";

/// How a round ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundOutcome {
    /// A response was heard and the game goes on.
    Continue,
    /// The round resolved the game.
    Correct,
    /// No response was captured.
    Timeout,
    /// A response was heard, but only after reprompting.
    Reprompted,
}

/// One prompt/response cycle. Never mutated after it is recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Round {
    pub index: usize,
    pub prompt_spoken: String,
    pub response: Option<String>,
    pub outcome: RoundOutcome,
}

impl Round {
    /// The response text, or the no-response sentinel.
    pub fn feedback(&self) -> &str {
        self.response.as_deref().unwrap_or(NO_RESPONSE)
    }
}

/// Difficulty knob, 1 (easiest) to 3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Difficulty(u8);

impl Difficulty {
    pub const EASY: Difficulty = Difficulty(1);
    pub const MEDIUM: Difficulty = Difficulty(2);
    pub const HARD: Difficulty = Difficulty(3);

    /// Clamps any integer into the valid range.
    pub fn clamped(level: i64) -> Self {
        Difficulty(level.clamp(1, 3) as u8)
    }

    pub fn level(&self) -> u8 {
        self.0
    }

    /// One step easier, or `None` at the floor.
    pub fn eased(&self) -> Option<Self> {
        (self.0 > 1).then(|| Difficulty(self.0 - 1))
    }
}

impl Default for Difficulty {
    fn default() -> Self {
        Self::EASY
    }
}

impl TryFrom<u8> for Difficulty {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if (1..=3).contains(&value) {
            Ok(Difficulty(value))
        } else {
            Err(format!("difficulty must be between 1 and 3, got {value}"))
        }
    }
}

impl From<Difficulty> for u8 {
    fn from(value: Difficulty) -> Self {
        value.0
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Terminal record of a match, read by the controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionResult {
    pub won: bool,
    pub rounds_used: usize,
    pub revealed_answer: String,
}
