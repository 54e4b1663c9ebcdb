//! One match of I Spy, in either direction.
//!
//! A [`GameSession`] owns the round history, the hint ledger and the current
//! difficulty for exactly one match and is dropped when the match ends.

mod engine_guesses;
mod player_guesses;
mod word_guess;

use crate::hints::HintLedger;
use crate::oracle::ResilientOracle;
use crate::round::{Difficulty, Round, RoundOutcome, SessionResult};
use crate::scanner::Scanner;
use crate::settings::GameSettings;
use crate::turn::TurnCoordinator;
use std::fmt;
use std::sync::Arc;
use tracing::{Instrument, debug, info, info_span};
use uuid::Uuid;

/// Which side does the guessing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameMode {
    /// The player thinks of a word and the engine asks yes/no questions.
    EngineGuesses,
    /// The engine spies an object in the room and the player guesses it.
    PlayerGuesses,
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            GameMode::EngineGuesses => "engine_guesses",
            GameMode::PlayerGuesses => "player_guesses",
        })
    }
}

/// The shared, clonable collaborators a session needs besides the turn loop.
#[derive(Clone)]
pub struct GameServices {
    pub oracle: ResilientOracle,
    pub scanner: Arc<dyn Scanner>,
    pub settings: Arc<GameSettings>,
}

pub struct GameSession<'a> {
    id: Uuid,
    mode: GameMode,
    player_name: String,
    turn: &'a mut TurnCoordinator,
    services: &'a GameServices,
    history: Vec<Round>,
    hints: HintLedger,
    difficulty: Difficulty,
    difficulty_trace: Vec<Difficulty>,
}

impl<'a> GameSession<'a> {
    pub fn new(
        turn: &'a mut TurnCoordinator,
        services: &'a GameServices,
        mode: GameMode,
        player_name: impl Into<String>,
    ) -> Self {
        let difficulty = services.settings.start_difficulty;
        Self {
            id: Uuid::new_v4(),
            mode,
            player_name: player_name.into(),
            turn,
            services,
            history: Vec::new(),
            hints: HintLedger::new(),
            difficulty,
            difficulty_trace: vec![difficulty],
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn history(&self) -> &[Round] {
        &self.history
    }

    pub fn hints(&self) -> &HintLedger {
        &self.hints
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    /// Every difficulty the session has been at, in order.
    pub fn difficulty_trace(&self) -> &[Difficulty] {
        &self.difficulty_trace
    }

    /// Plays the match to its end.
    pub async fn run(&mut self) -> SessionResult {
        let span = info_span!("game_session", session_id = %self.id, mode = %self.mode);
        self.play().instrument(span).await
    }

    async fn play(&mut self) -> SessionResult {
        info!(player = %self.player_name, difficulty = %self.difficulty, "Session started.");
        let result = match self.mode {
            GameMode::EngineGuesses => self.play_engine_guesses().await,
            GameMode::PlayerGuesses => self.play_player_guesses().await,
        };
        info!(
            won = result.won,
            rounds_used = result.rounds_used,
            "Session finished."
        );
        result
    }

    fn record_round(&mut self, prompt: &str, response: Option<String>, outcome: RoundOutcome) {
        let round = Round {
            index: self.history.len(),
            prompt_spoken: prompt.to_string(),
            response,
            outcome,
        };
        debug!(
            round = round.index,
            outcome = ?round.outcome,
            feedback = %round.feedback(),
            "Round recorded."
        );
        self.history.push(round);
    }

    /// Steps difficulty down once, if it is not already at the floor.
    fn ease_difficulty(&mut self) -> bool {
        match self.difficulty.eased() {
            Some(easier) => {
                info!(from = %self.difficulty, to = %easier, "Lowering difficulty.");
                self.difficulty = easier;
                self.difficulty_trace.push(easier);
                true
            }
            None => false,
        }
    }

    fn result(&self, won: bool, revealed_answer: impl Into<String>) -> SessionResult {
        SessionResult {
            won,
            rounds_used: self.history.len(),
            revealed_answer: revealed_answer.into(),
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use crate::object::{CandidateSet, Features, GameObject};
    use crate::oracle::MockOracle;
    use async_trait::async_trait;

    pub struct FixedScanner(pub CandidateSet);

    #[async_trait]
    impl Scanner for FixedScanner {
        async fn scan(&self) -> anyhow::Result<CandidateSet> {
            Ok(self.0.clone())
        }
    }

    pub struct BrokenScanner;

    #[async_trait]
    impl Scanner for BrokenScanner {
        async fn scan(&self) -> anyhow::Result<CandidateSet> {
            anyhow::bail!("camera offline")
        }
    }

    pub fn cup() -> GameObject {
        GameObject {
            name: "cup".to_string(),
            localized_name: "kopje".to_string(),
            features: Features {
                color: "white".to_string(),
                size: "small".to_string(),
                shape: "cylindrical".to_string(),
            },
            source_location_id: "0_left".to_string(),
        }
    }

    pub fn services(
        oracle: MockOracle,
        scanner: Arc<dyn Scanner>,
        settings: GameSettings,
    ) -> GameServices {
        GameServices {
            oracle: ResilientOracle::new(Arc::new(oracle)),
            scanner,
            settings: Arc::new(settings),
        }
    }
}
