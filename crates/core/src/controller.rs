//! The outer loop around individual matches: greeting, name capture, the
//! play/play-again questions and the final goodbye.

use crate::intent::{choose_mode, extract_name, yes_or_no};
use crate::reprompt::{RepromptPolicy, YES_NO_PHRASING};
use crate::round::SessionResult;
use crate::session::{GameMode, GameServices, GameSession};
use crate::speech::Gesture;
use crate::turn::{SpeakMode, TurnCoordinator};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

const DEFAULT_NAME: &str = "friend";

/// Ends the conversation with the player (session teardown, leaving the
/// transport).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Lifecycle: Send + Sync {
    async fn leave(&self) -> anyhow::Result<()>;
}

/// What happened over the whole conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerSummary {
    pub player_name: String,
    pub results: Vec<SessionResult>,
}

impl ControllerSummary {
    pub fn wins(&self) -> usize {
        self.results.iter().filter(|r| r.won).count()
    }
}

pub struct GameController {
    turn: TurnCoordinator,
    services: GameServices,
    lifecycle: Arc<dyn Lifecycle>,
}

impl GameController {
    pub fn new(
        turn: TurnCoordinator,
        services: GameServices,
        lifecycle: Arc<dyn Lifecycle>,
    ) -> Self {
        Self {
            turn,
            services,
            lifecycle,
        }
    }

    async fn confirm(&mut self, question: &str) -> bool {
        let answer = RepromptPolicy::new(
            &mut self.turn,
            &self.services.oracle,
            self.services.settings.reprompt_attempts,
            YES_NO_PHRASING,
        )
        .ask(question, Some(Gesture::Beat), None)
        .await;
        answer.is_some_and(|answer| yes_or_no(&answer.text) == Some(true))
    }

    async fn greet(&mut self) -> String {
        let settings = &self.services.settings;
        let timing = settings.listen_timing().with_timeout(settings.name_timeout());
        let reply = self
            .turn
            .ask_with(
                "Hello! What's your name?",
                Some(Gesture::Wave),
                SpeakMode::Await,
                timing,
            )
            .await;
        let name = reply
            .as_deref()
            .and_then(extract_name)
            .unwrap_or_else(|| DEFAULT_NAME.to_string());
        self.turn
            .dialogue()
            .say_detached(&format!("Nice to meet you, {name}!"), Some(Gesture::Beat));
        name
    }

    async fn choose_mode(&mut self) -> GameMode {
        let reply = self
            .turn
            .ask(
                "Who should guess? Say 'I guess' to find my object, \
                 or 'you guess' and I'll guess your word.",
                Some(Gesture::Beat),
            )
            .await;
        let choice = choose_mode(reply.as_deref());
        if choice.defaulted {
            info!(reply = ?reply, "Mode reply was ambiguous; defaulting.");
            self.turn
                .dialogue()
                .say(
                    "I didn't quite catch that, so you'll be the one guessing!",
                    Some(Gesture::Beat),
                )
                .await;
        }
        choice.mode
    }

    /// Runs matches until the player declines, then leaves.
    pub async fn run(&mut self) -> ControllerSummary {
        let player_name = self.greet().await;
        info!(player = %player_name, "Player greeted.");

        let mut results = Vec::new();
        let mut confirmed = false;
        loop {
            if !confirmed
                && !self
                    .confirm("Do you want to play a game? Please say yes or no.")
                    .await
            {
                self.turn
                    .dialogue()
                    .say("Okay, maybe next time!", Some(Gesture::GoodbyeWave))
                    .await;
                break;
            }

            let mode = self.choose_mode().await;
            let result =
                GameSession::new(&mut self.turn, &self.services, mode, player_name.as_str())
                    .run()
                    .await;
            results.push(result);

            confirmed = self
                .confirm("Do you want to play again? Please say yes or no.")
                .await;
            if !confirmed {
                self.turn
                    .dialogue()
                    .say("Okay, thanks for playing!", Some(Gesture::GoodbyeWave))
                    .await;
                break;
            }
        }

        if let Err(e) = self.lifecycle.leave().await {
            warn!(error = ?e, "Failed to leave the session cleanly.");
        }
        let summary = ControllerSummary {
            player_name,
            results,
        };
        info!(matches = summary.results.len(), wins = summary.wins(), "Conversation ended.");
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::MockOracle;
    use crate::session::fixtures::{BrokenScanner, services};
    use crate::settings::GameSettings;
    use crate::testing::{RecordingSpeech, ScriptedReplies, dialogue_with};
    use crate::turn::ListenTiming;

    fn controller(
        replies: Vec<Option<&str>>,
        oracle: MockOracle,
        settings: GameSettings,
        lifecycle: MockLifecycle,
    ) -> (GameController, Arc<RecordingSpeech>) {
        let (dialogue, speech) = dialogue_with();
        let turn = TurnCoordinator::new(
            dialogue,
            Box::new(ScriptedReplies::new(replies)),
            ListenTiming::default(),
        );
        let services = services(oracle, Arc::new(BrokenScanner), settings);
        (
            GameController::new(turn, services, Arc::new(lifecycle)),
            speech,
        )
    }

    fn leaves_once() -> MockLifecycle {
        let mut lifecycle = MockLifecycle::new();
        lifecycle.expect_leave().times(1).returning(|| Ok(()));
        lifecycle
    }

    #[tokio::test(start_paused = true)]
    async fn test_declining_ends_before_any_match() {
        let (mut controller, speech) = controller(
            vec![Some("my name is Alex."), Some("no thanks")],
            MockOracle::new(),
            GameSettings::default(),
            leaves_once(),
        );

        let summary = controller.run().await;

        assert_eq!(summary.player_name, "Alex");
        assert!(summary.results.is_empty());
        assert!(speech.said("Okay, maybe next time!"));
        tokio::task::yield_now().await;
        assert!(speech.said("Nice to meet you, Alex!"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_one_engine_match_then_goodbye() {
        let mut oracle = MockOracle::new();
        oracle
            .expect_next_question()
            .returning(|_, _| Ok("Is it a fruit?".to_string()));
        let (mut controller, speech) = controller(
            vec![None, Some("yes"), Some("you guess"), Some("yes"), Some("Correct!"), Some("no")],
            oracle,
            GameSettings::default(),
            leaves_once(),
        );

        let summary = controller.run().await;

        assert_eq!(summary.player_name, "friend");
        assert_eq!(summary.results.len(), 1);
        assert_eq!(summary.wins(), 1);
        assert!(speech.said("Yay! I guessed it!"));
        assert!(speech.said("Okay, thanks for playing!"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_ambiguous_mode_defaults_and_play_again_skips_invitation() {
        let mut oracle = MockOracle::new();
        oracle
            .expect_pick_secret_word()
            .returning(|| Ok("apple".to_string()));
        let settings = GameSettings {
            player_max_rounds: 1,
            ..GameSettings::default()
        };
        let mut lifecycle = MockLifecycle::new();
        lifecycle
            .expect_leave()
            .times(1)
            .returning(|| Err(anyhow::anyhow!("transport already closed")));
        let (mut controller, speech) = controller(
            vec![
                Some("Alex"),
                Some("sure"),
                Some("banana"),
                Some("I guess apple"),
                Some("yes"),
                Some("I spy"),
                Some("I guess pear"),
                Some("nope"),
            ],
            oracle,
            settings,
            lifecycle,
        );

        let summary = controller.run().await;

        assert_eq!(summary.results.len(), 2);
        assert_eq!(summary.wins(), 1);
        assert!(speech.said("so you'll be the one guessing"));
        let invitations = speech
            .lines()
            .iter()
            .filter(|line| line.contains("Do you want to play a game?"))
            .count();
        assert_eq!(invitations, 1);
    }
}
