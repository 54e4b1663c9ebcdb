use super::GameSession;
use crate::intent::{Intent, matches, normalize, yes_or_no};
use crate::reprompt::{MAX_REPEATS, READY_PHRASING, RepromptPolicy};
use crate::round::{RoundOutcome, SessionResult};
use crate::speech::Gesture;
use tracing::{debug, info};

const THINK_OF_A_WORD: &str =
    "Think of a word, any word, and I'll try to guess it by asking yes or no questions.";
const READY_PROMPT: &str = "Have you thought of a word?";
const MORE_TIME: &str = "Okay, I'll give you more time next round!";

fn is_ready(reply: &str) -> bool {
    match yes_or_no(reply) {
        Some(answer) => answer,
        None => {
            let reply = normalize(reply);
            reply.contains("ready") && !reply.contains("not ready")
        }
    }
}

impl GameSession<'_> {
    pub(super) async fn play_engine_guesses(&mut self) -> SessionResult {
        let services = self.services;
        let oracle = &services.oracle;
        let settings = &services.settings;

        self.turn
            .dialogue()
            .say(THINK_OF_A_WORD, Some(Gesture::Beat))
            .await;
        tokio::time::sleep(settings.think_pause()).await;

        let confirmation = RepromptPolicy::new(
            &mut *self.turn,
            oracle,
            settings.reprompt_attempts,
            READY_PHRASING,
        )
        .ask(READY_PROMPT, Some(Gesture::Beat), None)
        .await;
        if !confirmation.is_some_and(|answer| is_ready(&answer.text)) {
            info!("Player was not ready; ending without rounds.");
            self.turn
                .dialogue()
                .say(MORE_TIME, Some(Gesture::GoodbyeWave))
                .await;
            return self.result(false, "");
        }

        let mut feedback = String::new();
        let mut winning_question = None;
        for round in 0..settings.engine_max_rounds {
            let question = oracle.next_question(&feedback, &self.history).await;
            info!(round, %question, "Asking question.");
            let mut repeats = 0;
            let reply = loop {
                let reply = self.turn.ask(&question, Some(Gesture::Beat)).await;
                match reply {
                    Some(text) if matches(&text, Intent::Repeat) => {
                        if repeats == MAX_REPEATS {
                            // Further repeat requests count as no answer.
                            break None;
                        }
                        repeats += 1;
                        debug!(round, repeats, "Player asked for a repeat.");
                    }
                    other => break other,
                }
            };

            let outcome = match reply.as_deref() {
                Some(text) if matches(text, Intent::Affirm) => RoundOutcome::Correct,
                Some(_) => RoundOutcome::Continue,
                None => RoundOutcome::Timeout,
            };
            self.record_round(&question, reply, outcome);

            if outcome == RoundOutcome::Correct {
                winning_question = Some(question);
                break;
            }
            feedback = self
                .history
                .last()
                .map(|round| round.feedback().to_string())
                .unwrap_or_default();
        }

        let won = winning_question.is_some();
        let dialogue = self.turn.dialogue();
        if won {
            dialogue
                .say("Yay! I guessed it!", Some(Gesture::Celebration))
                .await;
        } else {
            dialogue
                .say("I give up! That was a challenging word.", Some(Gesture::Defeat))
                .await;
        }
        dialogue
            .say("Thanks for playing!", Some(Gesture::GoodbyeWave))
            .await;

        self.result(won, winning_question.unwrap_or_default())
    }
}
