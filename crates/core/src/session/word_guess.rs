use super::GameSession;
use crate::intent::final_guess;
use crate::oracle::{YesNo, names_match};
use crate::reprompt::{GUESS_PHRASING, RepromptPolicy};
use crate::round::{RoundOutcome, SessionResult};
use crate::speech::Gesture;
use tracing::info;

const RULES: &str = "I'm thinking of a word. Ask me yes or no questions about it, \
    or say 'I guess' followed by your answer.";

impl GameSession<'_> {
    /// A secret-word game used when there is nothing in the room to spy.
    pub(super) async fn play_word_guess(&mut self) -> SessionResult {
        let services = self.services;
        let oracle = &services.oracle;
        let settings = &services.settings;

        let secret = oracle.pick_secret_word().await;
        info!(%secret, "Secret word chosen.");
        self.turn.dialogue().say(RULES, Some(Gesture::Beat)).await;

        let mut won = false;
        for round in 0..settings.player_max_rounds {
            let prompt = if round == 0 {
                "What's your first question?"
            } else {
                "What's your next question or guess?"
            };
            let answer = RepromptPolicy::new(
                &mut *self.turn,
                oracle,
                settings.reprompt_attempts,
                GUESS_PHRASING,
            )
            .ask(prompt, Some(Gesture::Beat), None)
            .await;

            let Some(answer) = answer else {
                self.record_round(prompt, None, RoundOutcome::Timeout);
                continue;
            };
            let outcome = if answer.was_reprompted() {
                RoundOutcome::Reprompted
            } else {
                RoundOutcome::Continue
            };

            if let Some(guess) = final_guess(&answer.text) {
                if names_match(&guess, &[&secret]) {
                    self.record_round(prompt, Some(answer.text), RoundOutcome::Correct);
                    self.turn
                        .dialogue()
                        .say(
                            &format!("Yes! You guessed it, the word was {secret}!"),
                            Some(Gesture::Celebration),
                        )
                        .await;
                    won = true;
                    break;
                }
                self.record_round(prompt, Some(answer.text), outcome);
                self.turn
                    .dialogue()
                    .say("Nope, that's not it. Keep trying!", Some(Gesture::ShakeNo))
                    .await;
                continue;
            }

            let reply = oracle.answer_yes_no(&secret, &answer.text).await;
            self.record_round(prompt, Some(answer.text), outcome);
            let (line, gesture) = match reply {
                YesNo::Yes => ("Yes!", Gesture::Beat),
                YesNo::No => ("No.", Gesture::ShakeNo),
                YesNo::DontKnow => ("Hmm, I don't know.", Gesture::Beat),
            };
            self.turn.dialogue().say(line, Some(gesture)).await;
        }

        if !won {
            self.turn
                .dialogue()
                .say(&format!("The word was {secret}."), Some(Gesture::Defeat))
                .await;
        }
        self.result(won, secret)
    }
}

#[cfg(test)]
mod tests {
    use crate::oracle::{MockOracle, YesNo};
    use crate::round::RoundOutcome;
    use crate::session::fixtures::{BrokenScanner, services};
    use crate::session::{GameMode, GameSession};
    use crate::settings::GameSettings;
    use crate::testing::{ScriptedReplies, dialogue_with};
    use crate::turn::{ListenTiming, TurnCoordinator};
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_questions_are_answered_until_the_cap() {
        let mut oracle = MockOracle::new();
        oracle
            .expect_pick_secret_word()
            .returning(|| Err(anyhow::anyhow!("rate limited").into()));
        oracle
            .expect_answer_yes_no()
            .withf(|secret, _| secret.eq_ignore_ascii_case("apple"))
            .returning(|_, question| {
                Ok(if question.contains("fruit") {
                    YesNo::Yes
                } else {
                    YesNo::No
                })
            });
        let settings = GameSettings {
            player_max_rounds: 3,
            ..GameSettings::default()
        };
        let services = services(oracle, Arc::new(BrokenScanner), settings);
        let (dialogue, speech) = dialogue_with();
        let mut turn = TurnCoordinator::new(
            dialogue,
            Box::new(ScriptedReplies::new(vec![
                Some("is it a fruit"),
                Some("I guess pear"),
                Some("is it blue"),
            ])),
            ListenTiming::default(),
        );
        let mut session = GameSession::new(&mut turn, &services, GameMode::PlayerGuesses, "Sam");

        let result = session.run().await;

        assert!(!result.won);
        assert_eq!(result.revealed_answer, "apple");
        assert_eq!(session.history().len(), 3);
        assert!(
            session
                .history()
                .iter()
                .all(|round| round.outcome == RoundOutcome::Continue)
        );
        let english = speech.english();
        assert!(english.contains(&"Yes!".to_string()));
        assert!(english.contains(&"Nope, that's not it. Keep trying!".to_string()));
        assert!(english.contains(&"No.".to_string()));
        assert!(english.contains(&"The word was apple.".to_string()));
    }
}
