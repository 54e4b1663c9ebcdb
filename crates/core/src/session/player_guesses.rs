use super::GameSession;
use crate::object::{CandidateSet, GameObject};
use crate::reprompt::{GUESS_PHRASING, GameContext, RepromptPolicy};
use crate::round::{RoundOutcome, SessionResult};
use crate::speech::Gesture;
use tracing::{info, warn};

/// Incorrect guesses (0-based round index) after which difficulty may ease.
const EASE_FROM_ROUND: usize = 2;

const INTRO: &str = "I spy with my little eye something in this room! \
    You can ask me questions or make a guess. Say 'hint' if you need help.";

impl GameSession<'_> {
    pub(super) async fn play_player_guesses(&mut self) -> SessionResult {
        self.turn
            .dialogue()
            .say(
                "Let me look around for something interesting...",
                Some(Gesture::Beat),
            )
            .await;

        let result = match self.choose_object().await {
            Some(object) => self.guess_object(object).await,
            None => {
                self.turn
                    .dialogue()
                    .say(
                        "I couldn't find anything interesting. Sorry! \
                         Let's play a word game instead.",
                        Some(Gesture::ShakeNo),
                    )
                    .await;
                self.play_word_guess().await
            }
        };

        self.turn
            .dialogue()
            .say("Thanks for playing I Spy with me!", Some(Gesture::Wave))
            .await;
        result
    }

    async fn choose_object(&mut self) -> Option<GameObject> {
        let candidates = match self.services.scanner.scan().await {
            Ok(candidates) => candidates,
            Err(e) => {
                warn!(error = ?e, "Scan failed; continuing without candidates.");
                CandidateSet::new()
            }
        };
        info!(candidates = candidates.len(), "Scan complete.");
        if candidates.is_empty() {
            return None;
        }
        let object = self
            .services
            .oracle
            .pick_object(&candidates, self.difficulty)
            .await;
        if let Some(object) = &object {
            info!(object = %object.name, location = %object.source_location_id, "Object chosen.");
        }
        object
    }

    async fn guess_object(&mut self, object: GameObject) -> SessionResult {
        let services = self.services;
        let oracle = &services.oracle;
        let settings = &services.settings;
        let timing = settings.listen_timing().with_timeout(settings.guess_timeout());

        self.turn.dialogue().say(INTRO, Some(Gesture::Beat)).await;
        let initial = oracle
            .generate_hint(&object, self.difficulty, 0, self.hints.as_slice(), true)
            .await;
        self.turn.dialogue().say(&initial, Some(Gesture::Beat)).await;
        self.hints.push(initial);

        let mut won = false;
        for round in 0..settings.player_max_rounds {
            let prompt = if round == 0 {
                "What do you think the object is?"
            } else {
                "What else could it be?"
            };
            let context = GameContext {
                object: &object,
                difficulty: self.difficulty,
                round,
                hints: &mut self.hints,
            };
            let answer = RepromptPolicy::new(
                &mut *self.turn,
                oracle,
                settings.reprompt_attempts,
                GUESS_PHRASING,
            )
            .with_timing(timing)
            .ask(prompt, Some(Gesture::Beat), Some(context))
            .await;

            let Some(answer) = answer else {
                self.record_round(prompt, None, RoundOutcome::Timeout);
                continue;
            };

            let judgement = oracle
                .judge_guess(&answer.text, &object, round, self.hints.as_slice())
                .await;
            info!(round, guess = %answer.text, correct = judgement.correct, "Guess judged.");

            if judgement.correct {
                self.record_round(prompt, Some(answer.text), RoundOutcome::Correct);
                let dialogue = self.turn.dialogue();
                dialogue
                    .say(&judgement.response, Some(Gesture::Celebration))
                    .await;
                dialogue
                    .say(&format!("Here it is, {}!", self.player_name), Some(Gesture::Beat))
                    .await;
                dialogue.point_to(&object).await;
                won = true;
                break;
            }

            let outcome = if answer.was_reprompted() {
                RoundOutcome::Reprompted
            } else {
                RoundOutcome::Continue
            };
            self.record_round(prompt, Some(answer.text), outcome);
            self.turn
                .dialogue()
                .say(&judgement.response, Some(Gesture::ShakeNo))
                .await;
            self.hints.push(judgement.response);

            if round >= EASE_FROM_ROUND && self.ease_difficulty() {
                self.turn
                    .dialogue()
                    .say("Let me make this a little easier for you.", Some(Gesture::Beat))
                    .await;
            }
        }

        if !won {
            self.turn
                .dialogue()
                .say(
                    &format!(
                        "You're out of guesses. The object was the {}, in Dutch <nl>{}</nl>.",
                        object.name,
                        object.display_localized()
                    ),
                    Some(Gesture::ShakeNo),
                )
                .await;
        }
        self.result(won, object.name)
    }
}
