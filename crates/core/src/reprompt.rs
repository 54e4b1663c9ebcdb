//! Bounded retry around a single question.
//!
//! Attempt 0 speaks the caller's prompt; later attempts rotate through a fixed
//! list of reprompts. A "repeat" reply re-asks without using up an attempt, a
//! "hint" reply (in a game) is answered with a hint and one extra listen, and
//! silence on the penultimate attempt triggers an unsolicited hint. Silence on
//! the last attempt gives up.

use crate::hints::HintLedger;
use crate::intent::{Intent, matches};
use crate::object::GameObject;
use crate::oracle::ResilientOracle;
use crate::round::Difficulty;
use crate::speech::Gesture;
use crate::turn::{ListenTiming, SpeakMode, TurnCoordinator};
use tracing::{debug, info};

/// Repeat requests honoured per question before they start costing attempts.
pub(crate) const MAX_REPEATS: usize = 3;

const ASSIST_INTRO: &str = "Seems tricky! Here's a hint to help.";

/// What to say when reprompting, and when giving up.
#[derive(Debug, Clone, Copy)]
pub struct Phrasing {
    pub reprompts: &'static [&'static str],
    /// Spoken on giving up; empty to stay quiet and let the caller narrate.
    pub give_up: &'static str,
}

pub const GUESS_PHRASING: Phrasing = Phrasing {
    reprompts: &[
        "Any guesses yet? What do you think it is?",
        "Still curious! What's your guess?",
        "No answer yet? Try a guess or say 'hint'!",
    ],
    give_up: "Let's move on, no guess this time!",
};

pub const READY_PHRASING: Phrasing = Phrasing {
    reprompts: &[
        "Are you ready? Just say yes when you have a word in mind.",
        "Take your time. Tell me when you're ready!",
    ],
    give_up: "",
};

pub const YES_NO_PHRASING: Phrasing = Phrasing {
    reprompts: &[
        "Sorry, I didn't catch that. Could you say yes or no?",
        "Just say yes or no!",
    ],
    give_up: "",
};

/// The game a question belongs to. Enables hints.
pub struct GameContext<'a> {
    pub object: &'a GameObject,
    pub difficulty: Difficulty,
    pub round: usize,
    pub hints: &'a mut HintLedger,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepromptState {
    Attempting,
    Reprompting,
    Hinting,
    Succeeded,
    GaveUp,
}

/// A reply and the attempt on which it was heard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    pub text: String,
    pub attempt: usize,
}

impl Answer {
    pub fn was_reprompted(&self) -> bool {
        self.attempt > 0
    }
}

pub struct RepromptPolicy<'a> {
    turn: &'a mut TurnCoordinator,
    oracle: &'a ResilientOracle,
    max_attempts: usize,
    phrasing: Phrasing,
    timing: ListenTiming,
    state: RepromptState,
}

impl<'a> RepromptPolicy<'a> {
    pub fn new(
        turn: &'a mut TurnCoordinator,
        oracle: &'a ResilientOracle,
        max_attempts: usize,
        phrasing: Phrasing,
    ) -> Self {
        let timing = turn.timing();
        Self {
            turn,
            oracle,
            max_attempts: max_attempts.max(1),
            phrasing,
            timing,
            state: RepromptState::Attempting,
        }
    }

    /// Listens with `timing` instead of the coordinator's default.
    pub fn with_timing(mut self, timing: ListenTiming) -> Self {
        self.timing = timing;
        self
    }

    pub fn state(&self) -> RepromptState {
        self.state
    }

    fn prompt_for<'p>(&self, attempt: usize, initial_prompt: &'p str) -> &'p str {
        if attempt == 0 || self.phrasing.reprompts.is_empty() {
            initial_prompt
        } else {
            let phrases = self.phrasing.reprompts;
            phrases[(attempt - 1) % phrases.len()]
        }
    }

    async fn speak_hint(&mut self, intro: Option<&str>, context: &mut GameContext<'_>) {
        let hint = self
            .oracle
            .generate_hint(
                context.object,
                context.difficulty,
                context.round,
                context.hints.as_slice(),
                false,
            )
            .await;
        let line = match intro {
            Some(intro) => format!("{intro} {hint}"),
            None => hint.clone(),
        };
        self.turn.dialogue().say(&line, Some(Gesture::Beat)).await;
        context.hints.push(hint);
    }

    /// Asks until a reply is heard or the attempts run out.
    pub async fn ask(
        &mut self,
        initial_prompt: &str,
        gesture: Option<Gesture>,
        mut context: Option<GameContext<'_>>,
    ) -> Option<Answer> {
        let mut attempt = 0;
        let mut repeats = 0;
        self.state = RepromptState::Attempting;

        loop {
            let prompt = self.prompt_for(attempt, initial_prompt);
            let gesture = if attempt == 0 { gesture } else { Some(Gesture::Beat) };
            debug!(attempt, max_attempts = self.max_attempts, "Asking.");
            let reply = self
                .turn
                .ask_with(prompt, gesture, SpeakMode::Await, self.timing)
                .await;

            match reply {
                Some(text) if matches(&text, Intent::Repeat) && repeats < MAX_REPEATS => {
                    repeats += 1;
                    debug!(attempt, repeats, "Player asked for a repeat.");
                    continue;
                }
                Some(text) if matches(&text, Intent::Hint) && context.is_some() => {
                    self.state = RepromptState::Hinting;
                    if let Some(ctx) = context.as_mut() {
                        info!(round = ctx.round, "Player asked for a hint.");
                        self.speak_hint(None, ctx).await;
                    }
                    let after_hint = self.turn.listen(self.timing).await;
                    self.state = match after_hint {
                        Some(_) => RepromptState::Succeeded,
                        None => RepromptState::GaveUp,
                    };
                    return after_hint.map(|text| Answer { text, attempt });
                }
                Some(text) if !matches(&text, Intent::Repeat) => {
                    self.state = RepromptState::Succeeded;
                    return Some(Answer { text, attempt });
                }
                _ => {}
            }

            if attempt + 1 >= self.max_attempts {
                self.state = RepromptState::GaveUp;
                info!(attempts = self.max_attempts, "No reply; giving up on this question.");
                if !self.phrasing.give_up.is_empty() {
                    self.turn
                        .dialogue()
                        .say(self.phrasing.give_up, Some(Gesture::ShakeNo))
                        .await;
                }
                return None;
            }

            if attempt + 2 == self.max_attempts {
                if let Some(ctx) = context.as_mut() {
                    self.state = RepromptState::Hinting;
                    self.speak_hint(Some(ASSIST_INTRO), ctx).await;
                }
            }

            attempt += 1;
            self.state = RepromptState::Reprompting;
        }
    }
}
