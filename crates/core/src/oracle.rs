//! The content-generation contract and its fail-safe wrapper.
//!
//! An [`Oracle`] produces questions, answers, hints, judgements and object
//! choices. Any call may fail. The engine never talks to an oracle directly;
//! it goes through [`ResilientOracle`], which substitutes a fixed fallback for
//! every failure so a session always has something to say next.

use crate::error::{OracleError, OracleResult};
use crate::hints::{canned_hint, initial_hint, tidy_hint};
use crate::intent::normalize;
use crate::listen::sanitize_response;
use crate::object::{CandidateSet, GameObject};
use crate::round::{Difficulty, Round};
use crate::selection::draw_locally;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use tracing::warn;

pub const QUESTION_APOLOGY: &str = "I'm sorry, I couldn't generate a question.";
pub const FALLBACK_SECRET_WORD: &str = "apple";
const WRONG_GUESS_FALLBACK: &str = "That's not it, but good try! Keep looking around.";

/// Inputs with at least this many words are judged semantically rather than
/// only by name.
pub const SEMANTIC_MIN_WORDS: usize = 3;

/// Answer to a yes/no question about the secret word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YesNo {
    Yes,
    No,
    DontKnow,
}

impl YesNo {
    /// Reads a free-text model reply.
    pub fn from_reply(reply: &str) -> Self {
        let reply = normalize(reply);
        let words: Vec<&str> = reply.split_whitespace().collect();
        match words.first().copied() {
            Some("yes") => YesNo::Yes,
            Some("no") => YesNo::No,
            _ if words.contains(&"yes") => YesNo::Yes,
            _ if words.contains(&"no") => YesNo::No,
            _ => YesNo::DontKnow,
        }
    }
}

impl fmt::Display for YesNo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            YesNo::Yes => "yes",
            YesNo::No => "no",
            YesNo::DontKnow => "I don't know",
        })
    }
}

/// Verdict on a player's guess, with the line to speak.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Judgement {
    pub response: String,
    pub correct: bool,
}

/// Content-generation service. Implementations must be stateless between calls.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Oracle: Send + Sync {
    /// The next yes/no question for guessing the player's secret.
    async fn next_question(&self, last_feedback: &str, history: &[Round]) -> OracleResult<String>;

    async fn answer_yes_no(&self, secret: &str, question: &str) -> OracleResult<YesNo>;

    async fn pick_secret_word(&self) -> OracleResult<String>;

    /// Chooses the object for a player-guesses game, or `None` when nothing
    /// suitable was offered.
    async fn pick_object(
        &self,
        candidates: &CandidateSet,
        difficulty: Difficulty,
    ) -> OracleResult<Option<GameObject>>;

    async fn generate_hint(
        &self,
        object: &GameObject,
        difficulty: Difficulty,
        round: usize,
        previous_hints: &[String],
        initial: bool,
    ) -> OracleResult<String>;

    async fn judge_guess(
        &self,
        guess: &str,
        object: &GameObject,
        round: usize,
        previous_hints: &[String],
    ) -> OracleResult<Judgement>;
}

/// Whether `guess` names the object in either language, by substring either
/// way round. Very short guesses only match as the containing string.
pub fn names_match(guess: &str, names: &[&str]) -> bool {
    let guess = normalize(guess);
    if guess.is_empty() {
        return false;
    }
    names
        .iter()
        .map(|name| normalize(name))
        .filter(|name| !name.is_empty())
        .any(|name| guess.contains(&name) || (guess.len() >= 3 && name.contains(&guess)))
}

/// Name match against an object's English and localized names.
pub fn guess_names_object(guess: &str, object: &GameObject) -> bool {
    names_match(guess, &[&object.name, &object.localized_name])
}

/// The spoken line for a guess that named the object.
pub fn correct_response(object: &GameObject) -> String {
    format!(
        "Yes! You got it, it's the {}! In Dutch we say <nl>{}</nl>.",
        object.name,
        object.display_localized()
    )
}

/// Wraps an [`Oracle`] so every call yields a usable value.
#[derive(Clone)]
pub struct ResilientOracle {
    inner: Arc<dyn Oracle>,
}

fn log_fallback(call: &str, error: &OracleError) {
    warn!(call, error = %error, "Oracle call failed; using fallback.");
}

impl ResilientOracle {
    pub fn new(inner: Arc<dyn Oracle>) -> Self {
        Self { inner }
    }

    pub async fn next_question(&self, last_feedback: &str, history: &[Round]) -> String {
        match self.inner.next_question(last_feedback, history).await {
            Ok(question) => {
                let question = sanitize_response(&question);
                if question.is_empty() {
                    QUESTION_APOLOGY.to_string()
                } else {
                    question
                }
            }
            Err(e) => {
                log_fallback("next_question", &e);
                QUESTION_APOLOGY.to_string()
            }
        }
    }

    pub async fn answer_yes_no(&self, secret: &str, question: &str) -> YesNo {
        self.inner
            .answer_yes_no(secret, question)
            .await
            .unwrap_or_else(|e| {
                log_fallback("answer_yes_no", &e);
                YesNo::DontKnow
            })
    }

    pub async fn pick_secret_word(&self) -> String {
        match self.inner.pick_secret_word().await {
            Ok(word) => {
                let word = normalize(&word);
                if word.is_empty() {
                    FALLBACK_SECRET_WORD.to_string()
                } else {
                    word
                }
            }
            Err(e) => {
                log_fallback("pick_secret_word", &e);
                FALLBACK_SECRET_WORD.to_string()
            }
        }
    }

    /// Malformed descriptors yield `None`; transport failures fall back to a
    /// local weighted draw over the same shortlist.
    pub async fn pick_object(
        &self,
        candidates: &CandidateSet,
        difficulty: Difficulty,
    ) -> Option<GameObject> {
        match self.inner.pick_object(candidates, difficulty).await {
            Ok(object) => object.map(GameObject::with_concrete_features),
            Err(e @ OracleError::Malformed(_)) => {
                log_fallback("pick_object", &e);
                None
            }
            Err(e) => {
                log_fallback("pick_object", &e);
                draw_locally(candidates, difficulty)
            }
        }
    }

    pub async fn generate_hint(
        &self,
        object: &GameObject,
        difficulty: Difficulty,
        round: usize,
        previous_hints: &[String],
        initial: bool,
    ) -> String {
        let fallback = || {
            if initial {
                initial_hint(difficulty, object)
            } else {
                canned_hint(difficulty, round, object)
            }
        };
        match self
            .inner
            .generate_hint(object, difficulty, round, previous_hints, initial)
            .await
        {
            Ok(hint) => {
                let hint = tidy_hint(&hint);
                if hint.is_empty() { fallback() } else { hint }
            }
            Err(e) => {
                log_fallback("generate_hint", &e);
                fallback()
            }
        }
    }

    pub async fn judge_guess(
        &self,
        guess: &str,
        object: &GameObject,
        round: usize,
        previous_hints: &[String],
    ) -> Judgement {
        match self
            .inner
            .judge_guess(guess, object, round, previous_hints)
            .await
        {
            Ok(judgement) => judgement,
            Err(e) => {
                log_fallback("judge_guess", &e);
                if guess_names_object(guess, object) {
                    Judgement {
                        response: correct_response(object),
                        correct: true,
                    }
                } else {
                    Judgement {
                        response: WRONG_GUESS_FALLBACK.to_string(),
                        correct: false,
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::{Candidate, CandidateSource, Features};

    fn monitor() -> GameObject {
        GameObject {
            name: "monitor".to_string(),
            localized_name: "beeldscherm".to_string(),
            features: Features::default(),
            source_location_id: "1_center".to_string(),
        }
    }

    fn transport_error() -> OracleError {
        OracleError::Transport(anyhow::anyhow!("connection reset"))
    }

    fn failing_oracle() -> ResilientOracle {
        let mut mock = MockOracle::new();
        mock.expect_next_question()
            .returning(|_, _| Err(transport_error()));
        mock.expect_answer_yes_no()
            .returning(|_, _| Err(transport_error()));
        mock.expect_pick_secret_word()
            .returning(|| Err(transport_error()));
        mock.expect_pick_object()
            .returning(|_, _| Err(transport_error()));
        mock.expect_generate_hint()
            .returning(|_, _, _, _, _| Err(transport_error()));
        mock.expect_judge_guess()
            .returning(|_, _, _, _| Err(transport_error()));
        ResilientOracle::new(Arc::new(mock))
    }

    #[test]
    fn test_names_match_either_language() {
        let object = monitor();
        assert!(guess_names_object("is it the monitor?", &object));
        assert!(guess_names_object("Beeldscherm", &object));
        assert!(guess_names_object("monit", &object));
        assert!(!guess_names_object("it", &object));
        assert!(!guess_names_object("a cup", &object));
    }

    #[test]
    fn test_yes_no_from_reply() {
        assert_eq!(YesNo::from_reply("Yes."), YesNo::Yes);
        assert_eq!(YesNo::from_reply("No, it is not."), YesNo::No);
        assert_eq!(YesNo::from_reply("Hmm, maybe"), YesNo::DontKnow);
        assert_eq!(YesNo::from_reply("I don't know"), YesNo::DontKnow);
        assert_eq!(YesNo::DontKnow.to_string(), "I don't know");
    }

    #[tokio::test]
    async fn test_failures_fall_back() {
        let oracle = failing_oracle();
        let object = monitor().with_concrete_features();

        assert_eq!(oracle.next_question("", &[]).await, QUESTION_APOLOGY);
        assert_eq!(oracle.answer_yes_no("apple", "is it red?").await, YesNo::DontKnow);
        assert_eq!(oracle.pick_secret_word().await, FALLBACK_SECRET_WORD);
        assert_eq!(
            oracle.generate_hint(&object, Difficulty::EASY, 0, &[], true).await,
            "The object I'm thinking of is black."
        );
        assert_eq!(
            oracle.generate_hint(&object, Difficulty::EASY, 2, &[], false).await,
            "It has a rectangular shape."
        );

        let right = oracle.judge_guess("the monitor", &object, 0, &[]).await;
        assert!(right.correct);
        let wrong = oracle.judge_guess("a cup", &object, 0, &[]).await;
        assert!(!wrong.correct);
    }

    #[tokio::test]
    async fn test_pick_object_transport_failure_draws_locally() {
        let oracle = failing_oracle();
        let mut candidates = CandidateSet::new();
        candidates.insert(
            "0".to_string(),
            Candidate {
                name: "monitor".to_string(),
                features: Features::default(),
                confidence: 0.9,
                source: CandidateSource::Llm,
                location_id: "1_center".to_string(),
            },
        );

        let picked = oracle.pick_object(&candidates, Difficulty::EASY).await.unwrap();
        assert_eq!(picked.name, "monitor");
        assert_eq!(picked.features.color, "black");
    }

    #[tokio::test]
    async fn test_pick_object_malformed_is_absent() {
        let mut mock = MockOracle::new();
        mock.expect_pick_object()
            .returning(|_, _| Err(OracleError::Malformed("not json".to_string())));
        let oracle = ResilientOracle::new(Arc::new(mock));
        assert!(oracle.pick_object(&CandidateSet::new(), Difficulty::EASY).await.is_none());
    }

    #[tokio::test]
    async fn test_unknown_features_are_made_concrete() {
        let mut mock = MockOracle::new();
        mock.expect_pick_object().returning(|_, _| {
            let mut object = monitor();
            object.features.color = "unknown".to_string();
            Ok(Some(object))
        });
        let oracle = ResilientOracle::new(Arc::new(mock));
        let picked = oracle
            .pick_object(&CandidateSet::new(), Difficulty::EASY)
            .await
            .unwrap();
        assert_eq!(picked.features.color, "black");
    }

    #[tokio::test]
    async fn test_question_markers_are_stripped() {
        let mut mock = MockOracle::new();
        mock.expect_next_question()
            .returning(|_, _| Ok("<<<Is it an animal?>>>".to_string()));
        let oracle = ResilientOracle::new(Arc::new(mock));
        assert_eq!(oracle.next_question("", &[]).await, "Is it an animal?");
    }
}
