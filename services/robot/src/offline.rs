use async_trait::async_trait;
use ispy_core::error::{OracleError, OracleResult};
use ispy_core::object::{CandidateSet, GameObject};
use ispy_core::oracle::{Judgement, Oracle, YesNo};
use ispy_core::round::{Difficulty, Round};

/// An oracle with no model behind it. Every call fails with a transport
/// error, so a game runs entirely on the engine's local fallbacks.
pub struct OfflineOracle;

fn offline() -> OracleError {
    OracleError::Transport(anyhow::anyhow!("no language model configured"))
}

#[async_trait]
impl Oracle for OfflineOracle {
    async fn next_question(
        &self,
        _last_feedback: &str,
        _history: &[Round],
    ) -> OracleResult<String> {
        Err(offline())
    }

    async fn answer_yes_no(&self, _secret: &str, _question: &str) -> OracleResult<YesNo> {
        Err(offline())
    }

    async fn pick_secret_word(&self) -> OracleResult<String> {
        Err(offline())
    }

    async fn pick_object(
        &self,
        _candidates: &CandidateSet,
        _difficulty: Difficulty,
    ) -> OracleResult<Option<GameObject>> {
        Err(offline())
    }

    async fn generate_hint(
        &self,
        _object: &GameObject,
        _difficulty: Difficulty,
        _round: usize,
        _previous_hints: &[String],
        _initial: bool,
    ) -> OracleResult<String> {
        Err(offline())
    }

    async fn judge_guess(
        &self,
        _guess: &str,
        _object: &GameObject,
        _round: usize,
        _previous_hints: &[String],
    ) -> OracleResult<Judgement> {
        Err(offline())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::demo_scene;
    use ispy_core::oracle::{FALLBACK_SECRET_WORD, QUESTION_APOLOGY, ResilientOracle};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_offline_game_runs_on_fallbacks() {
        let oracle = ResilientOracle::new(Arc::new(OfflineOracle));

        assert_eq!(oracle.next_question("", &[]).await, QUESTION_APOLOGY);
        assert_eq!(oracle.pick_secret_word().await, FALLBACK_SECRET_WORD);
        assert_eq!(oracle.answer_yes_no("apple", "is it red").await, YesNo::DontKnow);

        let object = oracle
            .pick_object(&demo_scene(), Difficulty::EASY)
            .await
            .expect("a local draw from a non-empty scene");
        assert!(demo_scene().values().any(|c| c.name == object.name));

        let hint = oracle
            .generate_hint(&object, Difficulty::EASY, 0, &[], true)
            .await;
        assert!(!hint.is_empty());
        assert!(!hint.to_lowercase().contains(&object.name.to_lowercase()));

        let judgement = oracle
            .judge_guess(&format!("the {}", object.name), &object, 0, &[hint])
            .await;
        assert!(judgement.correct);
    }
}
