//! An [`Oracle`] backed by a chat-completion model.
//!
//! Prompt wording lives in Markdown templates keyed by file stem
//! (`next_question`, `answer_yes_no`, `pick_secret_word`, `pick_object`,
//! `generate_hint`, `judge_guess`, `wrong_guess`). Templates use `{name}`
//! placeholders that are substituted before each request.

use crate::error::{OracleError, OracleResult};
use crate::hints::initial_hint;
use crate::intent::normalize;
use crate::llm_client::{Completion, LLMClient};
use crate::object::{CandidateSet, GameObject};
use crate::oracle::{
    Judgement, Oracle, SEMANTIC_MIN_WORDS, YesNo, correct_response, guess_names_object,
};
use crate::round::{Difficulty, Round};
use crate::selection::{
    best_match, merge_with_candidate, object_from_candidate, parse_descriptor, shortlist,
    weighted_draw,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

const SYSTEM_PROMPT: &str = "You are a friendly robot playing guessing games with people. \
    Everything you write is spoken aloud, so keep it short and simple.";

const VERDICT_PREFIX: &str = "verdict:";

/// Every template key the oracle reads.
pub const PROMPT_KEYS: &[&str] = &[
    "next_question",
    "answer_yes_no",
    "pick_secret_word",
    "pick_object",
    "generate_hint",
    "judge_guess",
    "wrong_guess",
];

/// Fills `{key}` placeholders in a template.
fn fill(template: &str, values: &[(&str, &str)]) -> String {
    values
        .iter()
        .fold(template.to_string(), |text, (key, value)| {
            text.replace(&format!("{{{key}}}"), value)
        })
}

/// The text between `<<<` and `>>>`, or the whole reply when unframed.
fn extract_delimited(reply: &str) -> String {
    reply
        .find("<<<")
        .and_then(|start| {
            let body = &reply[start + 3..];
            body.find(">>>").map(|end| body[..end].trim().to_string())
        })
        .unwrap_or_else(|| reply.trim().to_string())
}

fn format_history(history: &[Round]) -> String {
    if history.is_empty() {
        return "None".to_string();
    }
    history
        .iter()
        .enumerate()
        .map(|(i, round)| {
            format!(
                "{}. Question: {} | Feedback: {}",
                i + 1,
                round.prompt_spoken,
                round.feedback()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_hints(hints: &[String]) -> String {
    if hints.is_empty() {
        "None".to_string()
    } else {
        hints.join(" | ")
    }
}

/// What a generated hint should focus on as the rounds progress.
fn round_guidance(round: usize) -> String {
    match round {
        0 => "- Is in English only\n\
               - Mentions the color of the object\n\
               - Is clear and straightforward"
            .to_string(),
        1 => "- Is in Dutch only, enclosed in <nl>...</nl> tags\n\
               - Mentions the shape of the object\n\
               - Uses simple Dutch vocabulary"
            .to_string(),
        _ => format!(
            "- Is bilingual: first in Dutch (in <nl>...</nl> tags), then in English\n\
             - Mentions the size or another attribute\n\
             - Is more specific than earlier hints (this is round {})",
            round + 1
        ),
    }
}

fn difficulty_guidance(difficulty: Difficulty) -> &'static str {
    match difficulty.level() {
        1 => "- Is suitable for young players\n- Makes the object fairly easy to guess",
        2 => "- Is moderately challenging but fair",
        _ => "- Is challenging, with indirect references",
    }
}

/// Splits a judge reply into its verdict and the line to speak.
fn parse_verdict(reply: &str) -> OracleResult<(bool, String)> {
    let mut verdict = None;
    let mut spoken = Vec::new();
    for line in reply.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let lowered = line.to_lowercase();
        match lowered.strip_prefix(VERDICT_PREFIX) {
            Some(value) if verdict.is_none() => {
                verdict = Some(value.trim().starts_with("correct"));
            }
            _ => spoken.push(line),
        }
    }
    let correct = verdict.ok_or_else(|| {
        OracleError::Malformed(format!("judge reply has no verdict line: {reply}"))
    })?;
    Ok((correct, spoken.join(" ")))
}

pub struct LlmOracle {
    client: Arc<dyn LLMClient>,
    prompts: HashMap<String, String>,
}

impl LlmOracle {
    /// Creates an oracle over `client`.
    ///
    /// # Arguments
    ///
    /// * `client` - The chat-completion client used for every request.
    /// * `prompts` - Templates keyed by prompt name, usually loaded from the
    ///   prompts directory at startup.
    pub fn new(client: Arc<dyn LLMClient>, prompts: HashMap<String, String>) -> Self {
        Self { client, prompts }
    }

    fn template(&self, key: &str) -> OracleResult<&str> {
        self.prompts
            .get(key)
            .map(String::as_str)
            .ok_or_else(|| OracleError::MissingPrompt(key.to_string()))
    }

    async fn complete(
        &self,
        prompt: String,
        max_tokens: u32,
        temperature: f32,
    ) -> OracleResult<String> {
        debug!(%prompt, "Sending oracle prompt.");
        let request = Completion::new(prompt, max_tokens, temperature).with_system(SYSTEM_PROMPT);
        let reply = self.client.complete(request).await?;
        debug!(%reply, "Oracle replied.");
        Ok(reply)
    }
}

#[async_trait]
impl Oracle for LlmOracle {
    async fn next_question(&self, last_feedback: &str, history: &[Round]) -> OracleResult<String> {
        let prompt = fill(
            self.template("next_question")?,
            &[
                ("history", format_history(history).as_str()),
                ("last_feedback", last_feedback),
            ],
        );
        let reply = self.complete(prompt, 200, 0.8).await?;
        let question = extract_delimited(&reply);
        if question.is_empty() {
            return Err(OracleError::Malformed("empty question".to_string()));
        }
        Ok(question)
    }

    async fn answer_yes_no(&self, secret: &str, question: &str) -> OracleResult<YesNo> {
        let prompt = fill(
            self.template("answer_yes_no")?,
            &[("secret", secret), ("question", question)],
        );
        let reply = self.complete(prompt, 20, 0.0).await?;
        Ok(YesNo::from_reply(&reply))
    }

    async fn pick_secret_word(&self) -> OracleResult<String> {
        let prompt = self.template("pick_secret_word")?.to_string();
        let reply = self.complete(prompt, 10, 0.5).await?;
        normalize(&reply)
            .split_whitespace()
            .next()
            .map(str::to_string)
            .ok_or_else(|| OracleError::Malformed("no secret word in reply".to_string()))
    }

    async fn pick_object(
        &self,
        candidates: &CandidateSet,
        difficulty: Difficulty,
    ) -> OracleResult<Option<GameObject>> {
        let list = shortlist(candidates, difficulty);
        if list.is_empty() {
            info!("No eligible candidates to pick from.");
            return Ok(None);
        }

        let offered: Vec<serde_json::Value> = list
            .iter()
            .map(|s| {
                serde_json::json!({
                    "id": s.id,
                    "name": s.candidate.name,
                    "confidence": s.candidate.confidence,
                    "position_id": s.candidate.location_id,
                    "features": s.candidate.features,
                })
            })
            .collect();
        let offered = serde_json::to_string_pretty(&offered)
            .map_err(|e| OracleError::Transport(e.into()))?;
        let schema = serde_json::to_string_pretty(&schemars::schema_for!(GameObject))
            .map_err(|e| OracleError::Transport(e.into()))?;

        let prompt = fill(
            self.template("pick_object")?,
            &[
                ("difficulty", difficulty.to_string().as_str()),
                ("candidates", offered.as_str()),
                ("schema", schema.as_str()),
            ],
        );
        let reply = self.complete(prompt, 300, 0.3).await?;
        let descriptor = parse_descriptor(&reply)?;

        let chosen = match best_match(&list, &descriptor.name) {
            Some(matched) => merge_with_candidate(descriptor, matched),
            None => {
                info!(
                    suggested = %descriptor.name,
                    "Model picked an object outside the shortlist; drawing instead."
                );
                let mut rng = rand::rng();
                match weighted_draw(&list, &mut rng) {
                    Some(drawn) => object_from_candidate(drawn),
                    None => return Ok(None),
                }
            }
        };
        Ok(Some(chosen))
    }

    async fn generate_hint(
        &self,
        object: &GameObject,
        difficulty: Difficulty,
        round: usize,
        previous_hints: &[String],
        initial: bool,
    ) -> OracleResult<String> {
        if initial {
            return Ok(initial_hint(difficulty, object));
        }
        let prompt = fill(
            self.template("generate_hint")?,
            &[
                ("name", object.name.as_str()),
                ("localized_name", object.display_localized()),
                ("color", object.features.color.as_str()),
                ("size", object.features.size.as_str()),
                ("shape", object.features.shape.as_str()),
                ("round", (round + 1).to_string().as_str()),
                ("difficulty", difficulty.to_string().as_str()),
                ("previous_hints", format_hints(previous_hints).as_str()),
                ("round_guidance", round_guidance(round).as_str()),
                ("difficulty_guidance", difficulty_guidance(difficulty)),
            ],
        );
        self.complete(prompt, 100, 0.7).await
    }

    async fn judge_guess(
        &self,
        guess: &str,
        object: &GameObject,
        round: usize,
        previous_hints: &[String],
    ) -> OracleResult<Judgement> {
        if guess_names_object(guess, object) {
            return Ok(Judgement {
                response: correct_response(object),
                correct: true,
            });
        }

        let hints = format_hints(previous_hints);
        let round_number = (round + 1).to_string();
        let mut values = vec![
            ("guess", guess),
            ("name", object.name.as_str()),
            ("localized_name", object.display_localized()),
            ("color", object.features.color.as_str()),
            ("size", object.features.size.as_str()),
            ("shape", object.features.shape.as_str()),
            ("previous_hints", hints.as_str()),
        ];

        if guess.split_whitespace().count() >= SEMANTIC_MIN_WORDS {
            let prompt = fill(self.template("judge_guess")?, &values);
            let reply = self.complete(prompt, 120, 0.3).await?;
            let (correct, spoken) = parse_verdict(&reply)?;
            if correct {
                return Ok(Judgement {
                    response: correct_response(object),
                    correct: true,
                });
            }
            if spoken.is_empty() {
                return Err(OracleError::Malformed(
                    "judge reply has no response line".to_string(),
                ));
            }
            return Ok(Judgement {
                response: spoken,
                correct: false,
            });
        }

        values.push(("round", round_number.as_str()));
        let prompt = fill(self.template("wrong_guess")?, &values);
        let response = self.complete(prompt, 100, 0.7).await?;
        Ok(Judgement {
            response,
            correct: false,
        })
    }
}
