//! Hint bookkeeping and the deterministic hint tables.

use crate::object::GameObject;
use crate::round::Difficulty;

/// Hints already given in this session, oldest first. Append-only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HintLedger {
    hints: Vec<String>,
}

impl HintLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, hint: impl Into<String>) {
        let hint = hint.into();
        if !hint.trim().is_empty() {
            self.hints.push(hint);
        }
    }

    pub fn as_slice(&self) -> &[String] {
        &self.hints
    }

    pub fn len(&self) -> usize {
        self.hints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hints.is_empty()
    }
}

/// The opening hint. Difficulty 1 reveals the color, 2 the size as a riddle,
/// 3 nothing concrete.
pub fn initial_hint(difficulty: Difficulty, object: &GameObject) -> String {
    match difficulty.level() {
        1 => format!("The object I'm thinking of is {}.", object.features.color),
        2 => format!(
            "I spy with my little eye, something that is {}.",
            object.features.size
        ),
        _ => "I spy with my little eye, something in this room.".to_string(),
    }
}

/// Canned hint used when hint generation fails. Later rounds reuse the last
/// entry of the difficulty's list.
pub fn canned_hint(difficulty: Difficulty, round: usize, object: &GameObject) -> String {
    let features = &object.features;
    let hints: Vec<String> = match difficulty.level() {
        1 => vec![
            format!("It is {} in color.", features.color),
            format!("It is {} in size.", features.size),
            format!("It has a {} shape.", features.shape),
            "You might use this object every day.".to_string(),
            "Look around the room carefully.".to_string(),
        ],
        2 => vec![
            "This object is used for a specific purpose.".to_string(),
            "You might find this in many homes or offices.".to_string(),
            format!("Think about objects that are {}.", features.size),
            "This object has a specific function.".to_string(),
            "It's something you might interact with regularly.".to_string(),
        ],
        _ => vec![
            "This object serves a purpose that helps people.".to_string(),
            "Look beyond the obvious things in the room.".to_string(),
            "Consider objects you might take for granted.".to_string(),
            "This object has been around for quite some time.".to_string(),
            "Think about what you use in your daily activities.".to_string(),
        ],
    };
    let index = round.min(hints.len() - 1);
    hints[index].clone()
}

/// Removes quotes the model sometimes wraps a single sentence in.
pub fn tidy_hint(raw: &str) -> String {
    raw.trim().trim_matches(|c| c == '"' || c == '\'').trim().to_string()
}
