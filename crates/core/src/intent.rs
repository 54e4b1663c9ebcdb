//! Keyword intents.
//!
//! Spoken replies are matched against a small table of phrases after
//! lowercasing and stripping punctuation. A phrase matches only on word
//! boundaries, so "no" does not fire on "know" and "correct" does not fire on
//! "incorrect".

use crate::session::GameMode;

/// What a reply is asking for or asserting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    /// Say the last prompt again.
    Repeat,
    /// Give me a hint.
    Hint,
    /// Confirms that the engine guessed right.
    Affirm,
    Yes,
    No,
    /// The engine should do the guessing.
    EngineGuesses,
    /// The player wants to do the guessing.
    PlayerGuesses,
}

const INTENT_TABLE: &[(Intent, &[&str])] = &[
    (Intent::Repeat, &["repeat", "say that again", "say it again", "what did you say"]),
    (Intent::Hint, &["hint", "hints", "clue", "help me"]),
    (
        Intent::Affirm,
        &[
            "correct",
            "exactly",
            "yes thats it",
            "yes that is it",
            "yes you guessed it",
            "you got it",
        ],
    ),
    (
        Intent::Yes,
        &["yes", "yeah", "yep", "sure", "okay", "ok", "of course", "lets play", "ja"],
    ),
    (Intent::No, &["no", "nope", "nah", "not now", "stop", "nee"]),
    (
        Intent::EngineGuesses,
        &["you guess", "robot guesses", "you ask", "you go", "your turn", "you can guess"],
    ),
    (
        Intent::PlayerGuesses,
        &["i guess", "i spy", "my turn", "i want to guess", "let me guess"],
    ),
];

/// Words that turn an affirmation into its opposite ("not correct").
const NEGATIONS: &[&str] = &["not", "no", "nope", "isnt", "wrong", "never"];

const FINAL_GUESS_PREFIXES: &[&str] = &["i guess", "my guess is"];

/// Lowercases, drops ASCII punctuation and collapses whitespace.
pub fn normalize(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .filter(|c| !c.is_ascii_punctuation())
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn contains_phrase(normalized: &str, phrase: &str) -> bool {
    format!(" {normalized} ").contains(&format!(" {phrase} "))
}

fn phrases(intent: Intent) -> &'static [&'static str] {
    INTENT_TABLE
        .iter()
        .find(|(candidate, _)| *candidate == intent)
        .map(|(_, phrases)| *phrases)
        .unwrap_or(&[])
}

fn negated(normalized: &str) -> bool {
    NEGATIONS
        .iter()
        .any(|word| contains_phrase(normalized, word))
}

/// Whether `text` expresses `intent`. An affirmation alongside a negation
/// ("no, that's not correct") does not count.
pub fn matches(text: &str, intent: Intent) -> bool {
    let normalized = normalize(text);
    if intent == Intent::Affirm && negated(&normalized) {
        return false;
    }
    phrases(intent)
        .iter()
        .any(|phrase| contains_phrase(&normalized, phrase))
}

/// Interprets a yes/no reply. A refusal wins over an agreement.
pub fn yes_or_no(text: &str) -> Option<bool> {
    if matches(text, Intent::No) {
        Some(false)
    } else if matches(text, Intent::Yes) || matches(text, Intent::Affirm) {
        Some(true)
    } else {
        None
    }
}

/// Result of parsing a mode-selection reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeChoice {
    pub mode: GameMode,
    /// True when the reply was ambiguous and the default was used.
    pub defaulted: bool,
}

/// Parses which side should guess. Ambiguous or empty replies default to the
/// player guessing.
pub fn choose_mode(text: Option<&str>) -> ModeChoice {
    let default = ModeChoice {
        mode: GameMode::PlayerGuesses,
        defaulted: true,
    };
    let Some(text) = text else {
        return default;
    };
    let engine = matches(text, Intent::EngineGuesses);
    let player = matches(text, Intent::PlayerGuesses);
    match (engine, player) {
        (true, false) => ModeChoice {
            mode: GameMode::EngineGuesses,
            defaulted: false,
        },
        (false, true) => ModeChoice {
            mode: GameMode::PlayerGuesses,
            defaulted: false,
        },
        _ => default,
    }
}

/// Extracts the guessed word from "I guess X" style replies.
pub fn final_guess(text: &str) -> Option<String> {
    let normalized = normalize(text);
    FINAL_GUESS_PREFIXES.iter().find_map(|prefix| {
        normalized
            .strip_prefix(prefix)
            .filter(|rest| rest.starts_with(' '))
            .map(|rest| rest.trim().to_string())
            .filter(|rest| !rest.is_empty())
    })
}

/// Takes the last spoken word as the player's name.
pub fn extract_name(text: &str) -> Option<String> {
    text.split_whitespace()
        .last()
        .map(|word| {
            word.chars()
                .filter(|c| !c.is_ascii_punctuation())
                .collect::<String>()
        })
        .filter(|word| !word.is_empty())
}
