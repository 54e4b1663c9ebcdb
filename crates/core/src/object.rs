//! The secret entity and the scan candidates it is chosen from.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const UNKNOWN: &str = "unknown";

/// Known defaults for objects commonly found in a room: (name, color, size, shape).
///
/// Keys are matched against whole words of the object name, starting from the
/// last word, so "desk lamp" is a lamp and "pencil" is not a pen.
const FEATURE_TABLE: &[(&str, &str, &str, &str)] = &[
    ("monitor", "black", "large", "rectangular"),
    ("keyboard", "black", "medium", "rectangular"),
    ("mouse", "black", "small", "oval"),
    ("laptop", "silver", "medium", "rectangular"),
    ("phone", "black", "small", "rectangular"),
    ("chair", "black", "large", "L-shaped"),
    ("table", "brown", "large", "rectangular"),
    ("desk", "brown", "large", "rectangular"),
    ("cup", "white", "small", "cylindrical"),
    ("mug", "white", "small", "cylindrical"),
    ("bottle", "clear", "small", "cylindrical"),
    ("book", "blue", "small", "rectangular"),
    ("plant", "green", "medium", "leafy"),
    ("lamp", "white", "medium", "tall"),
    ("clock", "white", "small", "round"),
    ("backpack", "black", "medium", "boxy"),
    ("pen", "blue", "small", "long and thin"),
    ("door", "white", "large", "rectangular"),
    ("window", "clear", "large", "rectangular"),
    ("banana", "yellow", "small", "curved"),
    ("apple", "red", "small", "round"),
    ("ball", "red", "small", "round"),
];

const DEFAULT_FEATURES: (&str, &str, &str) = ("colorful", "medium", "ordinary");

/// Visible attributes used for hints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Features {
    /// The primary color(s) of the object.
    #[serde(default = "unknown")]
    pub color: String,
    /// Approximate size: small, medium or large.
    #[serde(default = "unknown")]
    pub size: String,
    /// A short description of the object's shape.
    #[serde(default = "unknown")]
    pub shape: String,
}

fn unknown() -> String {
    UNKNOWN.to_string()
}

impl Default for Features {
    fn default() -> Self {
        Self {
            color: unknown(),
            size: unknown(),
            shape: unknown(),
        }
    }
}

fn is_unknown(value: &str) -> bool {
    let value = value.trim();
    value.is_empty() || value.eq_ignore_ascii_case(UNKNOWN)
}

/// Looks up the table defaults for an object name.
pub fn fallback_features(name: &str) -> (&'static str, &'static str, &'static str) {
    let lowered = name.to_lowercase();
    lowered
        .split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .rev()
        .find_map(|word| {
            let singular = word.strip_suffix('s').unwrap_or(word);
            FEATURE_TABLE
                .iter()
                .find(|(key, ..)| *key == word || *key == singular)
        })
        .map(|(_, color, size, shape)| (*color, *size, *shape))
        .unwrap_or(DEFAULT_FEATURES)
}

/// The object chosen for a player-guesses game. Immutable once chosen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct GameObject {
    /// The English name of the object.
    pub name: String,
    /// The Dutch translation of the object name.
    #[serde(rename = "dutch_name", alias = "localized_name", default)]
    pub localized_name: String,
    #[serde(default)]
    pub features: Features,
    /// Where the object was detected during the scan (e.g. "2_left").
    #[serde(rename = "position_id", alias = "position", default)]
    pub source_location_id: String,
}

impl GameObject {
    /// Replaces every missing or "unknown" feature with the lookup-table value
    /// for this object's name.
    pub fn with_concrete_features(mut self) -> Self {
        let (color, size, shape) = fallback_features(&self.name);
        if is_unknown(&self.features.color) {
            self.features.color = color.to_string();
        }
        if is_unknown(&self.features.size) {
            self.features.size = size.to_string();
        }
        if is_unknown(&self.features.shape) {
            self.features.shape = shape.to_string();
        }
        self
    }

    /// The localized name, or the English one when no translation is known.
    pub fn display_localized(&self) -> &str {
        if self.localized_name.trim().is_empty() {
            &self.name
        } else {
            &self.localized_name
        }
    }
}

/// Which detector produced a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateSource {
    /// Labelled by the vision language model; carries rich descriptions.
    #[serde(alias = "chatgpt")]
    Llm,
    /// Labelled by a plain object detector.
    #[serde(alias = "yolo")]
    Detector,
}

/// An object seen during the scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub name: String,
    #[serde(default)]
    pub features: Features,
    pub confidence: f32,
    pub source: CandidateSource,
    #[serde(default, alias = "position_id")]
    pub location_id: String,
}

/// Scan results keyed by detection id.
pub type CandidateSet = BTreeMap<String, Candidate>;

#[cfg(test)]
mod tests {
    use super::*;

    fn object(name: &str, color: &str) -> GameObject {
        GameObject {
            name: name.to_string(),
            localized_name: String::new(),
            features: Features {
                color: color.to_string(),
                ..Features::default()
            },
            source_location_id: "1_center".to_string(),
        }
    }

    #[test]
    fn test_unknown_monitor_color_becomes_black() {
        let fixed = object("monitor", "unknown").with_concrete_features();
        assert_eq!(fixed.features.color, "black");
        assert_eq!(fixed.features.size, "large");
        assert_eq!(fixed.features.shape, "rectangular");
    }

    #[test]
    fn test_known_features_are_kept() {
        let fixed = object("computer monitor", "grey").with_concrete_features();
        assert_eq!(fixed.features.color, "grey");
        assert_eq!(fixed.features.size, "large");
    }

    #[test]
    fn test_lookup_matches_whole_words_from_the_end() {
        assert_eq!(fallback_features("desk lamp"), ("white", "medium", "tall"));
        assert_eq!(fallback_features("Coffee-Cup"), ("white", "small", "cylindrical"));
        assert_eq!(fallback_features("books"), ("blue", "small", "rectangular"));
        assert_eq!(fallback_features("pencil"), DEFAULT_FEATURES);
        assert_eq!(fallback_features("cupboard"), DEFAULT_FEATURES);
        assert_eq!(fallback_features("open box"), DEFAULT_FEATURES);
    }

    #[test]
    fn test_unlisted_name_gets_generic_features() {
        let fixed = object("sculpture", "UNKNOWN").with_concrete_features();
        assert_eq!(fixed.features.color, "colorful");
        assert!(!is_unknown(&fixed.features.shape));
    }

    #[test]
    fn test_descriptor_accepts_llm_field_names() {
        let json = r#"{
            "name": "cup",
            "dutch_name": "kopje",
            "confidence": 0.9,
            "position": "0_right",
            "features": {"color": "white", "size": "small"}
        }"#;
        let parsed: GameObject = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.localized_name, "kopje");
        assert_eq!(parsed.source_location_id, "0_right");
        assert_eq!(parsed.features.shape, "unknown");
    }

    #[test]
    fn test_candidate_source_aliases() {
        let source: CandidateSource = serde_json::from_str("\"chatgpt\"").unwrap();
        assert_eq!(source, CandidateSource::Llm);
    }
}
