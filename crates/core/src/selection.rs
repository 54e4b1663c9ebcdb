//! Choosing the secret object from scan candidates.
//!
//! Only candidates labelled by the vision language model are eligible. The
//! five most confident of them form the shortlist; when the model's own pick
//! cannot be matched to the shortlist, a weighted random draw decides, with
//! weights that favour confident (easy to see) objects at low difficulty and
//! less obvious ones at high difficulty.

use crate::error::{OracleError, OracleResult};
use crate::object::{Candidate, CandidateSet, CandidateSource, Features, GameObject};
use crate::round::Difficulty;
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;
use rand::Rng;
use rand::distr::Distribution;
use rand::distr::weighted::WeightedIndex;
use tracing::debug;

pub const SHORTLIST_LEN: usize = 5;
const MIN_WEIGHT: f64 = 0.05;

/// A shortlisted candidate and its draw weight.
#[derive(Debug, Clone, PartialEq)]
pub struct Shortlisted {
    pub id: String,
    pub candidate: Candidate,
    pub weight: f64,
}

/// How strongly a candidate should be preferred at a difficulty.
pub fn difficulty_weight(confidence: f32, difficulty: Difficulty) -> f64 {
    let confidence = f64::from(confidence.clamp(0.0, 1.0));
    let weight = match difficulty.level() {
        1 => confidence,
        2 => 1.0,
        _ => 1.0 - confidence,
    };
    weight.max(MIN_WEIGHT)
}

/// The eligible candidates, most confident first, at most [`SHORTLIST_LEN`].
pub fn shortlist(candidates: &CandidateSet, difficulty: Difficulty) -> Vec<Shortlisted> {
    let mut eligible: Vec<(&String, &Candidate)> = candidates
        .iter()
        .filter(|(_, c)| c.source == CandidateSource::Llm)
        .collect();
    eligible.sort_by(|a, b| b.1.confidence.total_cmp(&a.1.confidence));
    eligible
        .into_iter()
        .take(SHORTLIST_LEN)
        .map(|(id, candidate)| Shortlisted {
            id: id.clone(),
            candidate: candidate.clone(),
            weight: difficulty_weight(candidate.confidence, difficulty),
        })
        .collect()
}

/// Draws one shortlisted candidate according to its weight.
pub fn weighted_draw<'a, R: Rng + ?Sized>(
    shortlist: &'a [Shortlisted],
    rng: &mut R,
) -> Option<&'a Shortlisted> {
    let dist = WeightedIndex::new(shortlist.iter().map(|s| s.weight)).ok()?;
    shortlist.get(dist.sample(rng))
}

/// Finds the shortlisted candidate whose name best matches `name`.
pub fn best_match<'a>(shortlist: &'a [Shortlisted], name: &str) -> Option<&'a Shortlisted> {
    let wanted = name.trim().to_lowercase();
    if wanted.is_empty() {
        return None;
    }
    if let Some(exact) = shortlist
        .iter()
        .find(|s| s.candidate.name.to_lowercase() == wanted)
    {
        return Some(exact);
    }
    let matcher = SkimMatcherV2::default();
    shortlist
        .iter()
        .filter_map(|s| {
            let candidate = s.candidate.name.to_lowercase();
            let score = matcher
                .fuzzy_match(&wanted, &candidate)
                .max(matcher.fuzzy_match(&candidate, &wanted));
            score.map(|score| (score, s))
        })
        .max_by_key(|(score, _)| *score)
        .map(|(_, s)| s)
}

/// Builds a game object straight from a candidate's scan data.
pub fn object_from_candidate(shortlisted: &Shortlisted) -> GameObject {
    GameObject {
        name: shortlisted.candidate.name.clone(),
        localized_name: String::new(),
        features: shortlisted.candidate.features.clone(),
        source_location_id: shortlisted.candidate.location_id.clone(),
    }
    .with_concrete_features()
}

/// Completes a model-provided descriptor with what the scan knows about it.
pub fn merge_with_candidate(mut object: GameObject, shortlisted: &Shortlisted) -> GameObject {
    let scanned: &Features = &shortlisted.candidate.features;
    let unknown = |v: &str| v.trim().is_empty() || v.eq_ignore_ascii_case("unknown");
    if unknown(&object.features.color) {
        object.features.color = scanned.color.clone();
    }
    if unknown(&object.features.size) {
        object.features.size = scanned.size.clone();
    }
    if unknown(&object.features.shape) {
        object.features.shape = scanned.shape.clone();
    }
    if object.source_location_id.trim().is_empty() {
        object.source_location_id = shortlisted.candidate.location_id.clone();
    }
    object.with_concrete_features()
}

/// Picks an object without any model input, using the thread-local RNG.
pub fn draw_locally(candidates: &CandidateSet, difficulty: Difficulty) -> Option<GameObject> {
    let list = shortlist(candidates, difficulty);
    let mut rng = rand::rng();
    let chosen = weighted_draw(&list, &mut rng)?;
    debug!(object = %chosen.candidate.name, "Drew object locally.");
    Some(object_from_candidate(chosen))
}

/// Parses a descriptor from model output: first as JSON, then by extracting
/// the outermost `{…}` block from surrounding prose.
pub fn parse_descriptor(text: &str) -> OracleResult<GameObject> {
    if let Ok(object) = serde_json::from_str::<GameObject>(text.trim()) {
        return Ok(object);
    }
    let start = text.find('{');
    let end = text.rfind('}');
    match (start, end) {
        (Some(start), Some(end)) if start < end => {
            serde_json::from_str::<GameObject>(&text[start..=end]).map_err(|e| {
                OracleError::Malformed(format!("object descriptor did not parse: {e}"))
            })
        }
        _ => Err(OracleError::Malformed(
            "no JSON object in descriptor response".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn candidate(name: &str, confidence: f32, source: CandidateSource) -> Candidate {
        Candidate {
            name: name.to_string(),
            features: Features::default(),
            confidence,
            source,
            location_id: format!("{name}_spot"),
        }
    }

    fn scene() -> CandidateSet {
        let mut set = CandidateSet::new();
        set.insert("a".into(), candidate("monitor", 0.95, CandidateSource::Llm));
        set.insert("b".into(), candidate("cup", 0.80, CandidateSource::Llm));
        set.insert("c".into(), candidate("person", 0.99, CandidateSource::Detector));
        set.insert("d".into(), candidate("plant", 0.60, CandidateSource::Llm));
        set.insert("e".into(), candidate("book", 0.50, CandidateSource::Llm));
        set.insert("f".into(), candidate("lamp", 0.40, CandidateSource::Llm));
        set.insert("g".into(), candidate("pen", 0.30, CandidateSource::Llm));
        set
    }

    #[test]
    fn test_shortlist_rejects_detector_candidates_and_keeps_top_five() {
        let list = shortlist(&scene(), Difficulty::EASY);
        let names: Vec<&str> = list.iter().map(|s| s.candidate.name.as_str()).collect();
        assert_eq!(names, vec!["monitor", "cup", "plant", "book", "lamp"]);
    }

    #[test]
    fn test_weights_follow_difficulty() {
        let easy = |confidence| difficulty_weight(confidence, Difficulty::EASY);
        let hard = |confidence| difficulty_weight(confidence, Difficulty::HARD);
        assert!(easy(0.9) > easy(0.3));
        assert!(hard(0.9) < hard(0.3));
        assert_eq!(difficulty_weight(1.0, Difficulty::HARD), MIN_WEIGHT);
    }

    #[test]
    fn test_weighted_draw_only_returns_shortlisted() {
        let list = shortlist(&scene(), Difficulty::MEDIUM);
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let drawn = weighted_draw(&list, &mut rng).unwrap();
            assert_ne!(drawn.candidate.name, "person");
            assert_ne!(drawn.candidate.name, "pen");
        }
        assert!(weighted_draw(&[], &mut rng).is_none());
    }

    #[test]
    fn test_best_match_tolerates_extra_words() {
        let list = shortlist(&scene(), Difficulty::EASY);
        assert_eq!(best_match(&list, "Cup").unwrap().id, "b");
        assert_eq!(best_match(&list, "the monitor").unwrap().id, "a");
        assert!(best_match(&list, "").is_none());
    }

    #[test]
    fn test_object_from_candidate_has_concrete_features() {
        let list = shortlist(&scene(), Difficulty::EASY);
        let object = object_from_candidate(&list[0]);
        assert_eq!(object.features.color, "black");
        assert_eq!(object.source_location_id, "monitor_spot");
    }

    #[test]
    fn test_parse_descriptor_extracts_from_prose() {
        let text = "Sure! Here it is:\n{\"name\": \"cup\", \"dutch_name\": \"kopje\"}\nHave fun!";
        let object = parse_descriptor(text).unwrap();
        assert_eq!(object.name, "cup");
        assert!(matches!(
            parse_descriptor("I pick the cup"),
            Err(OracleError::Malformed(_))
        ));
    }
}
