//! Scene scanning for the console runtime.
//!
//! Without a camera the scan result comes from a JSON file shaped like the
//! vision pipeline's output (detection id to candidate), re-read on every scan
//! so the scene can be edited between matches. With no file configured a
//! small built-in living room is used.

use anyhow::Context;
use async_trait::async_trait;
use ispy_core::object::{Candidate, CandidateSet, CandidateSource, Features};
use ispy_core::scanner::Scanner;
use std::path::PathBuf;
use tracing::debug;

pub struct SceneScanner {
    path: Option<PathBuf>,
}

impl SceneScanner {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }
}

fn candidate(
    name: &str,
    (color, size, shape): (&str, &str, &str),
    confidence: f32,
    source: CandidateSource,
    location_id: &str,
) -> Candidate {
    Candidate {
        name: name.to_string(),
        features: Features {
            color: color.to_string(),
            size: size.to_string(),
            shape: shape.to_string(),
        },
        confidence,
        source,
        location_id: location_id.to_string(),
    }
}

pub fn demo_scene() -> CandidateSet {
    let llm = CandidateSource::Llm;
    [
        candidate("cup", ("white", "small", "cylindrical"), 0.92, llm, "0_left"),
        candidate("book", ("red", "medium", "rectangular"), 0.88, llm, "1_center"),
        candidate("plant", ("green", "medium", "leafy"), 0.81, llm, "2_right"),
        candidate(
            "chair",
            ("unknown", "unknown", "unknown"),
            0.64,
            CandidateSource::Detector,
            "3_right",
        ),
    ]
    .into_iter()
    .enumerate()
    .map(|(id, candidate)| (id.to_string(), candidate))
    .collect()
}

#[async_trait]
impl Scanner for SceneScanner {
    async fn scan(&self) -> anyhow::Result<CandidateSet> {
        let Some(path) = &self.path else {
            return Ok(demo_scene());
        };
        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read scene file {}", path.display()))?;
        let candidates: CandidateSet = serde_json::from_str(&raw)
            .with_context(|| format!("Scene file {} is not a candidate map", path.display()))?;
        debug!(candidates = candidates.len(), path = %path.display(), "Scene loaded.");
        Ok(candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_demo_scene_without_path() {
        let scene = SceneScanner::new(None).scan().await.unwrap();
        assert_eq!(scene.len(), 4);
        assert_eq!(scene["0"].name, "cup");
        assert_eq!(scene["3"].source, CandidateSource::Detector);
    }

    #[tokio::test]
    async fn test_scene_file_uses_vision_field_names() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "7": {{
                    "name": "lamp",
                    "features": {{"color": "yellow"}},
                    "confidence": 0.7,
                    "source": "yolo",
                    "position_id": "7_left"
                }}
            }}"#
        )
        .unwrap();

        let scene = SceneScanner::new(Some(file.path().to_path_buf()))
            .scan()
            .await
            .unwrap();

        let lamp = &scene["7"];
        assert_eq!(lamp.name, "lamp");
        assert_eq!(lamp.features.color, "yellow");
        assert_eq!(lamp.features.size, "unknown");
        assert_eq!(lamp.source, CandidateSource::Detector);
        assert_eq!(lamp.location_id, "7_left");
    }

    #[tokio::test]
    async fn test_broken_scene_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        let scanner = SceneScanner::new(Some(file.path().to_path_buf()));
        assert!(scanner.scan().await.is_err());

        let missing = SceneScanner::new(Some(PathBuf::from("/definitely/not/here.json")));
        assert!(missing.scan().await.is_err());
    }
}
