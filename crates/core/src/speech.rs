//! Speech output and gesture playback.
//!
//! The physical voice and motion layers are external; the engine only sees the
//! [`SpeechChannel`] and [`GesturePort`] contracts. [`Dialogue`] sits on top of
//! them: it switches voice language per tagged span and runs a gesture
//! alongside the speech, waiting for both to finish.

use crate::object::GameObject;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

const DUTCH_OPEN: &str = "<nl>";
const DUTCH_CLOSE: &str = "</nl>";

/// Voice language for a span of speech.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    English,
    Dutch,
}

impl Language {
    pub fn code(&self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Dutch => "nl",
        }
    }
}

/// Named animations the body can play while speaking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gesture {
    Beat,
    ShakeNo,
    Celebration,
    Defeat,
    Wave,
    GoodbyeWave,
}

impl fmt::Display for Gesture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Gesture::Beat => "beat_gesture",
            Gesture::ShakeNo => "shake_no",
            Gesture::Celebration => "celebration",
            Gesture::Defeat => "defeat",
            Gesture::Wave => "wave_gesture",
            Gesture::GoodbyeWave => "goodbye_wave",
        };
        f.write_str(name)
    }
}

/// Text-to-speech output. Resolves once the utterance has been spoken.
#[async_trait]
pub trait SpeechChannel: Send + Sync {
    async fn say(&self, text: &str, language: Language) -> anyhow::Result<()>;
}

/// Gesture playback. Resolves once the motion has finished.
#[async_trait]
pub trait GesturePort: Send + Sync {
    async fn play(&self, gesture: Gesture) -> anyhow::Result<()>;

    /// Physically indicates where the object was seen.
    async fn point_to(&self, object: &GameObject) -> anyhow::Result<()>;
}

/// A span of text to be spoken in a single language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub text: String,
    pub language: Language,
}

/// Splits text on `<nl>…</nl>` tags into language spans.
///
/// Whitespace-only English spans are dropped. An unterminated `<nl>` tag makes
/// the remainder of the text Dutch.
pub fn split_language_spans(text: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut rest = text;

    let mut push = |chunk: &str, language: Language| {
        let chunk = chunk.trim();
        if !chunk.is_empty() {
            segments.push(Segment {
                text: chunk.to_string(),
                language,
            });
        }
    };

    while let Some(open) = rest.find(DUTCH_OPEN) {
        push(&rest[..open], Language::English);
        let after_open = &rest[open + DUTCH_OPEN.len()..];
        match after_open.find(DUTCH_CLOSE) {
            Some(close) => {
                push(&after_open[..close], Language::Dutch);
                rest = &after_open[close + DUTCH_CLOSE.len()..];
            }
            None => {
                push(after_open, Language::Dutch);
                rest = "";
            }
        }
    }
    push(rest, Language::English);
    segments
}

/// Speaks on behalf of the engine. External failures are logged and reported
/// as `false` so the game can always move on to its next line.
#[derive(Clone)]
pub struct Dialogue {
    speech: Arc<dyn SpeechChannel>,
    gestures: Arc<dyn GesturePort>,
}

impl Dialogue {
    pub fn new(speech: Arc<dyn SpeechChannel>, gestures: Arc<dyn GesturePort>) -> Self {
        Self { speech, gestures }
    }

    /// Speaks `text`, playing `gesture` together with the first English span.
    pub async fn say(&self, text: &str, gesture: Option<Gesture>) -> bool {
        let mut pending_gesture = gesture;
        let mut all_ok = true;

        for segment in split_language_spans(text) {
            let gesture = match segment.language {
                Language::English => pending_gesture.take(),
                Language::Dutch => None,
            };
            let ok = match gesture {
                Some(gesture) => {
                    let (spoken, played) = tokio::join!(
                        self.speech.say(&segment.text, segment.language),
                        self.gestures.play(gesture)
                    );
                    if let Err(e) = played {
                        warn!(%gesture, error = ?e, "Gesture playback failed.");
                    }
                    spoken
                }
                None => self.speech.say(&segment.text, segment.language).await,
            };
            match ok {
                Ok(()) => {
                    debug!(lang = segment.language.code(), text = %segment.text, "Spoke segment.")
                }
                Err(e) => {
                    warn!(lang = segment.language.code(), error = ?e, "Speech output failed.");
                    all_ok = false;
                }
            }
        }
        all_ok
    }

    /// Starts speaking without waiting for completion.
    pub fn say_detached(&self, text: &str, gesture: Option<Gesture>) {
        let dialogue = self.clone();
        let text = text.to_string();
        tokio::spawn(async move {
            dialogue.say(&text, gesture).await;
        });
    }

    /// Points at the object's recorded location.
    pub async fn point_to(&self, object: &GameObject) -> bool {
        match self.gestures.point_to(object).await {
            Ok(()) => true,
            Err(e) => {
                warn!(object = %object.name, error = ?e, "Pointing at object failed.");
                false
            }
        }
    }
}
