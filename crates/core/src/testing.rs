//! In-memory collaborators shared by the unit tests.

use crate::listen::{ListenPort, Utterance};
use crate::object::GameObject;
use crate::speech::{Dialogue, GesturePort, Gesture, Language, SpeechChannel};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Records every spoken span as `"[lang] text"`.
#[derive(Default)]
pub struct RecordingSpeech {
    lines: Mutex<Vec<String>>,
    fail: bool,
}

impl RecordingSpeech {
    pub fn failing() -> Self {
        Self {
            lines: Mutex::default(),
            fail: true,
        }
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }

    /// Spoken English text only, without the language tag.
    pub fn english(&self) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter_map(|line| line.strip_prefix("[en] ").map(str::to_string))
            .collect()
    }

    pub fn said(&self, needle: &str) -> bool {
        self.lines().iter().any(|line| line.contains(needle))
    }
}

#[async_trait]
impl SpeechChannel for RecordingSpeech {
    async fn say(&self, text: &str, language: Language) -> anyhow::Result<()> {
        if self.fail {
            anyhow::bail!("speaker unplugged");
        }
        self.lines
            .lock()
            .unwrap()
            .push(format!("[{}] {}", language.code(), text));
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingGestures {
    played: Mutex<Vec<Gesture>>,
    pointed: Mutex<Vec<String>>,
}

impl RecordingGestures {
    pub fn played(&self) -> Vec<Gesture> {
        self.played.lock().unwrap().clone()
    }

    pub fn pointed(&self) -> Vec<String> {
        self.pointed.lock().unwrap().clone()
    }
}

#[async_trait]
impl GesturePort for RecordingGestures {
    async fn play(&self, gesture: Gesture) -> anyhow::Result<()> {
        self.played.lock().unwrap().push(gesture);
        Ok(())
    }

    async fn point_to(&self, object: &GameObject) -> anyhow::Result<()> {
        self.pointed.lock().unwrap().push(object.name.clone());
        Ok(())
    }
}

/// Yields one scripted entry per poll. Clearing is a no-op so the script is
/// observed exactly as written.
pub struct ScriptedListen {
    polls: VecDeque<Option<String>>,
}

impl ScriptedListen {
    pub fn new(polls: Vec<Option<&str>>) -> Self {
        Self {
            polls: polls.into_iter().map(|p| p.map(str::to_string)).collect(),
        }
    }
}

impl ListenPort for ScriptedListen {
    fn drain(&mut self) -> Option<Utterance> {
        self.polls
            .pop_front()
            .flatten()
            .map(|text| Utterance::new(text.split_whitespace().map(str::to_string).collect()))
    }

    fn clear(&mut self) {}
}

/// Yields one scripted reply per listen. Each `clear` (the start of a listen)
/// loads the next reply, which the first following drain returns. `None`
/// entries and an exhausted script mean the player stays silent.
pub struct ScriptedReplies {
    replies: VecDeque<Option<String>>,
    pending: Option<String>,
}

impl ScriptedReplies {
    pub fn new(replies: Vec<Option<&str>>) -> Self {
        Self {
            replies: replies.into_iter().map(|r| r.map(str::to_string)).collect(),
            pending: None,
        }
    }
}

impl ListenPort for ScriptedReplies {
    fn drain(&mut self) -> Option<Utterance> {
        self.pending
            .take()
            .map(|text| Utterance::new(text.split_whitespace().map(str::to_string).collect()))
    }

    fn clear(&mut self) {
        self.pending = self.replies.pop_front().flatten();
    }
}

pub fn dialogue_with() -> (Dialogue, Arc<RecordingSpeech>) {
    let speech = Arc::new(RecordingSpeech::default());
    let gestures = Arc::new(RecordingGestures::default());
    (Dialogue::new(speech.clone(), gestures), speech)
}

/// A dialogue whose gestures are observable too.
pub fn dialogue_with_gestures() -> (Dialogue, Arc<RecordingSpeech>, Arc<RecordingGestures>) {
    let speech = Arc::new(RecordingSpeech::default());
    let gestures = Arc::new(RecordingGestures::default());
    (Dialogue::new(speech.clone(), gestures.clone()), speech, gestures)
}
