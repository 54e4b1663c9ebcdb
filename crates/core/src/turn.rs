//! Turn coordination: speak, then poll for a reply until it is complete.
//!
//! Listening is a cooperative polling loop. Each iteration sleeps for one poll
//! interval, drains whatever the recognizer deposited, and advances an elapsed
//! counter. Once speech has been heard, the reply is only considered final
//! after a full silence window passes with nothing new arriving. A captured
//! reply always wins over the overall timeout.

use crate::listen::{ListenPort, Utterance, sanitize_response};
use crate::speech::{Dialogue, Gesture};
use std::time::Duration;
use tracing::debug;

const MIN_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Timing parameters for a single listen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ListenTiming {
    /// Give up after this long with no speech at all.
    pub timeout: Duration,
    pub poll_interval: Duration,
    /// Quiet period after the last change that ends an utterance.
    pub silence_window: Duration,
}

impl ListenTiming {
    pub fn from_secs(timeout: f64, poll_interval: f64, silence_window: f64) -> Self {
        Self {
            timeout: Duration::from_secs_f64(timeout.max(0.0)),
            poll_interval: Duration::from_secs_f64(poll_interval.max(0.0)).max(MIN_POLL_INTERVAL),
            silence_window: Duration::from_secs_f64(silence_window.max(0.0)),
        }
    }

    /// The same poll and silence settings with a different overall timeout.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        Self { timeout, ..self }
    }
}

impl Default for ListenTiming {
    fn default() -> Self {
        Self::from_secs(15.0, 1.0, 2.0)
    }
}

/// Whether to wait for the prompt to be spoken before listening.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeakMode {
    Await,
    /// Start listening straight away while the prompt is still being spoken.
    Detached,
}

/// Owns the listening side of the conversation and sequences it after speech.
pub struct TurnCoordinator {
    dialogue: Dialogue,
    listener: Box<dyn ListenPort>,
    timing: ListenTiming,
}

impl TurnCoordinator {
    pub fn new(dialogue: Dialogue, listener: Box<dyn ListenPort>, timing: ListenTiming) -> Self {
        Self {
            dialogue,
            listener,
            timing,
        }
    }

    pub fn dialogue(&self) -> &Dialogue {
        &self.dialogue
    }

    pub fn timing(&self) -> ListenTiming {
        self.timing
    }

    /// Speaks `prompt` (if non-empty) and listens with the default timing.
    pub async fn ask(&mut self, prompt: &str, gesture: Option<Gesture>) -> Option<String> {
        let timing = self.timing;
        self.ask_with(prompt, gesture, SpeakMode::Await, timing).await
    }

    /// Speaks `prompt` (if non-empty) and then listens for a reply.
    pub async fn ask_with(
        &mut self,
        prompt: &str,
        gesture: Option<Gesture>,
        mode: SpeakMode,
        timing: ListenTiming,
    ) -> Option<String> {
        if !prompt.trim().is_empty() {
            debug!(%prompt, "Prompting player.");
            match mode {
                SpeakMode::Await => {
                    self.dialogue.say(prompt, gesture).await;
                }
                SpeakMode::Detached => self.dialogue.say_detached(prompt, gesture),
            }
        }
        self.listen(timing).await
    }

    /// Discards stale words, then polls until a complete reply or the timeout.
    pub async fn listen(&mut self, timing: ListenTiming) -> Option<String> {
        self.listener.clear();

        let mut waited = Duration::ZERO;
        let mut best: Option<Utterance> = None;
        let mut quiet = Duration::ZERO;

        while waited < timing.timeout {
            tokio::time::sleep(timing.poll_interval).await;
            waited += timing.poll_interval;
            let fresh = self.listener.drain();

            match (best.as_mut(), fresh) {
                (None, None) => {
                    debug!(waited_ms = waited.as_millis() as u64, "Waiting for speech...");
                }
                (None, Some(first)) => {
                    debug!(
                        waited_ms = waited.as_millis() as u64,
                        heard = %first.text(),
                        "Speech detected."
                    );
                    best = Some(first);
                    quiet = Duration::ZERO;
                }
                (Some(current), Some(more)) => {
                    current.extend(more);
                    quiet = Duration::ZERO;
                    debug!(heard = %current.text(), "More speech detected.");
                }
                (Some(current), None) => {
                    quiet += timing.poll_interval;
                    if quiet >= timing.silence_window {
                        debug!(heard = %current.text(), "Silence window elapsed; reply is final.");
                        break;
                    }
                }
            }
        }

        match best {
            Some(utterance) => {
                let text = sanitize_response(&utterance.text());
                (!text.is_empty()).then_some(text)
            }
            None => {
                debug!(
                    timeout_ms = timing.timeout.as_millis() as u64,
                    "Listen timed out with no response."
                );
                None
            }
        }
    }
}
