//! Terminal stand-ins for the robot's speaker, motors and microphone.

use async_trait::async_trait;
use ispy_core::controller::Lifecycle;
use ispy_core::listen::{RawWords, WordSender};
use ispy_core::object::GameObject;
use ispy_core::speech::{Gesture, GesturePort, Language, SpeechChannel};
use std::sync::Mutex;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::task::JoinHandle;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::LinesStream;
use tracing::{debug, info, warn};

fn speech_line(text: &str, language: Language) -> String {
    format!("robot [{}]: {}", language.code(), text)
}

/// Prints each utterance, pausing roughly as long as saying it would take.
pub struct ConsoleSpeech {
    per_word: Duration,
}

impl ConsoleSpeech {
    pub fn new(per_word: Duration) -> Self {
        Self { per_word }
    }
}

#[async_trait]
impl SpeechChannel for ConsoleSpeech {
    async fn say(&self, text: &str, language: Language) -> anyhow::Result<()> {
        println!("{}", speech_line(text, language));
        let words = u32::try_from(text.split_whitespace().count()).unwrap_or(u32::MAX);
        tokio::time::sleep(self.per_word.saturating_mul(words)).await;
        Ok(())
    }
}

/// Describes gestures instead of performing them.
pub struct ConsoleGestures;

#[async_trait]
impl GesturePort for ConsoleGestures {
    async fn play(&self, gesture: Gesture) -> anyhow::Result<()> {
        println!("  *{gesture}*");
        Ok(())
    }

    async fn point_to(&self, object: &GameObject) -> anyhow::Result<()> {
        if object.source_location_id.is_empty() {
            anyhow::bail!("no recorded location for '{}'", object.name);
        }
        println!(
            "  *points at the {} ({})*",
            object.name, object.source_location_id
        );
        Ok(())
    }
}

/// Feeds every non-empty line from `reader` into the word mailbox, one
/// recognition chunk per line. Resolves with the number of chunks delivered
/// once the input ends.
pub fn spawn_line_listener<R>(reader: R, sender: WordSender) -> JoinHandle<usize>
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = LinesStream::new(reader.lines());
        let mut delivered = 0;
        while let Some(line) = lines.next().await {
            match line {
                Ok(line) => {
                    let tokens: Vec<String> =
                        line.split_whitespace().map(str::to_string).collect();
                    if tokens.is_empty() {
                        continue;
                    }
                    debug!(words = tokens.len(), "Heard a line.");
                    if sender.push(RawWords::Tokens(tokens)) {
                        delivered += 1;
                    }
                }
                Err(e) => {
                    warn!(error = ?e, "Reading input failed; the listener stops.");
                    break;
                }
            }
        }
        delivered
    })
}

/// Stops the listener task when the conversation is over.
pub struct ConsoleLifecycle {
    listener: Mutex<Option<JoinHandle<usize>>>,
}

impl ConsoleLifecycle {
    pub fn new(listener: JoinHandle<usize>) -> Self {
        Self {
            listener: Mutex::new(Some(listener)),
        }
    }
}

#[async_trait]
impl Lifecycle for ConsoleLifecycle {
    async fn leave(&self) -> anyhow::Result<()> {
        let listener = self
            .listener
            .lock()
            .map_err(|_| anyhow::anyhow!("listener handle poisoned"))?
            .take();
        match listener {
            Some(handle) => {
                handle.abort();
                info!("Listener stopped; leaving the session.");
                Ok(())
            }
            None => anyhow::bail!("session already left"),
        }
    }
}
