//! Speech-recognition ingestion.
//!
//! The recognizer runs independently of the game loop and deposits words into
//! a bounded mailbox through a [`WordSender`]. The turn loop owns the matching
//! [`WordMailbox`] and only ever polls it: a drain takes everything deposited
//! since the previous drain and leaves the mailbox empty. That read-and-clear
//! is the only synchronization point between the two sides.

use chrono::{DateTime, Utc};
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, warn};

/// Default capacity of the word mailbox, in recognition chunks.
pub const DEFAULT_MAILBOX_CAPACITY: usize = 64;

/// A recognition result as delivered by a speech-to-text source.
///
/// Recognizers either report bare tokens or tokens paired with a confidence
/// score. Both shapes are flattened into plain words at the mailbox boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum RawWords {
    Tokens(Vec<String>),
    Scored(Vec<(String, f32)>),
}

impl RawWords {
    /// Flattens either shape into non-empty, trimmed words.
    pub fn into_words(self) -> Vec<String> {
        let words: Vec<String> = match self {
            RawWords::Tokens(tokens) => tokens,
            RawWords::Scored(pairs) => pairs.into_iter().map(|(token, _)| token).collect(),
        };
        words
            .into_iter()
            .map(|w| w.trim().to_string())
            .filter(|w| !w.is_empty())
            .collect()
    }
}

/// Normalized text recognized since the last drain, plus when it was captured.
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub words: Vec<String>,
    pub captured_at: DateTime<Utc>,
}

impl Utterance {
    pub fn new(words: Vec<String>) -> Self {
        Self {
            words,
            captured_at: Utc::now(),
        }
    }

    /// The words joined with single spaces.
    pub fn text(&self) -> String {
        self.words.join(" ")
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Appends a later utterance, keeping the later capture time.
    pub fn extend(&mut self, later: Utterance) {
        self.words.extend(later.words);
        self.captured_at = later.captured_at;
    }
}

/// Removes the `<<<`/`>>>` framing markers the Oracle uses, plus any stray
/// angle brackets, so they are never spoken back or matched against.
pub fn sanitize_response(text: &str) -> String {
    text.replace("<<<", "")
        .replace(">>>", "")
        .replace(['<', '>'], "")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// The consumer side of speech recognition, as seen by the turn loop.
pub trait ListenPort: Send {
    /// Returns everything recognized since the previous drain and clears it.
    fn drain(&mut self) -> Option<Utterance>;

    /// Discards anything recognized so far.
    fn clear(&mut self) {
        let _ = self.drain();
    }
}

/// Producer handle fed by the recognizer. Cheap to clone; never blocks.
#[derive(Debug, Clone)]
pub struct WordSender {
    tx: mpsc::Sender<Utterance>,
}

impl WordSender {
    /// Deposits a recognition result. Returns `false` if it was dropped because
    /// the mailbox is full or the consumer has gone away.
    pub fn push(&self, raw: RawWords) -> bool {
        let words = raw.into_words();
        if words.is_empty() {
            return true;
        }
        match self.tx.try_send(Utterance::new(words)) {
            Ok(()) => true,
            Err(TrySendError::Full(dropped)) => {
                warn!(words = %dropped.text(), "Word mailbox full; dropping recognition result.");
                false
            }
            Err(TrySendError::Closed(_)) => {
                debug!("Word mailbox closed; recognizer output ignored.");
                false
            }
        }
    }
}

/// Consumer side of the word mailbox, owned by the turn loop.
#[derive(Debug)]
pub struct WordMailbox {
    rx: mpsc::Receiver<Utterance>,
}

impl ListenPort for WordMailbox {
    fn drain(&mut self) -> Option<Utterance> {
        let mut merged: Option<Utterance> = None;
        while let Ok(chunk) = self.rx.try_recv() {
            match merged.as_mut() {
                Some(existing) => existing.extend(chunk),
                None => merged = Some(chunk),
            }
        }
        merged
    }
}

/// Creates a connected producer/consumer pair.
pub fn mailbox(capacity: usize) -> (WordSender, WordMailbox) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (WordSender { tx }, WordMailbox { rx })
}
