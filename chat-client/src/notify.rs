//! Notification sink.
//!
//! The engine reports two things to the UI through [`Notifier`]:
//! - failures worth a transient notice (history load, send)
//! - messages for conversations other than the open one, for badging
//!
//! Rendering, dedup and badge counts belong to the implementor.

use palaver_chat_types::Message;
use std::fmt;
use std::sync::{Arc, Mutex};

/// What went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Fetching a conversation's history failed.
    HistoryLoad,
    /// Sending a message failed.
    Send,
}

/// A user-visible failure notice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    /// What went wrong.
    pub kind: FailureKind,
    /// Underlying cause, for the notice body.
    pub description: String,
}

impl Failure {
    /// Notice for a failed history fetch.
    pub fn history_load(description: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::HistoryLoad,
            description: description.into(),
        }
    }

    /// Notice for a failed send.
    pub fn send(description: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Send,
            description: description.into(),
        }
    }

    /// Short title for the notice.
    pub fn title(&self) -> &'static str {
        match self.kind {
            FailureKind::HistoryLoad => "Failed to Load the Messages",
            FailureKind::Send => "Failed to send the Message",
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.title(), self.description)
    }
}

/// Receiver of engine notices. Called synchronously; must not block.
pub trait Notifier: Send + Sync {
    /// A fetch or send failed.
    fn failure(&self, failure: Failure);

    /// A message arrived for a conversation that is not open.
    fn forward(&self, message: Message);
}

/// Notifier that records everything it is given.
///
/// Clones share state.
#[derive(Debug, Default, Clone)]
pub struct MemoryNotifier {
    inner: Arc<Mutex<MemoryNotifierInner>>,
}

#[derive(Debug, Default)]
struct MemoryNotifierInner {
    failures: Vec<Failure>,
    forwarded: Vec<Message>,
}

impl MemoryNotifier {
    /// Create an empty notifier.
    pub fn new() -> Self {
        Self::default()
    }

    /// Failures received so far.
    pub fn failures(&self) -> Vec<Failure> {
        self.lock().failures.clone()
    }

    /// Messages forwarded so far.
    pub fn forwarded(&self) -> Vec<Message> {
        self.lock().forwarded.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryNotifierInner> {
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl Notifier for MemoryNotifier {
    fn failure(&self, failure: Failure) {
        self.lock().failures.push(failure);
    }

    fn forward(&self, message: Message) {
        self.lock().forwarded.push(message);
    }
}
