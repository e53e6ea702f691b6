//! Ordered message log for the active conversation.
//!
//! The log is append-only between rebuilds:
//! 1. `install_history()` - fetched history, in the order the backend returned it
//! 2. `push_provisional()` - optimistic local send, appended at the end
//! 3. `append()` - inbound message, appended at the end
//!
//! Provisional entries are later settled in place with `confirm()` or
//! `fail()`. Nothing is ever reordered after it has been appended.
//!
//! ```text
//! [ history (0..history_len) | live entries appended since ]
//! ```
//!
//! Installing history rebuilds only the first part; live entries the new
//! history does not already contain are carried over behind it.

use palaver_chat_types::{ConversationId, LocalId, Message, MessageId};

/// Delivery status of a log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Known to the backend (fetched, pushed, or confirmed by a send).
    Confirmed,
    /// Appended optimistically, send in flight.
    Pending {
        /// Temporary identity of the entry.
        local_id: LocalId,
    },
    /// The send failed. The entry is kept so the text is not lost.
    Failed {
        /// Temporary identity of the entry.
        local_id: LocalId,
    },
}

/// One message in the log with its delivery status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    /// The message as shown.
    pub message: Message,
    /// Delivery status.
    pub delivery: Delivery,
}

impl LogEntry {
    fn local_id(&self) -> Option<LocalId> {
        match self.delivery {
            Delivery::Pending { local_id } | Delivery::Failed { local_id } => Some(local_id),
            Delivery::Confirmed => None,
        }
    }
}

/// The message log of one conversation.
#[derive(Debug, Clone, Default)]
pub struct MessageLog {
    conversation: Option<ConversationId>,
    entries: Vec<LogEntry>,
    history_len: usize,
}

impl MessageLog {
    /// Create an empty log bound to no conversation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop all entries and rebind to a conversation (or none).
    pub fn reset(&mut self, conversation: Option<ConversationId>) {
        self.conversation = conversation;
        self.entries.clear();
        self.history_len = 0;
    }

    /// Install fetched history at the head of the log.
    ///
    /// The backend is the authority on order; the sequence is kept as is.
    /// Entries added since the previous install (pushes, optimistic and
    /// failed sends) follow it in their original order, except confirmed
    /// ones the history already contains.
    pub fn install_history(&mut self, conversation: ConversationId, history: Vec<Message>) {
        if self.conversation.as_ref() != Some(&conversation) {
            self.entries.clear();
            self.history_len = 0;
        }
        self.conversation = Some(conversation);

        let live = self.entries.split_off(self.history_len.min(self.entries.len()));
        self.history_len = history.len();
        self.entries = history
            .into_iter()
            .map(|message| LogEntry {
                message,
                delivery: Delivery::Confirmed,
            })
            .collect();

        for entry in live {
            if entry.delivery == Delivery::Confirmed && self.contains_confirmed(&entry.message.id) {
                continue;
            }
            self.entries.push(entry);
        }
    }

    /// Append an inbound message at the end.
    ///
    /// Returns `false` if a confirmed entry with the same id is already
    /// present (a server echo of something we already have).
    pub fn append(&mut self, message: Message) -> bool {
        if self.contains_confirmed(&message.id) {
            return false;
        }
        self.entries.push(LogEntry {
            message,
            delivery: Delivery::Confirmed,
        });
        true
    }

    /// Append an optimistic entry for a message being sent.
    ///
    /// The message id is replaced by the provisional id derived from
    /// `local_id`.
    pub fn push_provisional(&mut self, local_id: LocalId, mut message: Message) {
        message.id = local_id.provisional_message_id();
        self.entries.push(LogEntry {
            message,
            delivery: Delivery::Pending { local_id },
        });
    }

    /// Settle a provisional entry with the backend's confirmed message.
    ///
    /// The entry keeps its position. If the confirmed message already
    /// arrived through a push, the provisional entry is removed instead so
    /// the message is shown once. Returns `false` if `local_id` is unknown.
    pub fn confirm(&mut self, local_id: LocalId, confirmed: Message) -> bool {
        let Some(index) = self.position_of(local_id) else {
            return false;
        };
        if self.contains_confirmed(&confirmed.id) {
            self.entries.remove(index);
            return true;
        }
        self.entries[index] = LogEntry {
            message: confirmed,
            delivery: Delivery::Confirmed,
        };
        true
    }

    /// Mark a provisional entry as failed. It stays in place.
    pub fn fail(&mut self, local_id: LocalId) -> bool {
        let Some(index) = self.position_of(local_id) else {
            return false;
        };
        self.entries[index].delivery = Delivery::Failed { local_id };
        true
    }

    /// The conversation this log belongs to.
    pub fn conversation(&self) -> Option<&ConversationId> {
        self.conversation.as_ref()
    }

    /// All entries in display order.
    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    /// Messages in display order.
    pub fn messages(&self) -> impl Iterator<Item = &Message> {
        self.entries.iter().map(|entry| &entry.message)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the log is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries still waiting for their send to complete.
    pub fn pending_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| matches!(entry.delivery, Delivery::Pending { .. }))
            .count()
    }

    fn position_of(&self, local_id: LocalId) -> Option<usize> {
        self.entries
            .iter()
            .position(|entry| entry.local_id() == Some(local_id))
    }

    fn contains_confirmed(&self, id: &MessageId) -> bool {
        self.entries
            .iter()
            .any(|entry| entry.delivery == Delivery::Confirmed && &entry.message.id == id)
    }
}
