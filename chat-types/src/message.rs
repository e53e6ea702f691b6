//! Chat message type.
//!
//! On the wire a message is the backend's document shape:
//!
//! ```text
//! {"_id": "m1", "sender": {"_id": "u1", "name": ..}, "chat": {"_id": "c1", ..},
//!  "content": "hi", "createdAt": "2024-01-11T19:06:40.000Z"}
//! ```
//!
//! `sender` and `chat` may also arrive unpopulated, as bare id strings.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::{ConversationId, MessageId, UserId};

/// A single chat message.
///
/// Messages carry no ordering field: position in a conversation is the
/// order in which they arrived (server order for fetched history).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BackendMessage", into = "BackendMessage")]
pub struct Message {
    /// Message identifier (provisional for optimistic entries)
    pub id: MessageId,
    /// Conversation the message belongs to
    pub conversation_id: ConversationId,
    /// Author of the message
    pub sender: UserId,
    /// Text content
    pub content: String,
    /// Creation time, unix milliseconds
    pub created_at: u64,
}

impl Message {
    /// Check whether the message belongs to the given conversation.
    pub fn belongs_to(&self, conversation: &ConversationId) -> bool {
        &self.conversation_id == conversation
    }
}

/// A reference to another document, populated or not.
#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum DocRef<I> {
    Populated {
        #[serde(rename = "_id")]
        id: I,
    },
    Bare(I),
}

impl<I> DocRef<I> {
    fn into_id(self) -> I {
        match self {
            Self::Populated { id } | Self::Bare(id) => id,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BackendMessage {
    #[serde(rename = "_id")]
    id: MessageId,
    chat: DocRef<ConversationId>,
    sender: DocRef<UserId>,
    #[serde(default)]
    content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    created_at: Option<DateTime<Utc>>,
}

impl From<BackendMessage> for Message {
    fn from(wire: BackendMessage) -> Self {
        let created_at = wire
            .created_at
            .and_then(|at| u64::try_from(at.timestamp_millis()).ok())
            .unwrap_or(0);
        Self {
            id: wire.id,
            conversation_id: wire.chat.into_id(),
            sender: wire.sender.into_id(),
            content: wire.content,
            created_at,
        }
    }
}

impl From<Message> for BackendMessage {
    fn from(message: Message) -> Self {
        let created_at = i64::try_from(message.created_at)
            .ok()
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single());
        Self {
            id: message.id,
            chat: DocRef::Populated {
                id: message.conversation_id,
            },
            sender: DocRef::Populated { id: message.sender },
            content: message.content,
            created_at,
        }
    }
}
