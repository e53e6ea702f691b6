//! Identity types for Palaver.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of an authenticated user.
///
/// Opaque, assigned by the backend.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Create a UserId from its backend representation.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the backend representation.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UserId({})", self.0)
    }
}

/// Identifier of a conversation (a one-to-one or group chat).
///
/// The core refers to conversations by id only; display metadata and
/// membership belong to the UI.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationId(String);

impl ConversationId {
    /// Create a ConversationId from its backend representation.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the backend representation.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ConversationId({})", self.0)
    }
}

/// Server-assigned identifier of a message.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(String);

impl MessageId {
    /// Create a MessageId from its backend representation.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the backend representation.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MessageId({})", self.0)
    }
}

/// Temporary identity of an optimistically appended message.
///
/// UUID v4, never sent to the backend. Used to find the provisional
/// entry again once the send completes.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocalId(uuid::Uuid);

impl LocalId {
    /// Create a new random LocalId.
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    /// Get the inner UUID.
    pub fn as_uuid(&self) -> &uuid::Uuid {
        &self.0
    }

    /// The provisional [`MessageId`] shown until the backend assigns one.
    pub fn provisional_message_id(&self) -> MessageId {
        MessageId(format!("local-{}", self.0))
    }
}

impl Default for LocalId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for LocalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for LocalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LocalId({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_ids_serialize_transparently() {
        let id = ConversationId::new("63f1c2");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"63f1c2\"");

        let user: UserId = serde_json::from_str("\"u-7\"").unwrap();
        assert_eq!(user.as_str(), "u-7");
    }

    #[test]
    fn ids_display_raw_value() {
        assert_eq!(MessageId::new("m1").to_string(), "m1");
        assert_eq!(format!("{:?}", MessageId::new("m1")), "MessageId(m1)");
    }

    #[test]
    fn local_id_is_uuid_v4() {
        let id = LocalId::new();
        assert_eq!(id.as_uuid().get_version_num(), 4);
    }

    #[test]
    fn local_ids_are_unique() {
        assert_ne!(LocalId::new(), LocalId::new());
    }

    #[test]
    fn provisional_message_id_is_marked_local() {
        let id = LocalId::new();
        let provisional = id.provisional_message_id();
        assert!(provisional.as_str().starts_with("local-"));
        assert!(provisional.as_str().ends_with(&id.to_string()));
    }
}
