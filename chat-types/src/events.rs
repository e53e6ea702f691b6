//! Named transport events.
//!
//! Every frame on the push channel is a JSON object naming the event and
//! carrying an optional payload:
//!
//! ```text
//! {"event": "join chat", "data": "63f1c2"}
//! {"event": "connected"}
//! ```
//!
//! [`ClientEvent`] covers what the client emits, [`ServerEvent`] what it
//! receives. Both directions share the `typing` and `stop typing` names.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{ConversationId, Message, UserId, WireError};

const SETUP: &str = "setup";
const CONNECTED: &str = "connected";
const JOIN_CHAT: &str = "join chat";
const TYPING: &str = "typing";
const STOP_TYPING: &str = "stop typing";
const NEW_MESSAGE: &str = "new message";
const MESSAGE_RECEIVED: &str = "message received";

/// Raw frame layout shared by both directions.
#[derive(Debug, Serialize, Deserialize)]
struct Frame {
    event: String,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    data: Value,
}

impl Frame {
    fn new(event: &str, data: impl Serialize) -> Result<Self, WireError> {
        Ok(Self {
            event: event.to_string(),
            data: serde_json::to_value(data).map_err(WireError::Serialization)?,
        })
    }

    fn to_bytes(&self) -> Result<Vec<u8>, WireError> {
        serde_json::to_vec(self).map_err(WireError::Serialization)
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self, WireError> {
        serde_json::from_slice(bytes).map_err(WireError::Deserialization)
    }

    fn payload<T: for<'de> Deserialize<'de>>(self) -> Result<T, WireError> {
        serde_json::from_value(self.data).map_err(WireError::Deserialization)
    }
}

/// Events the client publishes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    /// Announce the authenticated identity; precedes all other traffic
    Setup(UserId),
    /// Subscribe to a conversation's room
    JoinChat(ConversationId),
    /// Local user started typing in a conversation
    Typing(ConversationId),
    /// Local user stopped typing in a conversation
    StopTyping(ConversationId),
    /// Echo a locally sent message to the room
    NewMessage(Message),
}

impl ClientEvent {
    /// Event name on the wire.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Setup(_) => SETUP,
            Self::JoinChat(_) => JOIN_CHAT,
            Self::Typing(_) => TYPING,
            Self::StopTyping(_) => STOP_TYPING,
            Self::NewMessage(_) => NEW_MESSAGE,
        }
    }

    /// Serialize to a JSON frame.
    pub fn to_bytes(&self) -> Result<Vec<u8>, WireError> {
        let frame = match self {
            Self::Setup(user) => Frame::new(SETUP, user)?,
            Self::JoinChat(id) | Self::Typing(id) | Self::StopTyping(id) => {
                Frame::new(self.name(), id)?
            }
            Self::NewMessage(message) => Frame::new(NEW_MESSAGE, message)?,
        };
        frame.to_bytes()
    }

    /// Deserialize from a JSON frame.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, WireError> {
        let frame = Frame::from_bytes(bytes)?;
        match frame.event.as_str() {
            SETUP => Ok(Self::Setup(frame.payload()?)),
            JOIN_CHAT => Ok(Self::JoinChat(frame.payload()?)),
            TYPING => Ok(Self::Typing(frame.payload()?)),
            STOP_TYPING => Ok(Self::StopTyping(frame.payload()?)),
            NEW_MESSAGE => Ok(Self::NewMessage(frame.payload()?)),
            _ => Err(WireError::UnknownEvent(frame.event)),
        }
    }
}

/// Kinds of inbound events, one handler slot each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// `connected`
    Connected,
    /// `typing`
    Typing,
    /// `stop typing`
    StopTyping,
    /// `message received`
    MessageReceived,
}

/// Events the client receives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerEvent {
    /// The backend accepted `setup`; the channel is ready
    Connected,
    /// A peer started typing. Rooms may omit the conversation.
    Typing(Option<ConversationId>),
    /// A peer stopped typing. Rooms may omit the conversation.
    StopTyping(Option<ConversationId>),
    /// A message was posted to a conversation we belong to
    MessageReceived(Message),
}

impl ServerEvent {
    /// The handler slot this event is routed to.
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Connected => EventKind::Connected,
            Self::Typing(_) => EventKind::Typing,
            Self::StopTyping(_) => EventKind::StopTyping,
            Self::MessageReceived(_) => EventKind::MessageReceived,
        }
    }

    /// Event name on the wire.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Connected => CONNECTED,
            Self::Typing(_) => TYPING,
            Self::StopTyping(_) => STOP_TYPING,
            Self::MessageReceived(_) => MESSAGE_RECEIVED,
        }
    }

    /// Serialize to a JSON frame.
    pub fn to_bytes(&self) -> Result<Vec<u8>, WireError> {
        let frame = match self {
            Self::Connected => Frame::new(CONNECTED, Value::Null)?,
            Self::Typing(id) | Self::StopTyping(id) => Frame::new(self.name(), id)?,
            Self::MessageReceived(message) => Frame::new(MESSAGE_RECEIVED, message)?,
        };
        frame.to_bytes()
    }

    /// Deserialize from a JSON frame.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, WireError> {
        let frame = Frame::from_bytes(bytes)?;
        match frame.event.as_str() {
            CONNECTED => Ok(Self::Connected),
            TYPING => Ok(Self::Typing(frame.payload()?)),
            STOP_TYPING => Ok(Self::StopTyping(frame.payload()?)),
            MESSAGE_RECEIVED => Ok(Self::MessageReceived(frame.payload()?)),
            _ => Err(WireError::UnknownEvent(frame.event)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MessageId;

    fn sample_message() -> Message {
        Message {
            id: MessageId::new("m-1"),
            conversation_id: ConversationId::new("c-1"),
            sender: UserId::new("u-1"),
            content: "hi".into(),
            created_at: 42,
        }
    }

    #[test]
    fn join_chat_frame_layout() {
        let bytes = ClientEvent::JoinChat(ConversationId::new("c-9"))
            .to_bytes()
            .unwrap();
        let value: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["event"], "join chat");
        assert_eq!(value["data"], "c-9");
    }

    #[test]
    fn connected_frame_has_no_data() {
        let bytes = ServerEvent::Connected.to_bytes().unwrap();
        let value: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["event"], "connected");
        assert!(value.get("data").is_none());
    }

    #[test]
    fn inbound_typing_without_payload() {
        let event = ServerEvent::from_bytes(br#"{"event":"typing"}"#).unwrap();
        assert_eq!(event, ServerEvent::Typing(None));

        let event = ServerEvent::from_bytes(br#"{"event":"stop typing","data":"c-1"}"#).unwrap();
        assert_eq!(
            event,
            ServerEvent::StopTyping(Some(ConversationId::new("c-1")))
        );
    }

    #[test]
    fn message_received_decodes_message() {
        let bytes = ServerEvent::MessageReceived(sample_message())
            .to_bytes()
            .unwrap();
        match ServerEvent::from_bytes(&bytes).unwrap() {
            ServerEvent::MessageReceived(message) => assert_eq!(message, sample_message()),
            other => panic!("Expected MessageReceived, got {:?}", other),
        }
    }

    #[test]
    fn message_received_accepts_backend_document() {
        let frame = br#"{"event":"message received","data":{
            "_id":"m1","sender":{"_id":"u1","name":"Ada"},"content":"yo",
            "chat":{"_id":"c1","users":[{"_id":"u1"},{"_id":"u2"}]},
            "createdAt":"2024-01-11T19:06:40.000Z"}}"#;

        match ServerEvent::from_bytes(frame).unwrap() {
            ServerEvent::MessageReceived(message) => {
                assert_eq!(message.id, MessageId::new("m1"));
                assert_eq!(message.conversation_id, ConversationId::new("c1"));
                assert_eq!(message.sender, UserId::new("u1"));
            }
            other => panic!("Expected MessageReceived, got {:?}", other),
        }
    }

    #[test]
    fn new_message_decodes_on_client_side() {
        let bytes = ClientEvent::NewMessage(sample_message()).to_bytes().unwrap();
        assert_eq!(
            ClientEvent::from_bytes(&bytes).unwrap(),
            ClientEvent::NewMessage(sample_message())
        );
    }

    #[test]
    fn unknown_event_is_rejected() {
        let result = ServerEvent::from_bytes(br#"{"event":"reaction","data":1}"#);
        assert!(matches!(result, Err(WireError::UnknownEvent(name)) if name == "reaction"));
    }

    #[test]
    fn malformed_frame_is_rejected() {
        assert!(matches!(
            ServerEvent::from_bytes(b"not json"),
            Err(WireError::Deserialization(_))
        ));
        // Wrong payload shape for the named event
        assert!(matches!(
            ServerEvent::from_bytes(br#"{"event":"message received","data":"oops"}"#),
            Err(WireError::Deserialization(_))
        ));
    }

    #[test]
    fn event_kinds() {
        assert_eq!(ServerEvent::Connected.kind(), EventKind::Connected);
        assert_eq!(ServerEvent::Typing(None).kind(), EventKind::Typing);
        assert_eq!(ServerEvent::StopTyping(None).kind(), EventKind::StopTyping);
        assert_eq!(
            ServerEvent::MessageReceived(sample_message()).kind(),
            EventKind::MessageReceived
        );
    }
}
