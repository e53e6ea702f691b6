//! REST collaborator for history and sends.
//!
//! The backend is the authority on message order and identity:
//! - `history()` returns a conversation's messages in display order
//! - `send()` stores a message and returns it with its final id and timestamp

mod http;
mod mock;

pub use http::HttpChatApi;
pub use mock::{HistoryGate, MockChatApi, SendGate};

use async_trait::async_trait;
use palaver_chat_types::{ConversationId, Message};
use thiserror::Error;

/// REST errors.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Request could not be built or delivered.
    #[error("request failed: {0}")]
    Request(String),

    /// Backend answered with a non-success status.
    #[error("unexpected status: {0}")]
    Status(u16),

    /// Response body did not decode.
    #[error("invalid response: {0}")]
    Decode(String),
}

/// Request/response access to the messaging backend.
#[async_trait]
pub trait ChatApi: Send + Sync {
    /// Fetch the full history of a conversation, in backend order.
    async fn history(&self, conversation: &ConversationId) -> Result<Vec<Message>, ApiError>;

    /// Post a message and return the backend's confirmed copy.
    async fn send(&self, conversation: &ConversationId, content: &str)
        -> Result<Message, ApiError>;
}
