//! Mock REST collaborator for testing.
//!
//! Responses are scripted per conversation. Individual calls can be held
//! open with a gate so tests control exactly when a fetch or send
//! completes relative to other events.

use async_trait::async_trait;
use palaver_chat_types::{ConversationId, Message, MessageId, UserId};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

use super::{ApiError, ChatApi};

type HistoryReply = Result<Vec<Message>, ApiError>;

/// Holds one history fetch open until released.
#[derive(Debug)]
pub struct HistoryGate {
    tx: oneshot::Sender<HistoryReply>,
}

impl HistoryGate {
    /// Complete the held fetch with the given history.
    pub fn release(self, history: Vec<Message>) {
        let _ = self.tx.send(Ok(history));
    }

    /// Complete the held fetch with an error.
    pub fn fail(self, error: &str) {
        let _ = self.tx.send(Err(ApiError::Request(error.to_string())));
    }
}

/// Holds one send open until released.
#[derive(Debug)]
pub struct SendGate {
    tx: oneshot::Sender<Option<String>>,
}

impl SendGate {
    /// Let the held send succeed.
    pub fn release(self) {
        let _ = self.tx.send(None);
    }

    /// Let the held send fail.
    pub fn fail(self, error: &str) {
        let _ = self.tx.send(Some(error.to_string()));
    }
}

/// Mock REST collaborator.
///
/// Clones share state.
#[derive(Debug, Default, Clone)]
pub struct MockChatApi {
    inner: Arc<Mutex<MockChatApiInner>>,
}

#[derive(Debug, Default)]
struct MockChatApiInner {
    sender: Option<UserId>,
    histories: HashMap<ConversationId, Vec<Message>>,
    held_history: HashMap<ConversationId, VecDeque<oneshot::Receiver<HistoryReply>>>,
    held_send: VecDeque<oneshot::Receiver<Option<String>>>,
    fail_next_history: Option<String>,
    fail_next_send: Option<String>,
    history_calls: Vec<ConversationId>,
    sends: Vec<(ConversationId, String)>,
    next_id: u64,
}

impl MockChatApi {
    /// Create a mock with empty histories.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the sender stamped on confirmed messages (default: `me`).
    pub fn with_sender(self, sender: UserId) -> Self {
        self.inner.lock().unwrap().sender = Some(sender);
        self
    }

    /// Script the history returned for a conversation.
    pub fn set_history(&self, conversation: ConversationId, history: Vec<Message>) {
        let mut inner = self.inner.lock().unwrap();
        inner.histories.insert(conversation, history);
    }

    /// Hold the next history fetch for a conversation open.
    pub fn hold_history(&self, conversation: ConversationId) -> HistoryGate {
        let (tx, rx) = oneshot::channel();
        let mut inner = self.inner.lock().unwrap();
        inner.held_history.entry(conversation).or_default().push_back(rx);
        HistoryGate { tx }
    }

    /// Hold the next send open.
    pub fn hold_send(&self) -> SendGate {
        let (tx, rx) = oneshot::channel();
        let mut inner = self.inner.lock().unwrap();
        inner.held_send.push_back(rx);
        SendGate { tx }
    }

    /// Cause the next history fetch to fail.
    pub fn fail_next_history(&self, error: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_next_history = Some(error.to_string());
    }

    /// Cause the next send to fail.
    pub fn fail_next_send(&self, error: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_next_send = Some(error.to_string());
    }

    /// Conversations whose history was requested, in call order.
    pub fn history_calls(&self) -> Vec<ConversationId> {
        let inner = self.inner.lock().unwrap();
        inner.history_calls.clone()
    }

    /// Sends issued, in call order.
    pub fn sends(&self) -> Vec<(ConversationId, String)> {
        let inner = self.inner.lock().unwrap();
        inner.sends.clone()
    }

    fn confirm(&self, conversation: &ConversationId, content: &str) -> Message {
        let mut inner = self.inner.lock().unwrap();
        inner.next_id += 1;
        Message {
            id: MessageId::new(format!("srv-{}", inner.next_id)),
            conversation_id: conversation.clone(),
            sender: inner.sender.clone().unwrap_or_else(|| UserId::new("me")),
            content: content.to_string(),
            created_at: inner.next_id,
        }
    }
}

#[async_trait]
impl ChatApi for MockChatApi {
    async fn history(&self, conversation: &ConversationId) -> Result<Vec<Message>, ApiError> {
        let held = {
            let mut inner = self.inner.lock().unwrap();
            inner.history_calls.push(conversation.clone());

            if let Some(error) = inner.fail_next_history.take() {
                return Err(ApiError::Request(error));
            }

            match inner.held_history.get_mut(conversation).and_then(VecDeque::pop_front) {
                Some(rx) => rx,
                None => return Ok(inner.histories.get(conversation).cloned().unwrap_or_default()),
            }
        };

        held.await
            .unwrap_or_else(|_| Err(ApiError::Request("gate dropped".into())))
    }

    async fn send(
        &self,
        conversation: &ConversationId,
        content: &str,
    ) -> Result<Message, ApiError> {
        let held = {
            let mut inner = self.inner.lock().unwrap();
            inner
                .sends
                .push((conversation.clone(), content.to_string()));

            if let Some(error) = inner.fail_next_send.take() {
                return Err(ApiError::Request(error));
            }
            inner.held_send.pop_front()
        };

        if let Some(rx) = held {
            match rx.await {
                Ok(None) => {}
                Ok(Some(error)) => return Err(ApiError::Request(error)),
                Err(_) => return Err(ApiError::Request("gate dropped".into())),
            }
        }

        Ok(self.confirm(conversation, content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(id: &str, conversation: &str) -> Message {
        Message {
            id: MessageId::new(id),
            conversation_id: ConversationId::new(conversation),
            sender: UserId::new("peer"),
            content: id.into(),
            created_at: 0,
        }
    }

    #[tokio::test]
    async fn scripted_history_is_returned() {
        let api = MockChatApi::new();
        let c = ConversationId::new("c");
        api.set_history(c.clone(), vec![msg("1", "c"), msg("2", "c")]);

        let history = api.history(&c).await.unwrap();

        assert_eq!(history.len(), 2);
        assert_eq!(api.history_calls(), vec![c]);
    }

    #[tokio::test]
    async fn unknown_conversation_has_empty_history() {
        let api = MockChatApi::new();
        assert!(api
            .history(&ConversationId::new("nope"))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn held_history_waits_for_release() {
        let api = MockChatApi::new();
        let c = ConversationId::new("c");
        let gate = api.hold_history(c.clone());

        let task = tokio::spawn({
            let api = api.clone();
            let c = c.clone();
            async move { api.history(&c).await }
        });
        tokio::task::yield_now().await;
        assert!(!task.is_finished());

        gate.release(vec![msg("1", "c")]);
        assert_eq!(task.await.unwrap().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn send_confirms_with_server_identity() {
        let api = MockChatApi::new().with_sender(UserId::new("alice"));
        let c = ConversationId::new("c");

        let first = api.send(&c, "hello").await.unwrap();
        let second = api.send(&c, "again").await.unwrap();

        assert_eq!(first.id, MessageId::new("srv-1"));
        assert_eq!(second.id, MessageId::new("srv-2"));
        assert_eq!(first.sender, UserId::new("alice"));
        assert_eq!(api.sends().len(), 2);
    }

    #[tokio::test]
    async fn forced_failures_apply_once() {
        let api = MockChatApi::new();
        let c = ConversationId::new("c");

        api.fail_next_history("503");
        assert!(api.history(&c).await.is_err());
        assert!(api.history(&c).await.is_ok());

        api.fail_next_send("timeout");
        assert!(api.send(&c, "x").await.is_err());
        assert!(api.send(&c, "x").await.is_ok());
    }

    #[tokio::test]
    async fn held_send_can_fail() {
        let api = MockChatApi::new();
        let gate = api.hold_send();
        gate.fail("rejected");

        let result = api.send(&ConversationId::new("c"), "x").await;
        assert!(matches!(result, Err(ApiError::Request(e)) if e == "rejected"));
    }
}
