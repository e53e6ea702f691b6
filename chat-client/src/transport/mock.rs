//! Scripted push channel for tests.
//!
//! Inbound frames are queued up front and handed out by `recv()`; every
//! outbound frame is captured so tests can assert on the published events.

use super::{Transport, TransportError};
use async_trait::async_trait;
use palaver_chat_types::{ClientEvent, ServerEvent};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// In-memory push channel.
///
/// Clones share state, so a test can keep one handle while the engine
/// owns another.
#[derive(Debug, Default, Clone)]
pub struct MockTransport {
    inner: Arc<Mutex<MockTransportInner>>,
}

#[derive(Debug, Default)]
struct MockTransportInner {
    connected: bool,
    address: Option<String>,
    connect_count: usize,
    close_count: usize,
    outbound: Vec<Vec<u8>>,
    inbound: VecDeque<Vec<u8>>,
    connect_error: Option<String>,
    send_error: Option<String>,
}

impl MockTransport {
    /// Create a disconnected channel with nothing queued.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a raw frame to be returned by a later `recv()` call.
    pub fn queue_frame(&self, data: Vec<u8>) {
        let mut inner = self.inner.lock().unwrap();
        inner.inbound.push_back(data);
    }

    /// Queue an inbound event to be returned by a later `recv()` call.
    pub fn queue_event(&self, event: ServerEvent) {
        self.queue_frame(event.to_bytes().unwrap());
    }

    /// Get all raw frames that were sent.
    pub fn sent_frames(&self) -> Vec<Vec<u8>> {
        let inner = self.inner.lock().unwrap();
        inner.outbound.clone()
    }

    /// Get all sent frames decoded as client events.
    pub fn sent_events(&self) -> Vec<ClientEvent> {
        self.sent_frames()
            .iter()
            .map(|frame| ClientEvent::from_bytes(frame).unwrap())
            .collect()
    }

    /// Get the last event that was sent.
    pub fn last_sent(&self) -> Option<ClientEvent> {
        self.sent_events().pop()
    }

    /// Address passed to the last successful `connect()`.
    pub fn connected_address(&self) -> Option<String> {
        self.inner.lock().unwrap().address.clone()
    }

    /// Number of successful `connect()` calls.
    pub fn connect_count(&self) -> usize {
        let inner = self.inner.lock().unwrap();
        inner.connect_count
    }

    /// Number of `close()` calls.
    pub fn close_count(&self) -> usize {
        let inner = self.inner.lock().unwrap();
        inner.close_count
    }

    /// Make the next `connect()` fail.
    pub fn fail_next_connect(&self, error: &str) {
        self.inner.lock().unwrap().connect_error = Some(error.to_string());
    }

    /// Make the next `send()` fail.
    pub fn fail_next_send(&self, error: &str) {
        self.inner.lock().unwrap().send_error = Some(error.to_string());
    }

    /// Simulate the backend dropping the connection.
    pub fn drop_connection(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.connected = false;
    }

    /// Forget sent frames (keeps connection and queue).
    pub fn clear_sent(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.outbound.clear();
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn connect(&self, address: &str) -> Result<(), TransportError> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(error) = inner.connect_error.take() {
            return Err(TransportError::ConnectionFailed(error));
        }

        inner.connected = true;
        inner.address = Some(address.to_string());
        inner.connect_count += 1;
        Ok(())
    }

    async fn send(&self, data: &[u8]) -> Result<(), TransportError> {
        let mut inner = self.inner.lock().unwrap();

        if !inner.connected {
            return Err(TransportError::NotConnected);
        }

        match inner.send_error.take() {
            Some(error) => Err(TransportError::SendFailed(error)),
            None => {
                inner.outbound.push(data.to_vec());
                Ok(())
            }
        }
    }

    async fn recv(&self) -> Result<Vec<u8>, TransportError> {
        let mut inner = self.inner.lock().unwrap();

        if !inner.connected {
            return Err(TransportError::NotConnected);
        }

        // An empty queue reads as end of stream
        inner.inbound.pop_front().ok_or(TransportError::ConnectionClosed)
    }

    fn is_connected(&self) -> bool {
        self.inner.lock().unwrap().connected
    }

    async fn close(&self) -> Result<(), TransportError> {
        let mut inner = self.inner.lock().unwrap();
        inner.connected = false;
        inner.close_count += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use palaver_chat_types::{ConversationId, UserId};

    #[tokio::test]
    async fn connect_records_address() {
        let transport = MockTransport::new();
        assert!(!transport.is_connected());

        transport.connect("ws://test").await.unwrap();

        assert!(transport.is_connected());
        assert_eq!(transport.connected_address(), Some("ws://test".to_string()));
        assert_eq!(transport.connect_count(), 1);
    }

    #[tokio::test]
    async fn sent_frames_decode_as_events() {
        let transport = MockTransport::new();
        transport.connect("ws://test").await.unwrap();

        let setup = ClientEvent::Setup(UserId::new("me"));
        let join = ClientEvent::JoinChat(ConversationId::new("c"));
        transport.send(&setup.to_bytes().unwrap()).await.unwrap();
        transport.send(&join.to_bytes().unwrap()).await.unwrap();

        assert_eq!(transport.sent_events(), vec![setup, join.clone()]);
        assert_eq!(transport.last_sent(), Some(join));
    }

    #[tokio::test]
    async fn queued_events_are_received_in_order() {
        let transport = MockTransport::new();
        transport.connect("ws://test").await.unwrap();

        transport.queue_event(ServerEvent::Connected);
        transport.queue_event(ServerEvent::Typing(None));

        let first = ServerEvent::from_bytes(&transport.recv().await.unwrap()).unwrap();
        let second = ServerEvent::from_bytes(&transport.recv().await.unwrap()).unwrap();
        assert_eq!(first, ServerEvent::Connected);
        assert_eq!(second, ServerEvent::Typing(None));
    }

    #[tokio::test]
    async fn empty_queue_reads_as_closed() {
        let transport = MockTransport::new();
        transport.connect("ws://test").await.unwrap();

        let result = transport.recv().await;
        assert!(matches!(result, Err(TransportError::ConnectionClosed)));
    }

    #[tokio::test]
    async fn send_without_connect_fails() {
        let transport = MockTransport::new();

        assert!(matches!(
            transport.send(b"{}").await,
            Err(TransportError::NotConnected)
        ));
    }

    #[tokio::test]
    async fn forced_failures_apply_once() {
        let transport = MockTransport::new();
        transport.fail_next_connect("refused");
        assert!(matches!(
            transport.connect("ws://test").await,
            Err(TransportError::ConnectionFailed(_))
        ));

        transport.connect("ws://test").await.unwrap();
        transport.fail_next_send("socket closed");
        assert!(matches!(
            transport.send(b"x").await,
            Err(TransportError::SendFailed(_))
        ));
        transport.send(b"x").await.unwrap();
    }

    #[tokio::test]
    async fn clone_shares_state() {
        let test_side = MockTransport::new();
        let engine_side = test_side.clone();

        engine_side.connect("ws://test").await.unwrap();
        assert!(test_side.is_connected());

        engine_side.close().await.unwrap();
        assert!(!test_side.is_connected());
        assert_eq!(test_side.close_count(), 1);
    }

    #[tokio::test]
    async fn drop_connection_disconnects() {
        let transport = MockTransport::new();
        transport.connect("ws://test").await.unwrap();

        transport.drop_connection();

        assert!(!transport.is_connected());
        assert!(matches!(
            transport.recv().await,
            Err(TransportError::NotConnected)
        ));
    }
}
