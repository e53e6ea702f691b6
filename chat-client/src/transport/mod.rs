//! Push channel abstraction for Palaver.
//!
//! This module provides a pluggable transport layer that abstracts
//! the underlying connection mechanism (WebSocket, mock for testing).
//!
//! # Design
//!
//! The transport trait is async and connection-oriented:
//! - `connect()` establishes a connection
//! - `send()` transmits one encoded event frame
//! - `recv()` receives one encoded event frame
//! - `close()` gracefully terminates
//!
//! Transports move opaque frames. Event encoding lives in chat-types and
//! event routing in [`TransportSession`](crate::TransportSession).
//!
//! # Example
//!
//! ```ignore
//! let transport = MockTransport::new();
//! transport.connect("ws://localhost:5000/ws").await?;
//! transport.send(frame_bytes).await?;
//! let frame = transport.recv().await?;
//! ```

mod mock;
mod websocket;

pub use mock::MockTransport;
pub use websocket::WebSocketTransport;

use async_trait::async_trait;
use thiserror::Error;

/// Transport errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Not connected.
    #[error("not connected")]
    NotConnected,

    /// Connection closed.
    #[error("connection closed")]
    ConnectionClosed,

    /// Send failed.
    #[error("send failed: {0}")]
    SendFailed(String),

    /// Receive failed.
    #[error("receive failed: {0}")]
    ReceiveFailed(String),

    /// Connection timeout.
    #[error("connection timeout")]
    Timeout,
}

/// Transport trait for the chat push channel.
///
/// Implementations handle the underlying connection mechanism
/// (WebSocket, mock, etc). Reconnection, if any, is their business.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Connect to the backend at the given address.
    ///
    /// For WebSocket this is a `ws://` or `wss://` URL. For testing, it's arbitrary.
    async fn connect(&self, address: &str) -> Result<(), TransportError>;

    /// Send one frame over the connection.
    async fn send(&self, data: &[u8]) -> Result<(), TransportError>;

    /// Receive one frame from the connection.
    ///
    /// Blocks until data is available or connection closes.
    async fn recv(&self) -> Result<Vec<u8>, TransportError>;

    /// Check if currently connected.
    fn is_connected(&self) -> bool;

    /// Close the connection gracefully.
    async fn close(&self) -> Result<(), TransportError>;
}
