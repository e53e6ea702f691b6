//! Error types for chat-client.
//!
//! Only engine start-up and the receive pump return errors. Failures of
//! fetches and sends are reported through the [`Notifier`](crate::Notifier).

use palaver_chat_types::WireError;
use thiserror::Error;

use crate::config::ConfigError;
use crate::transport::TransportError;

/// Client errors.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Transport error.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Event encoding error.
    #[error("wire error: {0}")]
    Wire(#[from] WireError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Operation needs an open session.
    #[error("session not open")]
    NotStarted,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_error_converts() {
        let err: ClientError = TransportError::Timeout.into();
        assert!(matches!(err, ClientError::Transport(TransportError::Timeout)));
        assert_eq!(err.to_string(), "transport error: connection timeout");
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ClientError>();
    }
}
