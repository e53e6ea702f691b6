//! # chat-client
//!
//! Client engine for the Palaver real-time chat protocol.
//!
//! This is the library a chat UI embeds to keep one conversation view in
//! sync with a messaging backend.
//!
//! ## Features
//!
//! - **Generation fencing**: history fetches started for an abandoned
//!   conversation never touch the log
//! - **Optimistic sends**: messages appear immediately and are settled in
//!   place when the backend confirms them
//! - **Typing presence**: one debounced `typing`/`stop typing` pair per burst
//! - **Transport Abstraction**: Pluggable push channel (WebSocket, mock)
//! - **Pure State Machines**: Uses chat-core for side-effect-free logic
//!
//! ## Example
//!
//! ```ignore
//! use palaver_chat_client::{ChatEngine, ClientConfig, HttpChatApi, MemoryNotifier, WebSocketTransport};
//!
//! let config = ClientConfig::from_file("palaver.toml".as_ref())?;
//! let api = HttpChatApi::new(&config)?;
//! let engine = ChatEngine::new(config, WebSocketTransport::new(), api, MemoryNotifier::new());
//!
//! engine.start(UserId::new("me")).await?;
//! engine.select(Some(ConversationId::new("c-1"))).await;
//! engine.set_compose("hello").await;
//! engine.submit().await;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod api;
pub mod config;
pub mod engine;
pub mod error;
pub mod notify;
pub mod session;
pub mod transport;

pub use api::{ApiError, ChatApi, HistoryGate, HttpChatApi, MockChatApi, SendGate};
pub use config::{ClientConfig, ConfigError};
pub use engine::{ChatEngine, ChatView};
pub use error::ClientError;
pub use notify::{Failure, FailureKind, MemoryNotifier, Notifier};
pub use session::{EventHandler, TransportSession};
pub use transport::{MockTransport, Transport, TransportError, WebSocketTransport};
