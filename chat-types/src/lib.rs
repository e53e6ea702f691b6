//! # chat-types
//!
//! Wire format types for the Palaver chat synchronization engine.
//!
//! This crate provides the foundational types used across all Palaver crates:
//! - [`UserId`], [`ConversationId`], [`MessageId`], [`LocalId`] - Identity types
//! - [`Message`] - A chat message as stored by the backend
//! - [`ClientEvent`], [`ServerEvent`] - Named transport events
//! - [`WireError`] - Error types

#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
mod events;
mod ids;
mod message;

pub use error::WireError;
pub use events::{ClientEvent, EventKind, ServerEvent};
pub use ids::{ConversationId, LocalId, MessageId, UserId};
pub use message::Message;
