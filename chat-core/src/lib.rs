//! # chat-core
//!
//! Pure logic for Palaver (no I/O, instant tests).
//!
//! This crate implements the state machines behind chat synchronization
//! without any network, timer or UI access, enabling fast unit tests.
//!
//! ## Design Philosophy
//!
//! All modules in this crate are **pure** - they take input and produce output
//! without side effects:
//! - [`ConversationSelection`] issues generation tokens used to fence
//!   asynchronous results
//! - [`MessageLog`] keeps the ordered log of the active conversation
//! - [`TypingState`] turns keystrokes and idle checks into typing actions
//! - [`route_push`] decides where an inbound message goes
//!
//! Timers, transport and REST calls live in `chat-client`, which interprets
//! the decisions made here.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod log;
pub mod routing;
pub mod selection;
pub mod typing;

pub use log::{Delivery, LogEntry, MessageLog};
pub use routing::{route_push, PushRoute};
pub use selection::{ConversationSelection, Generation};
pub use typing::{TypingAction, TypingEvent, TypingState, DEFAULT_IDLE_WINDOW};
