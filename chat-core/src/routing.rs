//! Routing of inbound messages.
//!
//! The decision is made against the selection passed in at delivery time.
//! Callers must hand in the live selection, never a copy taken when the
//! handler was installed.

use palaver_chat_types::Message;

use crate::ConversationSelection;

/// Where an inbound message goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushRoute {
    /// Belongs to the open conversation: append to the log.
    Append(Message),
    /// Belongs elsewhere (or nothing is open): hand to the notifier.
    Forward(Message),
}

/// Route an inbound message against the current selection.
pub fn route_push(selection: &ConversationSelection, message: Message) -> PushRoute {
    if selection.is_active(&message.conversation_id) {
        PushRoute::Append(message)
    } else {
        PushRoute::Forward(message)
    }
}
