//! Conversation selection with generation fencing.
//!
//! Every change of the active conversation issues a new [`Generation`].
//! Asynchronous work captures the generation it was started under and
//! compares it to [`ConversationSelection::current_generation`] before
//! touching shared state. A mismatch means the user has moved on and the
//! result must be dropped.
//!
//! Generations are issued synchronously, so they are totally ordered by
//! issuance and a captured token equal to the current one proves that no
//! selection happened in between.

use palaver_chat_types::ConversationId;
use std::fmt;

/// A fencing token issued by [`ConversationSelection::select`].
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Generation(u64);

impl Generation {
    /// The generation before any selection.
    pub fn zero() -> Self {
        Self(0)
    }

    /// Get the numeric value of this Generation.
    pub fn value(&self) -> u64 {
        self.0
    }

    fn next(&self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Generation({})", self.0)
    }
}

/// The currently open conversation plus its generation.
#[derive(Debug, Clone, Default)]
pub struct ConversationSelection {
    current: Option<ConversationId>,
    generation: Generation,
}

impl ConversationSelection {
    /// Create an empty selection at generation zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a conversation (or close all with `None`).
    ///
    /// Always issues a new generation, even when re-selecting the same
    /// conversation: a re-selection refetches and must void the old fetch.
    pub fn select(&mut self, conversation: Option<ConversationId>) -> Generation {
        self.current = conversation;
        self.generation = self.generation.next();
        self.generation
    }

    /// The latest issued generation.
    pub fn current_generation(&self) -> Generation {
        self.generation
    }

    /// The open conversation, if any.
    pub fn current(&self) -> Option<&ConversationId> {
        self.current.as_ref()
    }

    /// Check whether a captured token is still valid.
    pub fn is_current(&self, generation: Generation) -> bool {
        self.generation == generation
    }

    /// Check whether the given conversation is the open one.
    pub fn is_active(&self, conversation: &ConversationId) -> bool {
        self.current.as_ref() == Some(conversation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conv(id: &str) -> Option<ConversationId> {
        Some(ConversationId::new(id))
    }

    #[test]
    fn starts_empty_at_zero() {
        let selection = ConversationSelection::new();
        assert!(selection.current().is_none());
        assert_eq!(selection.current_generation(), Generation::zero());
    }

    #[test]
    fn select_increments_generation() {
        let mut selection = ConversationSelection::new();
        let g1 = selection.select(conv("a"));
        let g2 = selection.select(conv("b"));

        assert_eq!(g1.value(), 1);
        assert_eq!(g2.value(), 2);
        assert!(g1 < g2);
        assert_eq!(selection.current(), Some(&ConversationId::new("b")));
    }

    #[test]
    fn deselect_also_increments() {
        let mut selection = ConversationSelection::new();
        let g1 = selection.select(conv("a"));
        let g2 = selection.select(None);

        assert!(g2 > g1);
        assert!(selection.current().is_none());
    }

    #[test]
    fn reselecting_same_conversation_voids_old_token() {
        let mut selection = ConversationSelection::new();
        let first = selection.select(conv("a"));
        let second = selection.select(conv("a"));

        assert!(!selection.is_current(first));
        assert!(selection.is_current(second));
    }

    #[test]
    fn captured_token_goes_stale() {
        let mut selection = ConversationSelection::new();
        let captured = selection.select(conv("a"));
        assert!(selection.is_current(captured));

        selection.select(conv("b"));
        assert!(!selection.is_current(captured));
    }

    #[test]
    fn is_active_tracks_current_conversation() {
        let mut selection = ConversationSelection::new();
        assert!(!selection.is_active(&ConversationId::new("a")));

        selection.select(conv("a"));
        assert!(selection.is_active(&ConversationId::new("a")));
        assert!(!selection.is_active(&ConversationId::new("b")));
    }

    #[test]
    fn generation_saturates() {
        let mut selection = ConversationSelection {
            current: None,
            generation: Generation(u64::MAX),
        };
        assert_eq!(selection.select(None).value(), u64::MAX);
    }
}
