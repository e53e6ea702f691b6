//! ChatEngine - keeps one conversation view in sync with the backend.
//!
//! # Architecture
//!
//! The engine owns the push session, the REST collaborator and the
//! notification sink, and drives the pure state from chat-core:
//!
//! ```text
//! UI ──► ChatEngine ──► ChatApi (history, send)
//!            │    └───► TransportSession ──► Transport
//!            ▼
//!   chat-core (selection, log, typing)
//! ```
//!
//! All state sits behind one lock. The lock is only held for short
//! synchronous sections and never across an await; results of async work
//! are fenced with the [`Generation`] they were started under.

use palaver_chat_core::{
    route_push, ConversationSelection, Generation, LogEntry, MessageLog, PushRoute, TypingAction,
    TypingEvent, TypingState,
};
use palaver_chat_types::{
    ClientEvent, ConversationId, EventKind, LocalId, Message, ServerEvent, UserId,
};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::task::JoinHandle;

use crate::api::ChatApi;
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::notify::{Failure, Notifier};
use crate::session::TransportSession;
use crate::transport::Transport;

/// Snapshot of everything a chat view renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatView {
    /// The open conversation.
    pub conversation: Option<ConversationId>,
    /// Log entries in display order.
    pub entries: Vec<LogEntry>,
    /// Whether the other side is typing.
    pub peer_typing: bool,
    /// Whether the local user is typing.
    pub local_typing: bool,
    /// Whether a history fetch is in flight.
    pub loading: bool,
    /// Whether the push session is ready.
    pub ready: bool,
}

/// Mutable engine state. One lock guards all of it.
#[derive(Debug)]
struct EngineState {
    selection: ConversationSelection,
    log: MessageLog,
    typing: TypingState,
    idle_check: Option<JoinHandle<()>>,
    /// Bumped on every arm and cancel; a check only acts if it still matches.
    idle_seq: u64,
    peer_typing: bool,
    compose: String,
    loading: bool,
    history_applied: bool,
}

struct EngineInner<T: Transport, A: ChatApi, N: Notifier> {
    session: TransportSession<T>,
    api: A,
    notifier: N,
    state: Mutex<EngineState>,
}

impl<T: Transport, A: ChatApi, N: Notifier> EngineInner<T, A, N> {
    fn lock_state(&self) -> MutexGuard<'_, EngineState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// The chat sync engine.
///
/// Cheap to clone; clones share state.
pub struct ChatEngine<T: Transport, A: ChatApi, N: Notifier> {
    inner: Arc<EngineInner<T, A, N>>,
}

impl<T: Transport, A: ChatApi, N: Notifier> Clone for ChatEngine<T, A, N> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T, A, N> ChatEngine<T, A, N>
where
    T: Transport + 'static,
    A: ChatApi + 'static,
    N: Notifier + 'static,
{
    /// Create an engine. Nothing is connected until [`start`](Self::start).
    pub fn new(config: ClientConfig, transport: T, api: A, notifier: N) -> Self {
        let state = EngineState {
            selection: ConversationSelection::new(),
            log: MessageLog::new(),
            typing: TypingState::new(config.idle_window()),
            idle_check: None,
            idle_seq: 0,
            peer_typing: false,
            compose: String::new(),
            loading: false,
            history_applied: false,
        };

        Self {
            inner: Arc::new(EngineInner {
                session: TransportSession::new(transport, config.server.push_url),
                api,
                notifier,
                state: Mutex::new(state),
            }),
        }
    }

    /// Wire the inbound handlers and open the push session for `identity`.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be opened.
    pub async fn start(&self, identity: UserId) -> Result<(), ClientError> {
        self.register_handlers();
        self.inner.session.open(identity).await
    }

    /// Receive and handle pushes until the channel ends.
    ///
    /// # Errors
    ///
    /// See [`TransportSession::pump`].
    pub async fn pump(&self) -> Result<(), ClientError> {
        self.inner.session.pump().await
    }

    /// Handle one inbound event as if it came off the push channel.
    pub fn deliver(&self, event: ServerEvent) {
        self.inner.session.dispatch(event);
    }

    /// Stop typing timers and close the push session.
    pub async fn shutdown(&self) {
        {
            let mut state = self.inner.lock_state();
            let _ = self.step_typing(&mut state, TypingEvent::Reset);
        }
        self.inner.session.dispose().await;
    }

    // ===========================================
    // Selection and History
    // ===========================================

    /// Open a conversation (or close the current one with `None`).
    ///
    /// Clears the log and fetches the new conversation's history. Returns
    /// the generation issued for this selection.
    pub async fn select(&self, conversation: Option<ConversationId>) -> Generation {
        let generation = {
            let mut state = self.inner.lock_state();
            let generation = state.selection.select(conversation.clone());
            state.log.reset(conversation.clone());
            state.peer_typing = false;
            state.loading = false;
            state.history_applied = false;
            let _ = self.step_typing(&mut state, TypingEvent::Reset);
            generation
        };
        tracing::debug!(?conversation, %generation, "selection changed");

        if let Some(conversation) = conversation {
            self.load_history(conversation, generation).await;
        }
        generation
    }

    /// Fetch a conversation's history under a generation token.
    ///
    /// The result is applied only if `token` is still current, after which
    /// the conversation's room is joined. A stale result has no effect.
    pub async fn load_history(&self, conversation: ConversationId, token: Generation) {
        {
            let mut state = self.inner.lock_state();
            if !state.selection.is_current(token) {
                return;
            }
            state.loading = true;
        }

        let result = self.inner.api.history(&conversation).await;

        let outcome = {
            let mut state = self.inner.lock_state();
            if !state.selection.is_current(token) {
                tracing::debug!(%conversation, %token, "dropping stale history");
                return;
            }
            state.loading = false;
            match result {
                Ok(history) => {
                    tracing::debug!(%conversation, messages = history.len(), "history loaded");
                    state.log.install_history(conversation.clone(), history);
                    state.history_applied = true;
                    Ok(())
                }
                Err(e) => Err(e),
            }
        };

        match outcome {
            Ok(()) => self.inner.session.join_conversation(&conversation).await,
            Err(e) => {
                tracing::warn!(%conversation, error = %e, "history fetch failed");
                self.inner.notifier.failure(Failure::history_load(e.to_string()));
            }
        }
    }

    /// Re-fetch the open conversation's history.
    pub async fn refresh(&self) {
        let current = {
            let state = self.inner.lock_state();
            state
                .selection
                .current()
                .cloned()
                .map(|conversation| (conversation, state.selection.current_generation()))
        };
        if let Some((conversation, generation)) = current {
            self.load_history(conversation, generation).await;
        }
    }

    // ===========================================
    // Compose and Send
    // ===========================================

    /// Replace the compose buffer. Counts as a keystroke for typing presence.
    pub async fn set_compose(&self, text: impl Into<String>) {
        let publishes = {
            let mut state = self.inner.lock_state();
            state.compose = text.into();
            if !self.inner.session.is_ready() || state.selection.current().is_none() {
                return;
            }
            self.step_typing(&mut state, TypingEvent::Keystroke { at: now() })
        };
        self.publish_all(publishes).await;
    }

    /// Send the compose buffer (Enter).
    ///
    /// `stop typing` goes out first, then the message is appended
    /// optimistically and handed to the REST collaborator. A failed send
    /// keeps the entry, marks it failed and raises a notice.
    pub async fn submit(&self) {
        let Some(identity) = self.inner.session.identity() else {
            tracing::debug!("submit before start, ignoring");
            return;
        };

        let prepared = {
            let mut state = self.inner.lock_state();
            let content = state.compose.clone();
            match state.selection.current().cloned() {
                Some(conversation) if !content.is_empty() => {
                    let generation = state.selection.current_generation();
                    let publishes = self.step_typing(&mut state, TypingEvent::Submitted);

                    let local_id = LocalId::new();
                    let provisional = Message {
                        id: local_id.provisional_message_id(),
                        conversation_id: conversation.clone(),
                        sender: identity,
                        content: content.clone(),
                        created_at: unix_millis(),
                    };
                    state.log.push_provisional(local_id, provisional);
                    state.compose.clear();
                    Some((conversation, generation, local_id, content, publishes))
                }
                _ => None,
            }
        };
        let Some((conversation, generation, local_id, content, publishes)) = prepared else {
            return;
        };

        self.publish_all(publishes).await;

        match self.inner.api.send(&conversation, &content).await {
            Ok(confirmed) => {
                {
                    let mut state = self.inner.lock_state();
                    if state.selection.is_current(generation) {
                        state.log.confirm(local_id, confirmed.clone());
                    } else {
                        tracing::debug!(%conversation, "selection changed during send");
                    }
                }
                self.inner
                    .session
                    .publish(ClientEvent::NewMessage(confirmed))
                    .await;
            }
            Err(e) => {
                tracing::warn!(%conversation, error = %e, "send failed");
                {
                    let mut state = self.inner.lock_state();
                    if state.selection.is_current(generation) {
                        state.log.fail(local_id);
                    }
                }
                self.inner.notifier.failure(Failure::send(e.to_string()));
            }
        }
    }

    // ===========================================
    // Accessors
    // ===========================================

    /// Snapshot of the view.
    pub fn view(&self) -> ChatView {
        let state = self.inner.lock_state();
        ChatView {
            conversation: state.selection.current().cloned(),
            entries: state.log.entries().to_vec(),
            peer_typing: state.peer_typing,
            local_typing: state.typing.is_active(),
            loading: state.loading,
            ready: self.inner.session.is_ready(),
        }
    }

    /// Whether a history fetch is in flight.
    pub fn is_loading(&self) -> bool {
        self.inner.lock_state().loading
    }

    /// The compose buffer.
    pub fn compose(&self) -> String {
        self.inner.lock_state().compose.clone()
    }

    /// The open conversation.
    pub fn current_conversation(&self) -> Option<ConversationId> {
        self.inner.lock_state().selection.current().cloned()
    }

    /// The push session.
    pub fn session(&self) -> &TransportSession<T> {
        &self.inner.session
    }

    // ===========================================
    // Inbound events
    // ===========================================

    fn register_handlers(&self) {
        let weak = Arc::downgrade(&self.inner);
        self.inner.session.on_event(EventKind::Connected, move |_| {
            if let Some(engine) = Self::upgrade(&weak) {
                tokio::spawn(async move { engine.rejoin().await });
            }
        });

        let weak = Arc::downgrade(&self.inner);
        self.inner
            .session
            .on_event(EventKind::MessageReceived, move |event| {
                if let (Some(engine), ServerEvent::MessageReceived(message)) =
                    (Self::upgrade(&weak), event)
                {
                    engine.on_push(message);
                }
            });

        let weak = Arc::downgrade(&self.inner);
        self.inner.session.on_event(EventKind::Typing, move |event| {
            if let (Some(engine), ServerEvent::Typing(conversation)) = (Self::upgrade(&weak), event)
            {
                engine.on_peer_typing(conversation.as_ref(), true);
            }
        });

        let weak = Arc::downgrade(&self.inner);
        self.inner
            .session
            .on_event(EventKind::StopTyping, move |event| {
                if let (Some(engine), ServerEvent::StopTyping(conversation)) =
                    (Self::upgrade(&weak), event)
                {
                    engine.on_peer_typing(conversation.as_ref(), false);
                }
            });
    }

    fn upgrade(weak: &Weak<EngineInner<T, A, N>>) -> Option<Self> {
        weak.upgrade().map(|inner| Self { inner })
    }

    /// Route an inbound message against the selection as it is now.
    fn on_push(&self, message: Message) {
        let forward = {
            let mut state = self.inner.lock_state();
            match route_push(&state.selection, message) {
                PushRoute::Append(message) => {
                    if !state.log.append(message) {
                        tracing::debug!("ignoring echo of a message already in the log");
                    }
                    None
                }
                PushRoute::Forward(message) => Some(message),
            }
        };
        if let Some(message) = forward {
            tracing::debug!(conversation = %message.conversation_id, "forwarding message");
            self.inner.notifier.forward(message);
        }
    }

    fn on_peer_typing(&self, conversation: Option<&ConversationId>, typing: bool) {
        let mut state = self.inner.lock_state();
        let applies = match (conversation, state.selection.current()) {
            (_, None) => false,
            (Some(named), Some(current)) => named == current,
            (None, Some(_)) => true,
        };
        if applies {
            state.peer_typing = typing;
        }
    }

    /// After a (re)connect, rejoin the open conversation once its history
    /// is in.
    async fn rejoin(&self) {
        let conversation = {
            let state = self.inner.lock_state();
            if state.history_applied {
                state.selection.current().cloned()
            } else {
                None
            }
        };
        if let Some(conversation) = conversation {
            self.inner.session.join_conversation(&conversation).await;
        }
    }

    // ===========================================
    // Typing presence
    // ===========================================

    /// Feed the typing machine and execute its timer actions. Returns the
    /// events to publish once the lock is released.
    fn step_typing(&self, state: &mut EngineState, event: TypingEvent) -> Vec<ClientEvent> {
        let (typing, actions) = state.typing.clone().on_event(event);
        state.typing = typing;

        let mut publishes = Vec::new();
        for action in actions {
            match action {
                TypingAction::PublishTyping => {
                    if let Some(conversation) = state.selection.current() {
                        publishes.push(ClientEvent::Typing(conversation.clone()));
                    }
                }
                TypingAction::PublishStopTyping => {
                    if let Some(conversation) = state.selection.current() {
                        publishes.push(ClientEvent::StopTyping(conversation.clone()));
                    }
                }
                TypingAction::ArmIdleCheck { delay } => {
                    Self::cancel_idle_check(state);
                    state.idle_check = Some(self.spawn_idle_check(delay, state.idle_seq));
                }
                TypingAction::CancelIdleCheck => Self::cancel_idle_check(state),
            }
        }
        publishes
    }

    fn cancel_idle_check(state: &mut EngineState) {
        state.idle_seq = state.idle_seq.wrapping_add(1);
        if let Some(handle) = state.idle_check.take() {
            handle.abort();
        }
    }

    fn spawn_idle_check(&self, delay: Duration, seq: u64) -> JoinHandle<()> {
        let weak = Arc::downgrade(&self.inner);
        let deadline = tokio::time::Instant::now() + delay;
        tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            if let Some(engine) = Self::upgrade(&weak) {
                engine.on_idle_check(seq).await;
            }
        })
    }

    async fn on_idle_check(&self, seq: u64) {
        let publishes = {
            let mut state = self.inner.lock_state();
            if state.idle_seq != seq {
                tracing::debug!(seq, current = state.idle_seq, "ignoring superseded idle check");
                return;
            }
            // The stored handle is this task; forget it without aborting.
            state.idle_check = None;
            self.step_typing(&mut state, TypingEvent::IdleCheck { at: now() })
        };
        self.publish_all(publishes).await;
    }

    async fn publish_all(&self, events: Vec<ClientEvent>) {
        for event in events {
            self.inner.session.publish(event).await;
        }
    }
}

impl<T: Transport, A: ChatApi, N: Notifier> std::fmt::Debug for ChatEngine<T, A, N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatEngine")
            .field("session", &self.inner.session)
            .finish_non_exhaustive()
    }
}

/// Current time on the runtime clock (pausable in tests).
fn now() -> std::time::Instant {
    tokio::time::Instant::now().into_std()
}

fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}
