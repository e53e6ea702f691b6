//! TransportSession - the single push channel of an authenticated client.
//!
//! # Lifecycle
//!
//! ```text
//! open(identity) → connect → setup ──► (server) connected ──► ready
//!                                              │
//!                      publish / join_conversation only go out while ready
//! ```
//!
//! One handler is registered per [`EventKind`]; registering again replaces
//! the previous handler, so re-wiring a view never delivers an event twice.

use dashmap::DashMap;
use palaver_chat_types::{ClientEvent, ConversationId, EventKind, ServerEvent, UserId};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::ClientError;
use crate::transport::{Transport, TransportError};

/// Callback for one kind of inbound event.
pub type EventHandler = Arc<dyn Fn(ServerEvent) + Send + Sync>;

/// The persistent push channel plus its handler table.
pub struct TransportSession<T: Transport> {
    transport: T,
    address: String,
    identity: Mutex<Option<UserId>>,
    ready: AtomicBool,
    handlers: DashMap<EventKind, EventHandler>,
}

impl<T: Transport> TransportSession<T> {
    /// Create a closed session that will connect to `address`.
    pub fn new(transport: T, address: impl Into<String>) -> Self {
        Self {
            transport,
            address: address.into(),
            identity: Mutex::new(None),
            ready: AtomicBool::new(false),
            handlers: DashMap::new(),
        }
    }

    /// Open the channel for `identity` and announce it with `setup`.
    ///
    /// Calling again for the same identity while connected does nothing. A
    /// different identity closes the current channel first.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport cannot connect or the `setup`
    /// event cannot be sent.
    pub async fn open(&self, identity: UserId) -> Result<(), ClientError> {
        let previous = self.lock_identity().clone();
        match &previous {
            Some(previous) if *previous == identity && self.transport.is_connected() => {
                tracing::debug!(identity = %identity, "session already open");
                return Ok(());
            }
            Some(previous) if *previous != identity => {
                tracing::info!(from = %previous, to = %identity, "identity changed, reopening session");
            }
            _ => {}
        }
        // A half-open channel from a failed attempt counts as open too
        if previous.is_some() || self.transport.is_connected() {
            self.close_transport().await;
            *self.lock_identity() = None;
        }

        self.transport.connect(&self.address).await?;

        // setup goes out before anything else, readiness or not
        if let Err(e) = self.send_setup(&identity).await {
            tracing::warn!(identity = %identity, error = %e, "setup failed, closing channel");
            self.close_transport().await;
            return Err(e);
        }

        *self.lock_identity() = Some(identity.clone());
        tracing::info!(identity = %identity, address = %self.address, "session opened");
        Ok(())
    }

    /// Whether the backend has acknowledged the session.
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    /// The identity the session was opened for.
    pub fn identity(&self) -> Option<UserId> {
        self.lock_identity().clone()
    }

    /// Send an event, fire-and-forget.
    ///
    /// Dropped while the session is not ready. Send failures are logged.
    pub async fn publish(&self, event: ClientEvent) {
        if !self.is_ready() {
            tracing::debug!(event = event.name(), "session not ready, dropping event");
            return;
        }

        let frame = match event.to_bytes() {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!(event = event.name(), error = %e, "failed to encode event");
                return;
            }
        };

        if let Err(e) = self.transport.send(&frame).await {
            tracing::warn!(event = event.name(), error = %e, "failed to publish event");
        }
    }

    /// Subscribe to a conversation's room.
    pub async fn join_conversation(&self, conversation: &ConversationId) {
        self.publish(ClientEvent::JoinChat(conversation.clone()))
            .await;
    }

    /// Register the handler for one kind of inbound event, replacing any
    /// previous one.
    pub fn on_event<F>(&self, kind: EventKind, handler: F)
    where
        F: Fn(ServerEvent) + Send + Sync + 'static,
    {
        if self.handlers.insert(kind, Arc::new(handler)).is_some() {
            tracing::debug!(?kind, "replaced event handler");
        }
    }

    /// Deliver an inbound event to its handler.
    pub fn dispatch(&self, event: ServerEvent) {
        if event == ServerEvent::Connected {
            self.ready.store(true, Ordering::SeqCst);
            tracing::info!("session ready");
        }

        // Clone out so the handler may re-register without deadlocking the map
        let handler = self
            .handlers
            .get(&event.kind())
            .map(|entry| Arc::clone(entry.value()));

        match handler {
            Some(handler) => handler(event),
            None => tracing::debug!(event = event.name(), "no handler registered"),
        }
    }

    /// Receive and dispatch inbound events until the channel ends.
    ///
    /// Undecodable frames are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NotStarted`] before `open()`, or the
    /// transport error if receiving fails for a reason other than the
    /// connection going away.
    pub async fn pump(&self) -> Result<(), ClientError> {
        if self.lock_identity().is_none() {
            return Err(ClientError::NotStarted);
        }

        loop {
            let frame = match self.transport.recv().await {
                Ok(frame) => frame,
                Err(e) => {
                    if !self.transport.is_connected() {
                        self.ready.store(false, Ordering::SeqCst);
                    }
                    return match e {
                        TransportError::ConnectionClosed | TransportError::ReceiveFailed(_) => {
                            tracing::info!(reason = %e, "push channel ended");
                            Ok(())
                        }
                        other => {
                            tracing::warn!(error = %other, "push channel failed");
                            Err(other.into())
                        }
                    };
                }
            };

            match ServerEvent::from_bytes(&frame) {
                Ok(event) => self.dispatch(event),
                Err(e) => tracing::warn!(error = %e, "skipping undecodable frame"),
            }
        }
    }

    /// Close the channel and forget the identity.
    pub async fn dispose(&self) {
        self.close_transport().await;
        *self.lock_identity() = None;
        tracing::info!("session disposed");
    }

    /// Get a reference to the transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    async fn send_setup(&self, identity: &UserId) -> Result<(), ClientError> {
        let setup = ClientEvent::Setup(identity.clone()).to_bytes()?;
        self.transport.send(&setup).await?;
        Ok(())
    }

    async fn close_transport(&self) {
        self.ready.store(false, Ordering::SeqCst);
        if let Err(e) = self.transport.close().await {
            tracing::warn!(error = %e, "failed to close transport");
        }
    }

    fn lock_identity(&self) -> MutexGuard<'_, Option<UserId>> {
        self.identity.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Transport> std::fmt::Debug for TransportSession<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportSession")
            .field("address", &self.address)
            .field("identity", &self.identity())
            .field("ready", &self.is_ready())
            .field("handlers", &self.handlers.len())
            .finish()
    }
}
