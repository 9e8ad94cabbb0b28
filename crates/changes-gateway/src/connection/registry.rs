//! Transport registry
//!
//! Owns every connection session keyed by connection id, fans notifications
//! out to them and reclaims sessions whose connection stayed missing for the
//! whole expiry window.

use super::session::{Delivery, Session};
use crate::broadcast::ChangeListeners;
use changes_core::{
    DocumentChangeNotification, EventsTransport, ExpiryTracker, IndexChangeNotification,
};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::{Arc, Weak};
use tokio::runtime::Handle;

/// Registry of all connection sessions
///
/// Uses `DashMap` so that operations on different ids never contend on a
/// single lock.
pub struct TransportRegistry {
    /// Sessions by connection id
    sessions: DashMap<String, Arc<Session>>,

    /// Decides when a missing connection may be reclaimed
    expiry: Arc<dyn ExpiryTracker>,

    /// Raised before the per-session fan-out
    listeners: ChangeListeners,

    /// Runtime handed to sessions for their asynchronous sends
    runtime: Handle,
}

impl TransportRegistry {
    /// Create a registry bound to the current tokio runtime
    ///
    /// # Panics
    /// Panics if called outside a tokio runtime.
    pub fn new(expiry: Arc<dyn ExpiryTracker>) -> Self {
        Self::with_runtime(expiry, Handle::current())
    }

    /// Create a registry whose sessions spawn their sends on `runtime`
    ///
    /// Use this when notifications are broadcast from threads that are not
    /// part of a runtime.
    pub fn with_runtime(expiry: Arc<dyn ExpiryTracker>, runtime: Handle) -> Self {
        Self {
            sessions: DashMap::new(),
            expiry,
            listeners: ChangeListeners::new(),
            runtime,
        }
    }

    /// Create a new registry wrapped in Arc
    pub fn new_shared(expiry: Arc<dyn ExpiryTracker>) -> Arc<Self> {
        Arc::new(Self::new(expiry))
    }

    /// Auxiliary listeners raised on every broadcast
    pub fn listeners(&self) -> &ChangeListeners {
        &self.listeners
    }

    // === Lifecycle ===

    /// Attach a transport to a connection id
    ///
    /// Creates the session on first contact; otherwise rebinds the existing
    /// one, keeping its subscriptions and flushing its buffer. Concurrent
    /// calls for the same id all get the same session.
    pub fn register(&self, connection_id: &str, transport: Arc<dyn EventsTransport>) -> Arc<Session> {
        self.expiry.seen(connection_id);

        let session = match self.sessions.entry(connection_id.to_string()) {
            Entry::Occupied(entry) => {
                // Rebind under the shard lock so a concurrent sweep sees it connected.
                let session = Arc::clone(entry.get());
                session.reconnect(Arc::clone(&transport));
                drop(entry);

                tracing::debug!(connection_id = %connection_id, "Session reconnected");
                session
            }
            Entry::Vacant(entry) => {
                let session = Arc::new(Session::new(
                    connection_id,
                    Some(Arc::clone(&transport)),
                    self.runtime.clone(),
                ));
                entry.insert(Arc::clone(&session));

                tracing::debug!(connection_id = %connection_id, "Session created");
                session
            }
        };

        self.watch_disconnect(connection_id, &session, &transport);
        session
    }

    /// Mark the id missing once `transport` goes away
    ///
    /// Skipped when the session has already moved on to another live
    /// transport, so a stale socket closing late cannot start the expiry
    /// window of a connected client.
    fn watch_disconnect(
        &self,
        connection_id: &str,
        session: &Arc<Session>,
        transport: &Arc<dyn EventsTransport>,
    ) {
        let expiry = Arc::clone(&self.expiry);
        let connection_id = connection_id.to_string();
        let session: Weak<Session> = Arc::downgrade(session);

        transport.on_disconnect(Box::new(move || {
            let still_connected = session.upgrade().is_some_and(|s| s.is_connected());
            if still_connected {
                tracing::trace!(
                    connection_id = %connection_id,
                    "Stale transport disconnected, session already rebound"
                );
                return;
            }

            expiry.missing(&connection_id);
            tracing::debug!(connection_id = %connection_id, "Transport disconnected");
        }));
    }

    /// Get the session for an id, creating an unbound one if needed
    ///
    /// A freshly created session starts expiring immediately unless a
    /// `register` for the same id follows.
    pub fn session_for(&self, connection_id: &str) -> Arc<Session> {
        if let Some(session) = self.sessions.get(connection_id) {
            return Arc::clone(session.value());
        }

        let session = self
            .sessions
            .entry(connection_id.to_string())
            .or_insert_with(|| {
                self.expiry.missing(connection_id);
                tracing::debug!(connection_id = %connection_id, "Unbound session created");
                Arc::new(Session::new(connection_id, None, self.runtime.clone()))
            });

        Arc::clone(session.value())
    }

    /// Get a session without creating it
    pub fn get(&self, connection_id: &str) -> Option<Arc<Session>> {
        self.sessions.get(connection_id).map(|s| Arc::clone(s.value()))
    }

    /// Remove every session whose connection has expired
    ///
    /// Returns the number of sessions removed.
    pub fn on_idle(&self) -> usize {
        let mut expired = Vec::new();
        self.expiry
            .for_all_expired(&mut |connection_id| expired.push(connection_id.to_string()));

        let mut removed = 0;
        for connection_id in expired {
            // A Register that landed after the expiry query has rebound the session.
            if self
                .sessions
                .remove_if(&connection_id, |_, session| !session.is_connected())
                .is_some()
            {
                removed += 1;
                tracing::info!(connection_id = %connection_id, "Expired session removed");
            }
        }

        if removed > 0 {
            tracing::debug!(
                removed = removed,
                remaining = self.sessions.len(),
                "Idle sweep finished"
            );
        }

        removed
    }

    // === Fan-out ===

    /// Current sessions, collected so no map lock is held while delivering
    fn snapshot(&self) -> Vec<Arc<Session>> {
        self.sessions.iter().map(|s| Arc::clone(s.value())).collect()
    }

    /// Broadcast an index change to every interested session
    ///
    /// Returns the number of sessions that accepted it (sent or buffered).
    pub fn broadcast_index_change(&self, notification: &IndexChangeNotification) -> usize {
        self.listeners.raise_index_change(notification);

        let accepted = self
            .snapshot()
            .iter()
            .map(|session| session.deliver_index_change(notification))
            .filter(Delivery::is_accepted)
            .count();

        tracing::trace!(
            index = %notification.name,
            change = %notification.change_type,
            accepted = accepted,
            "Index change broadcast"
        );

        accepted
    }

    /// Broadcast a document change to every interested session
    ///
    /// Returns the number of sessions that accepted it (sent or buffered).
    pub fn broadcast_document_change(&self, notification: &DocumentChangeNotification) -> usize {
        self.listeners.raise_document_change(notification);

        let accepted = self
            .snapshot()
            .iter()
            .map(|session| session.deliver_document_change(notification))
            .filter(Delivery::is_accepted)
            .count();

        tracing::trace!(
            document = %notification.name,
            change = %notification.change_type,
            accepted = accepted,
            "Document change broadcast"
        );

        accepted
    }

    // === Introspection ===

    /// Get the total number of sessions
    pub fn connection_count(&self) -> usize {
        self.sessions.len()
    }

    /// Check if a session exists
    pub fn has_session(&self, connection_id: &str) -> bool {
        self.sessions.contains_key(connection_id)
    }

    /// Get all connection ids
    pub fn connection_ids(&self) -> Vec<String> {
        self.sessions.iter().map(|s| s.key().clone()).collect()
    }
}

impl std::fmt::Debug for TransportRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportRegistry")
            .field("sessions", &self.sessions.len())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
