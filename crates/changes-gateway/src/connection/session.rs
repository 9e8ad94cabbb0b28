//! Connection session
//!
//! Per-connection subscription and buffering state. A session outlives any
//! single transport: reconnecting swaps the transport and flushes whatever
//! was buffered while the client was away, but never touches subscriptions.

use super::pending::PendingQueue;
use super::watch_set::WatchSet;
use changes_core::{
    ChangeMessage, DocumentChangeNotification, EventsTransport, IndexChangeNotification,
};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// Outcome of offering a notification to a session
#[derive(Debug)]
pub enum Delivery {
    /// The session is not subscribed; nothing happened
    Filtered,
    /// No usable transport; the message was buffered
    Queued,
    /// A send was started; the task re-queues the message if it fails
    Dispatched(JoinHandle<()>),
}

impl Delivery {
    /// Whether the session accepted the notification (sent or buffered)
    #[must_use]
    pub fn is_accepted(&self) -> bool {
        !matches!(self, Self::Filtered)
    }
}

/// Subscription and delivery state for one logical connection
pub struct Session {
    /// Stable connection id, shared by every transport the client reconnects on
    id: String,

    watched_indexes: WatchSet,
    watched_documents: WatchSet,
    watched_document_prefixes: WatchSet,

    /// "Watch all documents" is active iff this is non-zero
    watch_all_documents: AtomicUsize,

    /// Messages waiting for a usable transport
    pending: Arc<PendingQueue>,

    /// Currently bound transport, if any
    transport: RwLock<Option<Arc<dyn EventsTransport>>>,

    /// Runtime that owns the asynchronous sends
    runtime: Handle,
}

impl Session {
    /// Create a session, optionally bound to a transport
    pub fn new(
        id: impl Into<String>,
        transport: Option<Arc<dyn EventsTransport>>,
        runtime: Handle,
    ) -> Self {
        Self {
            id: id.into(),
            watched_indexes: WatchSet::new(),
            watched_documents: WatchSet::new(),
            watched_document_prefixes: WatchSet::new(),
            watch_all_documents: AtomicUsize::new(0),
            pending: Arc::new(PendingQueue::new()),
            transport: RwLock::new(transport),
            runtime,
        }
    }

    /// Get the connection id
    pub fn id(&self) -> &str {
        &self.id
    }

    // === Subscriptions ===

    pub fn watch_index(&self, name: &str) {
        self.watched_indexes.insert(name);
    }

    pub fn unwatch_index(&self, name: &str) {
        self.watched_indexes.remove(name);
    }

    pub fn watch_document(&self, name: &str) {
        self.watched_documents.insert(name);
    }

    pub fn unwatch_document(&self, name: &str) {
        self.watched_documents.remove(name);
    }

    pub fn watch_document_prefix(&self, prefix: &str) {
        self.watched_document_prefixes.insert(prefix);
    }

    pub fn unwatch_document_prefix(&self, prefix: &str) {
        self.watched_document_prefixes.remove(prefix);
    }

    /// Start (or nest) a "watch all documents" subscription
    pub fn watch_all_documents(&self) {
        // Saturates instead of wrapping.
        let _ = self
            .watch_all_documents
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |count| {
                count.checked_add(1)
            });
    }

    /// End one "watch all documents" subscription
    ///
    /// Unbalanced calls stop at zero: a later watch activates again right away.
    pub fn unwatch_all_documents(&self) {
        let _ = self
            .watch_all_documents
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |count| {
                count.checked_sub(1)
            });
    }

    /// Whether every document change is delivered
    pub fn is_watching_all_documents(&self) -> bool {
        self.watch_all_documents.load(Ordering::Acquire) > 0
    }

    pub fn is_watching_index(&self, name: &str) -> bool {
        self.watched_indexes.contains(name)
    }

    pub fn is_watching_document(&self, name: &str) -> bool {
        self.watched_documents.contains(name)
    }

    /// Whether a document change for `name` would pass this session's filters
    pub fn matches_document(&self, name: &str) -> bool {
        self.is_watching_all_documents()
            || self.watched_documents.contains(name)
            || self.watched_document_prefixes.matches_prefix_of(name)
    }

    // === Delivery ===

    /// Offer an index change; delivered only if the index is watched
    pub fn deliver_index_change(&self, notification: &IndexChangeNotification) -> Delivery {
        if !self.watched_indexes.contains(&notification.name) {
            return Delivery::Filtered;
        }

        self.enqueue(ChangeMessage::from(notification.clone()))
    }

    /// Offer a document change; delivered on watch-all, exact name or prefix match
    pub fn deliver_document_change(&self, notification: &DocumentChangeNotification) -> Delivery {
        if !self.matches_document(&notification.name) {
            return Delivery::Filtered;
        }

        self.enqueue(ChangeMessage::from(notification.clone()))
    }

    /// Send now if a connected transport is bound, otherwise buffer
    fn enqueue(&self, message: ChangeMessage) -> Delivery {
        let Some(transport) = self.connected_transport() else {
            tracing::trace!(
                connection_id = %self.id,
                message = %message,
                "No connected transport, message buffered"
            );
            self.pending.push(message);
            return Delivery::Queued;
        };

        let pending = Arc::clone(&self.pending);
        let connection_id = self.id.clone();

        let handle = self.runtime.spawn(async move {
            if let Err(e) = transport.send(&message).await {
                tracing::warn!(
                    connection_id = %connection_id,
                    message = %message,
                    error = %e,
                    "Send failed, message re-queued"
                );
                pending.push(message);
            }
        });

        Delivery::Dispatched(handle)
    }

    /// Bind a new transport and flush everything buffered onto it
    ///
    /// Returns the flush task, or `None` when there was nothing to flush.
    /// If the flush fails the whole batch goes back to the front of the
    /// buffer; a partially transmitted batch may therefore be sent twice.
    pub fn reconnect(&self, transport: Arc<dyn EventsTransport>) -> Option<JoinHandle<()>> {
        *self.transport.write() = Some(Arc::clone(&transport));
        self.flush(transport, "Reconnected")
    }

    /// Return messages a transport accepted but never put on the wire
    ///
    /// They go in front of the buffer. If the session has meanwhile been
    /// rebound to a connected transport, the buffer is flushed onto it.
    pub fn requeue(&self, undelivered: Vec<ChangeMessage>) -> Option<JoinHandle<()>> {
        if undelivered.is_empty() {
            return None;
        }

        tracing::debug!(
            connection_id = %self.id,
            count = undelivered.len(),
            "Undelivered messages returned to buffer"
        );
        self.pending.restore(undelivered);

        let transport = self.connected_transport()?;
        self.flush(transport, "Requeued onto live transport")
    }

    fn flush(&self, transport: Arc<dyn EventsTransport>, reason: &'static str) -> Option<JoinHandle<()>> {
        let batch = self.pending.take_all();
        if batch.is_empty() {
            tracing::debug!(connection_id = %self.id, reason, "Nothing to flush");
            return None;
        }

        tracing::debug!(
            connection_id = %self.id,
            count = batch.len(),
            reason,
            "Flushing pending messages"
        );

        let pending = Arc::clone(&self.pending);
        let connection_id = self.id.clone();

        Some(self.runtime.spawn(async move {
            if let Err(e) = transport.send_many(&batch).await {
                tracing::warn!(
                    connection_id = %connection_id,
                    count = batch.len(),
                    error = %e,
                    "Flush failed, batch re-queued"
                );
                pending.restore(batch);
            }
        }))
    }

    // === Transport state ===

    fn connected_transport(&self) -> Option<Arc<dyn EventsTransport>> {
        self.transport
            .read()
            .as_ref()
            .filter(|t| t.is_connected())
            .cloned()
    }

    /// Whether a transport is bound (connected or not)
    pub fn is_bound(&self) -> bool {
        self.transport.read().is_some()
    }

    /// Whether the bound transport currently reports itself connected
    pub fn is_connected(&self) -> bool {
        self.connected_transport().is_some()
    }

    /// Whether `transport` is the one currently bound
    pub fn is_bound_to(&self, transport: &Arc<dyn EventsTransport>) -> bool {
        self.transport
            .read()
            .as_ref()
            .is_some_and(|current| Arc::ptr_eq(current, transport))
    }

    // === Buffer inspection ===

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Copy of the buffered messages in delivery order
    pub fn pending_messages(&self) -> Vec<ChangeMessage> {
        self.pending.snapshot()
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("indexes", &self.watched_indexes.len())
            .field("documents", &self.watched_documents.len())
            .field("prefixes", &self.watched_document_prefixes.len())
            .field(
                "watch_all_documents",
                &self.watch_all_documents.load(Ordering::Relaxed),
            )
            .field("pending", &self.pending.len())
            .field("bound", &self.is_bound())
            .finish()
    }
}
