//! Auxiliary change listeners
//!
//! Owned by the registry, created and dropped with it.

use changes_core::{ChangeListener, DocumentChangeNotification, IndexChangeNotification};
use parking_lot::RwLock;
use std::sync::Arc;

/// Listeners notified of every broadcast before connections are
#[derive(Default)]
pub struct ChangeListeners {
    listeners: RwLock<Vec<Arc<dyn ChangeListener>>>,
}

impl ChangeListeners {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener
    pub fn add(&self, listener: Arc<dyn ChangeListener>) {
        self.listeners.write().push(listener);
    }

    /// Drop every registered listener
    pub fn clear(&self) {
        self.listeners.write().clear();
    }

    pub fn len(&self) -> usize {
        self.listeners.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.read().is_empty()
    }

    // Listeners run on a snapshot so they may register further listeners.
    fn snapshot(&self) -> Vec<Arc<dyn ChangeListener>> {
        self.listeners.read().clone()
    }

    pub fn raise_index_change(&self, notification: &IndexChangeNotification) {
        for listener in self.snapshot() {
            listener.on_index_change(notification);
        }
    }

    pub fn raise_document_change(&self, notification: &DocumentChangeNotification) {
        for listener in self.snapshot() {
            listener.on_document_change(notification);
        }
    }
}

impl std::fmt::Debug for ChangeListeners {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeListeners")
            .field("listeners", &self.len())
            .finish()
    }
}
