//! Auxiliary change listeners
//!
//! Observers that want every notification regardless of connection
//! subscriptions (metrics, replication hooks, ...). They are raised before
//! the per-connection fan-out.

use crate::events::{DocumentChangeNotification, IndexChangeNotification};

/// Receives every broadcast notification
///
/// **Thread Safety**: called from whichever thread broadcasts, possibly
/// several at once.
pub trait ChangeListener: Send + Sync {
    /// Called before an index change is fanned out to connections
    fn on_index_change(&self, _notification: &IndexChangeNotification) {}

    /// Called before a document change is fanned out to connections
    fn on_document_change(&self, _notification: &DocumentChangeNotification) {}
}
