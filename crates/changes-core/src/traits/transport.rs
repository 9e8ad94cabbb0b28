//! Events transport - the live channel a connection is currently reachable on

use async_trait::async_trait;

use crate::error::TransportError;
use crate::events::ChangeMessage;

/// Invoked once when the physical connection behind a transport goes away
pub type DisconnectCallback = Box<dyn FnOnce() + Send + 'static>;

/// A channel that pushes change messages to one client
///
/// A session holds at most one transport at a time and swaps it on
/// reconnect. Connectivity is always queried here, never cached by callers.
#[async_trait]
pub trait EventsTransport: Send + Sync {
    /// Whether the transport can currently accept messages
    fn is_connected(&self) -> bool;

    /// Push a single message
    async fn send(&self, message: &ChangeMessage) -> Result<(), TransportError>;

    /// Push a batch of messages in order
    ///
    /// A failure may happen after part of the batch went out.
    async fn send_many(&self, messages: &[ChangeMessage]) -> Result<(), TransportError>;

    /// Register a callback fired exactly once when this transport disconnects
    ///
    /// Implementations invoke the callback immediately if the transport is
    /// already disconnected.
    fn on_disconnect(&self, callback: DisconnectCallback);
}
