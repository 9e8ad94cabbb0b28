//! WebSocket-backed transport
//!
//! Change messages are handed to the socket writer task over a bounded
//! channel. A send succeeds once the message is in the channel; whatever the
//! writer never got onto the socket is returned by `OutboundQueue::close_and_drain`
//! so it can go back into the session buffer.

use async_trait::async_trait;
use changes_core::{ChangeMessage, DisconnectCallback, EventsTransport, TransportError};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

/// `EventsTransport` over the outbound channel of one WebSocket
pub struct WsTransport {
    connection_id: String,
    sender: mpsc::Sender<ChangeMessage>,
    connected: AtomicBool,
    callbacks: Mutex<Vec<DisconnectCallback>>,
}

/// Receiving end of a `WsTransport`, owned by the socket writer
#[derive(Debug)]
pub struct OutboundQueue {
    receiver: mpsc::Receiver<ChangeMessage>,
}

impl OutboundQueue {
    /// Next message to write, `None` once every sender is gone
    pub async fn recv(&mut self) -> Option<ChangeMessage> {
        self.receiver.recv().await
    }

    /// Refuse further sends and return everything still queued, oldest first
    ///
    /// Senders blocked on a full channel fail with `TransportError::Closed`.
    pub fn close_and_drain(mut self) -> Vec<ChangeMessage> {
        self.receiver.close();

        let mut undelivered = Vec::new();
        while let Ok(message) = self.receiver.try_recv() {
            undelivered.push(message);
        }
        undelivered
    }
}

impl WsTransport {
    /// Create a transport and the queue its writer reads from
    #[must_use]
    pub fn channel(connection_id: impl Into<String>, capacity: usize) -> (Arc<Self>, OutboundQueue) {
        let (sender, receiver) = mpsc::channel(capacity);
        let transport = Arc::new(Self {
            connection_id: connection_id.into(),
            sender,
            connected: AtomicBool::new(true),
            callbacks: Mutex::new(Vec::new()),
        });
        (transport, OutboundQueue { receiver })
    }

    pub fn connection_id(&self) -> &str {
        &self.connection_id
    }

    /// Mark the socket as gone and fire disconnect callbacks
    ///
    /// Only the first call has any effect.
    pub fn mark_disconnected(&self) {
        let callbacks = {
            let mut callbacks = self.callbacks.lock();
            if !self.connected.swap(false, Ordering::SeqCst) {
                return;
            }
            std::mem::take(&mut *callbacks)
        };

        tracing::debug!(
            connection_id = %self.connection_id,
            callbacks = callbacks.len(),
            "Transport disconnected"
        );

        for callback in callbacks {
            callback();
        }
    }
}

#[async_trait]
impl EventsTransport for WsTransport {
    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst) && !self.sender.is_closed()
    }

    async fn send(&self, message: &ChangeMessage) -> Result<(), TransportError> {
        if !self.connected.load(Ordering::SeqCst) {
            return Err(TransportError::Closed);
        }

        self.sender
            .send(message.clone())
            .await
            .map_err(|_| TransportError::Closed)?;

        tracing::trace!(
            connection_id = %self.connection_id,
            message = %message,
            "Message handed to socket writer"
        );
        Ok(())
    }

    async fn send_many(&self, messages: &[ChangeMessage]) -> Result<(), TransportError> {
        for message in messages {
            self.send(message).await?;
        }
        Ok(())
    }

    fn on_disconnect(&self, callback: DisconnectCallback) {
        let mut callbacks = self.callbacks.lock();
        if self.connected.load(Ordering::SeqCst) {
            callbacks.push(callback);
        } else {
            drop(callbacks);
            callback();
        }
    }
}

impl std::fmt::Debug for WsTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WsTransport")
            .field("connection_id", &self.connection_id)
            .field("connected", &self.is_connected())
            .finish_non_exhaustive()
    }
}
