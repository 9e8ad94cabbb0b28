//! In-memory transport and helpers for unit tests

use async_trait::async_trait;
use changes_core::{ChangeMessage, DisconnectCallback, EventsTransport, TransportError};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Records everything pushed through it; can be told to fail or disconnect
#[derive(Default)]
pub struct RecordingTransport {
    disconnected: AtomicBool,
    failing: bool,
    sent: Mutex<Vec<ChangeMessage>>,
    batches: Mutex<Vec<usize>>,
    callbacks: Mutex<Vec<DisconnectCallback>>,
}

impl RecordingTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Connected, but every send fails
    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            failing: true,
            ..Self::default()
        })
    }

    /// Simulate the physical connection going away
    pub fn disconnect(&self) {
        if self.disconnected.swap(true, Ordering::SeqCst) {
            return;
        }
        let callbacks = std::mem::take(&mut *self.callbacks.lock());
        for callback in callbacks {
            callback();
        }
    }

    pub fn sent(&self) -> Vec<ChangeMessage> {
        self.sent.lock().clone()
    }

    pub fn sent_names(&self) -> Vec<String> {
        self.sent.lock().iter().map(|m| m.name().to_string()).collect()
    }

    pub fn batch_sizes(&self) -> Vec<usize> {
        self.batches.lock().clone()
    }
}

#[async_trait]
impl EventsTransport for RecordingTransport {
    fn is_connected(&self) -> bool {
        !self.disconnected.load(Ordering::SeqCst)
    }

    async fn send(&self, message: &ChangeMessage) -> Result<(), TransportError> {
        if self.failing {
            return Err(TransportError::SendFailed("injected failure".to_string()));
        }
        self.sent.lock().push(message.clone());
        Ok(())
    }

    async fn send_many(&self, messages: &[ChangeMessage]) -> Result<(), TransportError> {
        if self.failing {
            return Err(TransportError::SendFailed("injected failure".to_string()));
        }
        self.batches.lock().push(messages.len());
        self.sent.lock().extend_from_slice(messages);
        Ok(())
    }

    fn on_disconnect(&self, callback: DisconnectCallback) {
        let mut callbacks = self.callbacks.lock();
        if self.disconnected.load(Ordering::SeqCst) {
            drop(callbacks);
            callback();
        } else {
            callbacks.push(callback);
        }
    }
}

/// Poll `condition` until it holds, failing the test after two seconds
pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while !condition() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "condition not met within 2s"
        );
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}
