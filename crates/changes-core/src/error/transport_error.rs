//! Transport errors - reported by an events transport when a push fails

use thiserror::Error;

/// Why a transport could not deliver a message
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Transport is closed")]
    Closed,

    #[error("Send failed: {0}")]
    SendFailed(String),

    #[error("Failed to encode message: {0}")]
    Encode(#[from] serde_json::Error),
}

impl TransportError {
    /// Whether the failure means the underlying channel is gone for good
    #[must_use]
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }
}
