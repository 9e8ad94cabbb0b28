//! Server control frames
//!
//! Frames the gateway itself emits on an events socket. They share the
//! `{"Type": ..., "Value": ...}` envelope with change messages.

use serde::{Deserialize, Serialize};

/// Body of the `Connected` frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectedPayload {
    pub id: String,
}

/// Frames emitted by the server outside the change stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "Type", content = "Value")]
pub enum ServerFrame {
    /// First frame on every socket, announcing the connection id
    Connected(ConnectedPayload),
    /// Keep-alive
    Heartbeat,
}

impl ServerFrame {
    #[must_use]
    pub fn connected(id: impl Into<String>) -> Self {
        Self::Connected(ConnectedPayload { id: id.into() })
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
