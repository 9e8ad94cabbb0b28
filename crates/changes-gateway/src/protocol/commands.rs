//! Subscription commands
//!
//! `watch-*` / `unwatch-*` requests, whether they arrive as a WebSocket text
//! frame or on the HTTP configuration endpoint.

use crate::connection::Session;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A subscription change requested by a client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangesCommand {
    WatchIndex(String),
    UnwatchIndex(String),
    WatchDocument(String),
    UnwatchDocument(String),
    WatchDocumentPrefix(String),
    UnwatchDocumentPrefix(String),
    WatchAllDocuments,
    UnwatchAllDocuments,
}

/// Why a command could not be understood
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("Unknown command '{0}'")]
    Unknown(String),

    #[error("Command '{0}' requires a value")]
    MissingValue(&'static str),
}

/// Wire shape of a command: `{"command": "watch-index", "value": "Orders/Totals"}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandRequest {
    pub command: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl CommandRequest {
    pub fn parse(&self) -> Result<ChangesCommand, CommandError> {
        ChangesCommand::parse(&self.command, self.value.as_deref())
    }
}

impl ChangesCommand {
    /// Parse a command name (case-insensitive) and its value
    pub fn parse(command: &str, value: Option<&str>) -> Result<Self, CommandError> {
        let command = command.trim().to_ascii_lowercase();

        match command.as_str() {
            "watch-index" => required(value, "watch-index").map(Self::WatchIndex),
            "unwatch-index" => required(value, "unwatch-index").map(Self::UnwatchIndex),
            "watch-doc" => required(value, "watch-doc").map(Self::WatchDocument),
            "unwatch-doc" => required(value, "unwatch-doc").map(Self::UnwatchDocument),
            "watch-prefix" => required(value, "watch-prefix").map(Self::WatchDocumentPrefix),
            "unwatch-prefix" => required(value, "unwatch-prefix").map(Self::UnwatchDocumentPrefix),
            "watch-docs" => Ok(Self::WatchAllDocuments),
            "unwatch-docs" => Ok(Self::UnwatchAllDocuments),
            _ => Err(CommandError::Unknown(command)),
        }
    }

    /// Canonical command name
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::WatchIndex(_) => "watch-index",
            Self::UnwatchIndex(_) => "unwatch-index",
            Self::WatchDocument(_) => "watch-doc",
            Self::UnwatchDocument(_) => "unwatch-doc",
            Self::WatchDocumentPrefix(_) => "watch-prefix",
            Self::UnwatchDocumentPrefix(_) => "unwatch-prefix",
            Self::WatchAllDocuments => "watch-docs",
            Self::UnwatchAllDocuments => "unwatch-docs",
        }
    }

    /// Apply the subscription change to a session
    pub fn apply(&self, session: &Session) {
        match self {
            Self::WatchIndex(name) => session.watch_index(name),
            Self::UnwatchIndex(name) => session.unwatch_index(name),
            Self::WatchDocument(name) => session.watch_document(name),
            Self::UnwatchDocument(name) => session.unwatch_document(name),
            Self::WatchDocumentPrefix(prefix) => session.watch_document_prefix(prefix),
            Self::UnwatchDocumentPrefix(prefix) => session.unwatch_document_prefix(prefix),
            Self::WatchAllDocuments => session.watch_all_documents(),
            Self::UnwatchAllDocuments => session.unwatch_all_documents(),
        }

        tracing::debug!(
            connection_id = %session.id(),
            command = %self,
            "Subscription updated"
        );
    }
}

/// A non-blank value, trimmed
fn required(value: Option<&str>, command: &'static str) -> Result<String, CommandError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(CommandError::MissingValue(command)),
    }
}

impl fmt::Display for ChangesCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WatchIndex(v)
            | Self::UnwatchIndex(v)
            | Self::WatchDocument(v)
            | Self::UnwatchDocument(v)
            | Self::WatchDocumentPrefix(v)
            | Self::UnwatchDocumentPrefix(v) => write!(f, "{} {v}", self.as_str()),
            Self::WatchAllDocuments | Self::UnwatchAllDocuments => f.write_str(self.as_str()),
        }
    }
}
