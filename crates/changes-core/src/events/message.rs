//! Change message envelope
//!
//! Wraps a notification with its discriminator so clients can tell the two
//! payload kinds apart on a shared stream.

use super::{DocumentChangeNotification, IndexChangeNotification};
use serde::{Deserialize, Serialize};

/// A notification ready to be pushed to a connection
///
/// Serializes as `{"Type": "<discriminator>", "Value": {...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "Type", content = "Value")]
pub enum ChangeMessage {
    IndexChangeNotification(IndexChangeNotification),
    DocumentChangeNotification(DocumentChangeNotification),
}

impl ChangeMessage {
    /// Discriminator carried in the `Type` field
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::IndexChangeNotification(_) => "IndexChangeNotification",
            Self::DocumentChangeNotification(_) => "DocumentChangeNotification",
        }
    }

    /// Name of the changed index or document
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::IndexChangeNotification(n) => &n.name,
            Self::DocumentChangeNotification(n) => &n.name,
        }
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl From<IndexChangeNotification> for ChangeMessage {
    fn from(notification: IndexChangeNotification) -> Self {
        Self::IndexChangeNotification(notification)
    }
}

impl From<DocumentChangeNotification> for ChangeMessage {
    fn from(notification: DocumentChangeNotification) -> Self {
        Self::DocumentChangeNotification(notification)
    }
}

impl std::fmt::Display for ChangeMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.type_name(), self.name())
    }
}
