//! Notification payloads
//!
//! Immutable value objects describing a single index or document change.
//! The delivery engine only ever looks at `name`; everything else is carried
//! through to clients verbatim.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// =============================================================================
// Document changes
// =============================================================================

/// Kind of change applied to a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentChangeTypes {
    /// Document created or overwritten
    Put,
    /// Document removed
    Delete,
}

impl DocumentChangeTypes {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Put => "Put",
            Self::Delete => "Delete",
        }
    }
}

impl fmt::Display for DocumentChangeTypes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A document was written or deleted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DocumentChangeNotification {
    /// Document key, e.g. `orders/1-A`
    pub name: String,

    #[serde(rename = "Type")]
    pub change_type: DocumentChangeTypes,

    /// Etag of the document after the change
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<Uuid>,
}

impl DocumentChangeNotification {
    #[must_use]
    pub fn new(name: impl Into<String>, change_type: DocumentChangeTypes) -> Self {
        Self {
            name: name.into(),
            change_type,
            etag: None,
        }
    }

    #[must_use]
    pub fn put(name: impl Into<String>) -> Self {
        Self::new(name, DocumentChangeTypes::Put)
    }

    #[must_use]
    pub fn delete(name: impl Into<String>) -> Self {
        Self::new(name, DocumentChangeTypes::Delete)
    }

    #[must_use]
    pub fn with_etag(mut self, etag: Uuid) -> Self {
        self.etag = Some(etag);
        self
    }
}

// =============================================================================
// Index changes
// =============================================================================

/// Kind of change observed on an index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IndexChangeTypes {
    /// A map batch finished
    MapCompleted,
    /// A reduce batch finished
    ReduceCompleted,
    /// Entries were removed from the index
    RemoveFromIndex,
}

impl IndexChangeTypes {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MapCompleted => "MapCompleted",
            Self::ReduceCompleted => "ReduceCompleted",
            Self::RemoveFromIndex => "RemoveFromIndex",
        }
    }
}

impl fmt::Display for IndexChangeTypes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An index made progress or lost entries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct IndexChangeNotification {
    /// Index name, e.g. `Orders/Totals`
    pub name: String,

    #[serde(rename = "Type")]
    pub change_type: IndexChangeTypes,

    /// Last etag covered by the change
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<Uuid>,
}

impl IndexChangeNotification {
    #[must_use]
    pub fn new(name: impl Into<String>, change_type: IndexChangeTypes) -> Self {
        Self {
            name: name.into(),
            change_type,
            etag: None,
        }
    }

    #[must_use]
    pub fn with_etag(mut self, etag: Uuid) -> Self {
        self.etag = Some(etag);
        self
    }
}
