//! Change notifications
//!
//! Payloads produced by the storage and indexing layers and the envelope
//! they travel in on their way to subscribed connections.

mod message;
mod notifications;

pub use message::ChangeMessage;
pub use notifications::{
    DocumentChangeNotification, DocumentChangeTypes, IndexChangeNotification, IndexChangeTypes,
};
