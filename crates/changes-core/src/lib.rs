//! # changes-core
//!
//! Domain layer for change notifications: the event payloads pushed to
//! subscribed connections and the traits the delivery engine consumes
//! (transports, expiry tracking, auxiliary listeners).
//! This crate has zero dependencies on infrastructure (runtime, web framework, etc.).

pub mod error;
pub mod events;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::TransportError;
pub use events::{
    ChangeMessage, DocumentChangeNotification, DocumentChangeTypes, IndexChangeNotification,
    IndexChangeTypes,
};
pub use traits::{ChangeListener, DisconnectCallback, EventsTransport, ExpiryTracker};
