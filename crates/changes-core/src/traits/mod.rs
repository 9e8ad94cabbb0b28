//! Traits (ports) consumed by the delivery engine
//!
//! The engine defines what it needs from transports, expiry tracking and
//! auxiliary listeners; the gateway crate provides implementations.

mod expiry;
mod listener;
mod transport;

pub use expiry::ExpiryTracker;
pub use listener::ChangeListener;
pub use transport::{DisconnectCallback, EventsTransport};
