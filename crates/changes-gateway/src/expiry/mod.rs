//! Expiry tracking
//!
//! Default implementation of the expiry tracker used by the registry.

mod time_sensitive_store;

pub use time_sensitive_store::{TimeSensitiveStore, DEFAULT_EXPIRY};
