//! Connection management
//!
//! Per-connection sessions and the registry that owns them.

mod pending;
mod registry;
mod session;
mod watch_set;

pub use registry::TransportRegistry;
pub use session::{Delivery, Session};
pub use watch_set::WatchSet;
