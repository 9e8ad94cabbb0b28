//! Changes protocol definitions
//!
//! Subscription commands accepted from clients and the control frames the
//! server pushes alongside change messages.

mod commands;
mod frames;

pub use commands::{ChangesCommand, CommandError, CommandRequest};
pub use frames::{ConnectedPayload, ServerFrame};
