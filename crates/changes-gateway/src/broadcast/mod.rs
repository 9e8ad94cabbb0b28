//! Event broadcasting
//!
//! Auxiliary listeners raised ahead of the connection fan-out, and the
//! periodic sweep that reclaims abandoned sessions.

mod listeners;
mod sweeper;

pub use listeners::ChangeListeners;
pub use sweeper::IdleSweeper;
