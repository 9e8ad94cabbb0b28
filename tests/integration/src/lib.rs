//! Integration test utilities for the changes gateway
//!
//! Spawns an in-process gateway on an ephemeral port and drives it over
//! HTTP and WebSocket.

pub mod helpers;

pub use helpers::*;
