//! # changes-gateway
//!
//! Change-notification gateway: per-connection subscriptions, buffering
//! across reconnects, expiry of abandoned sessions and fan-out over WebSocket.
//!
//! Clients subscribe and receive changes over the server routes, but change
//! events are produced in-process: the component that observes index and
//! document changes embeds the gateway (`create_gateway_state` / `create_app`)
//! and calls `TransportRegistry::broadcast_index_change` and
//! `broadcast_document_change` on the registry from `GatewayState::registry`.
//! The `changes-gateway` binary has no producer of its own.

pub mod broadcast;
pub mod connection;
pub mod expiry;
pub mod protocol;
pub mod server;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use broadcast::{ChangeListeners, IdleSweeper};
pub use connection::{Delivery, Session, TransportRegistry};
pub use expiry::TimeSensitiveStore;
pub use server::{create_app, create_gateway_state, run, GatewayState};
pub use transport::{OutboundQueue, WsTransport};
