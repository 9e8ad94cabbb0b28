//! Concrete events transports

mod ws;

pub use ws::{OutboundQueue, WsTransport};
