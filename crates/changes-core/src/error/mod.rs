//! Error types for the domain layer

mod transport_error;

pub use transport_error::TransportError;
