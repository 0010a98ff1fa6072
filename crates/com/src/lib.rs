//! WebSocket transport between the overlay and the inference backend.
//!
//! Outbound traffic is one binary message per encoded frame. Inbound traffic
//! is UTF-8 text carrying a JSON array of label strings.

pub mod error;
pub mod prediction;
pub mod state;
pub mod ws;

pub use error::ComError;
pub use prediction::PredictionMessage;
pub use state::ConnectionState;
pub use ws::{Connection, ReceivedFrame, TransportHandler, WsServer};

/// Largest inbound message accepted, in bytes.
pub const MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024;
