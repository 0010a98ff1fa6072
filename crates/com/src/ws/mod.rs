mod client;
mod server;

pub use client::{Connection, TransportHandler};
pub use server::{ReceivedFrame, WsServer};
