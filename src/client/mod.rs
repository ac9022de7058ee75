//! The `client` module defines how the hub talks to a connected peer.
//!
//! `Connection` is the contract the hub delivers through, `ClientHandle` is
//! the opaque, clonable reference the hub tracks, and `WsConnection` is the
//! implementation backed by a WebSocket writer task.

pub mod connection;
pub mod ws_client;

pub use connection::{ClientHandle, ClientId, Connection, SendError};
pub use ws_client::{Outbox, WsConnection};

#[cfg(test)]
mod tests;
