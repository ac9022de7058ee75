//! The `transport` module is the accept layer in front of the hub.
//!
//! It upgrades TCP connections to WebSockets, registers each one with the
//! hub, relays inbound frames as broadcasts and unregisters the connection
//! when it goes away. Framing is decided here; the hub only sees payloads.

pub mod message;
pub mod websocket;

pub use websocket::{serve, start_websocket_server};
