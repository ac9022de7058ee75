//! # connhub
//!
//! `connhub` is an in-memory connection hub. It tracks the set of live client
//! connections, accepts register/unregister requests from any task, and fans
//! broadcast messages out to every current member.
//!
//! ## Core Modules
//!
//! - `hub`: The control loop that owns the membership set and drains the
//!   register, unregister and broadcast queues.
//! - `client`: The connection abstraction the hub delivers through, and the
//!   WebSocket-backed implementation.
//! - `config`: Loads server and hub settings from files and the environment.
//! - `transport`: Accepts WebSocket connections and feeds them into the hub.
//! - `utils`: Shared error types and logging setup.

pub mod client;
pub mod config;
pub mod hub;
pub mod transport;
pub mod utils;

#[cfg(test)]
mod tests;
