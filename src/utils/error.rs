//! The `error` module defines the error types surfaced by the hub and the
//! transport layer.
//!
//! Per-member delivery failures never show up here: the hub turns them into
//! evictions. What remains are the conditions a producer has to react to.

use thiserror::Error;

/// Errors returned to producers submitting work to the hub.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum HubError {
    /// The hub has stopped and will never process this request.
    ///
    /// A rejected registration leaves the handle with the caller, who must
    /// close it.
    #[error("hub is stopped")]
    Stopped,

    /// The broadcast queue is at capacity; the payload was not enqueued.
    #[error("broadcast queue is full")]
    BroadcastQueueFull,
}

/// Errors from the WebSocket accept layer.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
