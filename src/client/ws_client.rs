use tokio::sync::{mpsc, watch};

use crate::client::connection::{Connection, SendError};
use crate::hub::Payload;

/// Represents a connected WebSocket peer as the hub sees it.
///
/// Sends go into a bounded outbox drained by the connection's writer task,
/// so a peer that stops reading eventually makes `send` wait; the hub's send
/// timeout turns that wait into an eviction.
#[derive(Debug)]
pub struct WsConnection {
    /// Channel to the writer task for this connection.
    outbox: mpsc::Sender<Payload>,

    /// Raised once by `close`; observed by the writer and the reader.
    closed: watch::Sender<bool>,
}

/// The receiving half handed to the writer task.
#[derive(Debug)]
pub struct Outbox {
    rx: mpsc::Receiver<Payload>,
    closed: watch::Receiver<bool>,
}

impl WsConnection {
    pub fn new(buffer: usize) -> (Self, Outbox) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        let (closed_tx, closed_rx) = watch::channel(false);
        (
            Self {
                outbox: tx,
                closed: closed_tx,
            },
            Outbox {
                rx,
                closed: closed_rx,
            },
        )
    }

    pub fn is_closed(&self) -> bool {
        *self.closed.borrow()
    }

    /// A receiver that flips to `true` once the connection is closed.
    pub fn closed_signal(&self) -> watch::Receiver<bool> {
        self.closed.subscribe()
    }
}

impl Connection for WsConnection {
    async fn send(&self, payload: Payload) -> Result<(), SendError> {
        if self.is_closed() {
            return Err(SendError::Closed);
        }
        self.outbox
            .send(payload)
            .await
            .map_err(|_| SendError::Closed)
    }

    fn close(&self) {
        self.closed.send_if_modified(|closed| {
            if *closed {
                false
            } else {
                *closed = true;
                true
            }
        });
    }
}

impl Outbox {
    /// Next payload to write, or `None` once the connection is closed or
    /// every sender is gone.
    pub async fn next(&mut self) -> Option<Payload> {
        if *self.closed.borrow() {
            return None;
        }
        // the flag only ever moves false -> true, so any change means closed
        tokio::select! {
            biased;
            _ = self.closed.changed() => None,
            payload = self.rx.recv() => payload,
        }
    }
}
