use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use thiserror::Error;
use uuid::Uuid;

use crate::hub::Payload;

pub type ClientId = String;

/// Failure of a single delivery attempt. The hub treats any of these as a
/// dead connection.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SendError {
    #[error("connection closed")]
    Closed,

    #[error("transport error: {0}")]
    Transport(String),
}

/// The two capabilities the hub needs from a connected peer.
///
/// `send` may suspend (for example while a bounded outbox is full); the hub
/// bounds every call with its send timeout. `close` must be idempotent and
/// must not fail.
pub trait Connection: Send + Sync + 'static {
    fn send(&self, payload: Payload) -> impl Future<Output = Result<(), SendError>> + Send;

    fn close(&self);
}

/// Opaque reference to one connected peer.
///
/// Clones share the same id and the same underlying connection, so a clone
/// submitted for unregistration refers to the handle that was registered.
pub struct ClientHandle<C> {
    id: ClientId,
    conn: Arc<C>,
}

impl<C: Connection> ClientHandle<C> {
    pub fn new(conn: C) -> Self {
        Self {
            id: format!("client-{}", Uuid::new_v4()),
            conn: Arc::new(conn),
        }
    }

    pub async fn send(&self, payload: Payload) -> Result<(), SendError> {
        self.conn.send(payload).await
    }

    pub fn close(&self) {
        self.conn.close();
    }
}

impl<C> ClientHandle<C> {
    pub fn id(&self) -> &ClientId {
        &self.id
    }
}

impl<C> Clone for ClientHandle<C> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            conn: Arc::clone(&self.conn),
        }
    }
}

impl<C> PartialEq for ClientHandle<C> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<C> Eq for ClientHandle<C> {}

impl<C> Hash for ClientHandle<C> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<C> fmt::Debug for ClientHandle<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientHandle").field("id", &self.id).finish()
    }
}
