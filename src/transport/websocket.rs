//! WebSocket transport
//!
//! Accepts TCP connections, upgrades them, and feeds each one into the hub:
//! - a `WsConnection` + `ClientHandle` is built per connection and submitted
//!   for registration
//! - a writer task drains the connection's outbox onto the socket
//! - every text or binary frame the peer sends is relayed into the hub as a
//!   broadcast, unmodified
//! - disconnects and write failures submit an unregistration
//!
//! The listener stops accepting once the hub's shutdown signal fires.

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::spawn;
use tokio_tungstenite::accept_async;
use tracing::{debug, info, warn};

use crate::client::{ClientHandle, WsConnection};
use crate::config::HubSettings;
use crate::hub::HubHandle;
use crate::transport::message::{from_frame, to_frame};
use crate::utils::TransportError;

pub async fn start_websocket_server(
    addr: &str,
    hub: HubHandle<WsConnection>,
    settings: &HubSettings,
) -> Result<(), TransportError> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| TransportError::Bind {
            addr: addr.to_string(),
            source,
        })?;

    info!("WebSocket server listening on ws://{}", listener.local_addr()?);

    serve(listener, hub, settings.client_capacity()).await;
    Ok(())
}

/// Accepts connections on an already bound listener until the hub shuts down.
pub async fn serve(listener: TcpListener, hub: HubHandle<WsConnection>, client_buffer: usize) {
    let mut shutdown = hub.shutdown_signal();

    loop {
        if *shutdown.borrow_and_update() {
            break;
        }

        tokio::select! {
            changed = shutdown.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    debug!(%peer, "accepted connection");
                    spawn(handle_connection(stream, hub.clone(), client_buffer));
                }
                Err(e) => warn!(error = %e, "accept failed"),
            },
        }
    }

    info!("WebSocket server stopped accepting connections");
}

async fn handle_connection(stream: TcpStream, hub: HubHandle<WsConnection>, client_buffer: usize) {
    let ws_stream = match accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            warn!(error = %e, "WebSocket handshake error");
            return;
        }
    };

    let (mut ws_sender, mut ws_receiver) = ws_stream.split();

    let (conn, mut outbox) = WsConnection::new(client_buffer);
    let mut closed = conn.closed_signal();
    let handle = ClientHandle::new(conn);
    let client_id = handle.id().clone();

    if let Err(e) = hub.submit_register(handle.clone()) {
        debug!(client_id = %client_id, error = %e, "rejecting connection");
        handle.close();
        let _ = ws_sender.close().await;
        return;
    }
    debug!(client_id = %client_id, "client connected");

    // Forward hub deliveries to the socket
    {
        let hub = hub.clone();
        let handle = handle.clone();

        spawn(async move {
            while let Some(payload) = outbox.next().await {
                if let Err(e) = ws_sender.send(to_frame(payload)).await {
                    warn!(client_id = %handle.id(), error = %e, "failed to write to client");
                    hub.submit_unregister(handle.clone());
                    break;
                }
            }

            let _ = ws_sender.close().await;
            debug!(client_id = %handle.id(), "send loop closed");
        });
    }

    // Relay incoming frames until the peer leaves or the hub closes us
    loop {
        tokio::select! {
            _ = closed.changed() => break,
            frame = ws_receiver.next() => match frame {
                Some(Ok(msg)) => {
                    if let Some(payload) = from_frame(msg) {
                        if hub.broadcast(payload).await.is_err() {
                            break;
                        }
                    }
                }
                Some(Err(e)) => {
                    debug!(client_id = %client_id, error = %e, "read error");
                    break;
                }
                None => break,
            },
        }
    }

    hub.submit_unregister(handle);
    debug!(client_id = %client_id, "client disconnected");
}
