use super::{ClientHandle, Connection, SendError, WsConnection};
use crate::hub::Payload;
use std::collections::HashSet;

#[test]
fn test_client_handle_new() {
    let (conn, _outbox) = WsConnection::new(4);
    let handle = ClientHandle::new(conn);
    assert!(handle.id().starts_with("client-"));
}

#[test]
fn test_client_handle_clone_shares_identity() {
    let (conn_a, _outbox_a) = WsConnection::new(4);
    let (conn_b, _outbox_b) = WsConnection::new(4);
    let a = ClientHandle::new(conn_a);
    let b = ClientHandle::new(conn_b);

    assert_eq!(a, a.clone());
    assert_ne!(a, b);

    let set: HashSet<_> = [a.clone(), a.clone(), b].into_iter().collect();
    assert_eq!(set.len(), 2);
}

#[tokio::test]
async fn test_ws_connection_send_reaches_outbox() {
    let (conn, mut outbox) = WsConnection::new(4);
    conn.send(Payload::text("hello")).await.unwrap();
    assert_eq!(outbox.next().await, Some(Payload::text("hello")));
}

#[tokio::test]
async fn test_ws_connection_close_is_idempotent() {
    let (conn, mut outbox) = WsConnection::new(4);
    let mut signal = conn.closed_signal();

    conn.close();
    conn.close();

    assert!(conn.is_closed());
    assert!(*signal.borrow_and_update());
    assert_eq!(conn.send(Payload::text("late")).await, Err(SendError::Closed));
    assert_eq!(outbox.next().await, None);
}

#[tokio::test]
async fn test_ws_connection_close_wakes_waiting_writer() {
    let (conn, mut outbox) = WsConnection::new(4);
    let writer = tokio::spawn(async move { outbox.next().await });

    tokio::task::yield_now().await;
    conn.close();

    assert_eq!(writer.await.unwrap(), None);
}

#[tokio::test]
async fn test_ws_connection_send_fails_once_writer_is_gone() {
    let (conn, outbox) = WsConnection::new(4);
    drop(outbox);
    assert_eq!(
        conn.send(Payload::binary(vec![1u8, 2, 3])).await,
        Err(SendError::Closed)
    );
}
