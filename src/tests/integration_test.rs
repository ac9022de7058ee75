use std::net::SocketAddr;
use std::time::Duration;

use crate::client::WsConnection;
use crate::config::HubSettings;
use crate::hub::{Hub, HubHandle};
use crate::transport::serve;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

type Client = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

async fn setup_server() -> (SocketAddr, HubHandle<WsConnection>, JoinHandle<()>) {
    let settings = HubSettings {
        send_timeout_ms: 500,
        ..HubSettings::default()
    };
    let (mut hub, handle) = Hub::<WsConnection>::new(&settings);
    let hub_task = tokio::spawn(async move {
        hub.run().await;
    });

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    let addr = listener.local_addr().expect("local_addr");
    tokio::spawn(serve(listener, handle.clone(), settings.client_capacity()));

    (addr, handle, hub_task)
}

async fn connect(addr: SocketAddr) -> Client {
    let (ws, _) = connect_async(format!("ws://{addr}"))
        .await
        .expect("WebSocket handshake failed");
    ws
}

/// Registration happens on the server side after the handshake, so poll the
/// hub until it has seen the expected number of members.
async fn wait_for_members(hub: &HubHandle<WsConnection>, expected: usize) {
    timeout(Duration::from_secs(5), async {
        while hub.stats().members != expected {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap_or_else(|_| panic!("hub never reached {expected} members"));
}

async fn next_text(ws: &mut Client) -> String {
    loop {
        let msg = timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("timed out waiting for a message")
            .expect("stream ended")
            .expect("read error");
        if let WsMessage::Text(text) = msg {
            return text.to_string();
        }
    }
}

#[tokio::test]
async fn test_frames_are_relayed_to_every_member() {
    let (addr, hub, _hub_task) = setup_server().await;
    let mut ws_a = connect(addr).await;
    let mut ws_b = connect(addr).await;
    wait_for_members(&hub, 2).await;

    ws_a.send(WsMessage::text("hello world".to_string()))
        .await
        .unwrap();

    assert_eq!(next_text(&mut ws_b).await, "hello world");
    // the sender is a member too
    assert_eq!(next_text(&mut ws_a).await, "hello world");
}

#[tokio::test]
async fn test_binary_frames_pass_through_unmodified() {
    let (addr, hub, _hub_task) = setup_server().await;
    let mut ws_a = connect(addr).await;
    let mut ws_b = connect(addr).await;
    wait_for_members(&hub, 2).await;

    ws_a.send(WsMessage::binary(vec![0u8, 159, 146, 150]))
        .await
        .unwrap();

    let msg = timeout(Duration::from_secs(5), ws_b.next())
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert!(msg.is_binary());
    assert_eq!(msg.into_data().to_vec(), vec![0u8, 159, 146, 150]);
}

#[tokio::test]
async fn test_disconnect_unregisters_client() {
    let (addr, hub, _hub_task) = setup_server().await;
    let mut ws_a = connect(addr).await;
    let mut ws_b = connect(addr).await;
    wait_for_members(&hub, 2).await;

    ws_a.close(None).await.unwrap();
    wait_for_members(&hub, 1).await;

    hub.submit_broadcast("still here").unwrap();
    assert_eq!(next_text(&mut ws_b).await, "still here");
    assert_eq!(hub.stats().unregistrations, 1);
}

#[tokio::test]
async fn test_shutdown_closes_connections() {
    let (addr, hub, hub_task) = setup_server().await;
    let mut ws = connect(addr).await;
    wait_for_members(&hub, 1).await;

    hub.shutdown();
    timeout(Duration::from_secs(5), hub_task)
        .await
        .expect("hub did not stop")
        .unwrap();

    // the server sends a close frame, then the stream ends
    let ended = timeout(Duration::from_secs(5), async {
        while let Some(Ok(msg)) = ws.next().await {
            if msg.is_close() {
                break;
            }
        }
    })
    .await;
    assert!(ended.is_ok());
    assert!(!hub.is_running());
}
