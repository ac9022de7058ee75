use tungstenite::protocol::Message as WsMessage;

use crate::hub::Payload;

/// Wraps a hub payload in the matching WebSocket frame. The body is passed
/// through unmodified.
pub fn to_frame(payload: Payload) -> WsMessage {
    match payload {
        Payload::Text(text) => WsMessage::text(text.to_string()),
        Payload::Binary(bytes) => WsMessage::binary(bytes.to_vec()),
    }
}

/// Extracts a broadcast payload from an inbound frame. Control frames carry
/// nothing to relay.
pub fn from_frame(msg: WsMessage) -> Option<Payload> {
    match msg {
        WsMessage::Text(text) => Some(Payload::text(text.as_str())),
        WsMessage::Binary(bytes) => Some(Payload::binary(bytes.to_vec())),
        _ => None,
    }
}
