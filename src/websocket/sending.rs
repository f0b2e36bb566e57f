//! Frame serialization: every outbound `ServerMessage` goes over the wire
//! as a single JSON text frame (spec.md §6 wire format).

use axum::extract::ws::{Message, WebSocket};
use futures_util::stream::SplitSink;
use futures_util::SinkExt;

use crate::protocol::messages::ServerMessage;
use crate::protocol::types::Uid;

pub(super) async fn send_server_message(
    sender: &mut SplitSink<WebSocket, Message>,
    message: &ServerMessage,
    uid: &Uid,
) -> Result<(), ()> {
    let payload = match serde_json::to_string(message) {
        Ok(payload) => payload,
        Err(err) => {
            tracing::error!(%uid, error = %err, "failed to serialize server message");
            return Ok(());
        }
    };

    if sender.send(Message::Text(payload.into())).await.is_err() {
        tracing::debug!(%uid, "failed to send message, connection closed");
        return Err(());
    }

    Ok(())
}
