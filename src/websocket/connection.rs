use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::coordination::Envelope;
use crate::protocol::messages::{ClientMessage, ServerMessage};
use crate::protocol::types::RoomCode;
use crate::server::GameEngine;

use super::sending::send_server_message;

const OUTBOUND_BUFFER: usize = 32;
const MAX_FRAME_BYTES: usize = 64 * 1024;

/// Drives one WebSocket connection end to end: the HELLO handshake that
/// establishes which participant this socket speaks for, then the
/// inbound-to-coordinator / outbound-from-bus relay loops until either side
/// disconnects.
pub(super) async fn handle_socket(socket: WebSocket, engine: Arc<GameEngine>, room_code: RoomCode) {
    let (mut sender, mut receiver) = socket.split();

    let deadline = Instant::now() + engine.connection_timeout();
    let first_frame = tokio::select! {
        frame = receiver.next() => frame,
        () = tokio::time::sleep_until(deadline) => {
            tracing::debug!(%room_code, "connection dropped, no HELLO within timeout");
            let _ = sender.close().await;
            return;
        }
    };

    let Some(Ok(Message::Text(text))) = first_frame else {
        let _ = sender.close().await;
        return;
    };

    let hello: ClientMessage = match serde_json::from_str(&text) {
        Ok(ClientMessage::Hello { uid, room_code: hello_room_code }) if hello_room_code == room_code => {
            ClientMessage::Hello { uid, room_code: hello_room_code }
        }
        Ok(_) => {
            tracing::debug!(%room_code, "first frame was not a matching HELLO");
            let _ = sender.close().await;
            return;
        }
        Err(err) => {
            tracing::debug!(%room_code, error = %err, "first frame was not valid JSON");
            let _ = sender.close().await;
            return;
        }
    };

    let ClientMessage::Hello { uid, .. } = hello else {
        unreachable!("matched above")
    };

    if engine.check_join_rate_limit(uid).await.is_err() {
        tracing::debug!(%room_code, %uid, "connection dropped, join rate limit exceeded");
        let _ = sender.close().await;
        return;
    }

    let Some(room) = engine.get_room(&room_code) else {
        let _ = sender.close().await;
        return;
    };

    let (outbound_tx, mut outbound_rx) = mpsc::channel::<Arc<ServerMessage>>(OUTBOUND_BUFFER);
    engine.bus().subscribe(room_code.clone(), uid, outbound_tx).await;

    if room
        .sender
        .send(Envelope {
            uid,
            message: ClientMessage::Hello { uid, room_code: room_code.clone() },
        })
        .await
        .is_err()
    {
        engine.bus().unsubscribe(&room_code, uid).await;
        let _ = sender.close().await;
        return;
    }

    engine.metrics().record_connection_opened();

    let send_task = tokio::spawn(async move {
        while let Some(message) = outbound_rx.recv().await {
            if send_server_message(&mut sender, &message, &uid).await.is_err() {
                break;
            }
        }
        let _ = sender.close().await;
    });

    loop {
        let msg = match receiver.next().await {
            Some(Ok(msg)) => msg,
            Some(Err(err)) => {
                tracing::debug!(%room_code, %uid, error = %err, "websocket error");
                break;
            }
            None => break,
        };

        let text = match msg {
            Message::Text(text) => text,
            Message::Close(_) => break,
            Message::Ping(_) | Message::Pong(_) | Message::Binary(_) => continue,
        };

        if text.len() > MAX_FRAME_BYTES {
            tracing::warn!(%room_code, %uid, size = text.len(), "dropping oversized frame");
            continue;
        }

        let client_message: ClientMessage = match serde_json::from_str(&text) {
            Ok(message) => message,
            Err(err) => {
                tracing::debug!(%room_code, %uid, error = %err, "dropping malformed frame");
                continue;
            }
        };

        if room.sender.send(Envelope { uid, message: client_message }).await.is_err() {
            break;
        }
    }

    engine.bus().unsubscribe(&room_code, uid).await;
    engine.metrics().record_connection_closed();
    send_task.abort();
}
