//! WebSocket upgrade entry point: resolves the path's room code to a live
//! `GameCoordinator`, rehydrating it from the durable store on a cold miss,
//! before handing the socket off to the HELLO handshake in `connection`.

use std::sync::Arc;

use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::protocol::types::RoomCode;
use crate::protocol::validation::validate_room_code;
use crate::server::GameEngine;

use super::connection::handle_socket;

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    Path(room_code): Path<String>,
    State(engine): State<Arc<GameEngine>>,
) -> Response {
    if let Err(reason) = validate_room_code(&room_code, engine.protocol_config()) {
        tracing::debug!(%room_code, %reason, "rejected websocket upgrade, malformed room code");
        return (StatusCode::BAD_REQUEST, reason).into_response();
    }
    let room_code = RoomCode(room_code);

    if engine.get_room(&room_code).is_none() {
        match engine.rehydrate_room(&room_code).await {
            Ok(Some(_)) => {}
            Ok(None) => {
                return (StatusCode::NOT_FOUND, "no such room").into_response();
            }
            Err(err) => {
                tracing::error!(%room_code, error = %err, "failed to rehydrate room from durable store");
                return (StatusCode::INTERNAL_SERVER_ERROR, "room unavailable").into_response();
            }
        }
    }

    ws.on_upgrade(move |socket| handle_socket(socket, engine, room_code))
}
