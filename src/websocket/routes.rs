//! HTTP route table: the WebSocket upgrade plus the handful of plain HTTP
//! endpoints a room host needs — creating a room (spec.md's wire protocol
//! has no `ClientMessage` for this; a room and its host uid must exist
//! before anyone can open a socket to it), health, and Prometheus metrics.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Json;
use serde::Serialize;
use tower_http::trace::TraceLayer;

use crate::server::{CreateRoomError, GameEngine};

use super::handler::websocket_handler;

pub fn create_router(engine: Arc<GameEngine>) -> axum::Router {
    use tower_http::cors::CorsLayer;

    // Single-instance deployments typically sit behind a reverse proxy that
    // already restricts Origin; cors_allow_any_origin is the development
    // default and pinning it down to a real allowlist is left to that proxy.
    let cors = if engine.cors_allow_any_origin() {
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
    };

    axum::Router::new()
        .route("/ws/{room_code}", get(websocket_handler))
        .route("/rooms", post(create_room_handler))
        .route("/health", get(health_check))
        .route("/metrics/prom", get(prometheus_metrics_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(engine)
}

#[derive(Serialize)]
struct CreateRoomResponse {
    room_code: String,
    host_id: uuid::Uuid,
}

pub async fn create_room_handler(State(engine): State<Arc<GameEngine>>) -> Response {
    match engine.create_room().await {
        Ok((room_code, host_id)) => Json(CreateRoomResponse {
            room_code: room_code.0,
            host_id,
        })
        .into_response(),
        Err(CreateRoomError::AtCapacity) => {
            (StatusCode::SERVICE_UNAVAILABLE, "server is at room capacity").into_response()
        }
    }
}

pub async fn health_check(State(engine): State<Arc<GameEngine>>) -> impl IntoResponse {
    if engine.is_healthy() {
        (StatusCode::OK, "OK")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "unhealthy")
    }
}

pub async fn prometheus_metrics_handler(State(engine): State<Arc<GameEngine>>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [("Content-Type", "text/plain; version=0.0.4")],
        engine.metrics().render_prometheus(),
    )
}
