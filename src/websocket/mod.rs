//! WebSocket transport: the thin glue between an axum socket and a room's
//! `GameCoordinator` inbox. It owns no game state — every message is
//! forwarded as an `Envelope` and every outbound frame is relayed from the
//! shared `MessageBus` subscription this connection opens for its uid.
//!
//! - handler: WebSocket upgrade entry point, room lookup/rehydration
//! - connection: HELLO handshake, inbound/outbound relay loops
//! - sending: frame serialization helpers
//! - routes: HTTP route table (`/ws/:room_code`, `/rooms`, `/health`, `/metrics/prom`)

mod connection;
mod handler;
mod routes;
mod sending;

pub use handler::websocket_handler;
pub use routes::{create_room_handler, create_router, health_check, prometheus_metrics_handler};
