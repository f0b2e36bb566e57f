#![cfg_attr(not(test), deny(clippy::panic))]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::struct_excessive_bools,
    clippy::too_many_arguments,
    clippy::too_many_lines,
    clippy::similar_names
)]

//! # Nightward Engine
//!
//! An authoritative, in-memory game-state engine for turn-based
//! social-deduction party games (Werewolf/Mafia-style night phases). One
//! room's state lives entirely inside its own actor task; the engine keeps
//! no shared mutable game state outside that task, and persists best-effort
//! snapshots so a room can rejoin or rehydrate after a restart.

/// Server configuration and environment variables
pub mod config;

/// Room coordination: the message bus and the per-room game actor
pub mod coordination;

/// Durable snapshot storage (in-memory implementation)
pub mod database;

/// Structured logging configuration
pub mod logging;

/// Metrics collection and reporting
pub mod metrics;

/// Night-phase engine: action model, flow controller, resolver, reveals
pub mod night;

/// WebSocket message protocol definitions
pub mod protocol;

/// Join/take-seat rate limiting
pub mod rate_limit;

/// Retry logic utilities
pub mod retry;

/// Role catalog and schema definitions
pub mod roles;

/// Room registry: creates, looks up, and retires rooms
pub mod server;

/// WebSocket connection handling
pub mod websocket;
