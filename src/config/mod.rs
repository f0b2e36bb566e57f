//! Configuration module for the nightward engine.
//!
//! This module provides typed configuration management with support for:
//! - JSON configuration files
//! - Environment variable overrides
//! - Stdin input
//! - Sensible defaults
//!
//! # Module Structure
//!
//! - [`crate::config::types`]: Root `Config` struct
//! - [`server`]: Room lifecycle + night timing knobs
//! - [`protocol`]: Room-code and player-name validation rules
//! - [`logging`]: Logging configuration
//! - [`store`]: Durable snapshot store backend selection
//! - [`metrics`]: Metrics configuration
//! - [`websocket`]: WebSocket connection settings
//! - [`crate::config::loader`]: Configuration loading functions
//! - [`crate::config::validation`]: Configuration validation functions
//! - [`crate::config::defaults`]: Default value functions

pub mod defaults;
pub mod loader;
pub mod logging;
pub mod metrics;
pub mod protocol;
pub mod server;
pub mod store;
pub mod types;
pub mod validation;
pub mod websocket;

pub use loader::load;
pub use logging::{LogFormat, LogLevel, LoggingConfig};
pub use metrics::MetricsConfig;
pub use protocol::{PlayerNameValidationConfig, ProtocolConfig};
pub use server::{RateLimitConfig, ServerConfig};
pub use store::StoreConfig;
pub use types::Config;
pub use validation::{is_production_mode, validate_server_config};
pub use websocket::WebSocketConfig;
