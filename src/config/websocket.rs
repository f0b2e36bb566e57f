//! WebSocket configuration types.

use super::defaults::{default_connection_timeout_secs, default_cors_origins_allow_all};
use serde::{Deserialize, Serialize};

/// WebSocket configuration.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct WebSocketConfig {
    /// Time allowed for a connection to send its first `HELLO`/`TAKE_SEAT` before it is dropped (seconds)
    #[serde(default = "default_connection_timeout_secs")]
    pub connection_timeout_secs: u64,
    /// Allow any Origin header (development default); set false to pin an allowlist.
    #[serde(default = "default_cors_origins_allow_all")]
    pub cors_allow_any_origin: bool,
}

impl Default for WebSocketConfig {
    fn default() -> Self {
        Self {
            connection_timeout_secs: default_connection_timeout_secs(),
            cors_allow_any_origin: default_cors_origins_allow_all(),
        }
    }
}

impl WebSocketConfig {
    /// Validate WebSocket configuration.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.connection_timeout_secs < 5 {
            anyhow::bail!(
                "websocket.connection_timeout_secs must be at least 5 seconds (configured: {})",
                self.connection_timeout_secs
            );
        }
        if self.connection_timeout_secs > 120 {
            anyhow::bail!(
                "websocket.connection_timeout_secs must not exceed 120 seconds (configured: {})",
                self.connection_timeout_secs
            );
        }
        Ok(())
    }
}
