//! Server behavior configuration: room lifecycle and night timing knobs.

use super::defaults::{
    default_empty_room_timeout, default_enable_per_step_timeout, default_enable_reconnection,
    default_event_buffer_size, default_inactive_room_timeout, default_max_players_per_room,
    default_max_rooms, default_per_step_timeout_secs, default_ping_timeout,
    default_reconnection_window, default_room_cleanup_interval, default_wolf_vote_deadline_secs,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Server configuration for room lifecycle and night-phase timing.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    /// Maximum players a room's template may seat.
    #[serde(default = "default_max_players_per_room")]
    pub max_players_per_room: u8,
    /// Timeout for client ping responses (seconds)
    #[serde(default = "default_ping_timeout")]
    pub ping_timeout: u64,
    /// Interval for room cleanup task (seconds)
    #[serde(default = "default_room_cleanup_interval")]
    pub room_cleanup_interval: u64,
    /// Maximum number of concurrently live rooms.
    #[serde(default = "default_max_rooms")]
    pub max_rooms: usize,
    /// Time after creation when an unseated/empty room expires (seconds)
    #[serde(default = "default_empty_room_timeout")]
    pub empty_room_timeout: u64,
    /// Time after last activity when a seated room expires (seconds)
    #[serde(default = "default_inactive_room_timeout")]
    pub inactive_room_timeout: u64,
    /// Time window in which a disconnected participant may rejoin (seconds)
    #[serde(default = "default_reconnection_window")]
    pub reconnection_window: u64,
    /// Number of past state updates/reveals buffered per room for rejoin redelivery
    #[serde(default = "default_event_buffer_size")]
    pub event_buffer_size: usize,
    /// Enable the HELLO/WELCOME_BACK rejoin protocol
    #[serde(default = "default_enable_reconnection")]
    pub enable_reconnection: bool,
    /// Deadline for the wolf-meeting finalizer once votes stop completing the quorum (seconds)
    #[serde(default = "default_wolf_vote_deadline_secs")]
    pub wolf_vote_deadline_secs: u64,
    /// Enable an optional per-step auto-action (`Action::None`) once a step's deadline elapses.
    /// Disabled by default per spec.md §9 — absent actions would otherwise hang the night.
    #[serde(default = "default_enable_per_step_timeout")]
    pub enable_per_step_timeout: bool,
    /// Per-step deadline when `enable_per_step_timeout` is set (seconds)
    #[serde(default = "default_per_step_timeout_secs")]
    pub per_step_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            max_players_per_room: default_max_players_per_room(),
            ping_timeout: default_ping_timeout(),
            room_cleanup_interval: default_room_cleanup_interval(),
            max_rooms: default_max_rooms(),
            empty_room_timeout: default_empty_room_timeout(),
            inactive_room_timeout: default_inactive_room_timeout(),
            reconnection_window: default_reconnection_window(),
            event_buffer_size: default_event_buffer_size(),
            enable_reconnection: default_enable_reconnection(),
            wolf_vote_deadline_secs: default_wolf_vote_deadline_secs(),
            enable_per_step_timeout: default_enable_per_step_timeout(),
            per_step_timeout_secs: default_per_step_timeout_secs(),
        }
    }
}

impl ServerConfig {
    pub fn wolf_vote_deadline(&self) -> Duration {
        Duration::from_secs(self.wolf_vote_deadline_secs)
    }

    pub fn per_step_timeout(&self) -> Option<Duration> {
        self.enable_per_step_timeout
            .then(|| Duration::from_secs(self.per_step_timeout_secs))
    }

    pub fn room_cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.room_cleanup_interval.max(1))
    }
}

/// Rate limiting configuration for join attempts.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RateLimitConfig {
    /// Time window for rate limiting (seconds)
    #[serde(default = "super::defaults::default_rate_limit_time_window")]
    pub time_window: u64,
    /// Maximum number of join/take-seat attempts per time window
    #[serde(default = "super::defaults::default_max_join_attempts")]
    pub max_join_attempts: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            time_window: super::defaults::default_rate_limit_time_window(),
            max_join_attempts: super::defaults::default_max_join_attempts(),
        }
    }
}
