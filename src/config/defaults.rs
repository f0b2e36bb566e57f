//! Default value functions for configuration fields.
//!
//! This module contains all the default value functions used by serde's `#[serde(default = ...)]`
//! attributes throughout the configuration system. Functions are organized by category for
//! easier maintenance.

use super::logging::LogFormat;

// =============================================================================
// Port & Root Config
// =============================================================================

pub const fn default_port() -> u16 {
    7777
}

// =============================================================================
// Server Defaults (room / night timing)
// =============================================================================

pub const fn default_max_players_per_room() -> u8 {
    18
}

pub const fn default_ping_timeout() -> u64 {
    30
}

pub const fn default_room_cleanup_interval() -> u64 {
    60
}

pub const fn default_max_rooms() -> usize {
    1000
}

pub const fn default_empty_room_timeout() -> u64 {
    300 // 5 minutes
}

pub const fn default_inactive_room_timeout() -> u64 {
    3600 // 1 hour
}

pub const fn default_reconnection_window() -> u64 {
    300 // 5 minutes
}

pub const fn default_event_buffer_size() -> usize {
    100 // reveals/state updates buffered per room for rejoin redelivery
}

pub const fn default_enable_reconnection() -> bool {
    true
}

/// Deadline for the wolf-meeting finalizer when not every live wolf has voted (seconds).
pub const fn default_wolf_vote_deadline_secs() -> u64 {
    45
}

/// Per-step auto-action is disabled by default; spec.md §9 leaves this optional.
pub const fn default_enable_per_step_timeout() -> bool {
    false
}

pub const fn default_per_step_timeout_secs() -> u64 {
    90
}

// =============================================================================
// Rate Limit Defaults
// =============================================================================

pub const fn default_max_room_creations() -> u32 {
    5
}

pub const fn default_rate_limit_time_window() -> u64 {
    60
}

pub const fn default_max_join_attempts() -> u32 {
    20
}

// =============================================================================
// Protocol Defaults
// =============================================================================

pub const fn default_max_room_name_length() -> usize {
    64
}

pub const fn default_room_code_length() -> usize {
    4
}

pub const fn default_max_player_name_length() -> usize {
    24
}

// =============================================================================
// Player Name Validation Defaults
// =============================================================================

pub const fn default_allow_unicode_player_names() -> bool {
    true
}

pub const fn default_allow_spaces_in_player_names() -> bool {
    true
}

pub const fn default_allow_leading_trailing_whitespace() -> bool {
    false
}

pub fn default_allowed_player_name_symbols() -> Vec<char> {
    vec!['-', '_']
}

// =============================================================================
// Logging Defaults
// =============================================================================

pub fn default_log_dir() -> String {
    "logs".to_string()
}

pub fn default_log_filename() -> String {
    "nightward.log".to_string()
}

pub fn default_rotation() -> String {
    "daily".to_string()
}

pub const fn default_enable_file_logging() -> bool {
    true
}

pub const fn default_log_format() -> LogFormat {
    LogFormat::Json
}

// =============================================================================
// Store Defaults
// =============================================================================

pub fn default_store_backend() -> String {
    "in-memory".to_string()
}

// =============================================================================
// Metrics Defaults
// =============================================================================

pub const fn default_metrics_enabled() -> bool {
    true
}

// =============================================================================
// WebSocket Defaults
// =============================================================================

pub const fn default_connection_timeout_secs() -> u64 {
    30
}

pub const fn default_cors_origins_allow_all() -> bool {
    true
}
