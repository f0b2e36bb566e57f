//! Configuration validation functions.

use super::Config;

/// Validate the loaded configuration for internally-consistent night timing
/// and room-capacity settings. Unlike the precedent's TLS/metrics-auth
/// checks (dropped — see DESIGN.md), there is no secret material to guard
/// here; this exists to catch operator typos before they wedge a room.
pub fn validate_server_config(config: &Config) -> anyhow::Result<()> {
    if config.server.max_players_per_room == 0 {
        anyhow::bail!("server.max_players_per_room must be at least 1");
    }
    if config.server.max_players_per_room > 40 {
        anyhow::bail!(
            "server.max_players_per_room is implausibly large ({}); the role catalog has no \
             template this size",
            config.server.max_players_per_room
        );
    }

    if config.server.wolf_vote_deadline_secs == 0 {
        anyhow::bail!("server.wolf_vote_deadline_secs must be greater than zero");
    }

    if config.server.enable_per_step_timeout && config.server.per_step_timeout_secs == 0 {
        anyhow::bail!(
            "server.per_step_timeout_secs must be greater than zero when \
             enable_per_step_timeout is set"
        );
    }

    if config.protocol.room_code_length != 4 {
        anyhow::bail!(
            "protocol.room_code_length must be 4 per the external room-code contract \
             (configured: {})",
            config.protocol.room_code_length
        );
    }

    config.websocket.validate()?;

    Ok(())
}

/// Detect if we're running in production mode, used only to pick a default
/// log format; this crate has no security posture that changes with it.
pub fn is_production_mode() -> bool {
    use std::env;

    if let Ok(mode) = env::var("NIGHTWARD__ENVIRONMENT") {
        return mode.eq_ignore_ascii_case("production") || mode.eq_ignore_ascii_case("prod");
    }

    env::var("NIGHTWARD_PRODUCTION").is_ok()
        || env::var("PRODUCTION").is_ok()
        || env::var("PROD").is_ok()
}
