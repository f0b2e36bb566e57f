//! Ingress validation (spec.md §4.4, §6): display-name rules and
//! template well-formedness, shared by the room service and coordinator.

use crate::config::{ProtocolConfig, ServerConfig};
use crate::protocol::room_state::Template;
use crate::roles;

pub fn validate_room_code(code: &str, config: &ProtocolConfig) -> Result<(), String> {
    if code.len() != config.room_code_length {
        return Err(format!(
            "room code must be exactly {} characters",
            config.room_code_length
        ));
    }
    if !code.chars().all(|c| c.is_ascii_digit()) {
        return Err("room code must be ASCII decimal digits".to_string());
    }
    Ok(())
}

pub fn validate_display_name(name: &str, config: &ProtocolConfig) -> Result<(), String> {
    if name.is_empty() {
        return Err("display name cannot be empty".to_string());
    }
    if name.chars().count() > config.max_player_name_length {
        return Err(format!(
            "display name too long (max {} characters)",
            config.max_player_name_length
        ));
    }

    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err("display name cannot be blank".to_string());
    }

    let rules = &config.player_name_validation;
    if !rules.allow_leading_trailing_whitespace && trimmed.len() != name.len() {
        return Err("display name cannot have leading or trailing whitespace".to_string());
    }

    for ch in name.chars() {
        if ch == ' ' {
            if rules.allow_spaces {
                continue;
            }
            return Err("display name cannot contain spaces".to_string());
        }
        if ch.is_whitespace() {
            return Err("display name cannot contain whitespace characters".to_string());
        }
        let is_alphanumeric = if rules.allow_unicode_alphanumeric {
            ch.is_alphanumeric()
        } else {
            ch.is_ascii_alphanumeric()
        };
        if is_alphanumeric || rules.is_allowed_symbol(ch) {
            continue;
        }
        return Err("display name contains invalid characters".to_string());
    }

    Ok(())
}

/// Template well-formedness (spec.md §3 invariants): non-empty, every role
/// id known to the catalog, within the configured room-name length.
pub fn validate_template(template: &Template, config: &ProtocolConfig) -> Result<(), String> {
    if template.roles.is_empty() {
        return Err("template must include at least one role".to_string());
    }
    if template.name.chars().count() > config.max_room_name_length {
        return Err(format!(
            "template name too long (max {} characters)",
            config.max_room_name_length
        ));
    }
    if !roles::all_known(template.roles.iter().cloned()) {
        return Err("template references an unknown role id".to_string());
    }
    Ok(())
}

pub fn validate_player_count(player_count: u8, config: &ServerConfig) -> Result<(), String> {
    if player_count < 1 {
        return Err("a template must seat at least 1 player".to_string());
    }
    if player_count > config.max_players_per_room {
        return Err(format!(
            "template seats more players than this server allows (max {})",
            config.max_players_per_room
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::types::RoleId;

    #[test]
    fn blank_display_name_is_rejected() {
        let cfg = ProtocolConfig::default();
        assert!(validate_display_name("   ", &cfg).is_err());
    }

    #[test]
    fn template_with_unknown_role_is_rejected() {
        let cfg = ProtocolConfig::default();
        let template = Template {
            name: "t".to_string(),
            roles: vec![RoleId::new("not_a_real_role")],
        };
        assert!(validate_template(&template, &cfg).is_err());
    }

    #[test]
    fn empty_template_is_rejected() {
        let cfg = ProtocolConfig::default();
        let template = Template {
            name: "t".to_string(),
            roles: vec![],
        };
        assert!(validate_template(&template, &cfg).is_err());
    }

    #[test]
    fn player_count_over_server_limit_is_rejected() {
        let cfg = ServerConfig::default();
        assert!(validate_player_count(cfg.max_players_per_room + 1, &cfg).is_err());
        assert!(validate_player_count(cfg.max_players_per_room, &cfg).is_ok());
    }
}
