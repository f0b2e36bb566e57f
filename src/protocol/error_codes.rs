use serde::{Deserialize, Serialize};
use std::fmt;

/// Why an inbound action was rejected at ingress (spec.md §4.4, §6).
///
/// These are user-facing but not errors in the Rust sense: the room keeps
/// running, only the submitter is told why their action did not land.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ActionRejectedReason {
    /// Submitter's role does not match the role of the current night step.
    WrongRole,
    /// `status != ongoing` or the controller is not in `WaitingForAction`.
    WrongPhase,
    /// The schema validator rejected the target (dead seat, self-save, etc).
    IllegalTarget,
    /// `actions[roleId]` was already written this night (once-guard).
    Duplicate,
}

/// Fatal, room-ending faults (spec.md §7 "Strict invariant violation").
///
/// Distinct from [`ActionRejectedReason`]: a room fault means the room's
/// own bookkeeping is broken and the room must be torn down, not that a
/// participant made an illegal move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoomFaultReason {
    /// `status = ongoing` but no night controller/plan is present.
    MissingNightState,
    /// The role catalog has no entry for a role id that appears in a
    /// template, or a `night1.hasAction = true` role is missing entirely.
    RoleCatalogInconsistent,
    /// Catch-all for conditions that should be unreachable.
    InternalError,
}

impl RoomFaultReason {
    pub fn description(&self) -> &'static str {
        match self {
            Self::MissingNightState => {
                "room status is ongoing but no night plan/controller is present"
            }
            Self::RoleCatalogInconsistent => {
                "role catalog is missing a role referenced by the active template"
            }
            Self::InternalError => "an internal invariant was violated",
        }
    }
}

impl fmt::Display for RoomFaultReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_rejected_reason_serializes_camel_case() {
        let json = serde_json::to_string(&ActionRejectedReason::WrongRole).unwrap();
        assert_eq!(json, "\"wrongRole\"");
    }

    #[test]
    fn room_fault_reason_serializes_screaming_snake() {
        let json = serde_json::to_string(&RoomFaultReason::InternalError).unwrap();
        assert_eq!(json, "\"INTERNAL_ERROR\"");
    }
}
