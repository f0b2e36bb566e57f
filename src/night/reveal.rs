//! Reveal Dispatcher (spec.md §4.5): builds the private reveal payloads a
//! role's action submission (or step entry, for the witch) triggers. This
//! module only constructs payloads — the coordinator is responsible for
//! sending them to the right participant before firing `RoleEndAudioDone`.

use crate::night::action::Action;
use crate::protocol::types::{RoleId, Seat, SeerResult};
use crate::roles;

/// A private reveal produced for one actor seat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reveal {
    SeerReveal {
        target_seat: Seat,
        result: SeerResult,
    },
    PsychicReveal {
        target_seat: Seat,
        display_name: String,
    },
    GargoyleReveal {
        target_seat: Seat,
        display_name: String,
    },
    WitchContext {
        /// Pre-resolution (raw) wolf target; `None` encodes `-1` on the wire.
        killed_seat: Option<Seat>,
        can_save: bool,
    },
}

/// On submission of a `target` action for `seer`/`psychic`/`gargoyle`,
/// returns the reveal to send to the actor. `display_name_at` resolves a
/// seat's current display name for psychic/gargoyle reveals.
pub fn reveal_for_submission(
    role_id: &RoleId,
    action: &Action,
    role_at: impl Fn(Seat) -> Option<RoleId>,
    display_name_at: impl Fn(Seat) -> String,
) -> Option<Reveal> {
    let Action::Target { seat: Some(target) } = action else {
        return None;
    };

    match role_id.as_str() {
        "seer" => {
            let result = role_at(*target)
                .map(|r| roles::seer_check_result(&r))
                .unwrap_or(SeerResult::Good);
            Some(Reveal::SeerReveal {
                target_seat: *target,
                result,
            })
        }
        "psychic" => Some(Reveal::PsychicReveal {
            target_seat: *target,
            display_name: display_name_at(*target),
        }),
        "gargoyle" => Some(Reveal::GargoyleReveal {
            target_seat: *target,
            display_name: display_name_at(*target),
        }),
        _ => None,
    }
}

/// On entering the witch's `WaitingForAction` step, returns her
/// `WITCH_CONTEXT` reveal. `killed_seat` is the raw (pre-guard) wolf
/// target per spec.md §4.5/§9 Open Question #3. `can_save` is false iff
/// the witch is the victim and her role's `canSaveSelf = false`.
pub fn witch_context(witch_seat: Seat, raw_wolf_target: Option<Seat>, can_save_self: bool) -> Reveal {
    let can_save = match raw_wolf_target {
        Some(victim) if victim == witch_seat => can_save_self,
        Some(_) => true,
        None => false,
    };
    Reveal::WitchContext {
        killed_seat: raw_wolf_target,
        can_save,
    }
}

/// Nightmare-block handling (spec.md §4.5): a blocked actor's step is
/// skipped without a reveal, even if the blocked actor is the seer.
/// `blocked_seats` is whatever the engine's nightmare resolution decided
/// this night; callers should skip `reveal_for_submission` entirely for
/// seats in this set rather than calling it and discarding the result,
/// since the blocked role's step never reaches `WaitingForAction`.
pub fn is_blocked(seat: Seat, blocked_seats: &[Seat]) -> bool {
    blocked_seats.contains(&seat)
}
