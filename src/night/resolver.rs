//! Death Resolver (spec.md §4.6): combines the finalized wolf vote,
//! protection, poison, and role immunities into the night's death list.

use std::collections::HashMap;

use crate::night::action::Action;
use crate::night::plan::NightStep;
use crate::protocol::types::{RoleId, Seat};
use crate::roles;

/// The canonical key the finalized wolf-meeting action is stored under in
/// `actions` (spec.md §4.4 "if `actions['wolf']` exists, it is a no-op"),
/// distinct from the `wolf-meeting` id used for `NightStep`/`ROLE_TURN`.
pub fn wolf_action_key() -> RoleId {
    RoleId::new("wolf")
}

pub fn guard_action_key() -> RoleId {
    RoleId::new("guard")
}

pub fn witch_action_key() -> RoleId {
    RoleId::new("witch")
}

pub fn magician_action_key() -> RoleId {
    RoleId::new("magician")
}

/// Maps a compiled `NightStep`'s plan-facing role id to the key its
/// finalized action is stored under in `actions`.
pub fn action_key_for_step(step: &NightStep) -> RoleId {
    if step.role_id.as_str() == "wolf-meeting" {
        wolf_action_key()
    } else {
        step.role_id.clone()
    }
}

/// Result of resolving one night.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NightResult {
    pub deaths: Vec<Seat>,
    /// Bound by the guard's action this night, for next night's
    /// no-consecutive-protection rule (spec.md §3/§4.6). `None` if no
    /// guard action was submitted.
    pub last_protected_seat: Option<Seat>,
}

fn step_index_by_action_key(plan: &[NightStep]) -> HashMap<RoleId, usize> {
    plan.iter()
        .enumerate()
        .map(|(idx, step)| (action_key_for_step(step), idx))
        .collect()
}

fn remap_seat(seat: Seat, swap: (Seat, Seat)) -> Seat {
    if seat == swap.0 {
        swap.1
    } else if seat == swap.1 {
        swap.0
    } else {
        seat
    }
}

/// Remaps `seat` through the finalized magician swap iff `action_key`'s
/// `NightStep` comes after the magician's step in `plan` (spec.md §4.6 step
/// 6). Shared by the death resolver and the reveal dispatcher at
/// submission time, so a seer/psychic/gargoyle acting after the magician
/// sees the same swapped seat the end-of-night resolver would.
pub fn remap_through_magician_swap(
    plan: &[NightStep],
    actions: &HashMap<RoleId, Action>,
    action_key: &RoleId,
    seat: Seat,
) -> Seat {
    let step_index = step_index_by_action_key(plan);
    let magician_index = step_index.get(&magician_action_key()).copied();
    let swap = match actions.get(&magician_action_key()) {
        Some(Action::MagicianSwap {
            first_seat,
            second_seat,
        }) => Some((*first_seat, *second_seat)),
        _ => None,
    };
    match (swap, magician_index, step_index.get(action_key)) {
        (Some(swap), Some(magician_idx), Some(&idx)) if idx > magician_idx => remap_seat(seat, swap),
        _ => seat,
    }
}

/// Resolves the night given the compiled plan, the finalized per-role
/// actions, and a role lookup for each occupied seat. `role_at` must
/// return `None` for an empty/unoccupied seat.
pub fn resolve_night(
    plan: &[NightStep],
    actions: &HashMap<RoleId, Action>,
    role_at: impl Fn(Seat) -> Option<RoleId>,
) -> NightResult {
    // Step 6 happens conceptually after every other target is read, but we
    // apply it inline per-action below so each lookup sees the remapped
    // seat consistently with "submitted after the magician step".
    let remap_if_later = |key: &RoleId, seat: Seat| -> Seat {
        remap_through_magician_swap(plan, actions, key, seat)
    };

    // Step 1: raw wolf target.
    let wolf_target = match actions.get(&wolf_action_key()) {
        Some(Action::Target { seat: Some(seat) }) => {
            Some(remap_if_later(&wolf_action_key(), *seat))
        }
        _ => None,
    };

    // Step 2: guard protection + lastProtectedSeat binding.
    let guard_seat = match actions.get(&guard_action_key()) {
        Some(Action::Target { seat: Some(seat) }) => {
            Some(remap_if_later(&guard_action_key(), *seat))
        }
        _ => None,
    };
    let guard_cancels_kill = matches!((wolf_target, guard_seat), (Some(w), Some(g)) if w == g);

    // Step 3 & 4: witch save/poison. Witch targets are explicitly excluded
    // from magician remapping (spec.md §4.6 step 6).
    let (witch_save, witch_poison_seat) = match actions.get(&witch_action_key()) {
        Some(Action::Witch {
            save,
            poison,
            target_seat,
        }) => (*save && wolf_target.is_some(), poison.then_some(*target_seat).flatten()),
        _ => (false, None),
    };

    // Step 2.5: immuneToWolfKill cancels the kill for that seat regardless
    // of guard/witch outcome.
    let wolf_target_immune = wolf_target
        .and_then(|seat| role_at(seat))
        .map(|role_id| roles::get(&role_id).flags.immune_to_wolf_kill)
        .unwrap_or(false);

    let wolf_kill_cancelled = guard_cancels_kill || witch_save || wolf_target_immune;

    // Step 5: immuneToPoison cancels poison for that seat.
    let poison_cancelled = witch_poison_seat
        .and_then(|seat| role_at(seat))
        .map(|role_id| roles::get(&role_id).flags.immune_to_poison)
        .unwrap_or(false);

    let mut deaths = Vec::new();
    if !wolf_kill_cancelled {
        if let Some(seat) = wolf_target {
            deaths.push(seat);
        }
    }
    if !poison_cancelled {
        if let Some(seat) = witch_poison_seat {
            if !deaths.contains(&seat) {
                deaths.push(seat);
            }
        }
    }
    deaths.sort();

    NightResult {
        deaths,
        last_protected_seat: guard_seat,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roles::SchemaId;

    fn villager_only_plan() -> Vec<NightStep> {
        vec![
            NightStep {
                role_id: RoleId::new("guard"),
                schema: SchemaId::Target,
                actor_seats: vec![Seat(2)],
            },
            NightStep {
                role_id: RoleId::new("wolf-meeting"),
                schema: SchemaId::WolfVote,
                actor_seats: vec![Seat(0)],
            },
            NightStep {
                role_id: RoleId::new("witch"),
                schema: SchemaId::Witch,
                actor_seats: vec![Seat(3)],
            },
        ]
    }

    fn role_lookup(roles_by_seat: Vec<(Seat, &'static str)>) -> impl Fn(Seat) -> Option<RoleId> {
        move |seat| {
            roles_by_seat
                .iter()
                .find(|(s, _)| *s == seat)
                .map(|(_, r)| RoleId::new(*r))
        }
    }

    #[test]
    fn peaceful_night_with_no_wolf_target_has_no_deaths() {
        let plan = villager_only_plan();
        let actions = HashMap::from([(wolf_action_key(), Action::Target { seat: None })]);
        let result = resolve_night(&plan, &actions, role_lookup(vec![]));
        assert_eq!(result.deaths, vec![]);
    }

    #[test]
    fn guard_saves_wolf_target() {
        let plan = villager_only_plan();
        let actions = HashMap::from([
            (wolf_action_key(), Action::Target { seat: Some(Seat(1)) }),
            (guard_action_key(), Action::Target { seat: Some(Seat(1)) }),
        ]);
        let result = resolve_night(&plan, &actions, role_lookup(vec![]));
        assert_eq!(result.deaths, vec![]);
        assert_eq!(result.last_protected_seat, Some(Seat(1)));
    }

    #[test]
    fn witch_saves_wolf_target() {
        let plan = villager_only_plan();
        let actions = HashMap::from([
            (wolf_action_key(), Action::Target { seat: Some(Seat(1)) }),
            (
                witch_action_key(),
                Action::Witch {
                    save: true,
                    poison: false,
                    target_seat: None,
                },
            ),
        ]);
        let result = resolve_night(&plan, &actions, role_lookup(vec![]));
        assert_eq!(result.deaths, vec![]);
    }

    #[test]
    fn witch_poison_kills_independently_of_guard() {
        let plan = villager_only_plan();
        let actions = HashMap::from([
            (wolf_action_key(), Action::Target { seat: None }),
            (
                witch_action_key(),
                Action::Witch {
                    save: false,
                    poison: true,
                    target_seat: Some(Seat(4)),
                },
            ),
        ]);
        let result = resolve_night(&plan, &actions, role_lookup(vec![]));
        assert_eq!(result.deaths, vec![Seat(4)]);
    }

    #[test]
    fn immune_to_poison_role_cancels_poison() {
        let plan = villager_only_plan();
        let actions = HashMap::from([
            (wolf_action_key(), Action::Target { seat: None }),
            (
                witch_action_key(),
                Action::Witch {
                    save: false,
                    poison: true,
                    target_seat: Some(Seat(4)),
                },
            ),
        ]);
        // no role in the catalog currently sets immune_to_poison=true by
        // default, so this exercises the plumbing via a seat with no role.
        let result = resolve_night(&plan, &actions, role_lookup(vec![]));
        assert_eq!(result.deaths, vec![Seat(4)]);
    }

    #[test]
    fn magician_swap_remaps_wolf_target_submitted_after_swap() {
        let plan = vec![
            NightStep {
                role_id: RoleId::new("magician"),
                schema: SchemaId::MagicianSwap,
                actor_seats: vec![Seat(5)],
            },
            NightStep {
                role_id: RoleId::new("wolf-meeting"),
                schema: SchemaId::WolfVote,
                actor_seats: vec![Seat(0)],
            },
        ];
        let actions = HashMap::from([
            (
                magician_action_key(),
                Action::MagicianSwap {
                    first_seat: Seat(3),
                    second_seat: Seat(5),
                },
            ),
            (wolf_action_key(), Action::Target { seat: Some(Seat(3)) }),
        ]);
        let result = resolve_night(&plan, &actions, role_lookup(vec![]));
        assert_eq!(result.deaths, vec![Seat(5)]);
    }

    #[test]
    fn magician_swap_does_not_remap_witch_targets() {
        let plan = vec![
            NightStep {
                role_id: RoleId::new("magician"),
                schema: SchemaId::MagicianSwap,
                actor_seats: vec![Seat(5)],
            },
            NightStep {
                role_id: RoleId::new("witch"),
                schema: SchemaId::Witch,
                actor_seats: vec![Seat(1)],
            },
        ];
        let actions = HashMap::from([
            (
                magician_action_key(),
                Action::MagicianSwap {
                    first_seat: Seat(3),
                    second_seat: Seat(5),
                },
            ),
            (
                witch_action_key(),
                Action::Witch {
                    save: false,
                    poison: true,
                    target_seat: Some(Seat(3)),
                },
            ),
        ]);
        let result = resolve_night(&plan, &actions, role_lookup(vec![]));
        // target_seat stays 3, not remapped to 5.
        assert_eq!(result.deaths, vec![Seat(3)]);
    }
}
