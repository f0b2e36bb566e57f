//! Night Plan Compiler (spec.md §4.2): a pure function from a template's
//! role multiset to a deterministic, ordered list of [`NightStep`]s.

use crate::protocol::types::{RoleId, Seat};
use crate::roles::{self, SchemaId};

/// One step of the compiled night sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NightStep {
    pub role_id: RoleId,
    pub schema: SchemaId,
    /// Seats that perform this step. For the consolidated `wolf-meeting`
    /// step this is every seat satisfying `participatesInWolfVote`, not
    /// just seats holding the literal `wolf` role id.
    pub actor_seats: Vec<Seat>,
}

impl NightStep {
    fn schema_id(schema: SchemaId) -> &'static str {
        match schema {
            SchemaId::Target => "target",
            SchemaId::Witch => "witch",
            SchemaId::MagicianSwap => "magicianSwap",
            SchemaId::WolfVote => "wolfVote",
        }
    }

    pub fn schema_name(&self) -> &'static str {
        Self::schema_id(self.schema)
    }
}

/// Builds the ordered night plan from a role assignment (spec.md §4.2).
///
/// `assignment` is `(seat, role_id)` pairs in seat order; seat order also
/// serves as "first occurrence in the template's role list" for the
/// tie-break since templates assign roles to seats in list order.
pub fn build_night_plan(assignment: &[(Seat, RoleId)]) -> Vec<NightStep> {
    // Seats grouped by role id, preserving first-occurrence order per role.
    let mut seats_by_role: Vec<(RoleId, Vec<Seat>)> = Vec::new();
    for (seat, role_id) in assignment {
        if let Some(entry) = seats_by_role.iter_mut().find(|(id, _)| id == role_id) {
            entry.1.push(*seat);
        } else {
            seats_by_role.push((role_id.clone(), vec![*seat]));
        }
    }

    // Distinct role ids with hasAction=true, annotated with spec + first
    // occurrence index for the deterministic sort (spec.md §4.2 step 1-2).
    let mut actionable: Vec<(usize, RoleId, Vec<Seat>)> = seats_by_role
        .into_iter()
        .enumerate()
        .filter_map(|(first_seen, (role_id, seats))| {
            let role_spec = roles::get(&role_id);
            role_spec
                .night1
                .has_action
                .then_some((first_seen, role_id, seats))
        })
        .collect();

    actionable.sort_by(|(a_first, a_id, _), (b_first, b_id, _)| {
        let a_order = roles::get(a_id).night1.order;
        let b_order = roles::get(b_id).night1.order;
        a_order
            .cmp(&b_order)
            .then_with(|| a_first.cmp(b_first))
            .then_with(|| a_id.cmp(b_id))
    });

    let mut steps = Vec::new();
    let mut wolf_meeting_seats: Vec<Seat> = Vec::new();
    let mut wolf_meeting_emitted = false;

    for (_, role_id, seats) in actionable {
        let role_spec = roles::get(&role_id);

        if role_spec.wolf_meeting.participates_in_wolf_vote {
            // Consolidate every wolf-meeting participant into one step
            // (spec.md §4.2 step 4), emitted once at the first such role's
            // sort position.
            if !wolf_meeting_emitted {
                wolf_meeting_seats = all_wolf_meeting_seats(assignment);
                steps.push(NightStep {
                    role_id: RoleId::new("wolf-meeting"),
                    schema: SchemaId::WolfVote,
                    actor_seats: wolf_meeting_seats.clone(),
                });
                wolf_meeting_emitted = true;
            }
            continue;
        }

        steps.push(NightStep {
            role_id,
            schema: role_spec.night1.schema,
            actor_seats: seats,
        });
    }

    steps
}

fn all_wolf_meeting_seats(assignment: &[(Seat, RoleId)]) -> Vec<Seat> {
    let mut seats: Vec<Seat> = assignment
        .iter()
        .filter(|(_, role_id)| roles::get(role_id).wolf_meeting.participates_in_wolf_vote)
        .map(|(seat, _)| *seat)
        .collect();
    seats.sort();
    seats
}
