//! Room state (spec.md §3): the authoritative per-room data model the
//! Game Coordinator mutates. One `Room` exists per live room code; the
//! seat lifecycle `unseated -> seated -> assigned -> ready -> ongoing ->
//! ended` governs which operations are legal.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::night::action::Action;
use crate::night::ballot::WolfBallot;
use crate::night::plan::NightStep;
use crate::protocol::types::{RoleId, RoomCode, Seat, Uid};
use crate::roles;

/// A room's lifecycle stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomStatus {
    /// No template chosen, or the template is set but seats remain open.
    Unseated,
    /// Every seat the template needs is occupied.
    Seated,
    /// Roles have been dealt; not every player has viewed theirs yet.
    Assigned,
    /// Every seated player has viewed their role.
    Ready,
    /// The night plan is compiled and the flow controller is driving steps.
    Ongoing,
    /// The night has resolved; `last_night_deaths` holds the result.
    Ended,
}

/// A fixed multiset of role ids describing a game mode, immutable once set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    pub name: String,
    pub roles: Vec<RoleId>,
}

impl Template {
    pub fn player_count(&self) -> u8 {
        self.roles.len() as u8
    }
}

/// One occupied seat.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub uid: Uid,
    pub seat: Seat,
    pub display_name: String,
    pub role: Option<RoleId>,
    pub has_viewed_role: bool,
    pub alive: bool,
}

impl Player {
    fn new(uid: Uid, seat: Seat, display_name: String) -> Self {
        Self {
            uid,
            seat,
            display_name,
            role: None,
            has_viewed_role: false,
            alive: true,
        }
    }
}

/// Operations that cannot proceed given the room's current state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoomStateError {
    #[error("seat {0} is already occupied")]
    SeatOccupied(Seat),
    #[error("seat {0} is out of range for this room's template")]
    SeatOutOfRange(Seat),
    #[error("no template has been set for this room")]
    NoTemplate,
    #[error("room status does not permit this operation")]
    WrongStatus,
    #[error("participant is not seated in this room")]
    NotSeated,
    #[error("template role count ({roles}) does not match seated player count ({seats})")]
    TemplateMismatch { roles: usize, seats: usize },
}

/// The authoritative per-room data model (spec.md §3).
#[derive(Debug, Clone)]
pub struct Room {
    pub room_code: RoomCode,
    pub host_id: Uid,
    pub status: RoomStatus,
    pub template: Option<Template>,
    /// Seat -> occupant. Absent seats are empty.
    pub players: BTreeMap<Seat, Player>,
    pub night_plan: Vec<NightStep>,
    pub actions: HashMap<RoleId, Action>,
    pub wolf_votes: WolfBallot,
    pub current_step_index: usize,
    pub is_audio_playing: bool,
    pub last_night_deaths: Vec<Seat>,
    pub last_protected_seat: Option<Seat>,
    pub magician_swap: Option<(Seat, Seat)>,
    /// The seat nightmare's wolf-meeting vote targeted for a blocked action
    /// this night (spec.md §4.5/§GLOSSARY "Nightmare block"). `None` until
    /// the wolf-meeting finalizes, and cleared each night by `start_night`.
    pub nightmare_blocked_seat: Option<Seat>,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
}

impl Room {
    pub fn new(room_code: RoomCode, host_id: Uid, now: DateTime<Utc>) -> Self {
        Self {
            room_code,
            host_id,
            status: RoomStatus::Unseated,
            template: None,
            players: BTreeMap::new(),
            night_plan: Vec::new(),
            actions: HashMap::new(),
            wolf_votes: WolfBallot::new(),
            current_step_index: 0,
            is_audio_playing: false,
            last_night_deaths: Vec::new(),
            last_protected_seat: None,
            magician_swap: None,
            nightmare_blocked_seat: None,
            created_at: now,
            last_activity: now,
        }
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_activity = now;
    }

    pub fn seat_of(&self, uid: Uid) -> Option<Seat> {
        self.players
            .values()
            .find(|p| p.uid == uid)
            .map(|p| p.seat)
    }

    pub fn player_at(&self, seat: Seat) -> Option<&Player> {
        self.players.get(&seat)
    }

    pub fn role_at(&self, seat: Seat) -> Option<RoleId> {
        self.players.get(&seat).and_then(|p| p.role.clone())
    }

    /// The first seat currently holding `role_id`, if any.
    pub fn seat_with_role(&self, role_id: &RoleId) -> Option<Seat> {
        self.players
            .values()
            .find(|p| p.role.as_ref() == Some(role_id))
            .map(|p| p.seat)
    }

    pub fn is_alive(&self, seat: Seat) -> bool {
        self.players.get(&seat).map(|p| p.alive).unwrap_or(false)
    }

    pub fn display_name_at(&self, seat: Seat) -> String {
        self.players
            .get(&seat)
            .map(|p| p.display_name.clone())
            .unwrap_or_default()
    }

    /// Sets the room's template. Only legal before any seat is assigned a
    /// role (spec.md §3: "Template ... immutable per room once set").
    pub fn set_template(&mut self, template: Template) -> Result<(), RoomStateError> {
        if self.status != RoomStatus::Unseated {
            return Err(RoomStateError::WrongStatus);
        }
        self.template = Some(template);
        self.recompute_seated_status();
        Ok(())
    }

    /// Idempotent seat take: re-taking your own current seat is a no-op;
    /// taking a new seat while already seated reseats you (spec.md §1
    /// "idempotent join/leave/reseat").
    pub fn take_seat(
        &mut self,
        uid: Uid,
        seat: Seat,
        display_name: String,
    ) -> Result<(), RoomStateError> {
        let template = self.template.as_ref().ok_or(RoomStateError::NoTemplate)?;
        if seat.0 >= template.player_count() {
            return Err(RoomStateError::SeatOutOfRange(seat));
        }
        if let Some(occupant) = self.players.get(&seat) {
            if occupant.uid != uid {
                return Err(RoomStateError::SeatOccupied(seat));
            }
            // Re-taking one's own seat: just refresh the display name.
            self.players.get_mut(&seat).unwrap().display_name = display_name;
            return Ok(());
        }
        // Vacate any seat this uid previously held (reseat).
        if let Some(prior) = self.seat_of(uid) {
            self.players.remove(&prior);
        }
        self.players.insert(seat, Player::new(uid, seat, display_name));
        self.recompute_seated_status();
        Ok(())
    }

    pub fn leave_seat(&mut self, uid: Uid) -> Result<(), RoomStateError> {
        let seat = self.seat_of(uid).ok_or(RoomStateError::NotSeated)?;
        self.players.remove(&seat);
        // Leaving always drops back below "seated"; assignment/readiness
        // can no longer hold without the seat filled.
        if matches!(
            self.status,
            RoomStatus::Seated | RoomStatus::Assigned | RoomStatus::Ready
        ) {
            self.status = RoomStatus::Unseated;
        }
        Ok(())
    }

    fn recompute_seated_status(&mut self) {
        if self.status != RoomStatus::Unseated {
            return;
        }
        if let Some(template) = &self.template {
            if self.players.len() == template.player_count() as usize && !self.players.is_empty()
            {
                self.status = RoomStatus::Seated;
            }
        }
    }

    /// Deals the template's role multiset across occupied seats and
    /// transitions `seated -> assigned`. `shuffle` receives the template's
    /// role list and the returned permutation is zipped to seats in seat
    /// order; callers typically pass a `rand`-backed shuffle.
    pub fn assign_roles(
        &mut self,
        shuffle: impl FnOnce(Vec<RoleId>) -> Vec<RoleId>,
    ) -> Result<(), RoomStateError> {
        if self.status != RoomStatus::Seated {
            return Err(RoomStateError::WrongStatus);
        }
        let template = self.template.clone().ok_or(RoomStateError::NoTemplate)?;
        if template.roles.len() != self.players.len() {
            return Err(RoomStateError::TemplateMismatch {
                roles: template.roles.len(),
                seats: self.players.len(),
            });
        }
        let shuffled = shuffle(template.roles.clone());
        for (player, role_id) in self.players.values_mut().zip(shuffled) {
            player.role = Some(role_id);
        }
        self.status = RoomStatus::Assigned;
        Ok(())
    }

    /// Marks a participant as having viewed their role; transitions
    /// `assigned -> ready` once every seated player has viewed.
    pub fn mark_role_viewed(&mut self, uid: Uid) -> Result<(), RoomStateError> {
        if !matches!(self.status, RoomStatus::Assigned | RoomStatus::Ready) {
            return Err(RoomStateError::WrongStatus);
        }
        let seat = self.seat_of(uid).ok_or(RoomStateError::NotSeated)?;
        self.players.get_mut(&seat).unwrap().has_viewed_role = true;
        if self.players.values().all(|p| p.has_viewed_role) {
            self.status = RoomStatus::Ready;
        }
        Ok(())
    }

    /// Builds the night plan from the current role assignment and
    /// transitions `ready -> ongoing`.
    pub fn start_night(&mut self) -> Result<(), RoomStateError> {
        if self.status != RoomStatus::Ready {
            return Err(RoomStateError::WrongStatus);
        }
        let assignment: Vec<(Seat, RoleId)> = self
            .players
            .values()
            .filter_map(|p| p.role.clone().map(|r| (p.seat, r)))
            .collect();
        self.night_plan = crate::night::plan::build_night_plan(&assignment);
        self.actions.clear();
        self.wolf_votes.clear();
        self.current_step_index = 0;
        self.magician_swap = None;
        self.nightmare_blocked_seat = None;
        self.status = RoomStatus::Ongoing;
        Ok(())
    }

    /// Every seat whose assigned role participates in the wolf meeting and
    /// is still alive (spec.md §4.4 wolf-vote finalization).
    pub fn live_wolf_meeting_seats(&self) -> Vec<Seat> {
        self.players
            .values()
            .filter(|p| p.alive)
            .filter(|p| {
                p.role
                    .as_ref()
                    .map(|r| roles::get(r).wolf_meeting.participates_in_wolf_vote)
                    .unwrap_or(false)
            })
            .map(|p| p.seat)
            .collect()
    }

    /// Applies a night's resolved deaths and transitions `ongoing -> ended`.
    pub fn finish_night(&mut self, deaths: Vec<Seat>, last_protected_seat: Option<Seat>) {
        for seat in &deaths {
            if let Some(player) = self.players.get_mut(seat) {
                player.alive = false;
            }
        }
        self.last_night_deaths = deaths;
        self.last_protected_seat = last_protected_seat;
        self.status = RoomStatus::Ended;
    }

    /// Reconstructs a seat directly from a durable snapshot, bypassing the
    /// `take_seat`/`assign_roles` lifecycle gates (spec.md §4.7 rehydrate
    /// path: the snapshot already reflects a validly-reached state).
    pub fn rehydrate_player(
        &mut self,
        uid: Uid,
        seat: Seat,
        display_name: String,
        role: Option<RoleId>,
        alive: bool,
    ) {
        let has_viewed_role = role.is_some();
        self.players.insert(
            seat,
            Player {
                uid,
                seat,
                display_name,
                role,
                has_viewed_role,
                alive,
            },
        );
    }

    pub fn is_expired(
        &self,
        now: DateTime<Utc>,
        empty_timeout: chrono::Duration,
        inactive_timeout: chrono::Duration,
    ) -> bool {
        if self.players.is_empty() {
            return now - self.created_at > empty_timeout;
        }
        now - self.last_activity > inactive_timeout
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template(roles: &[&str]) -> Template {
        Template {
            name: "test".to_string(),
            roles: roles.iter().map(|r| RoleId::new(*r)).collect(),
        }
    }

    fn room() -> Room {
        Room::new(RoomCode("1234".to_string()), Uid::nil(), Utc::now())
    }

    #[test]
    fn seating_every_seat_transitions_to_seated() {
        let mut room = room();
        room.set_template(template(&["wolf", "villager"])).unwrap();
        room.take_seat(Uid::from_u128(1), Seat(0), "Alice".to_string())
            .unwrap();
        assert_eq!(room.status, RoomStatus::Unseated);
        room.take_seat(Uid::from_u128(2), Seat(1), "Bob".to_string())
            .unwrap();
        assert_eq!(room.status, RoomStatus::Seated);
    }

    #[test]
    fn retaking_own_seat_is_idempotent() {
        let mut room = room();
        room.set_template(template(&["wolf", "villager"])).unwrap();
        let uid = Uid::from_u128(1);
        room.take_seat(uid, Seat(0), "Alice".to_string()).unwrap();
        room.take_seat(uid, Seat(0), "Alice2".to_string()).unwrap();
        assert_eq!(room.players.len(), 1);
        assert_eq!(room.players[&Seat(0)].display_name, "Alice2");
    }

    #[test]
    fn taking_an_occupied_seat_is_rejected() {
        let mut room = room();
        room.set_template(template(&["wolf", "villager"])).unwrap();
        room.take_seat(Uid::from_u128(1), Seat(0), "Alice".to_string())
            .unwrap();
        let err = room
            .take_seat(Uid::from_u128(2), Seat(0), "Eve".to_string())
            .unwrap_err();
        assert_eq!(err, RoomStateError::SeatOccupied(Seat(0)));
    }

    #[test]
    fn leaving_drops_back_to_unseated() {
        let mut room = room();
        room.set_template(template(&["wolf", "villager"])).unwrap();
        let uid = Uid::from_u128(1);
        room.take_seat(uid, Seat(0), "Alice".to_string()).unwrap();
        room.take_seat(Uid::from_u128(2), Seat(1), "Bob".to_string())
            .unwrap();
        assert_eq!(room.status, RoomStatus::Seated);
        room.leave_seat(uid).unwrap();
        assert_eq!(room.status, RoomStatus::Unseated);
        assert!(room.players.get(&Seat(0)).is_none());
    }

    #[test]
    fn assign_roles_deals_the_full_multiset() {
        let mut room = room();
        room.set_template(template(&["wolf", "villager"])).unwrap();
        room.take_seat(Uid::from_u128(1), Seat(0), "Alice".to_string())
            .unwrap();
        room.take_seat(Uid::from_u128(2), Seat(1), "Bob".to_string())
            .unwrap();
        room.assign_roles(|roles| roles).unwrap();
        assert_eq!(room.status, RoomStatus::Assigned);
        let mut dealt: Vec<_> = room
            .players
            .values()
            .map(|p| p.role.clone().unwrap())
            .collect();
        dealt.sort();
        let mut expected = vec![RoleId::new("wolf"), RoleId::new("villager")];
        expected.sort();
        assert_eq!(dealt, expected);
    }

    #[test]
    fn ready_requires_every_player_to_have_viewed() {
        let mut room = room();
        room.set_template(template(&["wolf", "villager"])).unwrap();
        let (u1, u2) = (Uid::from_u128(1), Uid::from_u128(2));
        room.take_seat(u1, Seat(0), "Alice".to_string()).unwrap();
        room.take_seat(u2, Seat(1), "Bob".to_string()).unwrap();
        room.assign_roles(|roles| roles).unwrap();
        room.mark_role_viewed(u1).unwrap();
        assert_eq!(room.status, RoomStatus::Assigned);
        room.mark_role_viewed(u2).unwrap();
        assert_eq!(room.status, RoomStatus::Ready);
    }

    #[test]
    fn start_night_compiles_a_plan_and_clears_actions() {
        let mut room = room();
        room.set_template(template(&["wolf", "guard"])).unwrap();
        let (u1, u2) = (Uid::from_u128(1), Uid::from_u128(2));
        room.take_seat(u1, Seat(0), "Alice".to_string()).unwrap();
        room.take_seat(u2, Seat(1), "Bob".to_string()).unwrap();
        room.assign_roles(|_| vec![RoleId::new("wolf"), RoleId::new("guard")])
            .unwrap();
        room.mark_role_viewed(u1).unwrap();
        room.mark_role_viewed(u2).unwrap();
        room.start_night().unwrap();
        assert_eq!(room.status, RoomStatus::Ongoing);
        assert_eq!(room.night_plan.len(), 2);
    }
}
