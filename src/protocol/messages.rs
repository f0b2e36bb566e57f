//! Wire message envelopes (spec.md §6).

use serde::{Deserialize, Serialize};

use crate::night::action::{ActionWire, NONE_SEAT};
use crate::night::reveal::Reveal;
use crate::protocol::error_codes::{ActionRejectedReason, RoomFaultReason};
use crate::protocol::room_state::RoomStatus;
use crate::protocol::types::{RoleId, RoomCode, Seat, SeerResult, Uid};

/// Public, broadcast-to-room projection of a room (spec.md §6). Never
/// contains any player's role.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomPublicView {
    pub room_code: RoomCode,
    pub status: RoomStatus,
    pub current_step_index: usize,
    pub seats: Vec<SeatView>,
    pub last_night_deaths: Vec<Seat>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeatView {
    pub seat: Seat,
    pub display_name: String,
    pub alive: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleTurnInfo {
    pub role_id: RoleId,
    pub step_index: usize,
}

/// Messages a participant's client sends to the host (spec.md §6
/// "Inbound"), plus the audio/animation-done callbacks the out-of-scope
/// UI collaborator reports back through the same channel (spec.md §9
/// "an adapter implements audio/animation and calls the inbox").
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientMessage {
    Hello {
        uid: Uid,
        room_code: RoomCode,
    },
    SetTemplate {
        name: String,
        roles: Vec<RoleId>,
    },
    TakeSeat {
        seat: Seat,
        display_name: String,
    },
    LeaveSeat,
    ViewRole,
    AssignRoles,
    StartNight,
    SubmitAction {
        role_id: RoleId,
        wire: ActionWire,
    },
    WolfVote {
        target_seat: Option<Seat>,
    },
    NightBeginAudioDone,
    RoleBeginAudioDone,
    RoleEndAudioDone,
    NightEndAudioDone,
}

/// Messages the host sends to one or more participants (spec.md §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServerMessage {
    StateUpdate {
        state: RoomPublicView,
    },
    RoleTurn {
        role_id: RoleId,
        step_index: usize,
    },
    NightEnd {
        last_night_deaths: Vec<Seat>,
    },
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
        killed_index: i16,
        can_save: bool,
    },
    ActionRejected {
        reason: ActionRejectedReason,
    },
    /// Delivered once per player at the `seated -> assigned` transition.
    RoleAssignment {
        role_id: RoleId,
    },
    /// Personalized response to `HELLO` (spec.md §4.7 rejoin protocol).
    WelcomeBack {
        state: RoomPublicView,
        your_role_id: Option<RoleId>,
        pending_reveals: Vec<ServerMessage>,
        role_turn: Option<RoleTurnInfo>,
    },
    RoomFault {
        reason: RoomFaultReason,
    },
}

impl ServerMessage {
    /// Lifts a night-module [`Reveal`] into its wire envelope.
    pub fn from_reveal(reveal: Reveal) -> Self {
        match reveal {
            Reveal::SeerReveal {
                target_seat,
                result,
            } => ServerMessage::SeerReveal {
                target_seat,
                result,
            },
            Reveal::PsychicReveal {
                target_seat,
                display_name,
            } => ServerMessage::PsychicReveal {
                target_seat,
                display_name,
            },
            Reveal::GargoyleReveal {
                target_seat,
                display_name,
            } => ServerMessage::GargoyleReveal {
                target_seat,
                display_name,
            },
            Reveal::WitchContext {
                killed_seat,
                can_save,
            } => ServerMessage::WitchContext {
                killed_index: killed_seat.map(|s| i16::from(s.0)).unwrap_or(NONE_SEAT),
                can_save,
            },
        }
    }
}
