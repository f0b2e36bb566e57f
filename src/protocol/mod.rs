//! Protocol module: wire message types, room state, validation, and
//! room-code generation.

pub mod error_codes;
pub mod messages;
pub mod room_codes;
pub mod room_state;
pub mod types;
pub mod validation;

pub use error_codes::{ActionRejectedReason, RoomFaultReason};
pub use messages::{ClientMessage, RoleTurnInfo, RoomPublicView, SeatView, ServerMessage};
pub use room_codes::{generate_room_code, generate_unique_room_code};
pub use room_state::{Player, Room, RoomStateError, RoomStatus, Template};
pub use types::{Faction, RoleId, RoomCode, Seat, SeerResult, Team, Uid};
pub use validation::{
    validate_display_name, validate_player_count, validate_room_code, validate_template,
};
