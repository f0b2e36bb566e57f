//! Room code generation (spec.md §6: "4-digit ASCII decimal, uniformly
//! generated, checked against live-room set for uniqueness").

use rand::Rng;

use crate::protocol::types::RoomCode;

const DIGITS: usize = 4;
const SPACE_SIZE: u32 = 10_000;

/// Draws one uniformly random 4-digit code. Leading zeros are kept so the
/// code always renders at the configured width.
pub fn generate_room_code() -> RoomCode {
    let mut rng = rand::rng();
    let value: u32 = rng.random_range(0..SPACE_SIZE);
    RoomCode(format!("{value:0width$}", width = DIGITS))
}

/// Draws a code rejected by `is_live`, i.e. not currently assigned to a
/// live room. Bails out after a bounded number of attempts rather than
/// spinning forever once the 10,000-code space is nearly saturated.
pub fn generate_unique_room_code(is_live: impl Fn(&RoomCode) -> bool) -> RoomCode {
    const MAX_ATTEMPTS: u32 = 200;
    let mut candidate = generate_room_code();
    for _ in 0..MAX_ATTEMPTS {
        if !is_live(&candidate) {
            return candidate;
        }
        candidate = generate_room_code();
    }
    tracing::warn!(
        attempts = MAX_ATTEMPTS,
        "room code space exhausted; returning a possibly colliding code"
    );
    candidate
}
