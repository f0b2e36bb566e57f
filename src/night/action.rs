//! Action model (spec.md §3, §4.4, §6): tagged night-action variants plus
//! the wire encode/decode helpers for the magician's two-seat swap.

use serde::{Deserialize, Serialize};

use crate::protocol::types::Seat;

/// A seat value meaning "no target" / "peaceful" on the wire (spec.md §6:
/// "-1/null for skip").
pub const NONE_SEAT: i16 = -1;

/// One role's finalized night action. Written at most once per role per
/// night (the once-guard, spec.md §3/§4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Action {
    /// A single-seat target. `seat = None` encodes the wolf-meeting's
    /// "peaceful night" abstain outcome.
    Target { seat: Option<Seat> },
    Witch {
        save: bool,
        poison: bool,
        target_seat: Option<Seat>,
    },
    MagicianSwap { first_seat: Seat, second_seat: Seat },
    None,
}

/// Raw wire payload for `SUBMIT_ACTION` before schema-specific decoding
/// (spec.md §6). Transport encoding is opaque; this is the parsed JSON
/// shape every schema decodes from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionWire {
    /// Plain seat integer for `target`/`wolfVote` schemas, or the encoded
    /// `secondSeat*100 + firstSeat` integer for `magicianSwap`. `None`/`-1`
    /// means skip/abstain.
    #[serde(default)]
    pub target: Option<i32>,
    #[serde(default)]
    pub save: bool,
    #[serde(default)]
    pub poison: bool,
}

/// Error produced by schema validation at ingress (spec.md §4.4). The
/// caller maps this to `ACTION_REJECTED{reason:'illegalTarget'}`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ActionDecodeError {
    #[error("seat {0} is out of range for this room")]
    SeatOutOfRange(i32),
    #[error("magician swap wire value {0} does not encode two distinct seats")]
    MalformedSwap(i32),
    #[error("target is required for this action")]
    MissingTarget,
}

fn seat_in_range(raw: i32, player_count: u8) -> Result<Seat, ActionDecodeError> {
    if raw < 0 || raw >= i32::from(player_count) {
        return Err(ActionDecodeError::SeatOutOfRange(raw));
    }
    Ok(Seat(raw as u8))
}

/// Decodes a plain `target` schema wire value. `-1`/`None` means skip.
pub fn decode_target(
    wire: &ActionWire,
    player_count: u8,
) -> Result<Option<Seat>, ActionDecodeError> {
    match wire.target {
        None => Ok(None),
        Some(raw) if raw == i32::from(NONE_SEAT) => Ok(None),
        Some(raw) => seat_in_range(raw, player_count).map(Some),
    }
}

/// Encodes a magician swap into the wire integer
/// `secondSeat*100 + firstSeat` (spec.md §4.4/§6). The validator's
/// constraint `secondSeat >= 1` ensures every encoded value is `>= 100`,
/// disambiguating it from a plain seat target.
pub fn encode_magician_swap(first_seat: Seat, second_seat: Seat) -> i32 {
    i32::from(second_seat.0) * 100 + i32::from(first_seat.0)
}

/// Decodes a magician-swap wire integer into `(firstSeat, secondSeat)`.
/// Requires `wire >= 100` and `secondSeat >= 1`, per spec.md §4.4.
pub fn decode_magician_swap(
    raw: i32,
    player_count: u8,
) -> Result<(Seat, Seat), ActionDecodeError> {
    if raw < 100 {
        return Err(ActionDecodeError::MalformedSwap(raw));
    }
    let second_seat = raw / 100;
    let first_seat = raw % 100;
    if second_seat < 1 {
        return Err(ActionDecodeError::MalformedSwap(raw));
    }
    let first_seat = seat_in_range(first_seat, player_count)?;
    let second_seat = seat_in_range(second_seat, player_count)?;
    if first_seat == second_seat {
        return Err(ActionDecodeError::MalformedSwap(raw));
    }
    Ok((first_seat, second_seat))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn none_seat_decodes_to_skip() {
        let wire = ActionWire {
            target: Some(NONE_SEAT as i32),
            save: false,
            poison: false,
        };
        assert_eq!(decode_target(&wire, 8).unwrap(), None);
    }

    #[test]
    fn out_of_range_seat_is_rejected() {
        let wire = ActionWire {
            target: Some(12),
            save: false,
            poison: false,
        };
        assert!(decode_target(&wire, 8).is_err());
    }

    #[test]
    fn magician_swap_round_trips() {
        for a in 0u8..12 {
            for b in 1u8..12 {
                if a == b {
                    continue;
                }
                let wire = encode_magician_swap(Seat(a), Seat(b));
                assert!(wire >= 100);
                let (da, db) = decode_magician_swap(wire, 12).unwrap();
                assert_eq!((da, db), (Seat(a), Seat(b)));
            }
        }
    }

    #[test]
    fn magician_swap_rejects_second_seat_zero() {
        // second_seat=0 would encode a value < 100, indistinguishable from
        // a plain target; the validator's secondSeat >= 1 constraint
        // excludes it up front.
        assert!(decode_magician_swap(5, 12).is_err());
    }

    proptest! {
        #[test]
        fn magician_swap_encode_decode_round_trip(a in 0u8..20, b in 1u8..20) {
            prop_assume!(a != b);
            let player_count = 20;
            prop_assume!(a < player_count && b < player_count);
            let wire = encode_magician_swap(Seat(a), Seat(b));
            let (da, db) = decode_magician_swap(wire, player_count).unwrap();
            prop_assert_eq!((da, db), (Seat(a), Seat(b)));
        }
    }
}
