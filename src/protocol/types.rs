//! Core identifiers shared across the engine.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Stable per-connection participant identifier, supplied by the out-of-scope
/// auth collaborator (spec.md §1).
pub type Uid = Uuid;

/// A 0-based seat index, unique to one participant while occupied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Seat(pub u8);

impl fmt::Display for Seat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u8> for Seat {
    fn from(value: u8) -> Self {
        Self(value)
    }
}

/// A 4-digit ASCII decimal room code (spec.md §6), stored as its canonical
/// rendered form so it round-trips over JSON without leading-zero loss.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomCode(pub String);

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for RoomCode {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl AsRef<str> for RoomCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A role identifier. Kept as an opaque string (rather than a closed enum) so
/// the role catalog can register roles without a matching code change,
/// consistent with spec.md §4.1's "unknown ids yield a defined sentinel"
/// contract.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleId(pub String);

impl RoleId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RoleId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Faction: the role's broad narrative grouping (spec.md §4.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Faction {
    Wolf,
    Villager,
    God,
    Special,
}

/// Team: the win-condition grouping surfaced in the seer's check result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Team {
    Wolf,
    Good,
    Third,
}

/// The seer's check result vocabulary (spec.md §4.1, §6) — kept as the
/// domain's own terms since it is a wire-level enum value players see
/// rendered directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SeerResult {
    #[serde(rename = "狼人")]
    Wolf,
    #[serde(rename = "好人")]
    Good,
}

impl fmt::Display for SeerResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Wolf => f.write_str("狼人"),
            Self::Good => f.write_str("好人"),
        }
    }
}
