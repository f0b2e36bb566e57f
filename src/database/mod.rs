//! Durable snapshot storage: a best-effort, forward-compatible persistence
//! layer the Game Coordinator writes to after a status transition so a
//! room can be rebuilt if the process restarts mid-night. Never on the
//! critical path of a night step — a store failure is logged and the
//! engine carries on with its in-memory `Room` as the source of truth.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::protocol::room_state::{Room, RoomStatus, Template};
use crate::protocol::types::{RoleId, RoomCode, Seat, Uid};

/// A serializable projection of a room, persisted under its room code.
/// Intentionally looser than [`Room`]: new fields must default on
/// deserialize so an older snapshot written before a field existed still
/// loads (spec.md's durable-store forward-compat requirement).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomSnapshot {
    pub room_code: RoomCode,
    pub host_id: Uid,
    pub status: RoomStatus,
    pub template: Option<Template>,
    pub seats: Vec<SeatSnapshot>,
    pub current_step_index: usize,
    pub last_night_deaths: Vec<Seat>,
    pub last_protected_seat: Option<Seat>,
    #[serde(default = "Utc::now")]
    pub saved_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeatSnapshot {
    pub uid: Uid,
    pub seat: Seat,
    pub display_name: String,
    pub role: Option<RoleId>,
    pub alive: bool,
}

impl RoomSnapshot {
    pub fn from_room(room: &Room) -> Self {
        Self {
            room_code: room.room_code.clone(),
            host_id: room.host_id,
            status: room.status,
            template: room.template.clone(),
            seats: room
                .players
                .values()
                .map(|p| SeatSnapshot {
                    uid: p.uid,
                    seat: p.seat,
                    display_name: p.display_name.clone(),
                    role: p.role.clone(),
                    alive: p.alive,
                })
                .collect(),
            current_step_index: room.current_step_index,
            last_night_deaths: room.last_night_deaths.clone(),
            last_protected_seat: room.last_protected_seat,
            saved_at: Utc::now(),
        }
    }
}

/// Best-effort key-value persistence keyed by room code (spec.md §4.7,
/// §6, §9 "durable store" collaborator).
#[async_trait]
pub trait DurableStore: Send + Sync {
    async fn save(&self, snapshot: RoomSnapshot) -> Result<()>;
    async fn load(&self, room_code: &RoomCode) -> Result<Option<RoomSnapshot>>;
    async fn delete(&self, room_code: &RoomCode) -> Result<()>;
}

/// Single-process store; last write for a room code wins.
pub struct InMemoryDurableStore {
    snapshots: RwLock<HashMap<RoomCode, RoomSnapshot>>,
}

impl InMemoryDurableStore {
    pub fn new() -> Self {
        Self {
            snapshots: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryDurableStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DurableStore for InMemoryDurableStore {
    async fn save(&self, snapshot: RoomSnapshot) -> Result<()> {
        let mut snapshots = self.snapshots.write().await;
        snapshots.insert(snapshot.room_code.clone(), snapshot);
        Ok(())
    }

    async fn load(&self, room_code: &RoomCode) -> Result<Option<RoomSnapshot>> {
        let snapshots = self.snapshots.read().await;
        Ok(snapshots.get(room_code).cloned())
    }

    async fn delete(&self, room_code: &RoomCode) -> Result<()> {
        let mut snapshots = self.snapshots.write().await;
        snapshots.remove(room_code);
        Ok(())
    }
}

/// Backend selection, following the same shape `config::store::StoreConfig`
/// validates against.
#[derive(Debug, Clone, Default)]
pub enum StoreBackend {
    #[default]
    InMemory,
}

impl StoreBackend {
    pub fn from_config(config: &crate::config::StoreConfig) -> Self {
        match config.backend.as_str() {
            _ => Self::InMemory,
        }
    }
}

pub fn create_store(backend: StoreBackend) -> Arc<dyn DurableStore> {
    match backend {
        StoreBackend::InMemory => Arc::new(InMemoryDurableStore::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let store = InMemoryDurableStore::new();
        let room = Room::new(RoomCode("1234".to_string()), Uid::nil(), Utc::now());
        let snapshot = RoomSnapshot::from_room(&room);
        store.save(snapshot).await.unwrap();

        let loaded = store
            .load(&RoomCode("1234".to_string()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded.room_code, RoomCode("1234".to_string()));
    }

    #[tokio::test]
    async fn load_of_unknown_room_is_none() {
        let store = InMemoryDurableStore::new();
        let loaded = store.load(&RoomCode("9999".to_string())).await.unwrap();
        assert!(loaded.is_none());
    }

    #[tokio::test]
    async fn delete_removes_the_snapshot() {
        let store = InMemoryDurableStore::new();
        let room = Room::new(RoomCode("4321".to_string()), Uid::nil(), Utc::now());
        store.save(RoomSnapshot::from_room(&room)).await.unwrap();
        store.delete(&RoomCode("4321".to_string())).await.unwrap();
        assert!(store
            .load(&RoomCode("4321".to_string()))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn later_save_overwrites_earlier_snapshot_for_same_code() {
        let store = InMemoryDurableStore::new();
        let mut room = Room::new(RoomCode("1111".to_string()), Uid::nil(), Utc::now());
        store.save(RoomSnapshot::from_room(&room)).await.unwrap();
        room.last_night_deaths = vec![Seat(2)];
        store.save(RoomSnapshot::from_room(&room)).await.unwrap();

        let loaded = store
            .load(&RoomCode("1111".to_string()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded.last_night_deaths, vec![Seat(2)]);
    }
}
