//! Game Engine: the process-wide room registry. Owns no game state itself
//! — each live room's state lives inside its own [`GameCoordinator`] task —
//! this type only tracks which rooms exist and how to reach them: a room
//! code maps to the coordinator's inbox `Sender` plus enough bookkeeping to
//! create, look up, and retire rooms (spec.md §9 "`GameStateService`
//! modeled as a registry keyed by `roomCode`; no process-wide singleton").

use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use tokio::sync::mpsc;

use crate::config::{Config, ProtocolConfig, ServerConfig, WebSocketConfig};
use crate::coordination::{Envelope, GameCoordinator, InMemoryMessageBus, MessageBus};
use crate::database::{create_store, DurableStore, RoomSnapshot, StoreBackend};
use crate::metrics::ServerMetrics;
use crate::night::flow::NightFlowController;
use crate::night::plan::build_night_plan;
use crate::protocol::room_codes::generate_unique_room_code;
use crate::protocol::room_state::{Room, RoomStatus};
use crate::protocol::types::{RoleId, RoomCode, Seat, Uid};
use crate::rate_limit::{JoinRateLimiter, RateLimitError};

/// A reachable live room: its inbox sender and the host that created it.
#[derive(Clone)]
pub struct RoomHandle {
    pub host_id: Uid,
    pub sender: mpsc::Sender<Envelope>,
}

/// Process-wide registry of live rooms, the shared message bus they
/// broadcast through, and the shared durable store they checkpoint to.
pub struct GameEngine {
    rooms: DashMap<RoomCode, RoomHandle>,
    bus: Arc<dyn MessageBus>,
    store: Arc<dyn DurableStore>,
    metrics: Arc<ServerMetrics>,
    rate_limiter: Arc<JoinRateLimiter>,
    protocol_config: ProtocolConfig,
    server_config: ServerConfig,
    websocket_config: WebSocketConfig,
}

impl GameEngine {
    pub fn new(config: &Config) -> Arc<Self> {
        let rate_limiter = Arc::new(JoinRateLimiter::new(config.rate_limit.clone()));
        rate_limiter.clone().start_cleanup_task();
        Arc::new(Self {
            rooms: DashMap::new(),
            bus: Arc::new(InMemoryMessageBus::new()),
            store: create_store(StoreBackend::from_config(&config.store)),
            metrics: Arc::new(ServerMetrics::new()),
            rate_limiter,
            protocol_config: config.protocol.clone(),
            server_config: config.server.clone(),
            websocket_config: config.websocket.clone(),
        })
    }

    pub fn bus(&self) -> Arc<dyn MessageBus> {
        self.bus.clone()
    }

    pub fn metrics(&self) -> Arc<ServerMetrics> {
        self.metrics.clone()
    }

    pub fn connection_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.websocket_config.connection_timeout_secs)
    }

    pub fn cors_allow_any_origin(&self) -> bool {
        self.websocket_config.cors_allow_any_origin
    }

    pub fn protocol_config(&self) -> &ProtocolConfig {
        &self.protocol_config
    }

    /// Rate-limit a join/take-seat style attempt from `uid`.
    pub async fn check_join_rate_limit(&self, uid: Uid) -> Result<(), RateLimitError> {
        let result = self.rate_limiter.check(uid).await;
        if result.is_err() {
            self.metrics.record_rate_limited();
        }
        result
    }

    /// Creates a fresh room, spawns its `GameCoordinator`, and registers it
    /// in the room table. Returns the room code and its host id.
    pub async fn create_room(self: &Arc<Self>) -> Result<(RoomCode, Uid), CreateRoomError> {
        if self.rooms.len() >= self.server_config.max_rooms {
            return Err(CreateRoomError::AtCapacity);
        }
        let host_id = Uid::new_v4();
        let room_code = generate_unique_room_code(|code| self.rooms.contains_key(code));
        let room = Room::new(room_code.clone(), host_id, Utc::now());
        let (coordinator, sender) = GameCoordinator::new(
            room,
            self.bus.clone(),
            self.store.clone(),
            self.metrics.clone(),
            self.protocol_config.clone(),
            self.server_config.clone(),
        );
        self.rooms.insert(
            room_code.clone(),
            RoomHandle {
                host_id,
                sender: sender.clone(),
            },
        );
        self.metrics.record_room_created();

        let engine = self.clone();
        let code_for_cleanup = room_code.clone();
        tokio::spawn(async move {
            coordinator.run().await;
            engine.rooms.remove(&code_for_cleanup);
            engine.metrics.record_room_ended();
        });

        Ok((room_code, host_id))
    }

    /// Rehydrates a room from its last durable snapshot, e.g. after a
    /// process restart (spec.md §4.7 "if the host itself restarted").
    /// Returns `Ok(None)` if no snapshot exists for `room_code`. When the
    /// snapshot's status is `Ongoing`, this also recompiles `night_plan`
    /// from the rehydrated roster and reconstructs a matching
    /// `NightFlowController` — without it, `status = ongoing` with no live
    /// controller is the strict invariant violation spec.md §4.3/§7
    /// requires faulting the room over, not silently wedging it.
    pub async fn rehydrate_room(
        self: &Arc<Self>,
        room_code: &RoomCode,
    ) -> anyhow::Result<Option<RoomCode>> {
        let Some(snapshot) = self.store.load(room_code).await? else {
            return Ok(None);
        };
        let room = room_from_snapshot(snapshot);
        let host_id = room.host_id;
        let rehydrated_flow = (room.status == RoomStatus::Ongoing).then(|| {
            let step = room.current_step_index.min(room.night_plan.len());
            NightFlowController::rehydrate(room.night_plan.clone(), step)
        });
        let (mut coordinator, sender) = GameCoordinator::new(
            room,
            self.bus.clone(),
            self.store.clone(),
            self.metrics.clone(),
            self.protocol_config.clone(),
            self.server_config.clone(),
        );
        if let Some(flow) = rehydrated_flow {
            coordinator.install_rehydrated_flow(flow);
        }
        self.rooms.insert(
            room_code.clone(),
            RoomHandle {
                host_id,
                sender: sender.clone(),
            },
        );
        self.metrics.record_room_created();

        let engine = self.clone();
        let code_for_cleanup = room_code.clone();
        tokio::spawn(async move {
            coordinator.run().await;
            engine.rooms.remove(&code_for_cleanup);
            engine.metrics.record_room_ended();
        });

        Ok(Some(room_code.clone()))
    }

    pub fn get_room(&self, room_code: &RoomCode) -> Option<RoomHandle> {
        self.rooms.get(room_code).map(|entry| entry.clone())
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// `true` once the engine has accepted at least one connection and the
    /// registry is reachable; used by the `/health` endpoint.
    pub fn is_healthy(&self) -> bool {
        self.rooms.len() <= self.server_config.max_rooms
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CreateRoomError {
    #[error("server is at its configured room capacity")]
    AtCapacity,
}

fn room_from_snapshot(snapshot: RoomSnapshot) -> Room {
    let mut room = Room::new(snapshot.room_code, snapshot.host_id, snapshot.saved_at);
    room.status = snapshot.status;
    room.template = snapshot.template;
    room.current_step_index = snapshot.current_step_index;
    room.last_night_deaths = snapshot.last_night_deaths;
    room.last_protected_seat = snapshot.last_protected_seat;
    for seat_snapshot in snapshot.seats {
        room.rehydrate_player(
            seat_snapshot.uid,
            seat_snapshot.seat,
            seat_snapshot.display_name,
            seat_snapshot.role,
            seat_snapshot.alive,
        );
    }
    // A night in progress needs its plan recompiled from the rehydrated
    // roster — the snapshot doesn't carry `night_plan` directly, and
    // `rehydrate_room` reconstructs the flow controller from this field.
    if room.status == RoomStatus::Ongoing {
        let assignment: Vec<(Seat, RoleId)> = room
            .players
            .values()
            .filter_map(|p| p.role.clone().map(|r| (p.seat, r)))
            .collect();
        room.night_plan = build_night_plan(&assignment);
    }
    room
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        Config::default()
    }

    #[tokio::test]
    async fn create_room_registers_a_reachable_handle() {
        let engine = GameEngine::new(&test_config());
        let (room_code, host_id) = engine.create_room().await.unwrap();
        let handle = engine.get_room(&room_code).unwrap();
        assert_eq!(handle.host_id, host_id);
        assert_eq!(engine.room_count(), 1);
    }

    #[tokio::test]
    async fn room_is_unregistered_once_its_coordinator_exits() {
        let engine = GameEngine::new(&test_config());
        let (room_code, _host_id) = engine.create_room().await.unwrap();
        let handle = engine.get_room(&room_code).unwrap();
        drop(handle.sender);

        for _ in 0..50 {
            if engine.get_room(&room_code).is_none() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert!(engine.get_room(&room_code).is_none());
    }

    #[tokio::test]
    async fn create_room_refuses_once_at_capacity() {
        let mut config = test_config();
        config.server.max_rooms = 1;
        let engine = GameEngine::new(&config);
        engine.create_room().await.unwrap();
        assert!(matches!(
            engine.create_room().await,
            Err(CreateRoomError::AtCapacity)
        ));
    }
}
