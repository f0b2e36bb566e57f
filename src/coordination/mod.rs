//! Message bus abstraction: broadcast-to-room and send-to-participant
//! delivery, plus the per-room subscription lifecycle. The Game
//! Coordinator never touches a transport directly; it only ever talks to
//! this trait, so swapping the in-memory fan-out for a cross-instance bus
//! later doesn't touch coordinator logic.

pub mod room_coordinator;

pub use room_coordinator::{Envelope, GameCoordinator};

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{mpsc, RwLock};

use crate::protocol::messages::ServerMessage;
use crate::protocol::types::{RoomCode, Uid};

#[async_trait::async_trait]
pub trait MessageBus: Send + Sync {
    async fn broadcast_to_room(&self, room_code: &RoomCode, message: ServerMessage);
    async fn send_to_participant(&self, room_code: &RoomCode, uid: Uid, message: ServerMessage);
    async fn subscribe(&self, room_code: RoomCode, uid: Uid, sender: mpsc::Sender<Arc<ServerMessage>>);
    async fn unsubscribe(&self, room_code: &RoomCode, uid: Uid);
    async fn release_room(&self, room_code: &RoomCode);
}

/// Single-process fan-out keyed by room code, then participant uid.
pub struct InMemoryMessageBus {
    rooms: RwLock<HashMap<RoomCode, HashMap<Uid, mpsc::Sender<Arc<ServerMessage>>>>>,
}

impl InMemoryMessageBus {
    pub fn new() -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryMessageBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl MessageBus for InMemoryMessageBus {
    async fn broadcast_to_room(&self, room_code: &RoomCode, message: ServerMessage) {
        let message = Arc::new(message);
        let rooms = self.rooms.read().await;
        if let Some(participants) = rooms.get(room_code) {
            for (uid, sender) in participants {
                if sender.try_send(Arc::clone(&message)).is_err() {
                    tracing::warn!(%room_code, %uid, "dropped broadcast message, participant inbox full or closed");
                }
            }
        }
    }

    async fn send_to_participant(&self, room_code: &RoomCode, uid: Uid, message: ServerMessage) {
        let rooms = self.rooms.read().await;
        match rooms.get(room_code).and_then(|participants| participants.get(&uid)) {
            Some(sender) => {
                if sender.try_send(Arc::new(message)).is_err() {
                    tracing::warn!(%room_code, %uid, "dropped message, participant inbox full or closed");
                }
            }
            None => tracing::debug!(%room_code, %uid, "participant not subscribed; message dropped"),
        }
    }

    async fn subscribe(
        &self,
        room_code: RoomCode,
        uid: Uid,
        sender: mpsc::Sender<Arc<ServerMessage>>,
    ) {
        let mut rooms = self.rooms.write().await;
        rooms.entry(room_code).or_default().insert(uid, sender);
    }

    async fn unsubscribe(&self, room_code: &RoomCode, uid: Uid) {
        let mut rooms = self.rooms.write().await;
        if let Some(participants) = rooms.get_mut(room_code) {
            participants.remove(&uid);
        }
    }

    async fn release_room(&self, room_code: &RoomCode) {
        let mut rooms = self.rooms.write().await;
        rooms.remove(room_code);
    }
}
