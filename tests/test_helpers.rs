//! Shared scaffolding for the integration tests in this directory: spawns a
//! real `GameCoordinator` task wired to an in-memory bus/store and drives it
//! only through its public `Envelope` inbox and `MessageBus` subscriptions,
//! the same surface a websocket connection handler uses.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use nightward_engine::config::{ProtocolConfig, ServerConfig};
use nightward_engine::coordination::{Envelope, GameCoordinator, InMemoryMessageBus, MessageBus};
use nightward_engine::database::InMemoryDurableStore;
use nightward_engine::metrics::ServerMetrics;
use nightward_engine::protocol::messages::{ClientMessage, ServerMessage};
use nightward_engine::protocol::room_state::Room;
use nightward_engine::protocol::types::{RoleId, RoomCode, Uid};
use tokio::sync::mpsc;

pub struct TestRoom {
    pub tx: mpsc::Sender<Envelope>,
    pub bus: Arc<dyn MessageBus>,
    pub room_code: RoomCode,
    pub host: Uid,
}

#[allow(dead_code)]
pub async fn spawn_room() -> TestRoom {
    spawn_room_with_config(ServerConfig::default()).await
}

#[allow(dead_code)]
pub async fn spawn_room_with_config(server_config: ServerConfig) -> TestRoom {
    let host = Uid::new_v4();
    let room_code = RoomCode("1234".to_string());
    let room = Room::new(room_code.clone(), host, Utc::now());
    let bus: Arc<dyn MessageBus> = Arc::new(InMemoryMessageBus::new());
    let store = Arc::new(InMemoryDurableStore::new());
    let metrics = Arc::new(ServerMetrics::new());
    let (coordinator, tx) = GameCoordinator::new(
        room,
        Arc::clone(&bus),
        store,
        metrics,
        ProtocolConfig::default(),
        server_config,
    );
    tokio::spawn(coordinator.run());
    TestRoom {
        tx,
        bus,
        room_code,
        host,
    }
}

#[allow(dead_code)]
pub async fn subscribe(room: &TestRoom, uid: Uid) -> mpsc::Receiver<Arc<ServerMessage>> {
    let (tx, rx) = mpsc::channel(64);
    room.bus.subscribe(room.room_code.clone(), uid, tx).await;
    rx
}

#[allow(dead_code)]
pub async fn send(room: &TestRoom, uid: Uid, message: ClientMessage) {
    room.tx
        .send(Envelope { uid, message })
        .await
        .expect("coordinator inbox closed unexpectedly");
}

/// Waits for the next message on `rx`, failing the test (rather than
/// hanging forever) if the coordinator never produces one.
#[allow(dead_code)]
pub async fn recv(rx: &mut mpsc::Receiver<Arc<ServerMessage>>) -> Arc<ServerMessage> {
    tokio::time::timeout(Duration::from_secs(1), rx.recv())
        .await
        .expect("timed out waiting for a message")
        .expect("bus channel closed unexpectedly")
}

/// Drains `rx` until a `StateUpdate` whose status matches `wanted` arrives,
/// or the deadline elapses. Several unrelated broadcasts (role turns,
/// reveals) can land ahead of the one under test; this skips past them.
#[allow(dead_code)]
pub async fn recv_state_update_with_status(
    rx: &mut mpsc::Receiver<Arc<ServerMessage>>,
    wanted: nightward_engine::protocol::room_state::RoomStatus,
) {
    tokio::time::timeout(Duration::from_secs(1), async {
        loop {
            let Some(message) = rx.recv().await else {
                panic!("bus channel closed before status {wanted:?} was observed");
            };
            if let ServerMessage::StateUpdate { state } = &*message {
                if state.status == wanted {
                    return;
                }
            }
        }
    })
    .await
    .unwrap_or_else(|_| panic!("timed out waiting for StateUpdate{{status={wanted:?}}}"));
}

/// Drains whatever is already queued on `rx` without blocking.
#[allow(dead_code)]
pub fn drain(rx: &mut mpsc::Receiver<Arc<ServerMessage>>) {
    while rx.try_recv().is_ok() {}
}

/// Sends `AssignRoles` and reads back each participant's dealt role from
/// their personal `RoleAssignment` message (sent before the shared
/// `StateUpdate` broadcast, so it's always the first thing queued for
/// them). Role dealing is shuffled, so tests that need to address a
/// specific role use this instead of assuming seat order.
#[allow(dead_code)]
pub async fn assign_roles_and_collect(
    room: &TestRoom,
    participants: &mut [(Uid, &mut mpsc::Receiver<Arc<ServerMessage>>)],
) -> HashMap<Uid, RoleId> {
    send(room, room.host, ClientMessage::AssignRoles).await;
    let mut roles = HashMap::new();
    for (uid, rx) in participants.iter_mut() {
        let message = recv(rx).await;
        match &*message {
            ServerMessage::RoleAssignment { role_id } => {
                roles.insert(*uid, role_id.clone());
            }
            other => panic!("expected RoleAssignment for {uid}, got {other:?}"),
        }
    }
    roles
}
