//! End-to-end night-phase tests: drive a room from lobby through the night
//! flow purely over its public `Envelope`/`MessageBus` surface, asserting on
//! what participants actually receive rather than internal coordinator
//! state. Role dealing is shuffled by the coordinator itself, so these
//! tests read back each participant's dealt role from their personal
//! `RoleAssignment` message instead of assuming a seat order.

mod test_helpers;

use std::collections::HashMap;
use std::sync::Arc;

use nightward_engine::night::action::{encode_magician_swap, ActionWire};
use nightward_engine::protocol::error_codes::ActionRejectedReason;
use nightward_engine::protocol::messages::{ClientMessage, ServerMessage};
use nightward_engine::protocol::types::{RoleId, Seat, SeerResult, Uid};
use test_helpers::{assign_roles_and_collect, drain, recv, send, spawn_room, subscribe, TestRoom};

type Rx = tokio::sync::mpsc::Receiver<Arc<ServerMessage>>;

fn uid_with_role(roles: &HashMap<Uid, RoleId>, role: &str) -> Uid {
    *roles
        .iter()
        .find(|(_, r)| r.as_str() == role)
        .unwrap_or_else(|| panic!("no seat was dealt role {role}"))
        .0
}

/// Seats every `(uid, seat, name)` under `template`, deals roles, and has
/// everyone view their role. Returns the dealt uid -> role map and each
/// participant's bus subscription, so a caller can look a role up and act
/// (or listen) as whichever uid actually received it.
async fn seat_assign_and_view(
    room: &TestRoom,
    template_name: &str,
    roles: Vec<RoleId>,
    seats: &[(Uid, Seat, &str)],
) -> (HashMap<Uid, RoleId>, HashMap<Uid, Rx>) {
    send(
        room,
        room.host,
        ClientMessage::SetTemplate {
            name: template_name.to_string(),
            roles,
        },
    )
    .await;
    for (uid, seat, name) in seats {
        send(
            room,
            *uid,
            ClientMessage::TakeSeat {
                seat: *seat,
                display_name: (*name).to_string(),
            },
        )
        .await;
    }

    let mut rxs: HashMap<Uid, Rx> = HashMap::new();
    for (uid, _, _) in seats {
        rxs.insert(*uid, subscribe(room, *uid).await);
    }
    let mut refs: Vec<(Uid, &mut Rx)> = rxs.iter_mut().map(|(uid, rx)| (*uid, rx)).collect();
    let dealt = assign_roles_and_collect(room, &mut refs).await;
    for rx in rxs.values_mut() {
        drain(rx);
    }

    for (uid, _, _) in seats {
        send(room, *uid, ClientMessage::ViewRole).await;
    }
    (dealt, rxs)
}

#[tokio::test]
async fn duplicate_action_submission_is_rejected() {
    let room = spawn_room().await;
    let guest = Uid::new_v4();

    let (dealt, mut rxs) = seat_assign_and_view(
        &room,
        "duo",
        vec![RoleId::new("guard"), RoleId::new("villager")],
        &[(room.host, Seat(0), "Host"), (guest, Seat(1), "Guest")],
    )
    .await;
    let guard_uid = uid_with_role(&dealt, "guard");
    let guard_seat = if guard_uid == room.host { Seat(0) } else { Seat(1) };
    let mut guard_rx = rxs.remove(&guard_uid).unwrap();

    send(&room, room.host, ClientMessage::StartNight).await;
    drain(&mut guard_rx);
    send(&room, room.host, ClientMessage::NightBeginAudioDone).await;
    send(&room, room.host, ClientMessage::RoleBeginAudioDone).await;

    let other_seat = if guard_seat == Seat(0) { Seat(1) } else { Seat(0) };
    let wire = ActionWire {
        target: Some(i32::from(other_seat.0)),
        save: false,
        poison: false,
    };
    send(
        &room,
        guard_uid,
        ClientMessage::SubmitAction {
            role_id: RoleId::new("guard"),
            wire: wire.clone(),
        },
    )
    .await;
    // Guard has no reveal of its own, so a successful submission produces
    // no message at all; only a rejection would show up here.
    if let Ok(Ok(unexpected)) =
        tokio::time::timeout(std::time::Duration::from_millis(150), guard_rx.recv()).await
    {
        assert!(
            !matches!(&*unexpected, ServerMessage::ActionRejected { .. }),
            "first guard submission must be accepted, got {unexpected:?}"
        );
    }

    send(
        &room,
        guard_uid,
        ClientMessage::SubmitAction {
            role_id: RoleId::new("guard"),
            wire,
        },
    )
    .await;
    let second = recv(&mut guard_rx).await;
    assert!(
        matches!(
            &*second,
            ServerMessage::ActionRejected {
                reason: ActionRejectedReason::WrongPhase
            }
        ),
        "resubmitting the same role after it already advanced the night must be rejected, got {second:?}"
    );
}

#[tokio::test]
async fn nightmare_block_suppresses_the_seer_step_without_a_reveal() {
    let room = spawn_room().await;
    let p2 = Uid::new_v4();
    let p3 = Uid::new_v4();
    let p4 = Uid::new_v4();
    let seat_of: HashMap<Uid, Seat> = HashMap::from([
        (room.host, Seat(0)),
        (p2, Seat(1)),
        (p3, Seat(2)),
        (p4, Seat(3)),
    ]);

    let (dealt, mut rxs) = seat_assign_and_view(
        &room,
        "quad",
        vec![
            RoleId::new("nightmare"),
            RoleId::new("seer"),
            RoleId::new("wolf"),
            RoleId::new("villager"),
        ],
        &[
            (room.host, Seat(0), "P1"),
            (p2, Seat(1), "P2"),
            (p3, Seat(2), "P3"),
            (p4, Seat(3), "P4"),
        ],
    )
    .await;
    let nightmare_uid = uid_with_role(&dealt, "nightmare");
    let wolf_uid = uid_with_role(&dealt, "wolf");
    let seer_uid = uid_with_role(&dealt, "seer");
    let villager_seat = seat_of[&uid_with_role(&dealt, "villager")];
    let seer_seat = seat_of[&seer_uid];
    let mut seer_rx = rxs.remove(&seer_uid).unwrap();
    let mut host_rx = rxs.remove(&room.host).unwrap();

    send(&room, room.host, ClientMessage::StartNight).await;

    // Step 0 is the consolidated wolf-meeting (nightmare + wolf).
    drain(&mut host_rx);
    send(&room, room.host, ClientMessage::NightBeginAudioDone).await;
    send(&room, room.host, ClientMessage::RoleBeginAudioDone).await;

    // Nightmare targets the seer to block her; the wolf votes for the
    // villager so the kill target differs from the block target.
    send(
        &room,
        nightmare_uid,
        ClientMessage::WolfVote {
            target_seat: Some(seer_seat),
        },
    )
    .await;
    send(
        &room,
        wolf_uid,
        ClientMessage::WolfVote {
            target_seat: Some(villager_seat),
        },
    )
    .await;

    drain(&mut seer_rx);

    // Advance into the seer's step; the block must auto-resolve it without
    // ever prompting for an action or sending a reveal.
    send(&room, room.host, ClientMessage::RoleEndAudioDone).await;
    send(&room, room.host, ClientMessage::RoleBeginAudioDone).await;

    let mut received = Vec::new();
    while let Ok(Ok(message)) =
        tokio::time::timeout(std::time::Duration::from_millis(200), seer_rx.recv()).await
    {
        received.push(message);
    }
    assert!(
        !received
            .iter()
            .any(|m: &Arc<ServerMessage>| matches!(**m, ServerMessage::SeerReveal { .. })),
        "a nightmare-blocked seer must not receive SEER_REVEAL, got {received:?}"
    );
}

#[tokio::test]
async fn magician_swap_reroutes_the_seer_reveal_to_the_swapped_occupant() {
    // Seats 3 and 5 are fixed at take-seat time; the magician swaps them,
    // and whoever was dealt "seer" then targets seat 3 and must see seat
    // 5's occupant's result, while the reveal's `targetSeat` still names
    // the seat she literally clicked.
    let room = spawn_room().await;
    let p1 = Uid::new_v4();
    let p2 = Uid::new_v4();
    let p3 = Uid::new_v4();
    let p4 = Uid::new_v4();
    let p5 = Uid::new_v4();

    let (dealt, mut rxs) = seat_assign_and_view(
        &room,
        "hex",
        vec![
            RoleId::new("magician"),
            RoleId::new("seer"),
            RoleId::new("villager"),
            RoleId::new("villager"),
            RoleId::new("villager"),
            RoleId::new("wolf"),
        ],
        &[
            (room.host, Seat(0), "P0"),
            (p1, Seat(1), "P1"),
            (p2, Seat(2), "P2"),
            (p3, Seat(3), "P3"),
            (p4, Seat(4), "P4"),
            (p5, Seat(5), "P5"),
        ],
    )
    .await;
    let magician_uid = uid_with_role(&dealt, "magician");
    let seer_uid = uid_with_role(&dealt, "seer");
    let wolf_uid = uid_with_role(&dealt, "wolf");
    let mut seer_rx = rxs.remove(&seer_uid).unwrap();
    let mut magician_rx = rxs.remove(&magician_uid).unwrap();

    send(&room, room.host, ClientMessage::StartNight).await;

    // Step 0: the magician swaps seats 3 and 5.
    drain(&mut magician_rx);
    send(&room, room.host, ClientMessage::NightBeginAudioDone).await;
    send(&room, room.host, ClientMessage::RoleBeginAudioDone).await;
    let swap_wire = ActionWire {
        target: Some(encode_magician_swap(Seat(3), Seat(5))),
        save: false,
        poison: false,
    };
    send(
        &room,
        magician_uid,
        ClientMessage::SubmitAction {
            role_id: RoleId::new("magician"),
            wire: swap_wire,
        },
    )
    .await;

    // Step 1 is the consolidated wolf-meeting; the lone wolf votes to move
    // the night along.
    send(&room, room.host, ClientMessage::RoleEndAudioDone).await;
    send(&room, room.host, ClientMessage::RoleBeginAudioDone).await;
    send(
        &room,
        wolf_uid,
        ClientMessage::WolfVote {
            target_seat: Some(Seat(2)),
        },
    )
    .await;

    // Step 2: the seer targets seat 3 -- the seat the magician moved the
    // seat-5 occupant into.
    send(&room, room.host, ClientMessage::RoleEndAudioDone).await;
    send(&room, room.host, ClientMessage::RoleBeginAudioDone).await;
    drain(&mut seer_rx);
    let seer_wire = ActionWire {
        target: Some(3),
        save: false,
        poison: false,
    };
    send(
        &room,
        seer_uid,
        ClientMessage::SubmitAction {
            role_id: RoleId::new("seer"),
            wire: seer_wire,
        },
    )
    .await;

    let message = recv(&mut seer_rx).await;
    assert!(
        matches!(
            &*message,
            ServerMessage::SeerReveal {
                target_seat: Seat(3),
                result: SeerResult::Wolf,
            }
        ),
        "seer checking seat 3 after a 3<->5 swap must see seat 5's (wolf) result while \
         targetSeat stays the literally-clicked seat, got {message:?}"
    );
}

#[tokio::test]
async fn target_schema_role_cannot_target_its_own_seat() {
    let room = spawn_room().await;
    let guest = Uid::new_v4();

    let (dealt, mut rxs) = seat_assign_and_view(
        &room,
        "duo",
        vec![RoleId::new("guard"), RoleId::new("villager")],
        &[(guest, Seat(0), "Guest"), (room.host, Seat(1), "Host")],
    )
    .await;
    let guard_uid = uid_with_role(&dealt, "guard");
    let guard_seat = if guard_uid == guest { Seat(0) } else { Seat(1) };
    let mut guard_rx = rxs.remove(&guard_uid).unwrap();

    send(&room, room.host, ClientMessage::StartNight).await;
    drain(&mut guard_rx);
    send(&room, room.host, ClientMessage::NightBeginAudioDone).await;
    send(&room, room.host, ClientMessage::RoleBeginAudioDone).await;

    drain(&mut guard_rx);
    let wire = ActionWire {
        target: Some(i32::from(guard_seat.0)),
        save: false,
        poison: false,
    };
    send(
        &room,
        guard_uid,
        ClientMessage::SubmitAction {
            role_id: RoleId::new("guard"),
            wire,
        },
    )
    .await;

    let message = recv(&mut guard_rx).await;
    assert!(
        matches!(
            &*message,
            ServerMessage::ActionRejected {
                reason: ActionRejectedReason::IllegalTarget
            }
        ),
        "guard targeting herself must get ACTION_REJECTED{{illegalTarget}}, got {message:?}"
    );
}
