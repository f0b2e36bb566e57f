//! Game Coordinator: the single-threaded, per-room actor that owns a
//! [`Room`] and drives it through seat lifecycle, role assignment, and the
//! night flow. One coordinator task runs per live room; rooms never share
//! mutable state, so no lock guards this struct's fields.

use std::sync::Arc;

use chrono::Utc;
use rand::seq::SliceRandom;
use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::coordination::MessageBus;
use crate::config::{ProtocolConfig, ServerConfig};
use crate::database::{DurableStore, RoomSnapshot};
use crate::metrics::ServerMetrics;
use crate::night::action::{decode_magician_swap, decode_target, Action, ActionWire};
use crate::night::flow::{Effect, Event, NightFlowController, Phase};
use crate::night::reveal;
use crate::night::resolver;
use crate::protocol::error_codes::{ActionRejectedReason, RoomFaultReason};
use crate::protocol::messages::{ClientMessage, RoleTurnInfo, RoomPublicView, SeatView, ServerMessage};
use crate::protocol::room_state::{Room, RoomStateError, RoomStatus};
use crate::protocol::types::{RoleId, Seat, Uid};
use crate::protocol::validation;
use crate::roles::{self, SchemaId};

/// One inbound message from a participant, addressed by the coordinator
/// this room's connection layer routes it to.
#[derive(Debug, Clone)]
pub struct Envelope {
    pub uid: Uid,
    pub message: ClientMessage,
}

pub struct GameCoordinator {
    room: Room,
    flow: Option<NightFlowController>,
    faulted: bool,
    bus: Arc<dyn MessageBus>,
    store: Arc<dyn DurableStore>,
    metrics: Arc<ServerMetrics>,
    protocol_config: ProtocolConfig,
    server_config: ServerConfig,
    inbox: mpsc::Receiver<Envelope>,
    /// Deadline for the step currently in `Phase::WaitingForAction`, armed
    /// by `EnterRoleTurn` and cleared once the step's action lands or the
    /// night ends. `None` whenever no timer applies (most steps, unless
    /// `enable_per_step_timeout` is set) or `Phase` isn't `WaitingForAction`.
    step_deadline: Option<Instant>,
}

impl GameCoordinator {
    pub fn new(
        room: Room,
        bus: Arc<dyn MessageBus>,
        store: Arc<dyn DurableStore>,
        metrics: Arc<ServerMetrics>,
        protocol_config: ProtocolConfig,
        server_config: ServerConfig,
    ) -> (Self, mpsc::Sender<Envelope>) {
        let buffer = server_config.event_buffer_size.max(16);
        let (tx, rx) = mpsc::channel(buffer);
        (
            Self {
                room,
                flow: None,
                faulted: false,
                bus,
                store,
                metrics,
                protocol_config,
                server_config,
                inbox: rx,
                step_deadline: None,
            },
            tx,
        )
    }

    /// Drains the inbox until the channel closes (every sender dropped,
    /// i.e. the room's last connection handler has gone away), the room
    /// sits idle past its configured timeout, or a strict invariant
    /// violation faults the room. When a step deadline is armed, races it
    /// against the inbox so a silent night step can't hang the room
    /// forever (spec.md §9 "enable an optional per-step auto-action once a
    /// step's deadline elapses").
    pub async fn run(mut self) {
        let mut cleanup_tick = tokio::time::interval(self.server_config.room_cleanup_interval());
        cleanup_tick.tick().await; // first tick fires immediately
        loop {
            let envelope = match self.step_deadline {
                Some(deadline) => {
                    tokio::select! {
                        envelope = self.inbox.recv() => envelope,
                        () = tokio::time::sleep_until(deadline) => {
                            self.handle_step_timeout().await;
                            if self.faulted {
                                break;
                            }
                            continue;
                        }
                        _ = cleanup_tick.tick() => {
                            if self.is_expired() {
                                tracing::info!(room_code = %self.room.room_code, "room expired, tearing down");
                                break;
                            }
                            continue;
                        }
                    }
                }
                None => {
                    tokio::select! {
                        envelope = self.inbox.recv() => envelope,
                        _ = cleanup_tick.tick() => {
                            if self.is_expired() {
                                tracing::info!(room_code = %self.room.room_code, "room expired, tearing down");
                                break;
                            }
                            continue;
                        }
                    }
                }
            };
            let Some(envelope) = envelope else {
                break;
            };
            self.handle_envelope(envelope).await;
            if self.faulted {
                break;
            }
        }
        self.bus.release_room(&self.room.room_code).await;
    }

    /// Installs a flow controller reconstructed from a rehydrated snapshot
    /// (spec.md §4.7). Must be called before `run()` whenever the room's
    /// status is `Ongoing`, or the strict invariant check in
    /// `handle_envelope` will fault the room on its first message.
    pub fn install_rehydrated_flow(&mut self, flow: NightFlowController) {
        self.flow = Some(flow);
    }

    /// Fires when `step_deadline` elapses while still `WaitingForAction`.
    /// Finalizes the wolf-meeting ballot on whatever partial tally it has,
    /// or submits `Action::None` for any other step, then advances the
    /// flow exactly as a real submission would.
    async fn handle_step_timeout(&mut self) {
        self.step_deadline = None;
        let Some(step) = self.flow.as_ref().and_then(|f| match f.phase() {
            Phase::WaitingForAction { step } => Some(*step),
            _ => None,
        }) else {
            return;
        };
        let Some(step_data) = self.flow.as_ref().and_then(|f| f.plan().get(step).cloned()) else {
            return;
        };

        if step_data.schema == SchemaId::WolfVote {
            let wolf_key = resolver::wolf_action_key();
            if !self.room.actions.contains_key(&wolf_key) {
                let tally = {
                    let room = &self.room;
                    room.wolf_votes.tally(|seat| room.is_alive(seat))
                };
                self.room.actions.insert(wolf_key, tally);
                self.resolve_nightmare_block();
                self.metrics.record_action_accepted();
                tracing::info!(room_code = %self.room.room_code, "wolf vote deadline elapsed, finalizing partial tally");
                self.advance_flow(Event::ActionSubmitted).await;
                self.persist().await;
            }
            return;
        }

        let action_key = resolver::action_key_for_step(&step_data);
        if !self.room.actions.contains_key(&action_key) {
            tracing::info!(room_code = %self.room.room_code, role_id = %step_data.role_id, "per-step timeout elapsed, submitting no-op action");
            self.room.actions.insert(action_key, Action::None);
            self.metrics.record_action_accepted();
            self.advance_flow(Event::ActionSubmitted).await;
            self.persist().await;
        }
    }

    /// Whether this room has sat empty past `empty_room_timeout` or idle
    /// past `inactive_room_timeout` (spec.md §5 shared-resource policy;
    /// `config::ServerConfig`'s room lifecycle knobs).
    fn is_expired(&self) -> bool {
        self.room.is_expired(
            Utc::now(),
            chrono::Duration::seconds(self.server_config.empty_room_timeout as i64),
            chrono::Duration::seconds(self.server_config.inactive_room_timeout as i64),
        )
    }

    /// Reads nightmare's individual wolf-meeting ballot (distinct from the
    /// tallied kill outcome) and binds it as this night's block target
    /// (spec.md §4.5/§GLOSSARY "Nightmare block"). A no-op if no seat holds
    /// `nightmare` or she didn't vote.
    fn resolve_nightmare_block(&mut self) {
        let nightmare = RoleId::new("nightmare");
        let Some(seat) = self.room.seat_with_role(&nightmare) else {
            return;
        };
        if let Some(Some(target)) = self.room.wolf_votes.vote_of(seat) {
            self.room.nightmare_blocked_seat = Some(target);
        }
    }

    fn arm_step_deadline(&mut self, step_data: &crate::night::plan::NightStep) {
        self.step_deadline = if step_data.schema == SchemaId::WolfVote {
            Some(Instant::now() + self.server_config.wolf_vote_deadline())
        } else {
            self.server_config
                .per_step_timeout()
                .map(|timeout| Instant::now() + timeout)
        };
    }

    async fn handle_envelope(&mut self, envelope: Envelope) {
        let Envelope { uid, message } = envelope;
        self.room.touch(Utc::now());
        // spec.md §4.3/§7 strict invariant: `status = ongoing` implies a
        // live flow controller. A room rehydrated from a snapshot without
        // reconstructing its controller (or any other path that lets the
        // two fall out of sync) must fault here rather than silently
        // rejecting every subsequent action forever.
        if self.room.status == RoomStatus::Ongoing && self.flow.is_none() {
            self.apply_effect(Effect::FatalMissingPlan).await;
            return;
        }
        match message {
            ClientMessage::Hello { .. } => self.handle_hello(uid).await,
            ClientMessage::SetTemplate { name, roles } => {
                self.handle_set_template(uid, name, roles).await
            }
            ClientMessage::TakeSeat { seat, display_name } => {
                self.handle_take_seat(uid, seat, display_name).await
            }
            ClientMessage::LeaveSeat => self.handle_leave_seat(uid).await,
            ClientMessage::ViewRole => self.handle_view_role(uid).await,
            ClientMessage::AssignRoles => self.handle_assign_roles(uid).await,
            ClientMessage::StartNight => self.handle_start_night(uid).await,
            ClientMessage::SubmitAction { role_id, wire } => {
                self.handle_submit_action(uid, role_id, wire).await
            }
            ClientMessage::WolfVote { target_seat } => self.handle_wolf_vote(uid, target_seat).await,
            ClientMessage::NightBeginAudioDone => {
                self.require_host_then(uid, Event::NightBeginAudioDone).await
            }
            ClientMessage::RoleBeginAudioDone => {
                self.require_host_then(uid, Event::RoleBeginAudioDone).await
            }
            ClientMessage::RoleEndAudioDone => {
                self.require_host_then(uid, Event::RoleEndAudioDone).await
            }
            ClientMessage::NightEndAudioDone => {
                self.require_host_then(uid, Event::NightEndAudioDone).await
            }
        }
    }

    async fn handle_hello(&self, uid: Uid) {
        let your_role_id = self.room.seat_of(uid).and_then(|s| self.room.role_at(s));
        let role_turn = self.flow.as_ref().and_then(|flow| match flow.phase() {
            Phase::RoleBeginAudio { step } | Phase::WaitingForAction { step } | Phase::RoleEndAudio { step } => {
                flow.plan().get(*step).map(|s| RoleTurnInfo {
                    role_id: s.role_id.clone(),
                    step_index: *step,
                })
            }
            _ => None,
        });
        self.bus
            .send_to_participant(
                &self.room.room_code,
                uid,
                ServerMessage::WelcomeBack {
                    state: self.public_view(),
                    your_role_id,
                    // No per-participant reveal replay log is kept; a
                    // rejoining participant only recovers the current
                    // public/private snapshot, not reveals missed while
                    // disconnected.
                    pending_reveals: Vec::new(),
                    role_turn,
                },
            )
            .await;
    }

    async fn handle_set_template(&mut self, uid: Uid, name: String, roles: Vec<RoleId>) {
        if uid != self.room.host_id {
            self.reject(uid, ActionRejectedReason::WrongRole).await;
            return;
        }
        let template = crate::protocol::room_state::Template { name, roles };
        if let Err(reason) = validation::validate_template(&template, &self.protocol_config)
            .and_then(|()| validation::validate_player_count(template.player_count(), &self.server_config))
        {
            tracing::debug!(room_code = %self.room.room_code, %reason, "rejected template");
            self.reject(uid, ActionRejectedReason::IllegalTarget).await;
            return;
        }
        if self.room.set_template(template).is_err() {
            self.reject(uid, ActionRejectedReason::WrongPhase).await;
            return;
        }
        self.broadcast_state().await;
        self.persist().await;
    }

    async fn handle_take_seat(&mut self, uid: Uid, seat: Seat, display_name: String) {
        if let Err(reason) = validation::validate_display_name(&display_name, &self.protocol_config) {
            tracing::debug!(room_code = %self.room.room_code, %reason, "rejected display name");
            self.reject(uid, ActionRejectedReason::IllegalTarget).await;
            return;
        }
        match self.room.take_seat(uid, seat, display_name) {
            Ok(()) => {
                self.broadcast_state().await;
                self.persist().await;
            }
            Err(RoomStateError::SeatOccupied(_)) | Err(RoomStateError::SeatOutOfRange(_)) => {
                self.reject(uid, ActionRejectedReason::IllegalTarget).await
            }
            Err(_) => self.reject(uid, ActionRejectedReason::WrongPhase).await,
        }
    }

    async fn handle_leave_seat(&mut self, uid: Uid) {
        match self.room.leave_seat(uid) {
            Ok(()) => {
                self.broadcast_state().await;
                self.persist().await;
            }
            Err(_) => self.reject(uid, ActionRejectedReason::WrongPhase).await,
        }
    }

    async fn handle_view_role(&mut self, uid: Uid) {
        match self.room.mark_role_viewed(uid) {
            Ok(()) => {
                self.broadcast_state().await;
                self.persist().await;
            }
            Err(_) => self.reject(uid, ActionRejectedReason::WrongPhase).await,
        }
    }

    async fn handle_assign_roles(&mut self, uid: Uid) {
        if uid != self.room.host_id {
            self.reject(uid, ActionRejectedReason::WrongRole).await;
            return;
        }
        let mut rng = rand::rng();
        let assigned = self.room.assign_roles(|mut roles| {
            roles.shuffle(&mut rng);
            roles
        });
        if assigned.is_err() {
            self.reject(uid, ActionRejectedReason::WrongPhase).await;
            return;
        }
        let dealt: Vec<(Uid, RoleId)> = self
            .room
            .players
            .values()
            .filter_map(|p| p.role.clone().map(|r| (p.uid, r)))
            .collect();
        for (participant, role_id) in dealt {
            self.bus
                .send_to_participant(&self.room.room_code, participant, ServerMessage::RoleAssignment { role_id })
                .await;
        }
        self.broadcast_state().await;
        self.persist().await;
    }

    async fn handle_start_night(&mut self, uid: Uid) {
        if uid != self.room.host_id {
            self.reject(uid, ActionRejectedReason::WrongRole).await;
            return;
        }
        if self.room.start_night().is_err() {
            self.reject(uid, ActionRejectedReason::WrongPhase).await;
            return;
        }
        self.flow = Some(NightFlowController::new(self.room.night_plan.clone()));
        self.advance_flow(Event::StartNight).await;
        self.persist().await;
    }

    async fn require_host_then(&mut self, uid: Uid, event: Event) {
        if uid != self.room.host_id {
            self.reject(uid, ActionRejectedReason::WrongRole).await;
            return;
        }
        self.advance_flow(event).await;
        self.persist().await;
    }

    async fn handle_wolf_vote(&mut self, uid: Uid, target_seat: Option<Seat>) {
        // Room-scope gate (spec.md §4.4 gate 1): a non-participant is
        // dropped silently, before any phase/role gate gets a chance to
        // answer with a misleading ACTION_REJECTED.
        let Some(seat) = self.room.seat_of(uid) else {
            tracing::debug!(room_code = %self.room.room_code, %uid, "ignoring wolf vote from a non-participant");
            return;
        };
        if self.room.status != RoomStatus::Ongoing {
            self.reject(uid, ActionRejectedReason::WrongPhase).await;
            return;
        }
        let on_wolf_step = matches!(
            self.flow.as_ref().and_then(|f| f.current_step()).map(|s| s.schema),
            Some(SchemaId::WolfVote)
        );
        if !on_wolf_step {
            self.reject(uid, ActionRejectedReason::WrongPhase).await;
            return;
        }
        let actor_seats = self
            .flow
            .as_ref()
            .and_then(|f| f.current_step())
            .map(|s| s.actor_seats.clone())
            .unwrap_or_default();
        if !actor_seats.contains(&seat) || !self.room.is_alive(seat) {
            self.reject(uid, ActionRejectedReason::WrongRole).await;
            return;
        }
        if let Some(target) = target_seat {
            if !self.room.is_alive(target) {
                self.reject(uid, ActionRejectedReason::IllegalTarget).await;
                return;
            }
            let target_immune = self
                .room
                .role_at(target)
                .map(|r| roles::get(&r).flags.immune_to_wolf_kill)
                .unwrap_or(false);
            if target_immune {
                self.reject(uid, ActionRejectedReason::IllegalTarget).await;
                return;
            }
        }

        self.room.wolf_votes.cast(seat, target_seat);
        self.metrics.record_wolf_vote_cast();
        let live_voters = self.room.live_wolf_meeting_seats();
        if !self.room.wolf_votes.quorum_reached(&live_voters) {
            self.broadcast_state().await;
            return;
        }

        let wolf_key = resolver::wolf_action_key();
        if !self.room.actions.contains_key(&wolf_key) {
            let tally = {
                let room = &self.room;
                room.wolf_votes.tally(|seat| room.is_alive(seat))
            };
            self.room.actions.insert(wolf_key, tally);
            self.resolve_nightmare_block();
            self.metrics.record_action_accepted();
            self.advance_flow(Event::ActionSubmitted).await;
            self.persist().await;
        }
    }

    async fn handle_submit_action(&mut self, uid: Uid, role_id: RoleId, wire: ActionWire) {
        // Room-scope gate (spec.md §4.4 gate 1): a non-participant is
        // dropped silently, ahead of the phase/role gates, so it can never
        // be conflated with a seated player acting out of turn.
        let Some(seat) = self.room.seat_of(uid) else {
            tracing::debug!(room_code = %self.room.room_code, %uid, "ignoring action submission from a non-participant");
            return;
        };
        if self.room.status != RoomStatus::Ongoing {
            self.reject(uid, ActionRejectedReason::WrongPhase).await;
            return;
        }
        let Some(step) = self.flow.as_ref().and_then(|f| match f.phase() {
            Phase::WaitingForAction { step } => Some(*step),
            _ => None,
        }) else {
            self.reject(uid, ActionRejectedReason::WrongPhase).await;
            return;
        };
        let Some(step_data) = self.flow.as_ref().and_then(|f| f.plan().get(step).cloned()) else {
            self.reject(uid, ActionRejectedReason::WrongPhase).await;
            return;
        };
        if step_data.role_id != role_id || step_data.schema == SchemaId::WolfVote {
            self.reject(uid, ActionRejectedReason::WrongPhase).await;
            return;
        }
        if !step_data.actor_seats.contains(&seat) || !self.room.is_alive(seat) {
            self.reject(uid, ActionRejectedReason::WrongRole).await;
            return;
        }
        let action_key = resolver::action_key_for_step(&step_data);
        if self.room.actions.contains_key(&action_key) {
            self.reject(uid, ActionRejectedReason::Duplicate).await;
            return;
        }

        let player_count = self.room.players.len() as u8;
        let action = match step_data.schema {
            SchemaId::Target => self.decode_target_action(seat, &wire, player_count, &role_id),
            SchemaId::Witch => self.decode_witch_action(seat, &wire, player_count),
            SchemaId::MagicianSwap => self.decode_magician_action(&wire, player_count),
            SchemaId::WolfVote => unreachable!("excluded above"),
        };
        let action = match action {
            Ok(action) => action,
            Err(reason) => {
                self.reject(uid, reason).await;
                return;
            }
        };

        // spec.md §4.6 step 6 / §8 scenario 4: a target acted on after the
        // magician's step is *read* through her swap — the seat the actor
        // named (`target_seat` on the wire reveal) stays literal, but the
        // occupant/role it resolves to is whoever the swap moved there.
        let plan = self.flow.as_ref().map(|f| f.plan()).unwrap_or(&[]);
        let actions = &self.room.actions;
        let remapped_role_at = |s: Seat| -> Option<RoleId> {
            self.room
                .role_at(resolver::remap_through_magician_swap(plan, actions, &action_key, s))
        };
        let remapped_display_name_at = |s: Seat| -> String {
            self.room
                .display_name_at(resolver::remap_through_magician_swap(plan, actions, &action_key, s))
        };

        if let Some(reveal) = reveal::reveal_for_submission(&role_id, &action, remapped_role_at, remapped_display_name_at) {
            self.bus
                .send_to_participant(&self.room.room_code, uid, ServerMessage::from_reveal(reveal))
                .await;
            self.metrics.record_reveal_sent();
        }

        self.room.actions.insert(action_key, action);
        self.metrics.record_action_accepted();
        self.advance_flow(Event::ActionSubmitted).await;
        self.persist().await;
    }

    fn decode_target_action(
        &self,
        actor_seat: Seat,
        wire: &ActionWire,
        player_count: u8,
        role_id: &RoleId,
    ) -> Result<Action, ActionRejectedReason> {
        let target = decode_target(wire, player_count).map_err(|_| ActionRejectedReason::IllegalTarget)?;
        if let Some(target) = target {
            if !self.room.is_alive(target) {
                return Err(ActionRejectedReason::IllegalTarget);
            }
            if target == actor_seat && !roles::get(role_id).flags.can_target_self {
                return Err(ActionRejectedReason::IllegalTarget);
            }
            if role_id.as_str() == "guard" && Some(target) == self.room.last_protected_seat {
                return Err(ActionRejectedReason::IllegalTarget);
            }
        }
        Ok(Action::Target { seat: target })
    }

    fn decode_witch_action(
        &self,
        seat: Seat,
        wire: &ActionWire,
        player_count: u8,
    ) -> Result<Action, ActionRejectedReason> {
        if wire.save && wire.poison {
            return Err(ActionRejectedReason::IllegalTarget);
        }
        let raw_wolf_target = match self.room.actions.get(&resolver::wolf_action_key()) {
            Some(Action::Target { seat: Some(victim) }) => Some(*victim),
            _ => None,
        };
        if wire.save {
            let witch = roles::get(&resolver::witch_action_key());
            let can_save = match raw_wolf_target {
                Some(victim) if victim == seat => witch.flags.can_save_self,
                Some(_) => true,
                None => false,
            };
            if !can_save {
                return Err(ActionRejectedReason::IllegalTarget);
            }
            return Ok(Action::Witch {
                save: true,
                poison: false,
                target_seat: None,
            });
        }
        if wire.poison {
            let target = decode_target(wire, player_count)
                .map_err(|_| ActionRejectedReason::IllegalTarget)?
                .ok_or(ActionRejectedReason::IllegalTarget)?;
            if !self.room.is_alive(target) {
                return Err(ActionRejectedReason::IllegalTarget);
            }
            return Ok(Action::Witch {
                save: false,
                poison: true,
                target_seat: Some(target),
            });
        }
        Ok(Action::Witch {
            save: false,
            poison: false,
            target_seat: None,
        })
    }

    fn decode_magician_action(&self, wire: &ActionWire, player_count: u8) -> Result<Action, ActionRejectedReason> {
        let raw = wire.target.unwrap_or(-1);
        let (first, second) =
            decode_magician_swap(raw, player_count).map_err(|_| ActionRejectedReason::IllegalTarget)?;
        if !self.room.is_alive(first) || !self.room.is_alive(second) {
            return Err(ActionRejectedReason::IllegalTarget);
        }
        Ok(Action::MagicianSwap {
            first_seat: first,
            second_seat: second,
        })
    }

    /// Drives `event` through the flow controller, then keeps looping
    /// whenever the applied effect hands back a follow-up event (e.g. a
    /// nightmare-blocked step auto-submitting `Action::None`) so a blocked
    /// step never waits on a participant who cannot act. A plain `while
    /// let`, not recursion, since two mutually-recursive `async fn`s would
    /// need an unboundedly-sized future.
    async fn advance_flow(&mut self, mut event: Event) {
        loop {
            let Some(flow) = self.flow.as_mut() else {
                return;
            };
            let effect = flow.handle(event);
            if let Some(fatal) = flow.assert_consistent() {
                self.apply_effect(fatal).await;
                return;
            }
            let Some(effect) = effect else {
                return;
            };
            match self.apply_effect(effect).await {
                Some(next) => event = next,
                None => return,
            }
        }
    }

    /// Applies one controller effect. Returns `Some(event)` when the effect
    /// itself determines the next event to feed the controller (nightmare
    /// auto-advance); `advance_flow`'s loop picks it up without recursing.
    async fn apply_effect(&mut self, effect: Effect) -> Option<Event> {
        match effect {
            Effect::BeginNightAudio => {
                self.broadcast_state().await;
            }
            Effect::EnterRoleTurn { step } => {
                self.room.current_step_index = step;
                let Some(step_data) = self.flow.as_ref().and_then(|f| f.plan().get(step).cloned()) else {
                    return None;
                };
                self.bus
                    .broadcast_to_room(
                        &self.room.room_code,
                        ServerMessage::RoleTurn {
                            role_id: step_data.role_id.clone(),
                            step_index: step,
                        },
                    )
                    .await;

                let blocked = step_data.schema != SchemaId::WolfVote
                    && step_data
                        .actor_seats
                        .iter()
                        .any(|seat| Some(*seat) == self.room.nightmare_blocked_seat);
                if blocked {
                    tracing::info!(
                        room_code = %self.room.room_code,
                        role_id = %step_data.role_id,
                        "role turn suppressed by nightmare block, advancing without action or reveal"
                    );
                    let action_key = resolver::action_key_for_step(&step_data);
                    if !self.room.actions.contains_key(&action_key) {
                        self.room.actions.insert(action_key, Action::None);
                        self.metrics.record_action_accepted();
                    }
                    return Some(Event::ActionSubmitted);
                }

                self.arm_step_deadline(&step_data);
                if step_data.schema == SchemaId::Witch {
                    let raw_wolf_target = match self.room.actions.get(&resolver::wolf_action_key()) {
                        Some(Action::Target { seat: Some(victim) }) => Some(*victim),
                        _ => None,
                    };
                    let witch = roles::get(&step_data.role_id);
                    for seat in &step_data.actor_seats {
                        let witch_reveal = reveal::witch_context(*seat, raw_wolf_target, witch.flags.can_save_self);
                        if let Some(player) = self.room.player_at(*seat) {
                            self.bus
                                .send_to_participant(
                                    &self.room.room_code,
                                    player.uid,
                                    ServerMessage::from_reveal(witch_reveal),
                                )
                                .await;
                        }
                    }
                }
            }
            Effect::ActionAccepted => {}
            Effect::ComputeNightEnd => {
                let result = resolver::resolve_night(&self.room.night_plan, &self.room.actions, |s| {
                    self.room.role_at(s)
                });
                self.room.finish_night(result.deaths.clone(), result.last_protected_seat);
                self.flow = None;
                self.broadcast_state().await;
                self.bus
                    .broadcast_to_room(
                        &self.room.room_code,
                        ServerMessage::NightEnd {
                            last_night_deaths: result.deaths,
                        },
                    )
                    .await;
            }
            Effect::Cleared => {}
            Effect::FatalMissingPlan => {
                self.faulted = true;
                self.metrics.record_room_fault();
                self.bus
                    .broadcast_to_room(
                        &self.room.room_code,
                        ServerMessage::RoomFault {
                            reason: RoomFaultReason::MissingNightState,
                        },
                    )
                    .await;
            }
        }
        None
    }

    fn public_view(&self) -> RoomPublicView {
        RoomPublicView {
            room_code: self.room.room_code.clone(),
            status: self.room.status,
            current_step_index: self.room.current_step_index,
            seats: self
                .room
                .players
                .values()
                .map(|p| SeatView {
                    seat: p.seat,
                    display_name: p.display_name.clone(),
                    alive: p.alive,
                })
                .collect(),
            last_night_deaths: self.room.last_night_deaths.clone(),
        }
    }

    async fn broadcast_state(&self) {
        self.bus
            .broadcast_to_room(&self.room.room_code, ServerMessage::StateUpdate { state: self.public_view() })
            .await;
    }

    async fn reject(&self, uid: Uid, reason: ActionRejectedReason) {
        self.metrics.record_action_rejected();
        self.bus
            .send_to_participant(&self.room.room_code, uid, ServerMessage::ActionRejected { reason })
            .await;
    }

    async fn persist(&self) {
        if let Err(err) = self.store.save(RoomSnapshot::from_room(&self.room)).await {
            self.metrics.record_snapshot_save_failure();
            tracing::warn!(room_code = %self.room.room_code, error = %err, "failed to persist room snapshot");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordination::InMemoryMessageBus;
    use crate::database::InMemoryDurableStore;
    use crate::protocol::room_state::Room;
    use crate::protocol::types::RoomCode;
    use std::sync::Arc;
    use tokio::sync::mpsc;

    async fn setup() -> (GameCoordinator, mpsc::Sender<Envelope>, Uid, Uid) {
        let host = Uid::from_u128(1);
        let guest = Uid::from_u128(2);
        let room = Room::new(RoomCode("1234".to_string()), host, Utc::now());
        let bus: Arc<dyn MessageBus> = Arc::new(InMemoryMessageBus::new());
        let store: Arc<dyn DurableStore> = Arc::new(InMemoryDurableStore::new());
        let metrics = Arc::new(ServerMetrics::new());
        let (coordinator, tx) = GameCoordinator::new(
            room,
            bus,
            store,
            metrics,
            ProtocolConfig::default(),
            ServerConfig::default(),
        );
        (coordinator, tx, host, guest)
    }

    #[tokio::test]
    async fn idle_room_runner_exits_once_its_sender_drops() {
        let (coordinator, tx, _host, _guest) = setup().await;
        drop(tx);
        tokio::time::timeout(std::time::Duration::from_secs(1), coordinator.run())
            .await
            .expect("coordinator.run() must exit once every sender is dropped");
    }

    #[tokio::test]
    async fn empty_room_past_its_timeout_is_expired() {
        let host = Uid::from_u128(1);
        let room = Room::new(RoomCode("1234".to_string()), host, Utc::now());
        let bus: Arc<dyn MessageBus> = Arc::new(InMemoryMessageBus::new());
        let store: Arc<dyn DurableStore> = Arc::new(InMemoryDurableStore::new());
        let metrics = Arc::new(ServerMetrics::new());
        let mut config = ServerConfig::default();
        config.empty_room_timeout = 0;
        let (coordinator, _tx) = GameCoordinator::new(room, bus, store, metrics, ProtocolConfig::default(), config);
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        assert!(coordinator.is_expired());
    }
}
