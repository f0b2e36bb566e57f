//! Night Flow Controller (spec.md §4.3): a single per-room state machine
//! driving one role at a time through audio-gated sub-phases. The
//! controller owns only phase + step-index bookkeeping; it never touches
//! the message bus or durable store directly — that's the Game
//! Coordinator's job (spec.md §9's "separate engine state from UI
//! callbacks" redesign note).

use tracing::debug;

use crate::night::plan::NightStep;

/// The controller's current phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    Idle,
    NightBeginAudio,
    RoleBeginAudio { step: usize },
    WaitingForAction { step: usize },
    RoleEndAudio { step: usize },
    NightEndAudio,
    Done,
}

/// Events accepted by the controller (spec.md §4.3 table).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    StartNight,
    NightBeginAudioDone,
    RoleBeginAudioDone,
    ActionSubmitted,
    RoleEndAudioDone,
    NightEndAudioDone,
    Reset,
}

/// What the coordinator should do in response to a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Emit `STATE_UPDATE{status=ongoing}` and the begin-night audio cue.
    BeginNightAudio,
    /// Emit `ROLE_TURN{roleId}` for the step at this index and dispatch the
    /// step's reveal context.
    EnterRoleTurn { step: usize },
    /// Write the submitted action under the once-guard (the coordinator
    /// already validated and staged it before calling `handle`).
    ActionAccepted,
    /// Compute deaths and emit the terminal `STATE_UPDATE{status=ended}`.
    ComputeNightEnd,
    /// Night-scoped fields were cleared; nothing to tell participants.
    Cleared,
    /// A strict invariant violation (spec.md §7): `status=ongoing` is
    /// asserted by the caller but the controller has no plan. The caller
    /// must raise a `RoomFault` and tear the room down.
    FatalMissingPlan,
}

/// The controller. Holds the compiled plan and the current phase;
/// `room_coordinator` owns one instance per room for the night's duration.
#[derive(Debug)]
pub struct NightFlowController {
    plan: Vec<NightStep>,
    phase: Phase,
}

impl NightFlowController {
    pub fn new(plan: Vec<NightStep>) -> Self {
        Self {
            plan,
            phase: Phase::Idle,
        }
    }

    /// Reconstructs a controller mid-night from a rehydrated snapshot
    /// (spec.md §4.7: "in-flight night actions already written survive;
    /// in-flight wolf votes not yet finalized are lost and the wolf step
    /// replays"). The snapshot does not persist a partially-collected
    /// ballot, so the step at `step_index` always resumes in
    /// `WaitingForAction`, regardless of how far it had progressed before
    /// the restart. `step_index` is clamped to `plan.len()` so a snapshot
    /// saved exactly as the night ended lands in `NightEndAudio` rather
    /// than indexing past the plan.
    pub fn rehydrate(plan: Vec<NightStep>, step_index: usize) -> Self {
        let phase = if step_index >= plan.len() {
            Phase::NightEndAudio
        } else {
            Phase::WaitingForAction { step: step_index }
        };
        Self { plan, phase }
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn plan(&self) -> &[NightStep] {
        &self.plan
    }

    pub fn current_step(&self) -> Option<&NightStep> {
        match self.phase {
            Phase::RoleBeginAudio { step }
            | Phase::WaitingForAction { step }
            | Phase::RoleEndAudio { step } => self.plan.get(step),
            _ => None,
        }
    }

    /// Drives one event through the state machine. Timing no-ops
    /// (spec.md §4.3 "Strictness") return `None` and log at debug rather
    /// than erroring — duplicate audio-completion callbacks must not
    /// corrupt progress.
    pub fn handle(&mut self, event: Event) -> Option<Effect> {
        use Phase::*;

        match (&self.phase, &event) {
            (Idle, Event::StartNight) => {
                self.phase = NightBeginAudio;
                Some(Effect::BeginNightAudio)
            }
            (NightBeginAudio, Event::NightBeginAudioDone) => {
                if self.plan.is_empty() {
                    self.phase = NightEndAudio;
                    return Some(Effect::EnterRoleTurn { step: 0 });
                }
                self.phase = RoleBeginAudio { step: 0 };
                None
            }
            (RoleBeginAudio { step }, Event::RoleBeginAudioDone) => {
                let step = *step;
                self.phase = WaitingForAction { step };
                Some(Effect::EnterRoleTurn { step })
            }
            (WaitingForAction { step }, Event::ActionSubmitted) => {
                let step = *step;
                self.phase = RoleEndAudio { step };
                Some(Effect::ActionAccepted)
            }
            (RoleEndAudio { step }, Event::RoleEndAudioDone) => {
                let next = step + 1;
                if next >= self.plan.len() {
                    self.phase = NightEndAudio;
                } else {
                    self.phase = RoleBeginAudio { step: next };
                }
                None
            }
            (NightEndAudio, Event::NightEndAudioDone) => {
                self.phase = Done;
                Some(Effect::ComputeNightEnd)
            }
            (_, Event::Reset) => {
                self.phase = Idle;
                Some(Effect::Cleared)
            }
            (phase, event) => {
                debug!(?phase, ?event, "night flow: no-op, event not valid in this phase");
                None
            }
        }
    }

    /// Hard invariant check (spec.md §4.3/§7): called by the coordinator
    /// whenever room status is `ongoing`. A controller in any phase other
    /// than `Idle`/`Done` with an empty plan is a room fault.
    pub fn assert_consistent(&self) -> Option<Effect> {
        if self.plan.is_empty() && !matches!(self.phase, Phase::Idle | Phase::Done) {
            return Some(Effect::FatalMissingPlan);
        }
        None
    }
}
