//! The night-phase core: plan compilation, the per-role action model, the
//! flow controller state machine, wolf-vote tallying, the death resolver,
//! and the reveal dispatcher (spec.md §4.2-§4.6).

pub mod action;
pub mod ballot;
pub mod flow;
pub mod plan;
pub mod resolver;
pub mod reveal;

pub use action::{Action, ActionDecodeError, ActionWire};
pub use ballot::WolfBallot;
pub use flow::{Effect, Event, NightFlowController, Phase};
pub use plan::{build_night_plan, NightStep};
pub use resolver::{resolve_night, NightResult};
pub use reveal::Reveal;
