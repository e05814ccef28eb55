//! Turn orchestration.
//!
//! The engine is a value ([`GameState`]) plus a pure [`transition`]
//! function. Collaborator calls, playback and timers are requested through
//! [`Command`]s and answered through [`Event`]s, so the whole turn sequence
//! can be exercised without a clock or a backend.

pub mod event;
pub mod machine;
pub mod state;

pub use event::{Call, Command, Diagnostic, DiagnosticKind, Event, Outcome, Reply, Tick};
pub use machine::{transition, GameStateMachine, Transition};
pub use state::{Awaiting, GameState, Origin, TurnState};
