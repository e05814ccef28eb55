//! # smart-horses
//!
//! Turn orchestration for a two-knight capture game whose rules and
//! opponent live in a separate decision service.
//!
//! The crate owns everything between the user and that service: whose turn
//! it is, which cells the human may click, when to call the service, how its
//! multi-frame answers are replayed, and how experiment batches are
//! summarised.
//!
//! ## Design Principles
//!
//! 1. **Pure Transitions**: The turn sequence is a function
//!    `(GameState, Event) -> (GameState, Vec<Command>)`. Side effects are
//!    data; the driver executes them.
//!
//! 2. **Epoch Stamping**: Every call and timer carries the epoch of the game
//!    that issued it. A reset bumps the epoch, so late replies from an
//!    abandoned game are dropped instead of corrupting the new one.
//!
//! 3. **Backend Agnostic**: The engine only talks to [`GameBackend`]. The
//!    JSON client and the in-process backend are interchangeable.
//!
//! ## Modules
//!
//! - `core`: Board, cells, sides, score frames, RNG, configuration
//! - `rules`: Knight move generation for the human piece
//! - `engine`: Turn state machine, events and commands
//! - `playback`: Frame-by-frame replay of simulations
//! - `experiments`: Batch results and the 3×3 summary matrix
//! - `backend`: Decision-service boundary, JSON client, local service
//! - `session`: Driver that executes commands against a backend

pub mod backend;
pub mod core;
pub mod engine;
pub mod error;
pub mod experiments;
pub mod playback;
pub mod rules;
pub mod session;

// Re-export commonly used types
pub use crate::core::{
    cell, Board, BoardError, Cell,
    Difficulty, GameMode, SessionConfig,
    Score, Simulation, SimulationFrame,
    GameRng, Side, SideMap,
};

pub use crate::rules::{legal_moves, legal_moves_for_piece, LegalMoveSet};

pub use crate::engine::{
    transition, GameStateMachine, Transition,
    GameState, TurnState,
    Event, Reply, Tick, Call, Command, Outcome,
    Diagnostic, DiagnosticKind,
};

pub use crate::playback::{PlaybackEvent, PlaybackScheduler, PlaybackToken};

pub use crate::experiments::{aggregate, ExperimentMatrix, ExperimentResults, MatchupRecord};

pub use crate::backend::{
    AutomatedMatch, BackendError, BackendResult, GameBackend,
    JsonBackend, Transport,
    LocalBackend, LocalConfig, LocalServer,
};

pub use crate::session::GameSession;

pub use crate::error::{Error, Result};
