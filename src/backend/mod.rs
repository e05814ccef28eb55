//! The decision-service boundary.
//!
//! [`GameBackend`] is the only way the engine learns anything about the
//! game beyond the board it is shown. Two implementations ship with the
//! crate:
//!
//! - [`JsonBackend`]: speaks the service's JSON API over any [`Transport`]
//! - [`LocalBackend`]: hosts the game rules in-process
//!
//! [`LocalServer`] routes the JSON API to a `LocalBackend`, so the wire
//! schemas can be exercised end to end without a network.

pub mod error;
pub mod json;
pub mod local;
pub mod policy;
pub mod wire;

pub use error::BackendError;
pub use json::{JsonBackend, Method, Request, Transport};
pub use local::{LocalBackend, LocalConfig, LocalServer, Match};
pub use policy::{GreedyPolicy, MovePolicy};

use crate::core::{Board, Cell, Difficulty, Simulation};
use crate::experiments::ExperimentResults;

/// Result alias for collaborator calls.
pub type BackendResult<T> = std::result::Result<T, BackendError>;

/// A fully played automated match.
#[derive(Clone, Debug, PartialEq)]
pub struct AutomatedMatch {
    /// Every position of the match, first to last.
    pub simulation: Simulation,

    /// Service-defined summary. Shown to the user as-is.
    pub report: serde_json::Value,
}

/// Operations the engine needs from the decision service.
///
/// Calls are made one at a time, in the order the engine issues them.
pub trait GameBackend {
    /// Start a fresh game and return its board.
    fn initialize_board(&mut self) -> BackendResult<Board>;

    /// Play a complete machine-vs-machine match.
    fn request_automated_match(&mut self) -> BackendResult<AutomatedMatch>;

    /// Compute and apply the machine's next move.
    fn request_machine_move(&mut self) -> BackendResult<Simulation>;

    /// Apply the human's move and return its resolution.
    fn submit_human_move(&mut self, cell: Cell) -> BackendResult<Simulation>;

    /// Set the strength used by subsequent machine moves.
    fn set_difficulty(&mut self, difficulty: Difficulty) -> BackendResult<()>;

    /// Check whether any point cell remains.
    fn points_remaining(&mut self) -> BackendResult<bool>;

    /// Run the experiment batch over every difficulty pairing.
    fn run_experiments(&mut self) -> BackendResult<ExperimentResults>;
}

impl<B: GameBackend + ?Sized> GameBackend for Box<B> {
    fn initialize_board(&mut self) -> BackendResult<Board> {
        (**self).initialize_board()
    }

    fn request_automated_match(&mut self) -> BackendResult<AutomatedMatch> {
        (**self).request_automated_match()
    }

    fn request_machine_move(&mut self) -> BackendResult<Simulation> {
        (**self).request_machine_move()
    }

    fn submit_human_move(&mut self, cell: Cell) -> BackendResult<Simulation> {
        (**self).submit_human_move(cell)
    }

    fn set_difficulty(&mut self, difficulty: Difficulty) -> BackendResult<()> {
        (**self).set_difficulty(difficulty)
    }

    fn points_remaining(&mut self) -> BackendResult<bool> {
        (**self).points_remaining()
    }

    fn run_experiments(&mut self) -> BackendResult<ExperimentResults> {
        (**self).run_experiments()
    }
}
