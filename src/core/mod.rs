//! Core types: board, sides, score frames, RNG, configuration.
//!
//! These are shared by the state machine, the playback scheduler and the
//! backends. None of them know about turn sequencing.

pub mod board;
pub mod config;
pub mod frame;
pub mod rng;
pub mod side;

pub use board::{cell, Board, BoardError, Cell};
pub use config::{Difficulty, GameMode, SessionConfig};
pub use frame::{Score, Simulation, SimulationFrame};
pub use rng::GameRng;
pub use side::{Side, SideMap};
