//! Movement rules for the human-controlled piece.
//!
//! The engine only needs to know where the human may click. Everything else
//! about the game (scoring, multipliers, end conditions) belongs to the
//! decision service.

pub mod moves;

pub use moves::{legal_moves, legal_moves_for_piece, LegalMoveSet, KNIGHT_OFFSETS};
