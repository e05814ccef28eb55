//! Move selection for the local backend.
//!
//! How the real decision service picks moves is its own business; the
//! engine only sees the resulting simulations. [`MovePolicy`] is the seam
//! where a search-based opponent would plug in.

use super::local::Match;
use crate::core::{Cell, Difficulty, GameRng};

/// Chooses a destination for the side to move.
pub trait MovePolicy {
    /// Pick a move, or `None` if the side to move has no legal moves.
    fn choose(&self, game: &Match, difficulty: Difficulty, rng: &mut GameRng) -> Option<Cell>;
}

/// One-ply baseline.
///
/// Takes the most valuable point in reach, otherwise a multiplier when none
/// is armed, otherwise a random legal move. Ties go to the first candidate
/// in knight-offset order. Difficulty is ignored.
#[derive(Clone, Copy, Debug, Default)]
pub struct GreedyPolicy;

impl MovePolicy for GreedyPolicy {
    fn choose(&self, game: &Match, _difficulty: Difficulty, rng: &mut GameRng) -> Option<Cell> {
        let side = game.to_move();
        let moves = game.legal_moves(side);

        let best_point = moves
            .iter()
            .filter_map(|&to| game.point_at(to).map(|value| (to, value)))
            .fold(None, |best: Option<(Cell, u32)>, (to, value)| match best {
                Some((_, top)) if top >= value => best,
                _ => Some((to, value)),
            });
        if let Some((to, _)) = best_point {
            return Some(to);
        }

        if !game.score().multiplier[side] {
            if let Some(&to) = moves.iter().find(|&&to| game.multiplier_at(to)) {
                return Some(to);
            }
        }

        rng.choose(&moves).copied()
    }
}
