//! Legal destinations for the human-controlled knight.
//!
//! A destination is legal iff it is on the board and its cell is neither
//! [`cell::FORBIDDEN`] nor [`cell::PIECE`]. Point values and multipliers
//! never gate legality.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::core::{cell, Board, Cell};

/// The eight knight deltas, in the order candidates are generated.
pub const KNIGHT_OFFSETS: [(i32, i32); 8] = [
    (2, 1),
    (2, -1),
    (-2, 1),
    (-2, -1),
    (1, 2),
    (1, -2),
    (-1, 2),
    (-1, -2),
];

/// Distinct legal destinations for one human turn.
///
/// A knight has at most eight moves, so the set never leaves the stack.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegalMoveSet {
    cells: SmallVec<[Cell; 8]>,
}

impl LegalMoveSet {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Check membership.
    #[must_use]
    pub fn contains(&self, cell: Cell) -> bool {
        self.cells.contains(&cell)
    }

    /// Number of legal moves.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Check if there are no legal moves.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Remove all moves.
    pub fn clear(&mut self) {
        self.cells.clear();
    }

    /// Iterate in generation order.
    pub fn iter(&self) -> impl Iterator<Item = Cell> + '_ {
        self.cells.iter().copied()
    }

    /// Cells sorted by `(row, col)`, for order-independent comparison.
    #[must_use]
    pub fn sorted(&self) -> Vec<Cell> {
        let mut cells = self.cells.to_vec();
        cells.sort_unstable();
        cells
    }

    fn insert(&mut self, cell: Cell) {
        if !self.cells.contains(&cell) {
            self.cells.push(cell);
        }
    }
}

/// Compute the legal knight moves from `position` on `board`.
///
/// `position` itself is not inspected, so this also works while the piece
/// sentinel is absent.
#[must_use]
pub fn legal_moves(board: &Board, position: Cell) -> LegalMoveSet {
    let mut moves = LegalMoveSet::new();

    for (d_row, d_col) in KNIGHT_OFFSETS {
        let Some(target) = position.offset(d_row, d_col, board.size()) else {
            continue;
        };
        match board.get(target) {
            Some(cell::FORBIDDEN) | Some(cell::PIECE) | None => {}
            Some(_) => moves.insert(target),
        }
    }

    moves
}

/// Locate the human piece and compute its legal moves.
///
/// Returns `None` when the board has no piece sentinel.
#[must_use]
pub fn legal_moves_for_piece(board: &Board) -> Option<LegalMoveSet> {
    board.find_piece().map(|position| legal_moves(board, position))
}
