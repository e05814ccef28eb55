//! Rules of the two-knight capture game.
//!
//! ## Layout
//!
//! Two knights, a set of point cells valued `1..=10` and a few multiplier
//! cells are placed on distinct random cells. White (the machine) moves
//! first.
//!
//! ## Scoring
//!
//! - Landing on a point cell scores its value, doubled if the mover's
//!   multiplier is active. The multiplier is then spent.
//! - Landing on a multiplier cell arms the mover's multiplier if it is not
//!   already armed. The cell is consumed either way.
//!
//! The match ends when no point cell remains or after the move limit.
//!
//! The board uses the engine's encoding directly: white is
//! [`cell::FORBIDDEN`], black is [`cell::PIECE`]. Since both knights are
//! excluded from each other's destinations, the engine's move generator is
//! also the legal-move rule here.

use thiserror::Error;

use super::LocalConfig;
use crate::core::{cell, Board, BoardError, Cell, GameRng, Score, Side, SideMap, SimulationFrame};
use crate::rules::legal_moves;

/// A move the rules do not allow.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoveError {
    #[error("{side} cannot move from {from} to {to}")]
    Illegal { side: Side, from: Cell, to: Cell },

    #[error("the match is over")]
    MatchOver,
}

/// Board code of a side's knight.
#[must_use]
pub const fn knight_code(side: Side) -> i32 {
    match side {
        Side::White => cell::FORBIDDEN,
        Side::Black => cell::PIECE,
    }
}

/// One match in progress.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Match {
    board: Board,
    knights: SideMap<Cell>,
    score: Score,
    to_move: Side,
    moves: u32,
    max_moves: u32,
}

impl Match {
    /// Create a match with only the two knights on an empty board.
    ///
    /// Use [`with_point`](Self::with_point) and
    /// [`with_multiplier`](Self::with_multiplier) to populate it.
    pub fn new(size: usize, white: Cell, black: Cell, max_moves: u32) -> Result<Self, BoardError> {
        let mut board = Board::empty(size);
        board.set(white, knight_code(Side::White))?;
        board.set(black, knight_code(Side::Black))?;

        Ok(Self {
            board,
            knights: SideMap::new(white, black),
            score: Score::default(),
            to_move: Side::White,
            moves: 0,
            max_moves,
        })
    }

    /// Random layout drawn from `rng`.
    ///
    /// Cells are drawn without replacement in the order: white knight, black
    /// knight, point cells (valued `1, 2, ...`), multiplier cells. On a board
    /// too small for everything, trailing items are dropped.
    #[must_use]
    pub fn random(config: &LocalConfig, rng: &mut GameRng) -> Self {
        let size = config.board_size.max(2);
        let wanted = 2 + config.point_cells + config.multiplier_cells;
        let picks: Vec<Cell> = rng
            .sample_distinct(size * size, wanted)
            .into_iter()
            .map(|i| Cell::new(i / size, i % size))
            .collect();

        let mut board = Board::empty(size);
        let white = picks[0];
        let black = picks[1];
        let mut placed = picks[2..].iter().copied();

        for value in 0..config.point_cells {
            if let Some(at) = placed.next() {
                place(&mut board, at, (value % 10) as i32 + 1);
            }
        }
        for at in placed.take(config.multiplier_cells) {
            place(&mut board, at, cell::MULTIPLIER);
        }
        place(&mut board, white, knight_code(Side::White));
        place(&mut board, black, knight_code(Side::Black));

        Self {
            board,
            knights: SideMap::new(white, black),
            score: Score::default(),
            to_move: Side::White,
            moves: 0,
            max_moves: config.max_moves,
        }
    }

    /// Place a point cell.
    pub fn with_point(mut self, at: Cell, value: i32) -> Result<Self, BoardError> {
        self.board.set(at, value.clamp(1, 10))?;
        Ok(self)
    }

    /// Place a multiplier cell.
    pub fn with_multiplier(mut self, at: Cell) -> Result<Self, BoardError> {
        self.board.set(at, cell::MULTIPLIER)?;
        Ok(self)
    }

    // === Accessors ===

    #[must_use]
    pub fn board(&self) -> &Board {
        &self.board
    }

    #[must_use]
    pub fn knight(&self, side: Side) -> Cell {
        self.knights[side]
    }

    #[must_use]
    pub fn score(&self) -> &Score {
        &self.score
    }

    #[must_use]
    pub fn to_move(&self) -> Side {
        self.to_move
    }

    /// Moves made so far, passes included.
    #[must_use]
    pub fn moves(&self) -> u32 {
        self.moves
    }

    /// Check whether any point cell remains.
    #[must_use]
    pub fn points_remaining(&self) -> bool {
        self.board.has_points()
    }

    /// Check whether the match has ended.
    #[must_use]
    pub fn is_over(&self) -> bool {
        !self.points_remaining() || self.moves >= self.max_moves
    }

    /// Leader by points, `None` on a tie.
    #[must_use]
    pub fn winner(&self) -> Option<Side> {
        self.score.leader()
    }

    /// Snapshot for playback.
    #[must_use]
    pub fn frame(&self) -> SimulationFrame {
        SimulationFrame::new(self.board.clone(), self.score)
    }

    /// Destinations available to `side`.
    #[must_use]
    pub fn legal_moves(&self, side: Side) -> Vec<Cell> {
        legal_moves(&self.board, self.knights[side]).iter().collect()
    }

    /// Value of the point cell at `at`, if any.
    #[must_use]
    pub fn point_at(&self, at: Cell) -> Option<u32> {
        match self.board.get(at) {
            Some(code) if (1..=10).contains(&code) => Some(code as u32),
            _ => None,
        }
    }

    /// Check whether `at` holds a multiplier.
    #[must_use]
    pub fn multiplier_at(&self, at: Cell) -> bool {
        self.board.get(at) == Some(cell::MULTIPLIER)
    }

    // === Moves ===

    /// Move the side to play to `to`. Returns the points scored.
    pub fn apply_move(&mut self, to: Cell) -> Result<u32, MoveError> {
        if self.is_over() {
            return Err(MoveError::MatchOver);
        }
        let side = self.to_move;
        let from = self.knights[side];
        if !legal_moves(&self.board, from).contains(to) {
            return Err(MoveError::Illegal { side, from, to });
        }

        let mut scored = 0;
        if let Some(value) = self.point_at(to) {
            scored = value;
            if self.score.multiplier[side] {
                scored *= 2;
                self.score.multiplier[side] = false;
            }
        } else if self.multiplier_at(to) && !self.score.multiplier[side] {
            self.score.multiplier[side] = true;
        }

        place(&mut self.board, from, cell::EMPTY);
        place(&mut self.board, to, knight_code(side));
        self.knights[side] = to;
        self.score.points[side] += scored;
        self.end_turn();
        Ok(scored)
    }

    /// Skip the turn of a side with no legal moves.
    pub fn pass(&mut self) {
        self.end_turn();
    }

    fn end_turn(&mut self) {
        self.moves += 1;
        self.to_move = self.to_move.opponent();
    }
}

/// Set a cell produced by the board's own geometry.
fn place(board: &mut Board, at: Cell, code: i32) {
    let placed = board.set(at, code);
    debug_assert!(placed.is_ok(), "{} is off the board", at);
}
