//! Square grid of integer cell codes.
//!
//! ## Cell Codes
//!
//! The board carries whatever the decision service sends. Only two codes
//! have meaning to the engine:
//!
//! - [`cell::FORBIDDEN`]: the human piece may never land here
//! - [`cell::PIECE`]: the human-controlled piece
//!
//! Point values (`1..=10`) and [`cell::MULTIPLIER`] are passed through
//! untouched and only matter for display.
//!
//! Cells are stored row-major in an `im::Vector`, so cloning a board for
//! every state transition is O(1).

use im::Vector;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reserved cell codes.
pub mod cell {
    /// Empty / unscored cell.
    pub const EMPTY: i32 = 0;

    /// Cell the human piece may not enter (the opponent's piece).
    pub const FORBIDDEN: i32 = 11;

    /// The human-controlled piece.
    pub const PIECE: i32 = 12;

    /// Bonus cell. Opaque to the engine.
    pub const MULTIPLIER: i32 = 20;
}

/// Board construction and access errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoardError {
    #[error("board has no rows")]
    Empty,

    #[error("row {row} has {len} cells, expected {expected}")]
    NotSquare { row: usize, len: usize, expected: usize },

    #[error("piece appears more than once (at {first} and {second})")]
    DuplicatePiece { first: Cell, second: Cell },

    #[error("{cell} is outside a {size}x{size} board")]
    OutOfBounds { cell: Cell, size: usize },
}

/// A `(row, col)` coordinate on the board.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Cell {
    pub row: usize,
    pub col: usize,
}

impl Cell {
    /// Create a new cell coordinate.
    #[must_use]
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Offset this cell, returning `None` if either coordinate leaves `[0, size)`.
    #[must_use]
    pub fn offset(self, d_row: i32, d_col: i32, size: usize) -> Option<Cell> {
        let row = self.row as i64 + d_row as i64;
        let col = self.col as i64 + d_col as i64;
        let size = size as i64;
        if (0..size).contains(&row) && (0..size).contains(&col) {
            Some(Cell::new(row as usize, col as usize))
        } else {
            None
        }
    }
}

impl std::fmt::Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

impl From<(usize, usize)> for Cell {
    fn from((row, col): (usize, usize)) -> Self {
        Cell::new(row, col)
    }
}

/// An N×N grid of cell codes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    size: usize,
    cells: Vector<i32>,
}

impl Board {
    /// Create an empty `size`×`size` board.
    #[must_use]
    pub fn empty(size: usize) -> Self {
        Self {
            size,
            cells: std::iter::repeat(cell::EMPTY).take(size * size).collect(),
        }
    }

    /// Build a board from rows, validating shape and the piece invariant.
    pub fn from_rows<R: AsRef<[i32]>>(rows: &[R]) -> Result<Self, BoardError> {
        let size = rows.len();
        if size == 0 {
            return Err(BoardError::Empty);
        }

        let mut cells = Vector::new();
        let mut piece: Option<Cell> = None;

        for (r, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != size {
                return Err(BoardError::NotSquare {
                    row: r,
                    len: row.len(),
                    expected: size,
                });
            }
            for (c, &code) in row.iter().enumerate() {
                if code == cell::PIECE {
                    let here = Cell::new(r, c);
                    if let Some(first) = piece {
                        return Err(BoardError::DuplicatePiece { first, second: here });
                    }
                    piece = Some(here);
                }
                cells.push_back(code);
            }
        }

        Ok(Self { size, cells })
    }

    /// Side length.
    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Check whether a cell lies on the board.
    #[must_use]
    pub fn contains(&self, cell: Cell) -> bool {
        cell.row < self.size && cell.col < self.size
    }

    /// Get the code at a cell, or `None` if out of bounds.
    #[must_use]
    pub fn get(&self, cell: Cell) -> Option<i32> {
        if !self.contains(cell) {
            return None;
        }
        self.cells.get(cell.row * self.size + cell.col).copied()
    }

    /// Set the code at a cell.
    pub fn set(&mut self, cell: Cell, code: i32) -> Result<(), BoardError> {
        if !self.contains(cell) {
            return Err(BoardError::OutOfBounds { cell, size: self.size });
        }
        self.cells.set(cell.row * self.size + cell.col, code);
        Ok(())
    }

    /// Locate the human piece.
    #[must_use]
    pub fn find_piece(&self) -> Option<Cell> {
        self.cells
            .iter()
            .position(|&code| code == cell::PIECE)
            .map(|i| Cell::new(i / self.size, i % self.size))
    }

    /// Move the human piece to `to`, emptying its previous cell.
    ///
    /// Places the piece even if it was not on the board before.
    pub fn move_piece(&mut self, to: Cell) -> Result<(), BoardError> {
        if !self.contains(to) {
            return Err(BoardError::OutOfBounds { cell: to, size: self.size });
        }
        if let Some(from) = self.find_piece() {
            self.set(from, cell::EMPTY)?;
        }
        self.set(to, cell::PIECE)
    }

    /// Iterate over rows as owned vectors.
    pub fn rows(&self) -> impl Iterator<Item = Vec<i32>> + '_ {
        (0..self.size).map(move |r| {
            self.cells
                .iter()
                .skip(r * self.size)
                .take(self.size)
                .copied()
                .collect()
        })
    }

    /// Rows as a nested vector (wire format).
    #[must_use]
    pub fn to_rows(&self) -> Vec<Vec<i32>> {
        self.rows().collect()
    }

    /// Iterate over `(cell, code)` pairs in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (Cell, i32)> + '_ {
        let size = self.size;
        self.cells
            .iter()
            .enumerate()
            .map(move |(i, &code)| (Cell::new(i / size, i % size), code))
    }

    /// Check whether any point cell (`1..=10`) remains on the board.
    #[must_use]
    pub fn has_points(&self) -> bool {
        self.cells.iter().any(|&code| (1..cell::FORBIDDEN).contains(&code))
    }
}

impl std::fmt::Display for Board {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for row in self.rows() {
            let line: Vec<String> = row
                .iter()
                .map(|&code| match code {
                    cell::EMPTY => " .".to_string(),
                    cell::FORBIDDEN => " W".to_string(),
                    cell::PIECE => " B".to_string(),
                    cell::MULTIPLIER => " x".to_string(),
                    n => format!("{:>2}", n),
                })
                .collect();
            writeln!(f, "{}", line.join(" "))?;
        }
        Ok(())
    }
}
