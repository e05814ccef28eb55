//! The two sides of a match and per-side data storage.
//!
//! ## Side
//!
//! `White` is the machine and always moves first. `Black` is the human in
//! human-vs-machine games and the second machine otherwise.
//!
//! ## SideMap
//!
//! Fixed two-entry storage indexed by `Side`.

use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};

/// One of the two knights.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    White,
    Black,
}

impl Side {
    /// Both sides in move order.
    pub const ALL: [Side; 2] = [Side::White, Side::Black];

    /// Storage index (white = 0).
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Side::White => 0,
            Side::Black => 1,
        }
    }

    /// The other side.
    #[must_use]
    pub const fn opponent(self) -> Side {
        match self {
            Side::White => Side::Black,
            Side::Black => Side::White,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::White => write!(f, "white"),
            Side::Black => write!(f, "black"),
        }
    }
}

/// Per-side data with O(1) access.
///
/// ## Example
///
/// ```
/// use smart_horses::core::{Side, SideMap};
///
/// let mut points: SideMap<u32> = SideMap::default();
/// points[Side::Black] += 4;
///
/// assert_eq!(points[Side::White], 0);
/// assert_eq!(points[Side::Black], 4);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SideMap<T> {
    data: [T; 2],
}

impl<T> SideMap<T> {
    /// Create a map from explicit white and black values.
    pub const fn new(white: T, black: T) -> Self {
        Self { data: [white, black] }
    }

    /// Create a map with values from a factory function.
    pub fn from_fn(factory: impl Fn(Side) -> T) -> Self {
        Self::new(factory(Side::White), factory(Side::Black))
    }

    /// Get a reference to a side's data.
    #[must_use]
    pub fn get(&self, side: Side) -> &T {
        &self.data[side.index()]
    }

    /// Get a mutable reference to a side's data.
    pub fn get_mut(&mut self, side: Side) -> &mut T {
        &mut self.data[side.index()]
    }

    /// Iterate over `(Side, &T)` pairs in move order.
    pub fn iter(&self) -> impl Iterator<Item = (Side, &T)> {
        Side::ALL.into_iter().zip(self.data.iter())
    }
}

impl<T> Index<Side> for SideMap<T> {
    type Output = T;

    fn index(&self, side: Side) -> &Self::Output {
        self.get(side)
    }
}

impl<T> IndexMut<Side> for SideMap<T> {
    fn index_mut(&mut self, side: Side) -> &mut Self::Output {
        self.get_mut(side)
    }
}
