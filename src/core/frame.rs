//! Score snapshots and simulation frames.
//!
//! A `Simulation` is the ordered list of board+score snapshots the decision
//! service produces for one move resolution (or for a whole automated match).
//! Frames are applied in index order during playback.

use im::Vector;
use serde::{Deserialize, Serialize};

use super::board::Board;
use super::side::{Side, SideMap};

/// Points and multiplier flags for both sides.
///
/// Multiplier flags are opaque: they are displayed, never interpreted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    pub points: SideMap<u32>,
    pub multiplier: SideMap<bool>,
}

impl Score {
    /// Create a score from raw values.
    #[must_use]
    pub fn new(white: u32, black: u32, white_multiplier: bool, black_multiplier: bool) -> Self {
        Self {
            points: SideMap::new(white, black),
            multiplier: SideMap::new(white_multiplier, black_multiplier),
        }
    }

    /// Side with more points, `None` on a tie.
    #[must_use]
    pub fn leader(&self) -> Option<Side> {
        let white = self.points[Side::White];
        let black = self.points[Side::Black];
        match white.cmp(&black) {
            std::cmp::Ordering::Greater => Some(Side::White),
            std::cmp::Ordering::Less => Some(Side::Black),
            std::cmp::Ordering::Equal => None,
        }
    }
}

impl std::fmt::Display for Score {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mark = |on: bool| if on { " x2" } else { "" };
        write!(
            f,
            "white {}{} | black {}{}",
            self.points[Side::White],
            mark(self.multiplier[Side::White]),
            self.points[Side::Black],
            mark(self.multiplier[Side::Black]),
        )
    }
}

/// One step of a move resolution.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationFrame {
    pub board: Board,
    pub score: Score,
}

impl SimulationFrame {
    /// Create a new frame.
    #[must_use]
    pub fn new(board: Board, score: Score) -> Self {
        Self { board, score }
    }
}

/// Ordered, finite sequence of frames.
///
/// Backed by `im::Vector` so the state machine and the playback scheduler
/// can each hold a copy without duplicating boards.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Simulation {
    frames: Vector<SimulationFrame>,
}

impl Simulation {
    /// Create an empty simulation.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a frame.
    pub fn push(&mut self, frame: SimulationFrame) {
        self.frames.push_back(frame);
    }

    /// Number of frames.
    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Check if there are no frames.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Get a frame by index.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&SimulationFrame> {
        self.frames.get(index)
    }

    /// Last frame, if any.
    #[must_use]
    pub fn last(&self) -> Option<&SimulationFrame> {
        self.frames.last()
    }

    /// Iterate over frames in playback order.
    pub fn iter(&self) -> impl Iterator<Item = &SimulationFrame> {
        self.frames.iter()
    }
}

impl FromIterator<SimulationFrame> for Simulation {
    fn from_iter<I: IntoIterator<Item = SimulationFrame>>(iter: I) -> Self {
        Self {
            frames: iter.into_iter().collect(),
        }
    }
}
