//! Session configuration types.
//!
//! - `Difficulty`: opponent strength, sent to the decision service
//! - `GameMode`: who plays, or whether to run the experiment batch
//! - `SessionConfig`: everything a session needs at game start

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default time between two playback frames.
pub const DEFAULT_FRAME_INTERVAL_MS: u64 = 1_000;

/// Default pause between the end of a machine turn and human input.
pub const DEFAULT_HIGHLIGHT_DELAY_MS: u64 = 3_000;

/// Opponent strength.
///
/// `level` is the user-facing rank (`1..=3`). The decision service only
/// knows lookahead depths, so `set_difficulty` sends `search_depth`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Difficulty {
    Beginner,
    Amateur,
    Expert,
}

impl Difficulty {
    /// All levels in matchup-matrix order.
    pub const ALL: [Difficulty; 3] = [Difficulty::Beginner, Difficulty::Amateur, Difficulty::Expert];

    /// User-facing rank.
    #[must_use]
    pub const fn level(self) -> u8 {
        match self {
            Difficulty::Beginner => 1,
            Difficulty::Amateur => 2,
            Difficulty::Expert => 3,
        }
    }

    /// Parse a rank.
    #[must_use]
    pub const fn from_level(level: u8) -> Option<Self> {
        match level {
            1 => Some(Difficulty::Beginner),
            2 => Some(Difficulty::Amateur),
            3 => Some(Difficulty::Expert),
            _ => None,
        }
    }

    /// Lookahead depth the decision service associates with this level.
    #[must_use]
    pub const fn search_depth(self) -> u32 {
        match self {
            Difficulty::Beginner => 2,
            Difficulty::Amateur => 4,
            Difficulty::Expert => 6,
        }
    }

    /// Map a lookahead depth back to a level.
    ///
    /// Depths between the canonical ones round up to the next level; zero is
    /// rejected.
    #[must_use]
    pub const fn from_search_depth(depth: u32) -> Option<Self> {
        match depth {
            0 => None,
            1..=2 => Some(Difficulty::Beginner),
            3..=4 => Some(Difficulty::Amateur),
            _ => Some(Difficulty::Expert),
        }
    }

    /// Label used by the experiment endpoint.
    #[must_use]
    pub const fn wire_label(self) -> &'static str {
        match self {
            Difficulty::Beginner => "Principiante",
            Difficulty::Amateur => "Amateur",
            Difficulty::Expert => "Experto",
        }
    }

    /// Parse an experiment endpoint label.
    #[must_use]
    pub fn from_wire_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.wire_label() == label)
    }
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Difficulty::Beginner => write!(f, "Beginner"),
            Difficulty::Amateur => write!(f, "Amateur"),
            Difficulty::Expert => write!(f, "Expert"),
        }
    }
}

impl std::str::FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "beginner" | "1" => Ok(Difficulty::Beginner),
            "amateur" | "2" => Ok(Difficulty::Amateur),
            "expert" | "3" => Ok(Difficulty::Expert),
            other => Err(format!(
                "unknown difficulty '{}' (expected beginner, amateur or expert)",
                other
            )),
        }
    }
}

/// What a game start does.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameMode {
    /// Machine (white) moves first, human (black) answers.
    HumanVsMachine,
    /// One automated match played back in full.
    MachineVsMachine,
    /// Batch of automated matches across all difficulty pairs.
    Experiment,
}

impl GameMode {
    /// Check if this mode plays an interactive game on the board.
    #[must_use]
    pub const fn is_interactive(self) -> bool {
        !matches!(self, GameMode::Experiment)
    }
}

/// Session configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Mode used by `GameSession::start`.
    pub mode: GameMode,

    /// Difficulty sent to the decision service at game start.
    pub difficulty: Difficulty,

    /// Time between two playback frames (milliseconds).
    pub frame_interval_ms: u64,

    /// Pause before the human's legal moves are highlighted (milliseconds).
    pub highlight_delay_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            mode: GameMode::HumanVsMachine,
            difficulty: Difficulty::Amateur,
            frame_interval_ms: DEFAULT_FRAME_INTERVAL_MS,
            highlight_delay_ms: DEFAULT_HIGHLIGHT_DELAY_MS,
        }
    }
}

impl SessionConfig {
    /// Create a config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the game mode.
    #[must_use]
    pub fn with_mode(mut self, mode: GameMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the difficulty.
    #[must_use]
    pub fn with_difficulty(mut self, difficulty: Difficulty) -> Self {
        self.difficulty = difficulty;
        self
    }

    /// Set the frame interval.
    #[must_use]
    pub fn with_frame_interval(mut self, interval: Duration) -> Self {
        self.frame_interval_ms = interval.as_millis() as u64;
        self
    }

    /// Set the highlight delay.
    #[must_use]
    pub fn with_highlight_delay(mut self, delay: Duration) -> Self {
        self.highlight_delay_ms = delay.as_millis() as u64;
        self
    }

    /// Frame interval as a `Duration`.
    #[must_use]
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }

    /// Highlight delay as a `Duration`.
    #[must_use]
    pub fn highlight_delay(&self) -> Duration {
        Duration::from_millis(self.highlight_delay_ms)
    }
}
