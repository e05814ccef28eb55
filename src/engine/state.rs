//! Engine state: whose turn it is and what the engine is waiting for.
//!
//! ## TurnState
//!
//! The externally visible phase of the game. Exactly one is active.
//!
//! ## Awaiting
//!
//! The suspension point the engine is parked on. Every collaborator call and
//! every timer the engine arms sets a marker; the matching reply or tick
//! clears it. Anything that arrives without a matching marker is rejected.

use serde::{Deserialize, Serialize};

use super::event::Call;
use crate::core::{Board, Difficulty, GameMode, Score, SessionConfig};
use crate::rules::LegalMoveSet;

/// Phase of the game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TurnState {
    /// No game running. Start and difficulty changes are accepted.
    Idle,
    /// The human may click one of the highlighted cells.
    AwaitingHuman,
    /// The machine's move is being requested.
    MachineTurn,
    /// A simulation is replaying, or its aftermath is being checked.
    PlaybackAnimating,
    /// Terminal until reset.
    GameOver,
}

impl std::fmt::Display for TurnState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TurnState::Idle => "idle",
            TurnState::AwaitingHuman => "awaiting human",
            TurnState::MachineTurn => "machine turn",
            TurnState::PlaybackAnimating => "playback",
            TurnState::GameOver => "game over",
        };
        write!(f, "{}", name)
    }
}

/// Who produced the simulation being replayed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Origin {
    /// Response to a human move.
    Human,
    /// A single machine move.
    Machine,
    /// A whole automated match.
    Match,
}

/// What the engine is suspended on.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Awaiting {
    /// Nothing pending.
    #[default]
    None,
    /// `initialize_board`.
    Board,
    /// `set_difficulty` at game start.
    Difficulty,
    /// Points check before the next machine action.
    PointsBeforeMachine,
    /// `request_machine_move`.
    MachineMove,
    /// `request_automated_match`.
    AutomatedMatch,
    /// `submit_human_move`, with the board as it was before the optimistic
    /// local update.
    HumanMove { previous: Board },
    /// Replay of a simulation.
    Playback { origin: Origin },
    /// Points check after a completed replay.
    PointsAfterPlayback { origin: Origin },
    /// Delay before the human's moves are highlighted.
    HighlightDelay,
    /// `run_experiments`.
    Experiments,
}

impl Awaiting {
    /// Check whether `call` is the collaborator call this marker waits on.
    #[must_use]
    pub fn expects(&self, call: &Call) -> bool {
        matches!(
            (self, call),
            (Awaiting::Board, Call::InitializeBoard)
                | (Awaiting::Difficulty, Call::SetDifficulty(_))
                | (Awaiting::PointsBeforeMachine, Call::QueryPointsRemaining)
                | (Awaiting::PointsAfterPlayback { .. }, Call::QueryPointsRemaining)
                | (Awaiting::MachineMove, Call::RequestMachineMove)
                | (Awaiting::AutomatedMatch, Call::RequestAutomatedMatch)
                | (Awaiting::HumanMove { .. }, Call::SubmitHumanMove(_))
                | (Awaiting::Experiments, Call::RunExperiments)
        )
    }

    /// Short name for log lines and diagnostics.
    #[must_use]
    pub fn describe(&self) -> &'static str {
        match self {
            Awaiting::None => "nothing",
            Awaiting::Board => "initial board",
            Awaiting::Difficulty => "difficulty confirmation",
            Awaiting::PointsBeforeMachine | Awaiting::PointsAfterPlayback { .. } => {
                "points check"
            }
            Awaiting::MachineMove => "machine move",
            Awaiting::AutomatedMatch => "automated match",
            Awaiting::HumanMove { .. } => "human move response",
            Awaiting::Playback { .. } => "playback",
            Awaiting::HighlightDelay => "highlight delay",
            Awaiting::Experiments => "experiment results",
        }
    }
}

/// Complete engine state.
///
/// The state machine is the only writer. Boards are `im`-backed, so the
/// clone taken for every transition is cheap.
#[derive(Clone, Debug, PartialEq)]
pub struct GameState {
    // === Turn Sequencing ===
    pub turn: TurnState,

    /// What the engine is suspended on.
    pub awaiting: Awaiting,

    /// Game generation. Bumped on every reset; replies and timer ticks from
    /// older generations are ignored.
    pub epoch: u64,

    // === Game Setup ===
    pub mode: GameMode,
    pub difficulty: Difficulty,

    /// Set once a start is accepted, cleared when the game ends or the start
    /// fails.
    pub in_progress: bool,

    // === Board ===
    /// Last known-good board. `None` until the first board arrives.
    pub board: Option<Board>,
    pub score: Score,

    /// Highlighted destinations. Non-empty only while `AwaitingHuman`.
    pub legal_moves: LegalMoveSet,

    // === Collaborator Results ===
    /// Answer to the most recent points check.
    pub points_remaining: Option<bool>,

    /// Report attached to the automated match being replayed.
    pub match_report: Option<serde_json::Value>,
}

impl GameState {
    /// Create an idle state without a board.
    #[must_use]
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            turn: TurnState::Idle,
            awaiting: Awaiting::None,
            epoch: 0,
            mode: config.mode,
            difficulty: config.difficulty,
            in_progress: false,
            board: None,
            score: Score::default(),
            legal_moves: LegalMoveSet::new(),
            points_remaining: None,
            match_report: None,
        }
    }

    /// Check whether the human may click right now.
    #[must_use]
    pub fn accepts_clicks(&self) -> bool {
        self.turn == TurnState::AwaitingHuman && self.awaiting == Awaiting::None
    }

    /// Check whether a game may be started.
    #[must_use]
    pub fn can_start(&self) -> bool {
        self.turn == TurnState::Idle && self.awaiting == Awaiting::None
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new(&SessionConfig::default())
    }
}
