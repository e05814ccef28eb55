//! Inbound events and outbound commands.
//!
//! The state machine never calls anything. It consumes [`Event`]s and emits
//! [`Command`]s; a driver executes the commands and turns their results back
//! into events stamped with the epoch the command carried.

use serde::{Deserialize, Serialize};

use crate::backend::{AutomatedMatch, BackendError};
use crate::core::{Board, Cell, Difficulty, GameMode, Score, Side, Simulation, SimulationFrame};
use crate::experiments::{ExperimentMatrix, ExperimentResults};

// =============================================================================
// Inbound
// =============================================================================

/// Everything the state machine reacts to.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Begin a game (or an experiment batch) in `mode`.
    Start(GameMode),
    /// Change the difficulty used by the next start.
    ChooseDifficulty(Difficulty),
    /// The human clicked a cell.
    Click(Cell),
    /// Abandon everything and fetch a fresh board.
    Reset,
    /// A collaborator call finished.
    Collaborator { epoch: u64, reply: Reply },
    /// A timer armed by the engine fired.
    Timer { epoch: u64, tick: Tick },
}

impl Event {
    /// Epoch stamped on replies and ticks. User input carries none.
    #[must_use]
    pub fn epoch(&self) -> Option<u64> {
        match self {
            Event::Collaborator { epoch, .. } | Event::Timer { epoch, .. } => Some(*epoch),
            _ => None,
        }
    }
}

/// Result of a [`Call`].
#[derive(Clone, Debug, PartialEq)]
pub enum Reply {
    Board(Board),
    DifficultySet,
    PointsRemaining(bool),
    /// Answer to either a machine move or a human move.
    Simulation(Simulation),
    AutomatedMatch(AutomatedMatch),
    Experiments(ExperimentResults),
    Failed { call: Call, error: BackendError },
}

impl Reply {
    /// Short name for diagnostics.
    #[must_use]
    pub fn describe(&self) -> &'static str {
        match self {
            Reply::Board(_) => "board",
            Reply::DifficultySet => "difficulty acknowledgement",
            Reply::PointsRemaining(_) => "points check",
            Reply::Simulation(_) => "simulation",
            Reply::AutomatedMatch(_) => "automated match",
            Reply::Experiments(_) => "experiment results",
            Reply::Failed { .. } => "failure",
        }
    }
}

/// Timer payloads.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Tick {
    /// Next playback frame is due.
    Frame(SimulationFrame),
    /// The playback emitted its last frame and one more interval elapsed.
    PlaybackDone,
    /// The pre-highlight delay elapsed.
    HighlightDue,
}

// =============================================================================
// Outbound
// =============================================================================

/// A collaborator request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Call {
    InitializeBoard,
    SetDifficulty(Difficulty),
    QueryPointsRemaining,
    RequestMachineMove,
    RequestAutomatedMatch,
    SubmitHumanMove(Cell),
    RunExperiments,
}

impl Call {
    /// Operation name, as used in backend errors.
    #[must_use]
    pub fn operation(&self) -> &'static str {
        match self {
            Call::InitializeBoard => "initialize_board",
            Call::SetDifficulty(_) => "set_difficulty",
            Call::QueryPointsRemaining => "points_remaining",
            Call::RequestMachineMove => "request_machine_move",
            Call::RequestAutomatedMatch => "request_automated_match",
            Call::SubmitHumanMove(_) => "submit_human_move",
            Call::RunExperiments => "run_experiments",
        }
    }
}

/// Side effects requested by a transition.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Invoke the collaborator and feed the reply back with `epoch`.
    Call { epoch: u64, call: Call },
    /// Replay `simulation`, replacing any active replay.
    StartPlayback { epoch: u64, simulation: Simulation },
    /// Stop the active replay and the highlight timer.
    CancelTimers,
    /// Fire [`Tick::HighlightDue`] after the configured delay.
    ScheduleHighlight { epoch: u64 },
    /// Show a result to the user.
    Publish(Outcome),
    /// Surface a problem without changing the game.
    Report(Diagnostic),
}

/// Results worth showing to the user.
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    /// The game ended. `winner` is `None` on a tie.
    GameOver { score: Score, winner: Option<Side> },
    /// Summary the service attached to an automated match.
    MatchReport(serde_json::Value),
    /// Aggregated experiment batch.
    Experiments(ExperimentMatrix),
}

/// Diagnostic categories.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiagnosticKind {
    /// Click while not awaiting the human, or outside the legal set.
    InvalidInteraction,
    /// Start requested without a usable board, or while busy.
    NotReady,
    TransportFailure,
    MalformedResponse,
    /// The collaborator refused the request.
    Rejected,
    /// A reply that matched nothing the engine was waiting for.
    UnexpectedReply,
    /// Experiment results could not be summarized.
    AggregationInconsistency,
    /// The board holds no human piece.
    MissingPiece,
    /// The human piece cannot move.
    NoLegalMoves,
}

/// A reported problem.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
}

impl Diagnostic {
    /// Create a new diagnostic.
    pub fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Diagnostic for a failed collaborator call.
    #[must_use]
    pub fn from_backend(call: &Call, error: &BackendError) -> Self {
        let kind = match error {
            BackendError::Transport(_) => DiagnosticKind::TransportFailure,
            BackendError::Malformed { .. } => DiagnosticKind::MalformedResponse,
            BackendError::Rejected { .. } => DiagnosticKind::Rejected,
        };
        Self::new(kind, format!("{} failed: {}", call.operation(), error))
    }

    /// Check whether this reports a bad user action rather than a fault.
    #[must_use]
    pub fn is_user_error(&self) -> bool {
        matches!(
            self.kind,
            DiagnosticKind::InvalidInteraction | DiagnosticKind::NotReady
        )
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}
