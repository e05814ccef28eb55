//! The turn state machine.
//!
//! [`transition`] is a pure function from `(state, event)` to the next state
//! plus the commands to execute. [`GameStateMachine`] folds events through
//! it and keeps the current state.
//!
//! ## Turn Sequencing
//!
//! Human vs machine (white moves first):
//!
//! ```text
//! Start -> set difficulty -> points? -> machine move -> playback
//!       -> points? -> highlight delay -> human click -> playback
//!       -> points? -> machine move -> ...
//! ```
//!
//! Machine vs machine replaces the machine move with one automated match and
//! ends the game when its playback completes. Any points check answering
//! `false` ends the game.

use super::event::{Call, Command, Diagnostic, DiagnosticKind, Event, Outcome, Reply, Tick};
use super::state::{Awaiting, GameState, Origin, TurnState};
use crate::backend::BackendError;
use crate::core::{Cell, Difficulty, GameMode, SessionConfig, Simulation};
use crate::experiments::{aggregate, ExperimentResults};
use crate::rules::legal_moves_for_piece;

/// Result of one transition.
#[derive(Clone, Debug, PartialEq)]
pub struct Transition {
    pub state: GameState,
    pub commands: Vec<Command>,
}

/// Compute the state that follows `event`.
///
/// Replies and ticks stamped with an epoch other than the state's are
/// dropped without effect. Rejected user input produces a single
/// [`Command::Report`] and leaves the state untouched.
#[must_use]
pub fn transition(state: &GameState, event: Event) -> Transition {
    let mut next = state.clone();
    let mut commands = Vec::new();

    if event.epoch().is_some_and(|epoch| epoch != state.epoch) {
        return Transition {
            state: next,
            commands,
        };
    }

    match event {
        Event::Reset => reset(&mut next, &mut commands),
        Event::Start(mode) => start(&mut next, mode, &mut commands),
        Event::ChooseDifficulty(difficulty) => {
            choose_difficulty(&mut next, difficulty, &mut commands)
        }
        Event::Click(cell) => click(&mut next, cell, &mut commands),
        Event::Collaborator { reply, .. } => on_reply(&mut next, reply, &mut commands),
        Event::Timer { tick, .. } => on_tick(&mut next, tick, &mut commands),
    }

    Transition {
        state: next,
        commands,
    }
}

// =============================================================================
// User input
// =============================================================================

fn reset(s: &mut GameState, out: &mut Vec<Command>) {
    s.epoch += 1;
    s.turn = TurnState::Idle;
    s.awaiting = Awaiting::Board;
    s.in_progress = false;
    s.score = Default::default();
    s.legal_moves.clear();
    s.points_remaining = None;
    s.match_report = None;

    out.push(Command::CancelTimers);
    out.push(call(s, Call::InitializeBoard));
}

fn start(s: &mut GameState, mode: GameMode, out: &mut Vec<Command>) {
    if !s.can_start() {
        let diagnostic = match s.turn {
            TurnState::Idle => Diagnostic::new(
                DiagnosticKind::NotReady,
                format!("cannot start while waiting for {}", s.awaiting.describe()),
            ),
            TurnState::GameOver => Diagnostic::new(
                DiagnosticKind::InvalidInteraction,
                "game is over; reset before starting again",
            ),
            _ => Diagnostic::new(DiagnosticKind::InvalidInteraction, "a game is already running"),
        };
        out.push(Command::Report(diagnostic));
        return;
    }

    if !mode.is_interactive() {
        s.mode = mode;
        s.in_progress = true;
        s.awaiting = Awaiting::Experiments;
        out.push(call(s, Call::RunExperiments));
        return;
    }

    match &s.board {
        None => {
            out.push(report(DiagnosticKind::NotReady, "no board available"));
            return;
        }
        Some(board) if board.find_piece().is_none() => {
            out.push(report(DiagnosticKind::MissingPiece, "the board holds no human piece"));
            return;
        }
        Some(_) => {}
    }

    s.mode = mode;
    s.in_progress = true;
    s.awaiting = Awaiting::Difficulty;
    out.push(call(s, Call::SetDifficulty(s.difficulty)));
}

fn choose_difficulty(s: &mut GameState, difficulty: Difficulty, out: &mut Vec<Command>) {
    if s.in_progress {
        out.push(report(
            DiagnosticKind::InvalidInteraction,
            "difficulty can only change between games",
        ));
        return;
    }
    s.difficulty = difficulty;
}

fn click(s: &mut GameState, cell: Cell, out: &mut Vec<Command>) {
    if !s.accepts_clicks() {
        out.push(report(
            DiagnosticKind::InvalidInteraction,
            format!("click at {} ignored during {}", cell, s.turn),
        ));
        return;
    }
    if !s.legal_moves.contains(cell) {
        out.push(report(
            DiagnosticKind::InvalidInteraction,
            format!("{} is not a legal move", cell),
        ));
        return;
    }

    let Some(board) = s.board.as_mut() else {
        out.push(report(DiagnosticKind::NotReady, "no board available"));
        return;
    };
    let previous = board.clone();
    if let Err(err) = board.move_piece(cell) {
        out.push(report(DiagnosticKind::InvalidInteraction, err.to_string()));
        return;
    }

    s.legal_moves.clear();
    s.turn = TurnState::PlaybackAnimating;
    s.awaiting = Awaiting::HumanMove { previous };
    out.push(call(s, Call::SubmitHumanMove(cell)));
}

// =============================================================================
// Collaborator replies
// =============================================================================

fn on_reply(s: &mut GameState, reply: Reply, out: &mut Vec<Command>) {
    match reply {
        Reply::Failed { call, error } => on_failure(s, call, error, out),
        Reply::Board(board) if s.awaiting == Awaiting::Board => {
            s.board = Some(board);
            s.awaiting = Awaiting::None;
        }
        Reply::DifficultySet if s.awaiting == Awaiting::Difficulty => {
            s.turn = TurnState::MachineTurn;
            s.awaiting = Awaiting::PointsBeforeMachine;
            out.push(call(s, Call::QueryPointsRemaining));
        }
        Reply::PointsRemaining(remaining) => on_points(s, remaining, out),
        Reply::Simulation(simulation) => match s.awaiting {
            Awaiting::MachineMove => begin_playback(s, Origin::Machine, simulation, out),
            Awaiting::HumanMove { .. } => begin_playback(s, Origin::Human, simulation, out),
            _ => out.push(unexpected(s, "simulation")),
        },
        Reply::AutomatedMatch(automated) if s.awaiting == Awaiting::AutomatedMatch => {
            s.match_report = Some(automated.report);
            begin_playback(s, Origin::Match, automated.simulation, out);
        }
        Reply::Experiments(results) if s.awaiting == Awaiting::Experiments => {
            on_experiments(s, &results, out)
        }
        other => out.push(unexpected(s, other.describe())),
    }
}

fn on_points(s: &mut GameState, remaining: bool, out: &mut Vec<Command>) {
    let origin = match &s.awaiting {
        Awaiting::PointsBeforeMachine => None,
        Awaiting::PointsAfterPlayback { origin } => Some(*origin),
        _ => {
            out.push(unexpected(s, "points check"));
            return;
        }
    };

    s.points_remaining = Some(remaining);
    if !remaining {
        game_over(s, out);
        return;
    }

    match origin {
        None | Some(Origin::Human) => request_machine_action(s, out),
        Some(Origin::Machine) => {
            s.turn = TurnState::AwaitingHuman;
            s.legal_moves.clear();
            s.awaiting = Awaiting::HighlightDelay;
            out.push(Command::ScheduleHighlight { epoch: s.epoch });
        }
        // The automated match has been replayed in full.
        Some(Origin::Match) => game_over(s, out),
    }
}

fn on_experiments(s: &mut GameState, results: &ExperimentResults, out: &mut Vec<Command>) {
    match aggregate(results) {
        Ok(matrix) => out.push(Command::Publish(Outcome::Experiments(matrix))),
        Err(err) => out.push(report(DiagnosticKind::AggregationInconsistency, err.to_string())),
    }
    reset(s, out);
}

fn on_failure(s: &mut GameState, failed: Call, error: BackendError, out: &mut Vec<Command>) {
    if !s.awaiting.expects(&failed) {
        out.push(unexpected(s, "failure"));
        return;
    }
    out.push(Command::Report(Diagnostic::from_backend(&failed, &error)));

    match std::mem::take(&mut s.awaiting) {
        Awaiting::Difficulty => {
            s.in_progress = false;
            s.turn = TurnState::Idle;
        }
        Awaiting::HumanMove { previous } => {
            s.legal_moves = legal_moves_for_piece(&previous).unwrap_or_default();
            s.board = Some(previous);
            s.turn = TurnState::AwaitingHuman;
        }
        Awaiting::Experiments => s.in_progress = false,
        _ => {}
    }
}

// =============================================================================
// Timers
// =============================================================================

fn on_tick(s: &mut GameState, tick: Tick, out: &mut Vec<Command>) {
    let playing = match s.awaiting {
        Awaiting::Playback { origin } => Some(origin),
        _ => None,
    };

    match tick {
        Tick::Frame(frame) if playing.is_some() => {
            s.board = Some(frame.board);
            s.score = frame.score;
        }
        Tick::PlaybackDone => match playing {
            Some(origin) => {
                s.awaiting = Awaiting::PointsAfterPlayback { origin };
                out.push(call(s, Call::QueryPointsRemaining));
            }
            None => out.push(unexpected(s, "playback completion")),
        },
        Tick::HighlightDue if s.awaiting == Awaiting::HighlightDelay => {
            s.awaiting = Awaiting::None;
            highlight(s, out);
        }
        _ => out.push(unexpected(s, "timer tick")),
    }
}

fn highlight(s: &mut GameState, out: &mut Vec<Command>) {
    let moves = s.board.as_ref().and_then(legal_moves_for_piece);

    match moves {
        None => out.push(report(
            DiagnosticKind::MissingPiece,
            "cannot locate the human piece",
        )),
        Some(moves) if moves.is_empty() => {
            out.push(report(
                DiagnosticKind::NoLegalMoves,
                "the human piece has no legal moves; the turn passes",
            ));
            request_machine_action(s, out);
        }
        Some(moves) => s.legal_moves = moves,
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn request_machine_action(s: &mut GameState, out: &mut Vec<Command>) {
    s.turn = TurnState::MachineTurn;
    if s.mode == GameMode::MachineVsMachine {
        s.awaiting = Awaiting::AutomatedMatch;
        out.push(call(s, Call::RequestAutomatedMatch));
    } else {
        s.awaiting = Awaiting::MachineMove;
        out.push(call(s, Call::RequestMachineMove));
    }
}

fn begin_playback(s: &mut GameState, origin: Origin, simulation: Simulation, out: &mut Vec<Command>) {
    s.turn = TurnState::PlaybackAnimating;
    s.awaiting = Awaiting::Playback { origin };
    out.push(Command::StartPlayback {
        epoch: s.epoch,
        simulation,
    });
}

fn game_over(s: &mut GameState, out: &mut Vec<Command>) {
    s.turn = TurnState::GameOver;
    s.in_progress = false;
    s.awaiting = Awaiting::None;
    s.legal_moves.clear();

    out.push(Command::Publish(Outcome::GameOver {
        score: s.score,
        winner: s.score.leader(),
    }));
    if let Some(report) = s.match_report.take() {
        out.push(Command::Publish(Outcome::MatchReport(report)));
    }
}

fn call(s: &GameState, call: Call) -> Command {
    Command::Call {
        epoch: s.epoch,
        call,
    }
}

fn report(kind: DiagnosticKind, message: impl Into<String>) -> Command {
    Command::Report(Diagnostic::new(kind, message))
}

fn unexpected(s: &GameState, what: &str) -> Command {
    report(
        DiagnosticKind::UnexpectedReply,
        format!("unexpected {} while waiting for {}", what, s.awaiting.describe()),
    )
}

// =============================================================================
// Fold
// =============================================================================

/// Stateful wrapper folding events through [`transition`].
#[derive(Clone, Debug)]
pub struct GameStateMachine {
    state: GameState,
    events_handled: u64,
}

impl GameStateMachine {
    /// Create a machine in the idle state, without a board.
    #[must_use]
    pub fn new(config: &SessionConfig) -> Self {
        Self::from_state(GameState::new(config))
    }

    /// Resume from an existing state.
    #[must_use]
    pub fn from_state(state: GameState) -> Self {
        Self {
            state,
            events_handled: 0,
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Number of events folded so far (stale ones included).
    #[must_use]
    pub fn events_handled(&self) -> u64 {
        self.events_handled
    }

    /// Apply one event and return the commands to execute, in order.
    pub fn handle(&mut self, event: Event) -> Vec<Command> {
        self.events_handled += 1;

        if let Some(epoch) = event.epoch() {
            if epoch != self.state.epoch {
                log::debug!(
                    "dropping event from epoch {} (current {})",
                    epoch,
                    self.state.epoch
                );
                return Vec::new();
            }
        }

        let before = self.state.turn;
        let Transition { state, commands } = transition(&self.state, event);
        if state.turn != before {
            log::debug!("turn {} -> {}", before, state.turn);
        }
        self.state = state;
        commands
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{cell, Board};

    fn board() -> Board {
        let mut board = Board::empty(8);
        board.set(Cell::new(0, 0), cell::PIECE).unwrap();
        board.set(Cell::new(7, 7), cell::FORBIDDEN).unwrap();
        board.set(Cell::new(3, 3), 5).unwrap();
        board
    }

    fn ready() -> GameStateMachine {
        let mut state = GameState::default();
        state.board = Some(board());
        GameStateMachine::from_state(state)
    }

    fn reply(machine: &GameStateMachine, reply: Reply) -> Event {
        Event::Collaborator {
            epoch: machine.state().epoch,
            reply,
        }
    }

    #[test]
    fn test_reset_requests_board() {
        let mut machine = GameStateMachine::new(&SessionConfig::default());
        let commands = machine.handle(Event::Reset);

        assert_eq!(machine.state().epoch, 1);
        assert_eq!(machine.state().awaiting, Awaiting::Board);
        assert_eq!(
            commands,
            vec![
                Command::CancelTimers,
                Command::Call {
                    epoch: 1,
                    call: Call::InitializeBoard
                },
            ]
        );

        machine.handle(reply(&machine, Reply::Board(board())));
        assert!(machine.state().can_start());
    }

    #[test]
    fn test_start_sets_difficulty_first() {
        let mut machine = ready();
        let commands = machine.handle(Event::Start(GameMode::HumanVsMachine));

        assert!(machine.state().in_progress);
        assert_eq!(machine.state().turn, TurnState::Idle);
        assert!(matches!(
            commands.as_slice(),
            [Command::Call {
                call: Call::SetDifficulty(Difficulty::Amateur),
                ..
            }]
        ));
    }

    #[test]
    fn test_start_without_board() {
        let mut machine = GameStateMachine::new(&SessionConfig::default());
        let before = machine.state().clone();
        let commands = machine.handle(Event::Start(GameMode::HumanVsMachine));

        assert_eq!(machine.state(), &before);
        assert!(matches!(
            commands.as_slice(),
            [Command::Report(Diagnostic {
                kind: DiagnosticKind::NotReady,
                ..
            })]
        ));
    }

    #[test]
    fn test_difficulty_confirmed_checks_points() {
        let mut machine = ready();
        machine.handle(Event::Start(GameMode::HumanVsMachine));
        let commands = machine.handle(reply(&machine, Reply::DifficultySet));

        assert_eq!(machine.state().turn, TurnState::MachineTurn);
        assert_eq!(machine.state().awaiting, Awaiting::PointsBeforeMachine);
        assert!(matches!(
            commands.as_slice(),
            [Command::Call {
                call: Call::QueryPointsRemaining,
                ..
            }]
        ));
    }

    #[test]
    fn test_choose_difficulty_between_games_only() {
        let mut machine = ready();
        assert!(machine.handle(Event::ChooseDifficulty(Difficulty::Expert)).is_empty());
        assert_eq!(machine.state().difficulty, Difficulty::Expert);

        machine.handle(Event::Start(GameMode::HumanVsMachine));
        let commands = machine.handle(Event::ChooseDifficulty(Difficulty::Beginner));
        assert_eq!(machine.state().difficulty, Difficulty::Expert);
        assert_eq!(commands.len(), 1);
    }

    #[test]
    fn test_stale_reply_is_dropped() {
        let mut machine = ready();
        machine.handle(Event::Start(GameMode::HumanVsMachine));
        let before = machine.state().clone();

        let commands = machine.handle(Event::Collaborator {
            epoch: before.epoch + 1,
            reply: Reply::DifficultySet,
        });
        assert!(commands.is_empty());
        assert_eq!(machine.state(), &before);
        assert_eq!(machine.events_handled(), 2);
    }

    #[test]
    fn test_unexpected_reply_reported() {
        let mut machine = ready();
        let before = machine.state().clone();
        let commands = machine.handle(reply(&machine, Reply::PointsRemaining(true)));

        assert_eq!(machine.state(), &before);
        assert!(matches!(
            commands.as_slice(),
            [Command::Report(Diagnostic {
                kind: DiagnosticKind::UnexpectedReply,
                ..
            })]
        ));
    }

    #[test]
    fn test_transition_is_pure() {
        let state = ready().state().clone();
        let a = transition(&state, Event::Start(GameMode::MachineVsMachine));
        let b = transition(&state, Event::Start(GameMode::MachineVsMachine));
        assert_eq!(a, b);
        assert_eq!(state.turn, TurnState::Idle);
        assert!(!state.in_progress);
    }
}
