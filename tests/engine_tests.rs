//! Turn state machine integration tests.
//!
//! Every test scripts collaborator replies and timer ticks by hand, so the
//! whole turn sequence runs without a backend or a clock.

use serde_json::json;

use smart_horses::backend::{AutomatedMatch, BackendError};
use smart_horses::core::{cell, Board, Cell, Difficulty, GameMode, Score, SessionConfig, Side};
use smart_horses::core::{Simulation, SimulationFrame};
use smart_horses::engine::{
    transition, Awaiting, Call, Command, DiagnosticKind, Event, GameState, GameStateMachine,
    Origin, Outcome, Reply, Tick, TurnState,
};
use smart_horses::experiments::{ExperimentResults, MatchupRecord};

// =============================================================================
// Fixtures
// =============================================================================

const HUMAN_TARGET: Cell = Cell::new(1, 2);

/// Piece at (0, 0), machine knight at (4, 4), two point cells.
fn initial_board() -> Board {
    Board::from_rows(&[
        vec![12, 0, 0, 0, 0],
        vec![0, 0, 5, 0, 0],
        vec![0, 0, 0, 0, 0],
        vec![0, 0, 0, 3, 0],
        vec![0, 0, 0, 0, 11],
    ])
    .unwrap()
}

/// After the machine took the 3: its knight blocks (2, 1), leaving (1, 2).
fn after_machine() -> Board {
    Board::from_rows(&[
        vec![12, 0, 0, 0, 0],
        vec![0, 0, 5, 0, 0],
        vec![0, 11, 0, 0, 0],
        vec![0, 0, 0, 0, 0],
        vec![0, 0, 0, 0, 0],
    ])
    .unwrap()
}

/// After the human took the 5.
fn after_human() -> Board {
    Board::from_rows(&[
        vec![0, 0, 0, 0, 0],
        vec![0, 0, 12, 0, 0],
        vec![0, 11, 0, 0, 0],
        vec![0, 0, 0, 0, 0],
        vec![0, 0, 0, 0, 0],
    ])
    .unwrap()
}

fn frame(board: Board, white: u32, black: u32) -> SimulationFrame {
    SimulationFrame::new(board, Score::new(white, black, false, false))
}

fn machine_move() -> Simulation {
    [frame(initial_board(), 0, 0), frame(after_machine(), 3, 0)]
        .into_iter()
        .collect()
}

fn human_move() -> Simulation {
    [frame(after_machine(), 3, 0), frame(after_human(), 3, 5)]
        .into_iter()
        .collect()
}

fn full_results() -> ExperimentResults {
    let mut results = ExperimentResults::new();
    for first in Difficulty::ALL {
        for second in Difficulty::ALL {
            results.insert(first, second, MatchupRecord::new(5, 3, 2));
        }
    }
    results.recompute_totals();
    results
}

/// Folds events and keeps every intermediate state.
struct Script {
    machine: GameStateMachine,
    history: Vec<GameState>,
}

impl Script {
    /// A machine holding `initial_board`, ready to start.
    fn new(mode: GameMode) -> Self {
        let config = SessionConfig::new().with_mode(mode);
        let mut script = Self {
            machine: GameStateMachine::new(&config),
            history: Vec::new(),
        };
        script.history.push(script.state().clone());
        script.send(Event::Reset);
        script.reply(Reply::Board(initial_board()));
        script
    }

    fn state(&self) -> &GameState {
        self.machine.state()
    }

    fn send(&mut self, event: Event) -> Vec<Command> {
        let commands = self.machine.handle(event);
        self.history.push(self.state().clone());
        commands
    }

    fn reply(&mut self, reply: Reply) -> Vec<Command> {
        let epoch = self.state().epoch;
        self.send(Event::Collaborator { epoch, reply })
    }

    fn tick(&mut self, tick: Tick) -> Vec<Command> {
        let epoch = self.state().epoch;
        self.send(Event::Timer { epoch, tick })
    }

    /// Deliver every frame of `simulation`, then completion.
    fn play_back(&mut self, simulation: &Simulation) -> Vec<Command> {
        for frame in simulation.iter() {
            let commands = self.tick(Tick::Frame(frame.clone()));
            assert!(commands.is_empty(), "frame produced {:?}", commands);
        }
        self.tick(Tick::PlaybackDone)
    }

    /// Human vs machine up to the highlighted human turn.
    fn to_human_turn(&mut self) {
        expect_call(&self.send(Event::Start(GameMode::HumanVsMachine)));
        expect_call(&self.reply(Reply::DifficultySet));
        assert_eq!(
            expect_call(&self.reply(Reply::PointsRemaining(true))),
            Call::RequestMachineMove
        );
        self.reply(Reply::Simulation(machine_move()));
        expect_call(&self.play_back(&machine_move()));
        self.reply(Reply::PointsRemaining(true));
        self.tick(Tick::HighlightDue);
        assert!(self.state().accepts_clicks());
    }
}

/// The only command must be a collaborator call; return it.
fn expect_call(commands: &[Command]) -> Call {
    match commands {
        [Command::Call { call, .. }] => *call,
        other => panic!("expected one call, got {:?}", other),
    }
}

fn diagnostic_kinds(commands: &[Command]) -> Vec<DiagnosticKind> {
    commands
        .iter()
        .filter_map(|c| match c {
            Command::Report(d) => Some(d.kind),
            _ => None,
        })
        .collect()
}

fn has_call(commands: &[Command]) -> bool {
    commands.iter().any(|c| matches!(c, Command::Call { .. }))
}

// =============================================================================
// Human vs Machine
// =============================================================================

#[test]
fn test_machine_turn_sequence() {
    let mut script = Script::new(GameMode::HumanVsMachine);

    let commands = script.send(Event::Start(GameMode::HumanVsMachine));
    assert_eq!(expect_call(&commands), Call::SetDifficulty(Difficulty::Amateur));

    // Points are checked before the first machine action.
    let commands = script.reply(Reply::DifficultySet);
    assert_eq!(expect_call(&commands), Call::QueryPointsRemaining);
    assert_eq!(script.state().turn, TurnState::MachineTurn);

    let commands = script.reply(Reply::PointsRemaining(true));
    assert_eq!(expect_call(&commands), Call::RequestMachineMove);

    let commands = script.reply(Reply::Simulation(machine_move()));
    assert_eq!(script.state().turn, TurnState::PlaybackAnimating);
    assert!(matches!(
        commands.as_slice(),
        [Command::StartPlayback { simulation, .. }] if simulation.len() == 2
    ));

    let commands = script.play_back(&machine_move());
    assert_eq!(expect_call(&commands), Call::QueryPointsRemaining);
    assert_eq!(script.state().board, Some(after_machine()));
    assert_eq!(script.state().score, Score::new(3, 0, false, false));

    // Human input opens only after the highlight delay.
    let commands = script.reply(Reply::PointsRemaining(true));
    assert!(matches!(commands.as_slice(), [Command::ScheduleHighlight { .. }]));
    assert_eq!(script.state().turn, TurnState::AwaitingHuman);
    assert!(!script.state().accepts_clicks());
    assert!(script.state().legal_moves.is_empty());

    let commands = script.tick(Tick::HighlightDue);
    assert!(commands.is_empty());
    assert_eq!(script.state().legal_moves.sorted(), vec![HUMAN_TARGET]);
}

#[test]
fn test_human_move_sequence() {
    let mut script = Script::new(GameMode::HumanVsMachine);
    script.to_human_turn();

    let commands = script.send(Event::Click(HUMAN_TARGET));
    assert_eq!(expect_call(&commands), Call::SubmitHumanMove(HUMAN_TARGET));

    // Optimistic local update.
    let state = script.state();
    assert_eq!(state.turn, TurnState::PlaybackAnimating);
    assert!(state.legal_moves.is_empty());
    let board = state.board.as_ref().unwrap();
    assert_eq!(board.get(HUMAN_TARGET), Some(cell::PIECE));
    assert_eq!(board.get(Cell::new(0, 0)), Some(cell::EMPTY));

    script.reply(Reply::Simulation(human_move()));
    let commands = script.play_back(&human_move());
    assert_eq!(expect_call(&commands), Call::QueryPointsRemaining);
    assert_eq!(script.state().score, Score::new(3, 5, false, false));

    // The human's playback doubles as the check before the machine moves.
    let commands = script.reply(Reply::PointsRemaining(true));
    assert_eq!(expect_call(&commands), Call::RequestMachineMove);
    assert_eq!(script.state().turn, TurnState::MachineTurn);
}

#[test]
fn test_no_points_after_human_move_ends_game() {
    let mut script = Script::new(GameMode::HumanVsMachine);
    script.to_human_turn();
    script.send(Event::Click(HUMAN_TARGET));
    script.reply(Reply::Simulation(human_move()));
    script.play_back(&human_move());

    let commands = script.reply(Reply::PointsRemaining(false));
    assert_eq!(script.state().turn, TurnState::GameOver);
    assert!(!script.state().in_progress);
    assert_eq!(
        commands,
        vec![Command::Publish(Outcome::GameOver {
            score: Score::new(3, 5, false, false),
            winner: Some(Side::Black),
        })]
    );
}

#[test]
fn test_no_points_before_machine_move_ends_game() {
    let mut script = Script::new(GameMode::HumanVsMachine);
    script.send(Event::Start(GameMode::HumanVsMachine));
    script.reply(Reply::DifficultySet);

    let commands = script.reply(Reply::PointsRemaining(false));
    assert_eq!(script.state().turn, TurnState::GameOver);
    assert!(matches!(
        commands.as_slice(),
        [Command::Publish(Outcome::GameOver { winner: None, .. })]
    ));
}

#[test]
fn test_human_without_moves_passes() {
    let blocked = Board::from_rows(&[
        vec![12, 0, 0, 0, 0],
        vec![0, 0, 11, 0, 0],
        vec![0, 11, 0, 0, 0],
        vec![0, 0, 0, 0, 4],
        vec![0, 0, 0, 0, 0],
    ])
    .unwrap();
    let simulation: Simulation = [frame(blocked, 1, 0)].into_iter().collect();

    let mut script = Script::new(GameMode::HumanVsMachine);
    script.send(Event::Start(GameMode::HumanVsMachine));
    script.reply(Reply::DifficultySet);
    script.reply(Reply::PointsRemaining(true));
    script.reply(Reply::Simulation(simulation.clone()));
    script.play_back(&simulation);
    script.reply(Reply::PointsRemaining(true));

    let commands = script.tick(Tick::HighlightDue);
    assert_eq!(diagnostic_kinds(&commands), vec![DiagnosticKind::NoLegalMoves]);
    assert!(commands.contains(&Command::Call {
        epoch: script.state().epoch,
        call: Call::RequestMachineMove,
    }));
    assert_eq!(script.state().turn, TurnState::MachineTurn);
}

// =============================================================================
// Machine vs Machine
// =============================================================================

#[test]
fn test_automated_match_sequence() {
    let simulation: Simulation = [
        frame(initial_board(), 0, 0),
        frame(after_machine(), 3, 0),
        frame(after_human(), 3, 5),
    ]
    .into_iter()
    .collect();
    let report = json!({"result": "black wins"});

    let mut script = Script::new(GameMode::MachineVsMachine);
    script.send(Event::Start(GameMode::MachineVsMachine));
    script.reply(Reply::DifficultySet);
    let commands = script.reply(Reply::PointsRemaining(true));
    assert_eq!(expect_call(&commands), Call::RequestAutomatedMatch);

    let commands = script.reply(Reply::AutomatedMatch(AutomatedMatch {
        simulation: simulation.clone(),
        report: report.clone(),
    }));
    assert!(matches!(
        commands.as_slice(),
        [Command::StartPlayback { simulation: s, .. }] if s.len() == 3
    ));
    assert_eq!(
        script.state().awaiting,
        Awaiting::Playback {
            origin: Origin::Match
        }
    );

    let commands = script.play_back(&simulation);
    assert_eq!(expect_call(&commands), Call::QueryPointsRemaining);

    // The replayed match is over whatever the service answers.
    let commands = script.reply(Reply::PointsRemaining(true));
    assert_eq!(script.state().turn, TurnState::GameOver);
    assert_eq!(
        commands,
        vec![
            Command::Publish(Outcome::GameOver {
                score: Score::new(3, 5, false, false),
                winner: Some(Side::Black),
            }),
            Command::Publish(Outcome::MatchReport(report)),
        ]
    );
}

// =============================================================================
// Experiments
// =============================================================================

#[test]
fn test_experiments_publish_then_reset() {
    let mut script = Script::new(GameMode::Experiment);
    let epoch = script.state().epoch;

    let commands = script.send(Event::Start(GameMode::Experiment));
    assert_eq!(expect_call(&commands), Call::RunExperiments);
    assert!(script.state().in_progress);

    let commands = script.reply(Reply::Experiments(full_results()));
    match commands.as_slice() {
        [Command::Publish(Outcome::Experiments(matrix)), Command::CancelTimers, Command::Call { epoch: e, call: Call::InitializeBoard }] =>
        {
            assert_eq!(*e, epoch + 1);
            assert_eq!(matrix.rows.len(), 3);
            assert_eq!(matrix.cell(Difficulty::Expert, Difficulty::Beginner), Some("5-3-2"));
        }
        other => panic!("unexpected commands {:?}", other),
    }
    assert_eq!(script.state().turn, TurnState::Idle);
    assert_eq!(script.state().awaiting, Awaiting::Board);
    assert!(!script.state().in_progress);
}

#[test]
fn test_incomplete_experiments_reported() {
    let mut results = full_results();
    results.details.remove(&(Difficulty::Amateur, Difficulty::Expert));

    let mut script = Script::new(GameMode::Experiment);
    script.send(Event::Start(GameMode::Experiment));
    let commands = script.reply(Reply::Experiments(results));

    assert_eq!(
        diagnostic_kinds(&commands),
        vec![DiagnosticKind::AggregationInconsistency]
    );
    assert!(!commands
        .iter()
        .any(|c| matches!(c, Command::Publish(_))));
}

// =============================================================================
// Clicks
// =============================================================================

#[test]
fn test_click_accepted_only_when_awaiting_human_and_legal() {
    let mut script = Script::new(GameMode::HumanVsMachine);
    script.to_human_turn();
    script.send(Event::Click(HUMAN_TARGET));
    script.reply(Reply::Simulation(human_move()));

    let cells: Vec<Cell> = (0..5)
        .flat_map(|r| (0..5).map(move |c| Cell::new(r, c)))
        .collect();

    for state in &script.history {
        for &cell in &cells {
            let accepted = state.accepts_clicks() && state.legal_moves.contains(cell);
            let next = transition(state, Event::Click(cell));

            if accepted {
                assert_eq!(
                    next.commands,
                    vec![Command::Call {
                        epoch: state.epoch,
                        call: Call::SubmitHumanMove(cell),
                    }]
                );
            } else {
                assert_eq!(&next.state, state, "click at {} changed {}", cell, state.turn);
                assert!(!has_call(&next.commands));
                assert_eq!(
                    diagnostic_kinds(&next.commands),
                    vec![DiagnosticKind::InvalidInteraction]
                );
            }
        }
    }
}

// =============================================================================
// Reset and Epochs
// =============================================================================

#[test]
fn test_reset_from_any_state() {
    let mut script = Script::new(GameMode::HumanVsMachine);
    script.to_human_turn();
    script.send(Event::Click(HUMAN_TARGET));
    script.reply(Reply::Simulation(human_move()));
    script.play_back(&human_move());
    script.reply(Reply::PointsRemaining(false));

    for state in &script.history {
        let next = transition(state, Event::Reset);

        assert_eq!(next.state.turn, TurnState::Idle);
        assert_eq!(next.state.epoch, state.epoch + 1);
        assert_eq!(next.state.score, Score::default());
        assert!(next.state.legal_moves.is_empty());
        assert!(!next.state.in_progress);
        assert_eq!(
            next.commands,
            vec![
                Command::CancelTimers,
                Command::Call {
                    epoch: state.epoch + 1,
                    call: Call::InitializeBoard,
                },
            ]
        );
    }
}

#[test]
fn test_replies_from_abandoned_game_are_ignored() {
    let mut script = Script::new(GameMode::HumanVsMachine);
    script.send(Event::Start(GameMode::HumanVsMachine));
    script.reply(Reply::DifficultySet);
    script.reply(Reply::PointsRemaining(true));
    script.reply(Reply::Simulation(machine_move()));
    let old_epoch = script.state().epoch;

    script.send(Event::Reset);
    let after_reset = script.state().clone();

    let late = [
        Event::Timer {
            epoch: old_epoch,
            tick: Tick::Frame(frame(after_machine(), 3, 0)),
        },
        Event::Timer {
            epoch: old_epoch,
            tick: Tick::PlaybackDone,
        },
        Event::Collaborator {
            epoch: old_epoch,
            reply: Reply::PointsRemaining(false),
        },
        Event::Timer {
            epoch: old_epoch,
            tick: Tick::HighlightDue,
        },
    ];
    for event in late {
        assert!(script.send(event).is_empty());
        assert_eq!(script.state(), &after_reset);
    }

    // The new game's board still lands.
    script.reply(Reply::Board(after_human()));
    assert_eq!(script.state().board, Some(after_human()));
    assert!(script.state().can_start());
}

#[test]
fn test_start_refused_while_running_or_over() {
    let mut script = Script::new(GameMode::HumanVsMachine);
    script.send(Event::Start(GameMode::HumanVsMachine));
    script.reply(Reply::DifficultySet);

    let before = script.state().clone();
    let commands = script.send(Event::Start(GameMode::MachineVsMachine));
    assert_eq!(script.state(), &before);
    assert_eq!(diagnostic_kinds(&commands), vec![DiagnosticKind::InvalidInteraction]);

    script.reply(Reply::PointsRemaining(false));
    let commands = script.send(Event::Start(GameMode::HumanVsMachine));
    assert_eq!(diagnostic_kinds(&commands), vec![DiagnosticKind::InvalidInteraction]);
    assert_eq!(script.state().turn, TurnState::GameOver);
}

#[test]
fn test_start_refused_while_board_pending() {
    let config = SessionConfig::default();
    let mut machine = GameStateMachine::new(&config);
    machine.handle(Event::Reset);

    let commands = machine.handle(Event::Start(GameMode::HumanVsMachine));
    assert_eq!(diagnostic_kinds(&commands), vec![DiagnosticKind::NotReady]);
}

#[test]
fn test_start_refused_without_piece() {
    let config = SessionConfig::default();
    let mut machine = GameStateMachine::new(&config);
    machine.handle(Event::Reset);
    machine.handle(Event::Collaborator {
        epoch: 1,
        reply: Reply::Board(Board::empty(5)),
    });

    let commands = machine.handle(Event::Start(GameMode::HumanVsMachine));
    assert_eq!(diagnostic_kinds(&commands), vec![DiagnosticKind::MissingPiece]);
    assert!(!machine.state().in_progress);
}

// =============================================================================
// Collaborator Failures
// =============================================================================

#[test]
fn test_difficulty_failure_returns_to_idle() {
    let mut script = Script::new(GameMode::HumanVsMachine);
    script.send(Event::Start(GameMode::HumanVsMachine));

    let commands = script.reply(Reply::Failed {
        call: Call::SetDifficulty(Difficulty::Amateur),
        error: BackendError::Transport("connection refused".into()),
    });

    assert_eq!(diagnostic_kinds(&commands), vec![DiagnosticKind::TransportFailure]);
    assert!(!has_call(&commands));
    assert_eq!(script.state().turn, TurnState::Idle);
    assert!(!script.state().in_progress);
    assert!(script.state().can_start());
}

#[test]
fn test_rejected_human_move_is_reverted() {
    let mut script = Script::new(GameMode::HumanVsMachine);
    script.to_human_turn();
    let offered = script.state().legal_moves.clone();

    script.send(Event::Click(HUMAN_TARGET));
    let commands = script.reply(Reply::Failed {
        call: Call::SubmitHumanMove(HUMAN_TARGET),
        error: BackendError::rejected("submit_human_move", "illegal move"),
    });

    assert_eq!(diagnostic_kinds(&commands), vec![DiagnosticKind::Rejected]);
    let state = script.state();
    assert_eq!(state.board, Some(after_machine()));
    assert_eq!(state.legal_moves, offered);
    assert!(state.accepts_clicks());

    // The player can retry.
    let commands = script.send(Event::Click(HUMAN_TARGET));
    assert_eq!(expect_call(&commands), Call::SubmitHumanMove(HUMAN_TARGET));
}

#[test]
fn test_malformed_machine_move_parks_game() {
    let mut script = Script::new(GameMode::HumanVsMachine);
    script.send(Event::Start(GameMode::HumanVsMachine));
    script.reply(Reply::DifficultySet);
    script.reply(Reply::PointsRemaining(true));
    let board = script.state().board.clone();

    let commands = script.reply(Reply::Failed {
        call: Call::RequestMachineMove,
        error: BackendError::malformed("request_machine_move", "missing field `simulation`"),
    });

    assert_eq!(diagnostic_kinds(&commands), vec![DiagnosticKind::MalformedResponse]);
    assert_eq!(script.state().board, board);
    assert_eq!(script.state().awaiting, Awaiting::None);
    assert!(!script.state().accepts_clicks());

    // Only a reset gets out.
    script.send(Event::Reset);
    assert_eq!(script.state().awaiting, Awaiting::Board);
}

#[test]
fn test_failure_for_other_call_is_unexpected() {
    let mut script = Script::new(GameMode::HumanVsMachine);
    script.send(Event::Start(GameMode::HumanVsMachine));
    let before = script.state().clone();

    let commands = script.reply(Reply::Failed {
        call: Call::RunExperiments,
        error: BackendError::Transport("timeout".into()),
    });
    assert_eq!(diagnostic_kinds(&commands), vec![DiagnosticKind::UnexpectedReply]);
    assert_eq!(script.state(), &before);
}

#[test]
fn test_experiment_failure_clears_progress() {
    let mut script = Script::new(GameMode::Experiment);
    script.send(Event::Start(GameMode::Experiment));

    let commands = script.reply(Reply::Failed {
        call: Call::RunExperiments,
        error: BackendError::Transport("timeout".into()),
    });
    assert_eq!(diagnostic_kinds(&commands), vec![DiagnosticKind::TransportFailure]);
    assert!(!script.state().in_progress);
    assert!(script.state().can_start());
}
