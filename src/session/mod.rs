//! Session driver.
//!
//! [`GameSession`] owns a backend, the state machine and the timers, and
//! executes the commands the machine emits. Everything runs on the caller's
//! thread: collaborator calls block, and time only moves when the caller
//! invokes [`GameSession::advance`].
//!
//! ```
//! use smart_horses::backend::{LocalBackend, LocalConfig};
//! use smart_horses::core::{GameMode, SessionConfig};
//! use smart_horses::engine::TurnState;
//! use smart_horses::session::GameSession;
//!
//! let config = SessionConfig::new().with_mode(GameMode::MachineVsMachine);
//! let mut session = GameSession::new(LocalBackend::new(LocalConfig::default()), config);
//! session.start().unwrap();
//! session.run_until_idle(10_000);
//! assert_eq!(session.state().turn, TurnState::GameOver);
//! ```

use std::collections::VecDeque;
use std::time::Duration;

use crate::backend::GameBackend;
use crate::core::{Board, Cell, Difficulty, GameMode, Score, SessionConfig};
use crate::engine::{
    Call, Command, Diagnostic, DiagnosticKind, Event, GameState, GameStateMachine, Outcome, Reply,
    Tick, TurnState,
};
use crate::playback::{PlaybackEvent, PlaybackScheduler};
use crate::rules::LegalMoveSet;

/// One-shot timer for the highlight delay.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Countdown {
    epoch: u64,
    remaining: Duration,
}

/// Counters for a session's lifetime.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SessionStats {
    pub events: u64,
    pub calls: u64,
    pub failed_calls: u64,
    pub playbacks: u64,
}

/// Drives one game at a time against a backend.
pub struct GameSession<B> {
    backend: B,
    config: SessionConfig,
    machine: GameStateMachine,
    scheduler: PlaybackScheduler,
    /// Epoch of the playback the scheduler is running.
    playback_epoch: u64,
    highlight: Option<Countdown>,
    queue: VecDeque<Event>,
    outcomes: Vec<Outcome>,
    diagnostics: Vec<Diagnostic>,
    clock: Duration,
    stats: SessionStats,
}

impl<B: GameBackend> GameSession<B> {
    /// Create a session and fetch the first board.
    pub fn new(backend: B, config: SessionConfig) -> Self {
        let mut session = Self {
            backend,
            scheduler: PlaybackScheduler::new(config.frame_interval()),
            machine: GameStateMachine::new(&config),
            config,
            playback_epoch: 0,
            highlight: None,
            queue: VecDeque::new(),
            outcomes: Vec::new(),
            diagnostics: Vec::new(),
            clock: Duration::ZERO,
            stats: SessionStats::default(),
        };
        session.dispatch(Event::Reset);
        session
    }

    // =========================================================================
    // User input
    // =========================================================================

    /// Start a game in the configured mode.
    pub fn start(&mut self) -> Result<(), Diagnostic> {
        self.start_mode(self.config.mode)
    }

    /// Start a game in `mode`.
    pub fn start_mode(&mut self, mode: GameMode) -> Result<(), Diagnostic> {
        log::info!("starting {:?} at {}", mode, self.state().difficulty);
        self.submit(Event::Start(mode))
    }

    /// Change the difficulty for the next start. Refused while a game runs.
    pub fn set_difficulty(&mut self, difficulty: Difficulty) -> Result<(), Diagnostic> {
        self.submit(Event::ChooseDifficulty(difficulty))
    }

    /// Click a cell. Refused unless it is a highlighted destination.
    pub fn click(&mut self, cell: Cell) -> Result<(), Diagnostic> {
        self.submit(Event::Click(cell))
    }

    /// Abandon the current game and fetch a fresh board.
    pub fn reset(&mut self) {
        log::info!("reset");
        self.dispatch(Event::Reset);
    }

    // =========================================================================
    // Time
    // =========================================================================

    /// Move the clock forward by `elapsed`, firing every timer that falls due.
    ///
    /// Timers armed while handling an earlier timer count from the moment
    /// that timer fired, not from the end of `elapsed`.
    pub fn advance(&mut self, elapsed: Duration) {
        let mut remaining = elapsed;
        while let Some(due) = self.next_due() {
            if due > remaining {
                self.tick(remaining);
                remaining = Duration::ZERO;
                break;
            }
            self.tick(due);
            remaining -= due;
        }
        if !remaining.is_zero() {
            self.tick(remaining);
        }
        self.clock += elapsed;
    }

    /// Time until the next timer fires, or `None` if none is armed.
    #[must_use]
    pub fn next_due(&self) -> Option<Duration> {
        let playback = self.scheduler.time_until_next();
        let highlight = self.highlight.map(|h| h.remaining);
        match (playback, highlight) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Advance straight to each pending timer until none is armed or
    /// `max_steps` timers fired. Returns the number of steps taken.
    pub fn run_until_idle(&mut self, max_steps: usize) -> usize {
        let mut steps = 0;
        while steps < max_steps {
            let Some(due) = self.next_due() else {
                break;
            };
            self.advance(due);
            steps += 1;
        }
        steps
    }

    fn tick(&mut self, elapsed: Duration) {
        let epoch = self.playback_epoch;
        let mut fired: Vec<Event> = self
            .scheduler
            .advance(elapsed)
            .into_iter()
            .map(|event| {
                let tick = match event {
                    PlaybackEvent::Frame { frame, index, .. } => {
                        log::trace!("frame {}", index);
                        Tick::Frame(frame)
                    }
                    PlaybackEvent::Completed { .. } => Tick::PlaybackDone,
                };
                Event::Timer { epoch, tick }
            })
            .collect();

        if let Some(countdown) = self.highlight.as_mut() {
            countdown.remaining = countdown.remaining.saturating_sub(elapsed);
            if countdown.remaining.is_zero() {
                fired.push(Event::Timer {
                    epoch: countdown.epoch,
                    tick: Tick::HighlightDue,
                });
                self.highlight = None;
            }
        }

        for event in fired {
            self.dispatch(event);
        }
    }

    // =========================================================================
    // Command execution
    // =========================================================================

    /// Dispatch user input and report the first user-facing rejection.
    fn submit(&mut self, event: Event) -> Result<(), Diagnostic> {
        let before = self.diagnostics.len();
        self.dispatch(event);
        match self.diagnostics[before..].iter().find(|d| d.is_user_error()) {
            Some(diagnostic) => Err(diagnostic.clone()),
            None => Ok(()),
        }
    }

    /// Feed `event` and every reply it causes through the machine.
    fn dispatch(&mut self, event: Event) {
        self.queue.push_back(event);
        while let Some(event) = self.queue.pop_front() {
            self.stats.events += 1;
            for command in self.machine.handle(event) {
                self.execute(command);
            }
        }
    }

    fn execute(&mut self, command: Command) {
        match command {
            Command::Call { epoch, call } => {
                let reply = self.invoke(call);
                self.queue.push_back(Event::Collaborator { epoch, reply });
            }
            Command::StartPlayback { epoch, simulation } => {
                log::debug!("playing back {} frames", simulation.len());
                self.playback_epoch = epoch;
                self.scheduler.start(simulation);
                self.stats.playbacks += 1;
            }
            Command::CancelTimers => {
                self.scheduler.cancel_active();
                self.highlight = None;
            }
            Command::ScheduleHighlight { epoch } => {
                self.highlight = Some(Countdown {
                    epoch,
                    remaining: self.config.highlight_delay(),
                });
            }
            Command::Publish(outcome) => {
                match &outcome {
                    Outcome::GameOver { score, winner } => match winner {
                        Some(side) => log::info!("game over, {} wins ({})", side, score),
                        None => log::info!("game over, draw ({})", score),
                    },
                    Outcome::MatchReport(report) => log::info!("match report: {}", report),
                    Outcome::Experiments(matrix) => {
                        log::info!("experiments aggregated: {}", matrix.totals)
                    }
                }
                self.outcomes.push(outcome);
            }
            Command::Report(diagnostic) => {
                if diagnostic.kind == DiagnosticKind::AggregationInconsistency {
                    log::error!("{}", diagnostic);
                } else {
                    log::warn!("{}", diagnostic);
                }
                self.diagnostics.push(diagnostic);
            }
        }
    }

    fn invoke(&mut self, call: Call) -> Reply {
        self.stats.calls += 1;
        log::debug!("calling {}", call.operation());

        let result = match call {
            Call::InitializeBoard => self.backend.initialize_board().map(Reply::Board),
            Call::SetDifficulty(difficulty) => self
                .backend
                .set_difficulty(difficulty)
                .map(|()| Reply::DifficultySet),
            Call::QueryPointsRemaining => self.backend.points_remaining().map(Reply::PointsRemaining),
            Call::RequestMachineMove => self.backend.request_machine_move().map(Reply::Simulation),
            Call::RequestAutomatedMatch => self
                .backend
                .request_automated_match()
                .map(Reply::AutomatedMatch),
            Call::SubmitHumanMove(cell) => self.backend.submit_human_move(cell).map(Reply::Simulation),
            Call::RunExperiments => self.backend.run_experiments().map(Reply::Experiments),
        };

        result.unwrap_or_else(|error| {
            self.stats.failed_calls += 1;
            Reply::Failed { call, error }
        })
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    #[must_use]
    pub fn state(&self) -> &GameState {
        self.machine.state()
    }

    #[must_use]
    pub fn turn(&self) -> TurnState {
        self.state().turn
    }

    #[must_use]
    pub fn board(&self) -> Option<&Board> {
        self.state().board.as_ref()
    }

    #[must_use]
    pub fn score(&self) -> &Score {
        &self.state().score
    }

    #[must_use]
    pub fn legal_moves(&self) -> &LegalMoveSet {
        &self.state().legal_moves
    }

    /// Published results, oldest first.
    #[must_use]
    pub fn outcomes(&self) -> &[Outcome] {
        &self.outcomes
    }

    /// Drain published results.
    pub fn take_outcomes(&mut self) -> Vec<Outcome> {
        std::mem::take(&mut self.outcomes)
    }

    /// Reported problems, oldest first.
    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Drain reported problems.
    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    /// Check whether a playback or the highlight delay is pending.
    #[must_use]
    pub fn has_pending_timers(&self) -> bool {
        self.next_due().is_some()
    }

    /// Total time advanced.
    #[must_use]
    pub fn clock(&self) -> Duration {
        self.clock
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }
}
