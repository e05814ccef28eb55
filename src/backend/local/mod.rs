//! In-process decision service.
//!
//! [`LocalBackend`] plays the game itself: it owns the current [`Match`],
//! answers the engine's calls directly and runs experiment batches. Moves
//! for the machine side come from a [`MovePolicy`].

mod game;
mod server;

pub use game::{knight_code, Match, MoveError};
pub use server::LocalServer;

use serde::{Deserialize, Serialize};
use serde_json::json;

use super::policy::{GreedyPolicy, MovePolicy};
use super::{AutomatedMatch, BackendError, BackendResult, GameBackend};
use crate::core::{Board, Cell, Difficulty, GameRng, Side, SideMap, Simulation};
use crate::experiments::{ExperimentResults, MatchupRecord};

/// Local backend configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalConfig {
    /// Board side length.
    pub board_size: usize,

    /// Point cells per board, valued `1, 2, ...`.
    pub point_cells: usize,

    /// Multiplier cells per board.
    pub multiplier_cells: usize,

    /// Moves (both sides, passes included) after which a match ends.
    pub max_moves: u32,

    /// Matches played per difficulty pairing in an experiment batch.
    pub games_per_matchup: u32,

    /// Seed for layouts and random move choices.
    pub seed: u64,
}

impl Default for LocalConfig {
    fn default() -> Self {
        Self {
            board_size: 8,
            point_cells: 10,
            multiplier_cells: 4,
            max_moves: 150,
            games_per_matchup: 10,
            seed: 42,
        }
    }
}

impl LocalConfig {
    /// Create a config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the number of matches per pairing.
    #[must_use]
    pub fn with_games_per_matchup(mut self, games: u32) -> Self {
        self.games_per_matchup = games;
        self
    }

    /// Set the move limit.
    #[must_use]
    pub fn with_max_moves(mut self, max_moves: u32) -> Self {
        self.max_moves = max_moves;
        self
    }
}

/// Game rules and opponent in one process.
///
/// White is the machine, black the human. The machine move is refused while
/// the human still has a legal move to make; a human without moves is passed
/// over.
#[derive(Clone, Debug)]
pub struct LocalBackend<P = GreedyPolicy> {
    config: LocalConfig,
    policy: P,
    rng: GameRng,
    game: Option<Match>,
    difficulty: Difficulty,
}

impl LocalBackend<GreedyPolicy> {
    /// Create a backend with the greedy baseline policy.
    #[must_use]
    pub fn new(config: LocalConfig) -> Self {
        Self::with_policy(config, GreedyPolicy)
    }
}

impl Default for LocalBackend<GreedyPolicy> {
    fn default() -> Self {
        Self::new(LocalConfig::default())
    }
}

impl<P: MovePolicy> LocalBackend<P> {
    /// Create a backend with a custom policy.
    pub fn with_policy(config: LocalConfig, policy: P) -> Self {
        let rng = GameRng::new(config.seed);
        Self {
            config,
            policy,
            rng,
            game: None,
            difficulty: Difficulty::Amateur,
        }
    }

    pub fn config(&self) -> &LocalConfig {
        &self.config
    }

    /// Current match, if one was started.
    pub fn game(&self) -> Option<&Match> {
        self.game.as_ref()
    }

    /// Difficulty used for machine moves.
    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    /// Replace the current match with a prepared one.
    pub fn load(&mut self, game: Match) {
        self.game = Some(game);
    }
}

impl<P: MovePolicy> GameBackend for LocalBackend<P> {
    fn initialize_board(&mut self) -> BackendResult<Board> {
        let game = Match::random(&self.config, &mut self.rng);
        let board = game.board().clone();
        self.game = Some(game);
        Ok(board)
    }

    fn request_automated_match(&mut self) -> BackendResult<AutomatedMatch> {
        let game = self
            .game
            .as_mut()
            .ok_or_else(|| not_started("request_automated_match"))?;

        let mut simulation = Simulation::new();
        play_out(
            game,
            &self.policy,
            SideMap::new(self.difficulty, self.difficulty),
            &mut self.rng,
            |g| simulation.push(g.frame()),
        );

        let report = match_report(game);
        log::info!("automated match finished after {} moves", game.moves());
        Ok(AutomatedMatch { simulation, report })
    }

    fn request_machine_move(&mut self) -> BackendResult<Simulation> {
        let operation = "request_machine_move";
        let game = self.game.as_mut().ok_or_else(|| not_started(operation))?;
        if game.is_over() {
            return Err(BackendError::rejected(operation, "the match is over"));
        }

        let mut simulation = Simulation::new();
        simulation.push(game.frame());

        if game.to_move() == Side::Black {
            if !game.legal_moves(Side::Black).is_empty() {
                return Err(BackendError::rejected(operation, "waiting for the human move"));
            }
            game.pass();
        }
        step(game, &self.policy, self.difficulty, &mut self.rng);

        simulation.push(game.frame());
        Ok(simulation)
    }

    fn submit_human_move(&mut self, cell: Cell) -> BackendResult<Simulation> {
        let operation = "submit_human_move";
        let game = self.game.as_mut().ok_or_else(|| not_started(operation))?;
        if game.to_move() != Side::Black {
            return Err(BackendError::rejected(operation, "not the human's turn"));
        }

        let before = game.frame();
        game.apply_move(cell)
            .map_err(|err| BackendError::rejected(operation, err.to_string()))?;
        Ok([before, game.frame()].into_iter().collect())
    }

    fn set_difficulty(&mut self, difficulty: Difficulty) -> BackendResult<()> {
        log::debug!("difficulty set to {}", difficulty);
        self.difficulty = difficulty;
        Ok(())
    }

    /// Reports `false` once the match is over, move limit included.
    fn points_remaining(&mut self) -> BackendResult<bool> {
        let game = self.game.as_ref().ok_or_else(|| not_started("points_remaining"))?;
        Ok(!game.is_over())
    }

    fn run_experiments(&mut self) -> BackendResult<ExperimentResults> {
        let mut results = ExperimentResults::new();

        for first in Difficulty::ALL {
            for second in Difficulty::ALL {
                let mut record = MatchupRecord::default();
                for _ in 0..self.config.games_per_matchup {
                    let mut rng = self.rng.fork();
                    let mut game = Match::random(&self.config, &mut rng);
                    play_out(&mut game, &self.policy, SideMap::new(first, second), &mut rng, |_| {});
                    record.record(game.winner());
                }
                log::debug!("{} vs {}: {}", first, second, record);
                results.insert(first, second, record);
            }
        }

        results.recompute_totals();
        log::info!("experiments finished: {}", results.totals);
        Ok(results)
    }
}

/// Play the side to move once, passing if it has no move.
fn step<P: MovePolicy>(game: &mut Match, policy: &P, difficulty: Difficulty, rng: &mut GameRng) {
    match policy.choose(game, difficulty, rng) {
        Some(to) => {
            if let Err(err) = game.apply_move(to) {
                log::warn!("policy chose an illegal move ({}); passing", err);
                game.pass();
            }
        }
        None => game.pass(),
    }
}

/// Play `game` to the end, observing every position including the last.
fn play_out<P: MovePolicy>(
    game: &mut Match,
    policy: &P,
    difficulties: SideMap<Difficulty>,
    rng: &mut GameRng,
    mut observe: impl FnMut(&Match),
) {
    while !game.is_over() {
        observe(game);
        let difficulty = difficulties[game.to_move()];
        step(game, policy, difficulty, rng);
    }
    observe(game);
}

fn match_report(game: &Match) -> serde_json::Value {
    let result = match game.winner() {
        Some(Side::White) => "white wins",
        Some(Side::Black) => "black wins",
        None => "draw",
    };
    json!({
        "result": result,
        "white_score": game.score().points[Side::White],
        "black_score": game.score().points[Side::Black],
    })
}

fn not_started(operation: &'static str) -> BackendError {
    BackendError::rejected(operation, "the game has not been initialized")
}
