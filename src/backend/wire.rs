//! JSON schemas of the decision service.
//!
//! Field names follow the service exactly. Every response is decoded into
//! one of these types first and then validated into domain types, so a
//! missing or ill-typed field surfaces as [`BackendError::Malformed`]
//! instead of a half-built board.

use rustc_hash::FxHashMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::BackendError;
use super::BackendResult;
use crate::core::{Board, BoardError, Difficulty, Score, Side, Simulation, SimulationFrame};
use crate::experiments::{ExperimentResults, ExperimentTotals, MatchupRecord};

/// Service routes.
pub mod routes {
    pub const START: &str = "/api/start";
    pub const AUTOMATED_MATCH: &str = "/api/partidaIaVSIa";
    pub const MACHINE_TURN: &str = "/api/ai-turn";
    pub const HUMAN_MOVE: &str = "/api/human-move";
    pub const UPDATE_DIFFICULTY: &str = "/api/update-difficulty";
    pub const POINTS_REMAINING: &str = "/api/quedan-puntos";
    pub const RUN_EXPERIMENTS: &str = "/api/run-experiments";
}

// =============================================================================
// Frames
// =============================================================================

/// One board snapshot as the service sends it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireFrame {
    pub matrix: Vec<Vec<i32>>,
    pub white_horse_points: u32,
    pub black_horse_points: u32,
    pub white_horse_multiplier: bool,
    pub black_horse_multiplier: bool,

    // Informational; ignored on decode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub moves_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_over: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub turn: Option<String>,
}

impl WireFrame {
    /// Encode a domain frame without the informational fields.
    #[must_use]
    pub fn from_frame(frame: &SimulationFrame) -> Self {
        let score = &frame.score;
        Self {
            matrix: frame.board.to_rows(),
            white_horse_points: score.points[Side::White],
            black_horse_points: score.points[Side::Black],
            white_horse_multiplier: score.multiplier[Side::White],
            black_horse_multiplier: score.multiplier[Side::Black],
            moves_count: None,
            game_over: None,
            turn: None,
        }
    }

    /// Validate into a domain frame.
    pub fn into_frame(self) -> Result<SimulationFrame, BoardError> {
        let board = Board::from_rows(&self.matrix)?;
        let score = Score::new(
            self.white_horse_points,
            self.black_horse_points,
            self.white_horse_multiplier,
            self.black_horse_multiplier,
        );
        Ok(SimulationFrame::new(board, score))
    }
}

/// Validate a list of frames, preserving order.
pub fn into_simulation(frames: Vec<WireFrame>) -> Result<Simulation, BoardError> {
    frames.into_iter().map(WireFrame::into_frame).collect()
}

/// Encode a simulation.
#[must_use]
pub fn from_simulation(simulation: &Simulation) -> Vec<WireFrame> {
    simulation.iter().map(WireFrame::from_frame).collect()
}

// =============================================================================
// Requests and responses
// =============================================================================

/// `/api/start` response. Only the matrix is required.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StartResponse {
    pub matrix: Vec<Vec<i32>>,
}

/// `/api/ai-turn` and `/api/human-move` response.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimulationResponse {
    pub simulation: Vec<WireFrame>,
}

/// `/api/partidaIaVSIa` response.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AutomatedMatchResponse {
    pub simulation: Vec<WireFrame>,
    pub report: Value,
}

/// `/api/human-move` request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HumanMoveRequest {
    pub row: usize,
    pub col: usize,
}

/// `/api/update-difficulty` request. `difficulty` is a lookahead depth.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DifficultyRequest {
    pub difficulty: i64,
}

/// `/api/update-difficulty` response.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DifficultyResponse {
    #[serde(default)]
    pub message: Option<String>,
    pub difficulty: i64,
}

/// `/api/quedan-puntos` response.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointsResponse {
    pub quedan_puntos: bool,
}

/// Error body returned with any non-success status.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

// =============================================================================
// Experiments
// =============================================================================

/// Totals block of `/api/run-experiments`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WireTotals {
    pub ia1: u32,
    pub ia1_percentage: f64,
    pub ia2: u32,
    pub ia2_percentage: f64,
    pub draws: u32,
    pub draws_percentage: f64,
}

/// One pairing in `/api/run-experiments`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireMatchup {
    pub wins_ai1: u32,
    pub wins_ai2: u32,
    pub draws: u32,
}

/// `/api/run-experiments` response: `details[first][second]`, keyed by
/// difficulty label.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExperimentsResponse {
    pub totals: WireTotals,
    pub details: FxHashMap<String, FxHashMap<String, WireMatchup>>,
}

impl ExperimentsResponse {
    /// Encode domain results.
    #[must_use]
    pub fn from_results(results: &ExperimentResults) -> Self {
        let t = &results.totals;
        let mut details: FxHashMap<String, FxHashMap<String, WireMatchup>> = FxHashMap::default();
        for (&(first, second), record) in &results.details {
            details
                .entry(first.wire_label().to_string())
                .or_default()
                .insert(
                    second.wire_label().to_string(),
                    WireMatchup {
                        wins_ai1: record.wins_first,
                        wins_ai2: record.wins_second,
                        draws: record.draws,
                    },
                );
        }

        Self {
            totals: WireTotals {
                ia1: t.wins_first,
                ia1_percentage: t.first_percentage,
                ia2: t.wins_second,
                ia2_percentage: t.second_percentage,
                draws: t.draws,
                draws_percentage: t.draws_percentage,
            },
            details,
        }
    }

    /// Validate into domain results. Unknown labels are malformed.
    ///
    /// Missing pairings are kept missing; the aggregator decides what that
    /// means.
    pub fn into_results(self) -> Result<ExperimentResults, String> {
        let label = |l: &str| {
            Difficulty::from_wire_label(l).ok_or_else(|| format!("unknown difficulty label '{}'", l))
        };

        let mut results = ExperimentResults::new();
        for (first, row) in &self.details {
            let first = label(first.as_str())?;
            for (second, m) in row {
                let second = label(second.as_str())?;
                results.insert(first, second, MatchupRecord::new(m.wins_ai1, m.wins_ai2, m.draws));
            }
        }

        let t = self.totals;
        results.totals = ExperimentTotals {
            wins_first: t.ia1,
            first_percentage: t.ia1_percentage,
            wins_second: t.ia2,
            second_percentage: t.ia2_percentage,
            draws: t.draws,
            draws_percentage: t.draws_percentage,
        };
        Ok(results)
    }
}

// =============================================================================
// Decoding
// =============================================================================

/// Decode a response body for `operation`.
///
/// An `{"error": ...}` body becomes [`BackendError::Rejected`]; anything
/// that does not fit `T` becomes [`BackendError::Malformed`].
pub fn decode<T: DeserializeOwned>(operation: &'static str, body: Value) -> BackendResult<T> {
    if let Some(message) = body.get("error").and_then(Value::as_str) {
        return Err(BackendError::rejected(operation, message));
    }
    serde_json::from_value(body).map_err(|err| BackendError::malformed(operation, err.to_string()))
}

/// Encode a request or response body.
pub fn encode<T: Serialize>(operation: &'static str, value: &T) -> BackendResult<Value> {
    serde_json::to_value(value).map_err(|err| BackendError::malformed(operation, err.to_string()))
}
