//! Raw experiment results as reported by the decision service.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::core::{Difficulty, Side};

/// Outcome counts for one `(first, second)` difficulty pairing.
///
/// The first player moves first (white).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MatchupRecord {
    pub wins_first: u32,
    pub wins_second: u32,
    pub draws: u32,
}

impl MatchupRecord {
    /// Create a record from raw counts.
    #[must_use]
    pub const fn new(wins_first: u32, wins_second: u32, draws: u32) -> Self {
        Self {
            wins_first,
            wins_second,
            draws,
        }
    }

    /// Count one finished game. `None` is a draw.
    pub fn record(&mut self, winner: Option<Side>) {
        match winner {
            Some(Side::White) => self.wins_first += 1,
            Some(Side::Black) => self.wins_second += 1,
            None => self.draws += 1,
        }
    }

    /// Games played.
    #[must_use]
    pub const fn games(&self) -> u32 {
        self.wins_first + self.wins_second + self.draws
    }
}

/// Formats as `wins_first-wins_second-draws`.
impl std::fmt::Display for MatchupRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}-{}", self.wins_first, self.wins_second, self.draws)
    }
}

/// Totals across every pairing.
///
/// Percentages are carried as reported; the aggregator never recomputes them.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ExperimentTotals {
    pub wins_first: u32,
    pub first_percentage: f64,
    pub wins_second: u32,
    pub second_percentage: f64,
    pub draws: u32,
    pub draws_percentage: f64,
}

impl ExperimentTotals {
    /// Build totals from counts, with percentages rounded to two decimals.
    ///
    /// All percentages are zero when no games were played.
    #[must_use]
    pub fn from_counts(wins_first: u32, wins_second: u32, draws: u32) -> Self {
        let total = wins_first + wins_second + draws;
        let percent = |n: u32| {
            if total == 0 {
                0.0
            } else {
                (n as f64 / total as f64 * 10_000.0).round() / 100.0
            }
        };

        Self {
            wins_first,
            first_percentage: percent(wins_first),
            wins_second,
            second_percentage: percent(wins_second),
            draws,
            draws_percentage: percent(draws),
        }
    }

    /// Games counted.
    #[must_use]
    pub const fn games(&self) -> u32 {
        self.wins_first + self.wins_second + self.draws
    }
}

impl std::fmt::Display for ExperimentTotals {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "first {} ({:.2}%), second {} ({:.2}%), draws {} ({:.2}%)",
            self.wins_first,
            self.first_percentage,
            self.wins_second,
            self.second_percentage,
            self.draws,
            self.draws_percentage
        )
    }
}

/// Per-pairing records plus totals.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExperimentResults {
    pub totals: ExperimentTotals,
    pub details: FxHashMap<(Difficulty, Difficulty), MatchupRecord>,
}

impl ExperimentResults {
    /// Create an empty result set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the record for a pairing, replacing any previous one.
    pub fn insert(&mut self, first: Difficulty, second: Difficulty, record: MatchupRecord) {
        self.details.insert((first, second), record);
    }

    /// Record for a pairing.
    #[must_use]
    pub fn get(&self, first: Difficulty, second: Difficulty) -> Option<&MatchupRecord> {
        self.details.get(&(first, second))
    }

    /// Recompute totals by summing every pairing.
    pub fn recompute_totals(&mut self) {
        let (w1, w2, d) = self.details.values().fold((0, 0, 0), |(w1, w2, d), r| {
            (w1 + r.wins_first, w2 + r.wins_second, d + r.draws)
        });
        self.totals = ExperimentTotals::from_counts(w1, w2, d);
    }
}
