//! Summary matrix over every difficulty pairing.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::results::{ExperimentResults, ExperimentTotals};
use crate::core::Difficulty;

/// Aggregation failures. No partial matrix is ever produced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AggregationError {
    #[error("no results for {first} vs {second}")]
    MissingMatchup { first: Difficulty, second: Difficulty },
}

/// One matrix row: the first player's difficulty and one cell per column.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatrixRow {
    pub first: Difficulty,
    pub cells: Vec<String>,
}

/// Row/column summary of an experiment batch.
///
/// Rows are first-player difficulties and columns second-player
/// difficulties, both in [`Difficulty::ALL`] order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExperimentMatrix {
    pub columns: Vec<Difficulty>,
    pub rows: Vec<MatrixRow>,
    pub totals: ExperimentTotals,
}

impl ExperimentMatrix {
    /// Cell for `(first, second)`.
    #[must_use]
    pub fn cell(&self, first: Difficulty, second: Difficulty) -> Option<&str> {
        let column = self.columns.iter().position(|&c| c == second)?;
        self.rows
            .iter()
            .find(|row| row.first == first)
            .and_then(|row| row.cells.get(column))
            .map(String::as_str)
    }
}

/// Fixed-width text table, one line per row, followed by the totals.
impl std::fmt::Display for ExperimentMatrix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:<12}", "first\\second")?;
        for column in &self.columns {
            write!(f, "{:>10}", column.to_string())?;
        }
        writeln!(f)?;

        for row in &self.rows {
            write!(f, "{:<12}", row.first.to_string())?;
            for cell in &row.cells {
                write!(f, "{:>10}", cell)?;
            }
            writeln!(f)?;
        }

        write!(f, "{}", self.totals)
    }
}

/// Build the summary matrix from raw results.
///
/// Cell `(i, j)` is `"wins_first-wins_second-draws"` for difficulty `i`
/// playing first against difficulty `j`. Totals pass through unchanged.
pub fn aggregate(results: &ExperimentResults) -> Result<ExperimentMatrix, AggregationError> {
    let mut rows = Vec::with_capacity(Difficulty::ALL.len());

    for first in Difficulty::ALL {
        let cells = Difficulty::ALL
            .into_iter()
            .map(|second| {
                results
                    .get(first, second)
                    .map(ToString::to_string)
                    .ok_or(AggregationError::MissingMatchup { first, second })
            })
            .collect::<Result<Vec<_>, _>>()?;
        rows.push(MatrixRow { first, cells });
    }

    Ok(ExperimentMatrix {
        columns: Difficulty::ALL.to_vec(),
        rows,
        totals: results.totals,
    })
}
