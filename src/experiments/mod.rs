//! Batch experiment results and their summary matrix.
//!
//! The decision service plays a fixed number of automated matches for every
//! ordered pair of difficulties. [`aggregate`] turns the raw per-pair counts
//! into a 3×3 matrix ready for display.

pub mod aggregator;
pub mod results;

pub use aggregator::{aggregate, AggregationError, ExperimentMatrix, MatrixRow};
pub use results::{ExperimentResults, ExperimentTotals, MatchupRecord};
