//! Crate-level error type.
//!
//! Each layer has its own error enum; [`Error`] collects them for callers
//! that drive the whole stack and only want to report what went wrong.

use thiserror::Error;

use crate::backend::BackendError;
use crate::core::BoardError;
use crate::engine::Diagnostic;
use crate::experiments::AggregationError;

/// Any failure surfaced by the crate.
#[derive(Debug, Error)]
pub enum Error {
    #[error("board: {0}")]
    Board(#[from] BoardError),

    #[error("backend: {0}")]
    Backend(#[from] BackendError),

    #[error("experiments: {0}")]
    Aggregation(#[from] AggregationError),

    /// User input the engine refused.
    #[error("refused: {0}")]
    Refused(Diagnostic),

    #[error("config: {0}")]
    Config(#[from] serde_json::Error),
}

impl From<Diagnostic> for Error {
    fn from(diagnostic: Diagnostic) -> Self {
        Error::Refused(diagnostic)
    }
}

/// Result alias using the crate error.
pub type Result<T> = std::result::Result<T, Error>;
