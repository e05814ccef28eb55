//! Collaborator errors.

use thiserror::Error;

use crate::core::BoardError;

/// A failed collaborator call.
///
/// None of these are retried. The engine reports them and abandons the
/// step that triggered the call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    /// The request never produced a response.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The response was missing a field or held an invalid value.
    #[error("malformed {operation} response: {reason}")]
    Malformed {
        operation: &'static str,
        reason: String,
    },

    /// The service answered with an error (e.g. an illegal move).
    #[error("{operation} rejected: {reason}")]
    Rejected {
        operation: &'static str,
        reason: String,
    },
}

impl BackendError {
    /// Shorthand for [`BackendError::Malformed`].
    pub fn malformed(operation: &'static str, reason: impl Into<String>) -> Self {
        BackendError::Malformed {
            operation,
            reason: reason.into(),
        }
    }

    /// Shorthand for [`BackendError::Rejected`].
    pub fn rejected(operation: &'static str, reason: impl Into<String>) -> Self {
        BackendError::Rejected {
            operation,
            reason: reason.into(),
        }
    }
}

impl From<BoardError> for BackendError {
    fn from(err: BoardError) -> Self {
        BackendError::malformed("board", err.to_string())
    }
}
