//! Score Errors

use crate::feed::protocol::ErrorCode;

/// Errors raised by the transition engine.
///
/// Signal derivation never fails; only point application and snapshot
/// parsing produce these.
#[derive(Debug, thiserror::Error)]
pub enum ScoreError {
    /// Point submitted against a finished match
    #[error("match is already completed")]
    AlreadyCompleted,

    /// Snapshot violates a structural invariant
    #[error("malformed match state: {0}")]
    MalformedState(String),

    /// Snapshot could not be (de)serialized
    #[error("snapshot encoding failed: {0}")]
    Snapshot(#[from] serde_json::Error),
}

impl ScoreError {
    /// Serving-boundary code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            ScoreError::AlreadyCompleted => ErrorCode::Conflict,
            ScoreError::MalformedState(_) | ScoreError::Snapshot(_) => ErrorCode::BadRequest,
        }
    }
}
