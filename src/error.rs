//! Error types for the assessment engine

use thiserror::Error;

use crate::assessment::Stage;

/// Every failure the engine knows how to name.
///
/// Only [`EngineError::AlreadyFinalized`] indicates a bug in the caller; the
/// other kinds are handled inside the engine and never end a session.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("Response before target appeared on trial {trial_index}")]
    PrematureInput { trial_index: usize },

    #[error("Scenario content unavailable: {0}")]
    ContentUnavailable(String),

    #[error("Invalid state: {action} not accepted during {stage:?}")]
    InvalidState { stage: Stage, action: &'static str },

    #[error("Submission failed: {0}")]
    SubmissionFailure(String),

    #[error("Session {session_id} was already finalized")]
    AlreadyFinalized { session_id: String },
}

impl EngineError {
    pub fn invalid(stage: Stage, action: &'static str) -> Self {
        EngineError::InvalidState { stage, action }
    }

    /// Whether the engine recovers from this error on its own.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, EngineError::AlreadyFinalized { .. })
    }
}

pub type EngineResult<T> = std::result::Result<T, EngineError>;
