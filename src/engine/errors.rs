use thiserror::Error;

use crate::mission::MissionError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("User not found: {0}")]
    NotFound(String),

    /// The stored record changed between load and store. The service retries
    /// with fresh state; callers only see this once retries are exhausted.
    #[error("Concurrent update conflict for user {0}")]
    Conflict(String),

    /// Domain-rule violation, distinguishable from shape validation so the
    /// caller can say "already completed" instead of a generic failure.
    #[error(transparent)]
    Mission(#[from] MissionError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Repository error: {0}")]
    Repository(String),
}
