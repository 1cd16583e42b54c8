use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MissionError {
    /// Completion is a one-way transition; a repeat attempt is rejected so
    /// rewards stay idempotent.
    #[error("Mission {0} already completed")]
    AlreadyCompleted(String),

    #[error("Mission {mission_id} target not reached: {progress}/{target}")]
    TargetNotReached {
        mission_id: String,
        progress: u32,
        target: u32,
    },

    #[error("Validation error: {0}")]
    Validation(String),
}
