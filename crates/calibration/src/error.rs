//! Calibration errors

use thiserror::Error;

use crate::ManualState;

#[derive(Debug, Error)]
pub enum CalibrationError {
    /// Point sets of different cardinality
    #[error("point sets differ in size: {source_points} vs {target_points}")]
    MismatchedPoints {
        source_points: usize,
        target_points: usize,
    },

    /// No point pairs at all
    #[error("at least one point pair is required")]
    EmptyPoints,

    /// SVD did not produce both singular vector matrices
    #[error("singular value decomposition failed")]
    Decomposition,

    /// Signal not accepted in the current procedure state
    #[error("'{signal}' is not allowed while {state:?}")]
    InvalidTransition {
        state: ManualState,
        signal: &'static str,
    },

    /// Automatic calibration asked to solve before all points were captured
    #[error("captured {captured} of {required} calibration points")]
    IncompletePoints { captured: usize, required: usize },

    /// Procedure already solved or aborted
    #[error("calibration procedure already finished")]
    Finished,

    /// Calibration store failure
    #[error("calibration store error: {message}")]
    Store { message: String },
}

impl CalibrationError {
    pub fn invalid_transition(state: ManualState, signal: &'static str) -> Self {
        Self::InvalidTransition { state, signal }
    }

    pub fn store(message: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CalibrationError>;
