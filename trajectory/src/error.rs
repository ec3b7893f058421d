//! Trajectory analysis errors.
//!

use thiserror::Error;

use retrace_sphere::PathError;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("The path of flight {0} is too short.")]
    PathTooShort(String),
    #[error("The positions of flight {0} extend beyond the fitted path.")]
    PathShort(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Numerical failure: {0}")]
    NumericalFailure(String),
    #[error(transparent)]
    Path(#[from] PathError),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
}
