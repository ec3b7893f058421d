//! Intersection errors.
//!

use thiserror::Error;

use retrace_sphere::PathError;
use retrace_trajectory::AnalysisError;

#[derive(Debug, Error)]
pub enum IntersectionError {
    #[error("Distance not within tolerance, {flight_id}, {distance_nm}")]
    DistanceTolerance { flight_id: String, distance_nm: f64 },
    #[error("{0} not found")]
    NotFound(String),
    #[error(transparent)]
    Path(#[from] PathError),
    #[error(transparent)]
    Analysis(#[from] AnalysisError),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
