//! Path construction errors.
//!

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PathError {
    #[error("Some path points are closer than the minimum leg length.")]
    ShortLeg,
    #[error("Invalid path input: {0}")]
    InvalidInput(String),
}
