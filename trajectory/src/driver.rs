//! The per flight analysis driver.
//!
//! Flights are independent, so they are analysed on a worker pool with
//! no shared mutable state. A failure in one flight is logged with its
//! flight id and the flight is skipped; the remaining flights proceed.
//!

use rayon::prelude::*;
use tracing::{error, info};

use retrace_common::{AnalysisOptions, IntersectionOptions};

use crate::analysis::{analyse_trajectory, PositionData, TrajectoryMetrics};
use crate::interpolation::{interpolate_trajectory, InterpolatedPosition};
use crate::model::SmoothedTrajectory;

/// The cleaned positions of one flight, keyed by its flight id.
///
#[derive(Clone, Debug)]
pub struct FlightPositions {
    /// The flight id
    pub flight_id: String,
    /// The cleaned, time ordered positions
    pub positions: PositionData,
}

/// Analyse a batch of flights in parallel.
///
/// Returns the smoothed trajectories and metrics of the flights that
/// analysed successfully, in input order; failed flights are logged and
/// skipped.
///
#[tracing::instrument(skip(flights, options))]
pub fn analyse_flights(
    flights: &[FlightPositions],
    options: &AnalysisOptions,
) -> (Vec<SmoothedTrajectory>, Vec<TrajectoryMetrics>) {
    let results = flights
        .par_iter()
        .filter_map(|flight| {
            match analyse_trajectory(&flight.flight_id, &flight.positions, options) {
                Ok(result) => Some(result),
                Err(e) => {
                    error!("flight {} skipped: {}", flight.flight_id, e);
                    None
                }
            }
        })
        .collect::<Vec<_>>();

    info!("analysed {} of {} flights", results.len(), flights.len());

    results.into_iter().unzip()
}

/// Interpolate positions along a batch of smoothed trajectories in
/// parallel.
///
/// Positions are returned in flight order; failed flights are logged
/// and skipped.
///
#[tracing::instrument(skip(trajectories, options))]
pub fn interpolate_flights(
    trajectories: &[SmoothedTrajectory],
    options: &IntersectionOptions,
) -> Vec<InterpolatedPosition> {
    let positions = trajectories
        .par_iter()
        .filter_map(|trajectory| match interpolate_trajectory(trajectory, options) {
            Ok(positions) => Some(positions),
            Err(e) => {
                error!("flight {} skipped: {}", trajectory.flight_id, e);
                None
            }
        })
        .flatten()
        .collect::<Vec<_>>();

    info!(
        "{} interpolated positions for {} flights",
        positions.len(),
        trajectories.len()
    );

    positions
}
