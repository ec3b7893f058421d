//! The per flight intersection driver.
//!
//! Trajectories are resolved independently on a worker pool; the oracle
//! is shared read-only and queries for unrelated flights are never
//! serialised behind each other. A failure in one flight is logged and
//! the flight is skipped.
//!

use rayon::prelude::*;
use tracing::{error, info};

use retrace_common::IntersectionOptions;
use retrace_trajectory::SmoothedTrajectory;

use crate::oracle::GeometryOracle;
use crate::sectors::{find_trajectory_sector_intersections, SectorIntersection};

/// Find the sector intersection events of a batch of trajectories in
/// parallel.
///
/// Events are returned in flight order, each flight's events in
/// distance order; failed flights are logged and skipped.
///
#[tracing::instrument(skip_all)]
pub fn find_flights_sector_intersections<O>(
    trajectories: &[SmoothedTrajectory],
    oracle: &O,
    options: &IntersectionOptions,
) -> Vec<SectorIntersection>
where
    O: GeometryOracle + Sync,
{
    let events = trajectories
        .par_iter()
        .filter_map(|trajectory| {
            match find_trajectory_sector_intersections(trajectory, oracle, options) {
                Ok(events) => Some(events),
                Err(e) => {
                    error!("flight {} skipped: {}", trajectory.flight_id, e);
                    None
                }
            }
        })
        .flatten()
        .collect::<Vec<_>>();

    info!(
        "{} intersection events for {} flights",
        events.len(),
        trajectories.len()
    );

    events
}
