//! Trajectory analysis: derive a smoothed trajectory and its quality
//! metrics from cleaned position data.
//!

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, trace};

use retrace_common::{
    calculate_delta_time, find_duplicate_values, find_most_extreme_value, nm2rad, rad2nm,
    AnalysisOptions,
};
use retrace_sphere::{calculate_points, derive_horizontal_path};

use crate::altitude::{analyse_altitudes, find_cruise_sections};
use crate::error::AnalysisError;
use crate::model::{HorizontalPath, SmoothedTrajectory};
use crate::smoothing::analyse_speeds;

/// Cleaned, time ordered position data for one flight.
///
#[derive(Clone, Debug, Default)]
pub struct PositionData {
    /// The report times, in ascending order
    pub times: Vec<DateTime<Utc>>,
    /// Latitudes [degrees]
    pub lats: Vec<f64>,
    /// Longitudes [degrees]
    pub lons: Vec<f64>,
    /// Altitudes [feet]
    pub alts: Vec<f64>,
}

impl PositionData {
    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }
}

/// Quality metrics of an analysed trajectory.
///
#[derive(Clone, Debug, Serialize)]
pub struct TrajectoryMetrics {
    /// The flight id
    pub flight_id: String,
    /// The altitude profile classification
    pub profile_type: i32,
    /// The average period between positions [Seconds]
    pub average_period: f64,
    /// The average period in the climb phase [Seconds]
    pub climb_period: f64,
    /// The average period in the cruise phase [Seconds]
    pub cruise_period: f64,
    /// The average period in the descent phase [Seconds]
    pub descent_period: f64,
    /// Whether sorting by path distance changed the position order
    pub is_unordered: bool,
    /// Standard deviation of the time residuals [Seconds]
    pub time_sd: f64,
    /// The maximum time residual [Seconds]
    pub max_time_diff: f64,
    /// The index of the maximum time residual
    pub max_time_index: usize,
    /// Standard deviation of the cross track distances [Nautical Miles]
    pub xte_sd: f64,
    /// The maximum cross track distance [Nautical Miles]
    pub max_xte: f64,
    /// The index of the maximum cross track distance
    pub max_xte_index: usize,
    /// Standard deviation of the cruise altitude residuals [feet]
    pub alt_sd: f64,
    /// The maximum cruise altitude residual [feet]
    pub max_alt: f64,
}

fn standard_deviation(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    (values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / values.len() as f64).sqrt()
}

/// Analyse and smooth the positions of one flight.
///
/// Derives the horizontal path from the latitudes and longitudes, sorts
/// the positions along it, detects cruising sections, smooths the time
/// and altitude profiles and packages them as a `SmoothedTrajectory`
/// with a row of quality metrics.
///
#[tracing::instrument(skip(positions, options))]
pub fn analyse_trajectory(
    flight_id: &str,
    positions: &PositionData,
    options: &AnalysisOptions,
) -> Result<(SmoothedTrajectory, TrajectoryMetrics), AnalysisError> {
    let count = positions.len();
    if count < 3 {
        return Err(AnalysisError::InvalidInput(format!(
            "flight {flight_id} has too few positions"
        )));
    }
    if (positions.lats.len() != count)
        || (positions.lons.len() != count)
        || (positions.alts.len() != count)
    {
        return Err(AnalysisError::InvalidInput(format!(
            "flight {flight_id} position arrays differ in length"
        )));
    }
    if positions.times.windows(2).any(|pair| pair[1] < pair[0]) {
        return Err(AnalysisError::InvalidInput(format!(
            "flight {flight_id} positions are not in time order"
        )));
    }

    // the position period as seconds per point
    let duration = calculate_delta_time(positions.times[0], positions.times[count - 1]);
    let position_period = duration / (count - 1) as f64;

    let across_track_radians = nm2rad(options.across_track_tolerance);
    let points = calculate_points(&positions.lats, &positions.lons);

    // derive the path and make sure it is long enough
    let path = derive_horizontal_path(&points, across_track_radians, false)?;
    let path_length = rad2nm(*path.path_distances().last().unwrap_or(&0.0));
    if path_length < options.across_track_tolerance {
        return Err(AnalysisError::PathTooShort(flight_id.into()));
    }

    let (lats, lons) = path.point_lat_longs();
    let hpath = HorizontalPath {
        lats,
        lons,
        tids: path.turn_initiation_distances_nm(),
    };

    // distances of the positions along the path
    let path_distances = path
        .calculate_path_distances(&points, across_track_radians, 0)
        .iter()
        .map(|d| rad2nm(*d))
        .collect::<Vec<_>>();

    // the positions must reach the end of the path, otherwise the path
    // mis-models the tail of the flight
    let positions_path_length = *path_distances.last().unwrap();
    if positions_path_length < path_length - options.path_length_tolerance {
        debug!(
            "flight {flight_id}: positions end at {positions_path_length:.3} NM of {path_length:.3} NM"
        );
        return Err(AnalysisError::PathShort(flight_id.into()));
    }

    // sort the positions by path distance then time
    let mut order = (0..count).collect::<Vec<_>>();
    order.sort_by(|a, b| {
        path_distances[*a]
            .total_cmp(&path_distances[*b])
            .then(positions.times[*a].cmp(&positions.times[*b]))
    });
    let is_unordered = order.windows(2).any(|pair| pair[0] > pair[1]);

    let sorted_distances = order.iter().map(|i| path_distances[*i]).collect::<Vec<_>>();
    let sorted_times = order.iter().map(|i| positions.times[*i]).collect::<Vec<_>>();
    let sorted_altitudes = order.iter().map(|i| positions.alts[*i]).collect::<Vec<_>>();

    // cruising sections of the sorted altitudes
    let cruise_sections = find_cruise_sections(&sorted_altitudes);

    // cross track residuals, in position order
    let xtds = path.calculate_cross_track_distances(&points, &path_distances);
    let xte_sd = standard_deviation(&xtds);
    let (max_xte, max_xte_index) = find_most_extreme_value(&xtds);
    let max_xte = max_xte.abs();

    // positions within tolerance of their predecessor carry no speed
    let duplicate_positions =
        find_duplicate_values(&sorted_distances, options.across_track_tolerance);

    let (timep, time_sd, max_time_diff, max_time_index) = smooth_time_profile(
        &sorted_distances,
        &sorted_times,
        &duplicate_positions,
        options,
    )?;
    let max_time_diff = max_time_diff.abs();

    let (altp, alt_sd, max_alt) =
        analyse_altitudes(&sorted_distances, &sorted_altitudes, &cruise_sections);
    let profile_type = altp.profile_type();

    // average periods in the climb, cruise and descent phases
    let toc_distance = altp.top_of_climb_distance();
    let tod_distance = altp.top_of_descent_distance();
    let climb_period = timep.calculate_average_period(0.0, toc_distance);
    let cruise_period = timep.calculate_average_period(toc_distance, tod_distance);
    let descent_period =
        timep.calculate_average_period(tod_distance, *timep.distances.last().unwrap());

    trace!("analysed flight {flight_id}: {} positions", count);

    let metrics = TrajectoryMetrics {
        flight_id: flight_id.into(),
        profile_type: profile_type as i32,
        average_period: position_period,
        climb_period,
        cruise_period,
        descent_period,
        is_unordered,
        time_sd,
        max_time_diff,
        max_time_index,
        xte_sd,
        max_xte,
        max_xte_index,
        alt_sd,
        max_alt,
    };

    Ok((
        SmoothedTrajectory {
            flight_id: flight_id.into(),
            horizontal_path: hpath,
            time_profile: timep,
            altitude_profile: altp,
        },
        metrics,
    ))
}

/// Smooth the time profile with the configured method.
///
fn smooth_time_profile(
    distances: &[f64],
    times: &[DateTime<Utc>],
    duplicate_positions: &[bool],
    options: &AnalysisOptions,
) -> Result<(crate::timeprofile::TimeProfile, f64, f64, usize), AnalysisError> {
    #[cfg(feature = "polynomial-fit")]
    if options.method.is_curve_fit() {
        return crate::smoothing::analyse_times(distances, times, duplicate_positions);
    }
    #[cfg(not(feature = "polynomial-fit"))]
    if options.method.is_curve_fit() {
        return Err(AnalysisError::NumericalFailure(
            "polynomial curve fitting is not enabled".into(),
        ));
    }

    Ok(analyse_speeds(
        distances,
        times,
        duplicate_positions,
        options.moving_median_samples,
        options.moving_average_samples,
        options.max_speed_duration,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    use eyre::Result;

    use retrace_common::parse_iso8601;

    use crate::altitude::AltitudeProfileType;

    /// The straight climb and descent of a flight heading due South
    /// along the Greenwich meridian.
    pub fn straight_flight() -> PositionData {
        let lats = vec![
            60.0, 59.55, 58.7, 56.25, 56.2, 56.15, 56.1, 56.05, 56.0, 55.95, 55.9, 55.895,
        ];
        let lons = vec![0.0; 12];
        let alts = vec![
            0., 1800., 3000., 3600., 4200., 5400., 6000., 6000., 6000., 6000., 5400., 4200.,
        ];
        let times = [
            "2017-08-01T08:47:31Z",
            "2017-08-01T08:52:23Z",
            "2017-08-01T08:59:29Z",
            "2017-08-01T09:29:54Z",
            "2017-08-01T09:30:24Z",
            "2017-08-01T09:30:54Z",
            "2017-08-01T09:31:24Z",
            "2017-08-01T09:31:54Z",
            "2017-08-01T09:32:24Z",
            "2017-08-01T09:32:54Z",
            "2017-08-01T09:33:24Z",
            "2017-08-01T09:33:30Z",
        ]
        .iter()
        .map(|t| parse_iso8601(t).unwrap())
        .collect();

        PositionData {
            times,
            lats,
            lons,
            alts,
        }
    }

    #[test]
    fn test_analyse_trajectory_straight_climb_and_descent() -> Result<()> {
        let positions = straight_flight();
        let options = AnalysisOptions {
            across_track_tolerance: 0.25,
            ..AnalysisOptions::default()
        };

        let (trajectory, metrics) = analyse_trajectory("259599", &positions, &options)?;

        assert_eq!(metrics.flight_id, "259599");
        assert_eq!(
            metrics.profile_type,
            AltitudeProfileType::ClimbingAndDescending as i32
        );
        assert!(!metrics.is_unordered);

        // one cruise section: its two interior samples are removed
        assert_eq!(trajectory.altitude_profile.altitudes.len(), 10);
        // the path is a single southbound leg
        assert!(*trajectory.time_profile.distances.last().unwrap() > 0.0);
        assert_eq!(trajectory.flight_id, "259599");

        // average period: 2759 seconds over 11 legs
        assert!((metrics.average_period - 2759.0 / 11.0).abs() < 1.0e-9);

        // the flight is straight, so cross track residuals are tiny
        assert!(metrics.xte_sd < 0.01);
        assert!(metrics.max_xte < 0.05);
        Ok(())
    }

    #[test]
    fn test_analyse_trajectory_rejects_bad_input() {
        let options = AnalysisOptions::default();

        let empty = PositionData::default();
        assert!(matches!(
            analyse_trajectory("1", &empty, &options),
            Err(AnalysisError::InvalidInput(_))
        ));

        let mut unordered = straight_flight();
        unordered.times.swap(2, 3);
        assert!(matches!(
            analyse_trajectory("2", &unordered, &options),
            Err(AnalysisError::InvalidInput(_))
        ));

        let mut mismatched = straight_flight();
        mismatched.alts.pop();
        assert!(matches!(
            analyse_trajectory("3", &mismatched, &options),
            Err(AnalysisError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_analyse_trajectory_path_too_short() {
        // positions within a fraction of a Nautical Mile
        let times = [
            "2017-08-01T08:47:31Z",
            "2017-08-01T08:47:41Z",
            "2017-08-01T08:47:51Z",
            "2017-08-01T08:48:01Z",
        ]
        .iter()
        .map(|t| parse_iso8601(t).unwrap())
        .collect();
        let positions = PositionData {
            times,
            lats: vec![45.0, 45.0001, 45.0002, 45.0003],
            lons: vec![1.0; 4],
            alts: vec![1000.0; 4],
        };
        let result = analyse_trajectory("4", &positions, &AnalysisOptions::default());
        assert!(matches!(
            result,
            Err(AnalysisError::PathTooShort(_)) | Err(AnalysisError::Path(_))
        ));
    }

    #[test]
    fn test_overnight_flight_is_continuous() -> Result<()> {
        // the flight ends 30 seconds after midnight UTC
        let mut positions = straight_flight();
        let origin = parse_iso8601("2017-08-01T23:14:31Z")?;
        let first = positions.times[0];
        for time in &mut positions.times {
            *time = origin + (*time - first);
        }

        let options = AnalysisOptions {
            across_track_tolerance: 0.25,
            ..AnalysisOptions::default()
        };
        let (trajectory, _) = analyse_trajectory("midnight", &positions, &options)?;

        // elapsed times and distances stay monotone across midnight
        assert!(trajectory
            .time_profile
            .elapsed_times
            .windows(2)
            .all(|pair| pair[0] < pair[1]));
        assert!(trajectory
            .time_profile
            .distances
            .windows(2)
            .all(|pair| pair[0] < pair[1]));
        assert_eq!(trajectory.time_profile.start_time, origin);
        Ok(())
    }
}
