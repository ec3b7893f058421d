//! Interpolation of synthetic positions along a smoothed trajectory.
//!

use chrono::{DateTime, Utc};
use serde::Serialize;

use retrace_common::{
    calculate_date_time, calculate_speed, calculate_vertical_speed,
    convert_angle_to_track_angle, IntersectionOptions,
};
use retrace_sphere::PointType;

use crate::error::AnalysisError;
use crate::model::SmoothedTrajectory;

/// One interpolated trajectory position.
///
#[derive(Clone, Debug, Serialize)]
pub struct InterpolatedPosition {
    /// The flight id
    pub flight_id: String,
    /// The path distance [Nautical Miles]
    pub distance: f64,
    /// The position time
    pub time: DateTime<Utc>,
    /// Latitude [degrees]
    pub lat: f64,
    /// Longitude [degrees]
    pub lon: f64,
    /// Altitude [feet]
    pub alt: f64,
    /// Ground speed [Knots]
    pub speed_gnd: f64,
    /// Ground track [degrees]
    pub track_gnd: f64,
    /// Vertical rate [feet per minute]
    pub vert_speed: f64,
}

/// Insert intermediate times within each pair of section boundary times.
///
/// Segments starting at a turn start are filled at `turn_interval`,
/// others at `straight_interval`; inserted times lie strictly within
/// their segment.
///
pub fn calculate_interpolation_times(
    point_times: &[f64],
    point_types: &[PointType],
    straight_interval: f64,
    turn_interval: f64,
) -> Vec<f64> {
    let mut prev_time = point_times[0];
    let mut times = vec![prev_time];
    let mut is_turning = point_types[0] == PointType::TurnStart;
    for i in 1..point_times.len() {
        let next_time = point_times[i];
        let interval = if is_turning { turn_interval } else { straight_interval };
        if interval > 0.0 {
            let mut time = prev_time + interval;
            while time < next_time - 1.0e-9 {
                times.push(time);
                time += interval;
            }
        }

        times.push(next_time);
        is_turning = point_types[i] == PointType::TurnStart;
        prev_time = next_time;
    }

    times
}

/// Calculate speeds in Knots by finite differences of the distances,
/// repeating the last value.
///
pub fn calculate_speeds(times: &[f64], distances: &[f64]) -> Vec<f64> {
    let mut speeds = times
        .windows(2)
        .zip(distances.windows(2))
        .map(|(t, d)| calculate_speed(d[1] - d[0], t[1] - t[0], 0.5))
        .collect::<Vec<_>>();
    if let Some(last) = speeds.last().copied() {
        speeds.push(last);
    }
    speeds
}

/// Calculate vertical speeds in feet per minute by finite differences of
/// the altitudes, repeating the last value.
///
pub fn calculate_vertical_speeds(times: &[f64], altitudes: &[f64]) -> Vec<f64> {
    let mut speeds = times
        .windows(2)
        .zip(altitudes.windows(2))
        .map(|(t, a)| calculate_vertical_speed(a[1] - a[0], t[1] - t[0], 0.5))
        .collect::<Vec<_>>();
    if let Some(last) = speeds.last().copied() {
        speeds.push(last);
    }
    speeds
}

/// Interpolate positions along a smoothed trajectory.
///
/// Samples are placed at the path section boundaries and at the
/// configured straight/turn intervals between them; each sample carries
/// position, altitude, time, ground speed, ground track and vertical
/// rate.
///
#[tracing::instrument(skip(trajectory, options))]
pub fn interpolate_trajectory(
    trajectory: &SmoothedTrajectory,
    options: &IntersectionOptions,
) -> Result<Vec<InterpolatedPosition>, AnalysisError> {
    let path = trajectory.horizontal_path.sphere_path()?;

    // section boundaries and their times
    let (point_distances, point_types) = path.section_distances_and_types();
    let point_times = trajectory.time_profile.interpolate_by_distance(&point_distances)?;

    // fill the boundaries at the straight and turn intervals
    let times = calculate_interpolation_times(
        &point_times,
        &point_types,
        options.straight_interval,
        options.turn_interval,
    );
    let distances = trajectory.time_profile.interpolate_by_elapsed_time(&times)?;
    let altitudes = trajectory.altitude_profile.interpolate(&distances);

    let points = path.calculate_positions(&distances);
    let speeds = calculate_speeds(&times, &distances);
    let tracks = path.calculate_ground_tracks(&distances);
    let vertical_speeds = calculate_vertical_speeds(&times, &altitudes);

    let positions = times
        .iter()
        .enumerate()
        .map(|(i, time)| InterpolatedPosition {
            flight_id: trajectory.flight_id.clone(),
            distance: distances[i],
            time: calculate_date_time(trajectory.time_profile.start_time, *time),
            lat: points[i].latitude(),
            lon: points[i].longitude(),
            alt: altitudes[i],
            speed_gnd: speeds[i],
            track_gnd: convert_angle_to_track_angle(tracks[i]),
            vert_speed: vertical_speeds[i],
        })
        .collect();

    Ok(positions)
}

#[cfg(test)]
mod tests {
    use super::*;

    use eyre::Result;

    use retrace_common::parse_iso8601;

    use crate::altitude::AltitudeProfile;
    use crate::model::HorizontalPath;
    use crate::timeprofile::TimeProfile;

    #[test]
    fn test_calculate_interpolation_times() {
        let point_times = [0.0, 12.5, 20.0];
        let point_types = [PointType::Waypoint, PointType::TurnStart, PointType::TurnFinish];

        let times = calculate_interpolation_times(&point_times, &point_types, 5.0, 2.5);
        // straight fill to the turn start, then the turn interval
        assert_eq!(times, vec![0.0, 5.0, 10.0, 12.5, 15.0, 17.5, 20.0]);
    }

    #[test]
    fn test_interpolation_times_exact_multiple() {
        let point_times = [0.0, 10.0];
        let point_types = [PointType::Waypoint, PointType::Waypoint];
        let times = calculate_interpolation_times(&point_times, &point_types, 5.0, 5.0);
        // no duplicate at the segment end
        assert_eq!(times, vec![0.0, 5.0, 10.0]);
    }

    #[test]
    fn test_calculate_speeds() {
        let times = [0.0, 60.0, 120.0];
        let distances = [0.0, 8.0, 16.0];
        let speeds = calculate_speeds(&times, &distances);
        assert_eq!(speeds.len(), 3);
        assert!((speeds[0] - 480.0).abs() < 1.0e-9);
        assert_eq!(speeds[1], speeds[2]);
    }

    #[test]
    fn test_interpolate_trajectory() -> Result<()> {
        // a steady southbound descent at 360 kt
        let trajectory = SmoothedTrajectory {
            flight_id: "259599".into(),
            horizontal_path: HorizontalPath {
                lats: vec![1.0, 0.5, 0.0],
                lons: vec![0.0, 0.0, 0.0],
                tids: vec![0.0, 0.0, 0.0],
            },
            time_profile: TimeProfile::new(
                parse_iso8601("2017-08-01T08:47:31Z")?,
                vec![0.0, 30.0, 60.0],
                vec![0.0, 300.0, 600.0],
            ),
            altitude_profile: AltitudeProfile::new(
                vec![0.0, 30.0, 60.0],
                vec![20000.0, 15000.0, 10000.0],
            ),
        };

        let options = IntersectionOptions::default();
        let positions = interpolate_trajectory(&trajectory, &options)?;

        // 600 seconds at a 5 second interval
        assert_eq!(positions.len(), 121);
        assert_eq!(positions[0].flight_id, "259599");
        assert!((positions[0].lat - 1.0).abs() < 1.0e-9);
        assert_eq!(positions[0].alt, 20000.0);

        let last = positions.last().unwrap();
        assert!((last.lat - 0.0).abs() < 1.0e-6);
        assert!((last.distance - 60.0).abs() < 1.0e-6);
        assert_eq!(
            retrace_common::format_iso8601_us(last.time),
            "2017-08-01T08:57:31.000000Z"
        );

        // monotone time and distance, southbound track, steady descent
        for pair in positions.windows(2) {
            assert!(pair[0].time < pair[1].time);
            assert!(pair[0].distance <= pair[1].distance);
        }
        let mid = &positions[60];
        assert!((mid.track_gnd - 180.0).abs() < 0.1);
        assert!((mid.speed_gnd - 360.0).abs() < 5.0);
        assert!((mid.vert_speed + 1000.0).abs() < 20.0);
        Ok(())
    }
}
