//! Airport cylinder intersections.
//!
//! A cylinder is defined by the airport reference point and a radius in
//! Nautical Miles. The resolver searches the path waypoints for the leg
//! where the distance to the centre crosses the radius, then refines the
//! crossing point on that leg with spherical Pythagoras.
//!

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::trace;

use retrace_common::{
    calculate_date_time, calculate_descending_value_reference, calculate_value_reference, nm2rad,
    rad2nm, IntersectionOptions,
};
use retrace_sphere::{calculate_distances, distance_radians, Arc3d, Point3d, SpherePath};
use retrace_trajectory::SmoothedTrajectory;

use crate::error::IntersectionError;
use crate::oracle::GeometryOracle;

/// An airport cylinder intersection event.
///
#[derive(Clone, Debug, Serialize)]
pub struct AirportIntersection {
    /// The flight id
    pub flight_id: String,
    /// The ICAO id of the airport
    pub airport_id: String,
    /// The cylinder radius [Nautical Miles]
    pub radius: f64,
    /// Whether the airport is the destination of the flight
    pub is_destination: bool,
    /// Latitude [degrees]
    pub lat: f64,
    /// Longitude [degrees]
    pub lon: f64,
    /// Altitude [feet]
    pub alt: f64,
    /// The event time
    pub time: DateTime<Utc>,
    /// The path distance [Nautical Miles]
    pub distance: f64,
}

/// Find the index and ratio in the points where the distance to the
/// centre crosses the radius: descending toward a destination, ascending
/// away from a departure. `None` if the points never cross the radius.
///
pub fn find_cylinder_intersection_index(
    points: &[Point3d],
    centre: &Point3d,
    radius: f64,
    is_destination: bool,
) -> Option<(usize, f64)> {
    let distances = calculate_distances(points, centre);

    let min_distance = distances.iter().fold(f64::INFINITY, |a, b| a.min(*b));
    let max_distance = distances.iter().fold(f64::NEG_INFINITY, |a, b| a.max(*b));
    if (min_distance < radius) && (radius < max_distance) {
        if is_destination {
            Some(calculate_descending_value_reference(&distances, radius))
        } else {
            Some(calculate_value_reference(&distances, radius))
        }
    } else {
        None
    }
}

/// Find the airport cylinder intersection of a smoothed trajectory.
///
/// Returns `None` when the path does not cross the cylinder; fails with
/// `DistanceTolerance` when the realised radius differs from the
/// requested radius by more than the distance tolerance.
///
#[tracing::instrument(skip_all, fields(flight_id = %trajectory.flight_id, airport))]
pub fn find_airport_intersection(
    trajectory: &SmoothedTrajectory,
    path: &SpherePath,
    airport: &str,
    reference_point: &Point3d,
    radius_nm: f64,
    is_destination: bool,
    options: &IntersectionOptions,
) -> Result<Option<AirportIntersection>, IntersectionError> {
    let radius = nm2rad(radius_nm);
    let tolerance = nm2rad(options.distance_tolerance);

    let points = path.points();
    let Some((index, ratio)) =
        find_cylinder_intersection_index(points, reference_point, radius, is_destination)
    else {
        trace!("no cylinder intersection for {airport}");
        return Ok(None);
    };

    let mut intersection_point = points[index];
    let mut distance = radius;
    if (ratio > 0.0) && (index < points.len() - 1) {
        // the along and across track distances of the centre to the leg
        let arc = Arc3d::new(&intersection_point, &points[index + 1]);
        let atd = arc.along_track_distance(reference_point);
        let xtd = arc.cross_track_distance(reference_point).abs();

        let mut offset = if xtd < radius { radius } else { 0.0 };
        if (offset > 0.0) && (xtd > f64::EPSILON) {
            // project the radius onto the arc with spherical Pythagoras
            offset = (radius.cos() / xtd.cos()).acos();
        }

        let along = if is_destination {
            // a destination crossing lies before the centre abeam point
            if atd + offset <= arc.length() {
                atd + offset
            } else {
                atd - offset
            }
        } else if atd - offset >= 0.0 {
            atd - offset
        } else {
            atd + offset
        };
        intersection_point = arc.position(along);
        distance = distance_radians(&intersection_point, reference_point);
    }

    // reject a crossing outside the distance tolerance
    let distance_nm = rad2nm(distance);
    if (distance_nm - radius_nm).abs() > options.distance_tolerance {
        return Err(IntersectionError::DistanceTolerance {
            flight_id: trajectory.flight_id.clone(),
            distance_nm,
        });
    }

    // the path distance of the crossing, with position, altitude and time
    let path_distance =
        rad2nm(path.calculate_path_distances(&[intersection_point], tolerance, 0)[0]);
    let altitude = trajectory.altitude_profile.altitude_at(path_distance);
    let elapsed = trajectory.time_profile.interpolate_by_distance(&[path_distance])?[0];

    Ok(Some(AirportIntersection {
        flight_id: trajectory.flight_id.clone(),
        airport_id: airport.into(),
        radius: radius_nm,
        is_destination,
        lat: intersection_point.latitude(),
        lon: intersection_point.longitude(),
        alt: altitude,
        time: calculate_date_time(trajectory.time_profile.start_time, elapsed),
        distance: path_distance,
    }))
}

/// Find the airport cylinder intersection of a trajectory, resolving the
/// airport reference point through the geometry oracle.
///
#[tracing::instrument(skip_all, fields(flight_id = %trajectory.flight_id, airport))]
pub fn find_trajectory_airport_intersection<O: GeometryOracle>(
    trajectory: &SmoothedTrajectory,
    oracle: &O,
    airport: &str,
    radius_nm: f64,
    is_destination: bool,
    options: &IntersectionOptions,
) -> Result<Option<AirportIntersection>, IntersectionError> {
    let (lat, lon) = oracle.airport_location(airport)?;
    let reference_point = Point3d::from_lat_lon(lat, lon);
    let path = trajectory.horizontal_path.sphere_path()?;

    find_airport_intersection(
        trajectory,
        &path,
        airport,
        &reference_point,
        radius_nm,
        is_destination,
        options,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    use eyre::Result;

    use retrace_common::parse_iso8601;
    use retrace_sphere::calculate_points;
    use retrace_trajectory::{AltitudeProfile, HorizontalPath, TimeProfile};

    /// A straight approach to LFPG at a constant altitude.
    fn approach_trajectory() -> SmoothedTrajectory {
        let count = 13;
        let lats = vec![49.0; count];
        let lons = (0..count).map(|i| 1.5 + 0.1 * i as f64).collect::<Vec<_>>();

        // ~3.93 NM per 0.1 degree of longitude at 49N
        let leg_nm = 0.1 * 60.0 * 49.0_f64.to_radians().cos();
        let distances = (0..count).map(|i| leg_nm * i as f64).collect::<Vec<_>>();
        let times = (0..count).map(|i| 60.0 * i as f64).collect::<Vec<_>>();

        SmoothedTrajectory {
            flight_id: "257463".into(),
            horizontal_path: HorizontalPath {
                lats,
                lons,
                tids: vec![0.0; count],
            },
            time_profile: TimeProfile::new(
                parse_iso8601("2017-08-01T17:00:00Z").unwrap(),
                distances.clone(),
                times,
            ),
            altitude_profile: AltitudeProfile::new(distances, vec![8000.0; count]),
        }
    }

    #[test]
    fn test_find_cylinder_intersection_index() {
        let points = calculate_points(&[0.0; 5], &[0.0, 1.0, 2.0, 3.0, 4.0]);
        let centre = Point3d::from_lat_lon(0.0, 4.0);
        let radius = nm2rad(90.0);

        // inbound: the distance to the centre descends through the radius
        let found = find_cylinder_intersection_index(&points, &centre, radius, true);
        let (index, ratio) = found.unwrap();
        assert_eq!(index, 2);
        assert!((ratio - 0.5).abs() < 1.0e-6);

        // a radius larger than any distance has no crossing
        assert!(
            find_cylinder_intersection_index(&points, &centre, nm2rad(500.0), true).is_none()
        );
    }

    #[test]
    fn test_find_airport_intersection_arrival() -> Result<()> {
        let trajectory = approach_trajectory();
        let path = trajectory.horizontal_path.sphere_path()?;
        // LFPG reference point
        let reference_point = Point3d::from_lat_lon(49.0097, 2.5479);
        let options = IntersectionOptions::default();

        let found = find_airport_intersection(
            &trajectory,
            &path,
            "LFPG",
            &reference_point,
            40.0,
            true,
            &options,
        )?
        .expect("an arrival crossing");

        assert_eq!(found.airport_id, "LFPG");
        assert!(found.is_destination);
        assert_eq!(found.radius, 40.0);
        assert_eq!(found.alt, 8000.0);

        // the realised radius is within the distance tolerance
        let realised = rad2nm(distance_radians(
            &Point3d::from_lat_lon(found.lat, found.lon),
            &reference_point,
        ));
        assert!((realised - 40.0).abs() < options.distance_tolerance);

        // the crossing lies on the westbound approach, before the airport
        assert!(found.lon < 2.5479);
        assert!(found.distance > 0.0);
        Ok(())
    }

    #[test]
    fn test_find_airport_intersection_oracle_lookup() -> Result<()> {
        let trajectory = approach_trajectory();
        let oracle = crate::oracle::FixtureOracle::new(
            vec![],
            vec![],
            retrace_common::AirportTable::load(None)?,
        );

        let found = find_trajectory_airport_intersection(
            &trajectory,
            &oracle,
            "LFPG",
            40.0,
            true,
            &IntersectionOptions::default(),
        )?;
        assert!(found.is_some());

        assert!(matches!(
            find_trajectory_airport_intersection(
                &trajectory,
                &oracle,
                "XXXX",
                40.0,
                true,
                &IntersectionOptions::default(),
            ),
            Err(IntersectionError::NotFound(_))
        ));
        Ok(())
    }
}
