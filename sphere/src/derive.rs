//! Derivation of a horizontal path from raw trajectory points.
//!
//! The builder decomposes the points with a recursive
//! Ramer-Douglas-Peucker style search on the sphere, extended to catch
//! along track excursions (holding patterns, hooks) and very short
//! segments. Each leg between extreme points is then fitted to its raw
//! samples by least squares in (along track, cross track) coordinates and
//! the turn at each interior waypoint is fitted through the raw point
//! nearest the waypoint.
//!

use retrace_common::MIN_LENGTH;
use tracing::trace;

use crate::arc::{calculate_atds, calculate_xtds, Arc3d};
use crate::error::PathError;
use crate::path::SpherePath;
use crate::point::{calculate_distances, distance_radians, Point3d};
use crate::turn::{MAX_TURN_ANGLE, MIN_TURN_ANGLE};

/// The maximum turn initiation distance, 20 NM [radians].
///
/// See ICAO Doc 9905 AN/471, Required Navigation Performance
/// Authorization Required (RNP AR) Procedure Design Manual.
pub const TWENTY_NM: f64 = std::f64::consts::PI / 540.0;

/// Two Nautical Miles [radians].
const TWO_NM: f64 = std::f64::consts::PI / 5400.0;

/// The minimum arc length, 0.1 NM [radians].
pub const MINIMUM_ARC_LENGTH: f64 = std::f64::consts::PI / 108_000.0;

const HALF_PI: f64 = std::f64::consts::FRAC_PI_2;
const MAX_LENGTH: f64 = std::f64::consts::PI - MIN_LENGTH;

/// Find the distance and index of the furthest point from the first point.
///
fn find_furthest_distance(points: &[Point3d]) -> (f64, usize) {
    let distances = calculate_distances(points, &points[0]);
    distances
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(b.1))
        .map_or((0.0, 0), |(i, d)| (*d, i))
}

/// Find the index of the point furthest along the arc, if it is more than
/// `threshold` beyond either end of the arc, otherwise zero.
///
/// Points beyond the ends of a segment indicate a holding pattern or a
/// hook at the start or end of the flight.
///
fn find_extreme_point_along_track_index(arc: &Arc3d, points: &[Point3d], threshold: f64) -> usize {
    let atds = calculate_atds(arc, points);
    let (max_atd, max_index) = atds
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(b.1))
        .map_or((0.0, 0), |(i, d)| (*d, i));
    let (min_atd, min_index) = atds
        .iter()
        .enumerate()
        .min_by(|a, b| a.1.total_cmp(b.1))
        .map_or((0.0, 0), |(i, d)| (*d, i));

    let past_end = max_atd - arc.length();
    let before_start = -min_atd;
    if before_start.max(past_end) > threshold {
        if before_start < past_end {
            max_index
        } else {
            min_index
        }
    } else {
        0
    }
}

/// Find the index of the point between `first_index` and `last_index`
/// furthest from the arc joining them, or `last_index` if no point
/// qualifies as extreme.
///
fn find_extreme_point_index(
    points: &[Point3d],
    first_index: usize,
    last_index: usize,
    threshold: f64,
    xtd_ratio: f64,
    calc_along_track: bool,
) -> usize {
    let mut max_xtd_index = last_index;
    // is there at least a point between first_index and last_index?
    if last_index - first_index > 1 {
        let arc = Arc3d::new(&points[first_index], &points[last_index]);
        if arc.length() > MINIMUM_ARC_LENGTH {
            // cross track distances relative to the base arc
            let xtds = calculate_xtds(&arc, &points[first_index + 1..last_index]);
            let (max_xtd, xtd_index) = retrace_common::find_most_extreme_value(&xtds);
            let xtd_index = xtd_index + 1;

            // the threshold is the lesser of the given threshold and a
            // fraction of the arc length, but never below the minimum
            let xtd_threshold = threshold.min(xtd_ratio * arc.length()).max(MINIMUM_ARC_LENGTH);
            if max_xtd.abs() > xtd_threshold {
                max_xtd_index = first_index + xtd_index;
            } else if calc_along_track {
                // the points are in line; is one past either end?
                let atd_index = find_extreme_point_along_track_index(
                    &arc,
                    &points[first_index..last_index],
                    MINIMUM_ARC_LENGTH,
                );
                if atd_index > 0 {
                    max_xtd_index = first_index + atd_index;
                }
            }
        } else {
            // a short arc: take the furthest point from the start, if it
            // is also far enough from the end point
            let (distance, xtd_index) =
                find_furthest_distance(&points[first_index..last_index]);
            if distance > MINIMUM_ARC_LENGTH {
                let xtd_index = xtd_index + first_index;
                let end_distance = distance_radians(&points[xtd_index], &points[last_index]);
                if end_distance > MINIMUM_ARC_LENGTH {
                    max_xtd_index = xtd_index;
                }
            }
        }
    }

    max_xtd_index
}

/// Find the indices of the most extreme points, including the first and
/// last points.
///
/// The points between may be turning points, holding points or erroneous
/// data points.
///
pub fn find_extreme_point_indices(
    points: &[Point3d],
    threshold: f64,
    xtd_ratio: f64,
    calc_along_track: bool,
) -> Vec<usize> {
    let finish_index = points.len() - 1;
    let mut indices = vec![0_usize];

    if points.len() > 2 {
        // ensure that a point is further than threshold from the start
        let (distance, _) = find_furthest_distance(points);
        if threshold < distance {
            let mut start_index = 0;
            let mut index = find_extreme_point_index(
                points,
                start_index,
                finish_index,
                threshold,
                xtd_ratio,
                calc_along_track,
            );
            let mut last_index = finish_index;
            let mut last_indices: Vec<usize> = vec![];
            // loop until all extreme points are found
            while index < finish_index {
                if index < last_index {
                    // keep searching toward the start
                    last_indices.push(last_index);
                    last_index = index;
                } else {
                    // last_index is the next most extreme point from the start
                    indices.push(last_index);
                    // search along the next leg away from the start
                    start_index = last_index;
                    last_index = last_indices.pop().unwrap_or(finish_index);
                }

                index = find_extreme_point_index(
                    points,
                    start_index,
                    last_index,
                    threshold,
                    xtd_ratio,
                    calc_along_track,
                );
            }
        }
    }

    indices.push(finish_index);

    indices
}

/// Calculate the closest arc through the points, minimising their cross
/// track distances by a least squares line in (along track, cross track)
/// coordinates.
///
/// Note: there must be at least 2 points.
///
pub fn fit_arc_to_points(points: &[Point3d], arc: &Arc3d) -> Arc3d {
    let atds = calculate_atds(arc, points);
    let xtds = calculate_xtds(arc, points);

    // the slope and intercept of the closest line through the points
    let count = atds.len() as f64;
    let mean_atd = atds.iter().sum::<f64>() / count;
    let mean_xtd = xtds.iter().sum::<f64>() / count;
    let variance = atds.iter().map(|a| (a - mean_atd) * (a - mean_atd)).sum::<f64>();
    if variance < MIN_LENGTH {
        return *arc;
    }
    let covariance = atds
        .iter()
        .zip(xtds.iter())
        .map(|(a, x)| (a - mean_atd) * (x - mean_xtd))
        .sum::<f64>();
    let slope = covariance / variance;
    let intercept = mean_xtd - slope * mean_atd;

    let a = arc.perp_position(&arc.a(), intercept);
    let b = arc.perp_position(&arc.b(), intercept + arc.length() * slope);
    Arc3d::new(&a, &b)
}

/// Calculate the intersection point of a pair of arcs.
///
/// If the arcs lie on (or very close to) the same great circle, it
/// returns the start point of the second arc.
///
pub fn calculate_intersection(prev_arc: &Arc3d, arc: &Arc3d) -> Point3d {
    let intersection = Arc3d::new(&prev_arc.pole(), &arc.pole());
    if (MIN_LENGTH < intersection.length()) && (intersection.length() < MAX_LENGTH) {
        let intersection_point = intersection.pole();
        // take the intersection on the same side as the legs
        if distance_radians(&arc.a(), &intersection_point) > HALF_PI {
            -intersection_point
        } else {
            intersection_point
        }
    } else {
        arc.a()
    }
}

/// Calculate the maximum initiation distance of a turn: half the shorter
/// adjacent leg, capped at `max_distance`.
///
pub fn calculate_max_turn_initiation_distance(
    in_length: f64,
    out_length: f64,
    max_distance: f64,
) -> f64 {
    (in_length.min(out_length) / 2.0).min(max_distance)
}

/// Calculate the turn initiation distance so that the turn arc tangent to
/// both legs passes as close as possible to `point`.
///
pub fn calculate_turn_initiation_distance(
    prev_arc: &Arc3d,
    arc: &Arc3d,
    point: &Point3d,
    max_distance: f64,
    threshold: f64,
) -> f64 {
    // the distance from the intersection to the point
    let waypoint = arc.a();
    let mut distance = distance_radians(&waypoint, point);
    if distance < max_distance {
        let xtd_in = prev_arc.cross_track_distance(point).abs();
        let xtd_out = arc.cross_track_distance(point).abs();

        // is the point close to either leg?
        if (xtd_in > threshold) && (xtd_out > threshold) {
            // the interior bisector direction of the turn at the waypoint
            let t_in = prev_arc.direction_at(&waypoint);
            let t_out = arc.direction_at(&waypoint);
            let bisector = t_out - t_in;
            if bisector.norm() > MIN_LENGTH {
                let bisector = bisector.normalize();
                // the projection of the point onto the bisector
                let xtd = point.dot(&bisector).clamp(-1.0, 1.0).asin().abs();
                if xtd < distance {
                    // the angle of the point from the bisector
                    let cos_angle = xtd / distance;
                    let half_turn_angle = prev_arc.turn_angle(&arc.b()).abs() / 2.0;
                    // the turn radius through the point
                    let cos_half_turn_angle = half_turn_angle.cos();
                    let sin2_half_turn_angle = 1.0 - cos_half_turn_angle * cos_half_turn_angle;
                    // factor is never negative for the square root
                    let factor = (cos_angle * cos_angle - sin2_half_turn_angle).max(0.0);
                    let radius = distance * cos_half_turn_angle * (cos_angle + factor.sqrt())
                        / sin2_half_turn_angle;

                    // and the initiation distance from the radius
                    distance = radius * half_turn_angle.tan();
                }
            }
        }
    }

    distance.min(max_distance)
}

/// Derive the horizontal path waypoints and turn initiation distances
/// from raw trajectory points.
///
/// `threshold` is the across track tolerance [radians].
///
#[tracing::instrument(skip(points))]
pub fn derive_horizontal_path(
    points: &[Point3d],
    threshold: f64,
    calc_along_track: bool,
) -> Result<SpherePath, PathError> {
    if points.len() < 3 {
        return Err(PathError::InvalidInput(
            "a horizontal path requires at least three points".into(),
        ));
    }
    trace!("deriving path from {} points", points.len());

    // Find the extreme points and their indices in the points array
    let indices = find_extreme_point_indices(points, threshold, 0.1, calc_along_track);
    let extreme_points = indices.iter().map(|i| points[*i]).collect::<Vec<_>>();

    // The Great Circle arc along the first route leg
    let mut index = indices[1];
    let mut prev_arc = Arc3d::new(&extreme_points[0], &extreme_points[1]);
    prev_arc = fit_arc_to_points(&points[0..=index], &prev_arc);

    // The waypoints and turn initiation distances, starting with the
    // first point
    let mut path_waypoints = vec![prev_arc.a()];
    let mut turn_distances = vec![0.0];

    let mut prev_length = prev_arc.length();
    for i in 1..extreme_points.len() - 1 {
        // The Great Circle arc along the next route leg
        let prev_index = index;
        index = indices[i + 1];
        let mut arc = Arc3d::new(&extreme_points[i], &extreme_points[i + 1]);
        arc = fit_arc_to_points(&points[prev_index..=index], &arc);

        // The turn parameters at the waypoint
        let turn_angle = prev_arc.turn_angle(&arc.b());
        let max_turn_distance =
            calculate_max_turn_initiation_distance(prev_length, arc.length(), TWENTY_NM);

        let mut waypoint = arc.a();
        let mut turn_distance = 0.0;

        let is_valid_turn = (MIN_TURN_ANGLE < turn_angle.abs())
            && (turn_angle.abs() <= MAX_TURN_ANGLE)
            && (max_turn_distance > TWO_NM);
        if is_valid_turn {
            waypoint = calculate_intersection(&prev_arc, &arc);
            turn_distance = calculate_turn_initiation_distance(
                &prev_arc,
                &arc,
                &points[prev_index + 1],
                max_turn_distance,
                threshold / 4.0,
            );
        }
        path_waypoints.push(waypoint);
        turn_distances.push(turn_distance);

        prev_arc = arc;
        prev_length = arc.length();
    }

    // Add the last point
    path_waypoints.push(prev_arc.b());
    turn_distances.push(0.0);

    SpherePath::new(path_waypoints, turn_distances)
}

#[cfg(test)]
mod tests {
    use super::*;

    use retrace_common::{nm2rad, rad2nm};

    use crate::point::calculate_points;

    /// Sample points along the equator with a small offset pattern.
    fn equator_points(count: usize) -> Vec<Point3d> {
        let lats = vec![0.0; count];
        let lons = (0..count).map(|i| i as f64 * 0.1).collect::<Vec<_>>();
        calculate_points(&lats, &lons)
    }

    #[test]
    fn test_find_extreme_point_indices_straight() {
        let points = equator_points(10);
        let indices = find_extreme_point_indices(&points, nm2rad(0.25), 0.1, false);
        assert_eq!(indices, vec![0, 9]);
    }

    #[test]
    fn test_find_extreme_point_indices_dog_leg() {
        // East along the equator, then turning away North
        let lats = [0.0, 0.0, 0.0, 0.0, 0.25, 0.5, 0.75];
        let lons = [0.0, 0.25, 0.5, 0.75, 1.0, 1.25, 1.5];
        let points = calculate_points(&lats, &lons);
        let indices = find_extreme_point_indices(&points, nm2rad(0.25), 0.1, false);
        assert_eq!(indices.first(), Some(&0));
        assert_eq!(indices.last(), Some(&6));
        // the corner point is an extreme point
        assert!(indices.contains(&3));
    }

    #[test]
    fn test_fit_arc_to_points_removes_offset() {
        // points consistently 1 NM north of the nominal arc
        let lats = vec![1.0 / 60.0; 6];
        let lons = (0..6).map(|i| i as f64 * 0.2).collect::<Vec<_>>();
        let points = calculate_points(&lats, &lons);

        let nominal = Arc3d::new(
            &Point3d::from_lat_lon(0.0, 0.0),
            &Point3d::from_lat_lon(0.0, 1.0),
        );
        let fitted = fit_arc_to_points(&points, &nominal);
        for point in &points {
            assert!(fitted.cross_track_distance(point).abs() < nm2rad(0.01));
        }
    }

    #[test]
    fn test_calculate_intersection() {
        let prev_arc = Arc3d::new(
            &Point3d::from_lat_lon(0.0, -1.0),
            &Point3d::from_lat_lon(0.0, 0.0),
        );
        let arc = Arc3d::new(
            &Point3d::from_lat_lon(0.0, 0.0),
            &Point3d::from_lat_lon(1.0, 1.0),
        );
        let intersection = calculate_intersection(&prev_arc, &arc);
        // the great circles cross at the shared waypoint
        assert!(distance_radians(&intersection, &arc.a()) < nm2rad(0.01));

        // colinear arcs fall back to the second arc start
        let colinear = Arc3d::new(
            &Point3d::from_lat_lon(0.0, 0.0),
            &Point3d::from_lat_lon(0.0, 1.0),
        );
        let fallback = calculate_intersection(&prev_arc, &colinear);
        assert_eq!(fallback, colinear.a());
    }

    #[test]
    fn test_calculate_max_turn_initiation_distance() {
        assert_eq!(
            calculate_max_turn_initiation_distance(nm2rad(10.0), nm2rad(30.0), TWENTY_NM),
            nm2rad(5.0)
        );
        assert_eq!(
            calculate_max_turn_initiation_distance(nm2rad(100.0), nm2rad(90.0), TWENTY_NM),
            TWENTY_NM
        );
    }

    #[test]
    fn test_calculate_turn_initiation_distance_through_point() {
        // a 90 degree right turn with the raw point on the bisector
        let prev_arc = Arc3d::new(
            &Point3d::from_lat_lon(0.0, -1.0),
            &Point3d::from_lat_lon(0.0, 0.0),
        );
        let arc = Arc3d::new(
            &Point3d::from_lat_lon(0.0, 0.0),
            &Point3d::from_lat_lon(-1.0, 0.0),
        );

        // a raw point 2 NM from the waypoint, just off the interior
        // bisector (bearing 220 degrees)
        let bearing = 220.0_f64.to_radians();
        let point =
            Point3d::from_lat_lon(2.0 * bearing.cos() / 60.0, 2.0 * bearing.sin() / 60.0);

        let tid = calculate_turn_initiation_distance(
            &prev_arc,
            &arc,
            &point,
            TWENTY_NM,
            nm2rad(0.125),
        );
        assert!((nm2rad(2.0) < tid) && (tid < TWENTY_NM));

        // the turn arc through the point passes (almost) through it
        let turn = crate::turn::SphereTurnArc::new(&prev_arc, &arc, tid);
        assert!(turn.is_valid());
        assert!(
            turn.cross_track_distance(&point).abs() < nm2rad(0.05),
            "turn misses the point by {} NM",
            rad2nm(turn.cross_track_distance(&point).abs())
        );
    }

    #[test]
    fn test_derive_horizontal_path_straight() {
        let points = equator_points(10);
        let path = derive_horizontal_path(&points, nm2rad(0.25), false).unwrap();
        assert_eq!(path.len(), 2);
        assert!((rad2nm(path.path_distances()[1]) - 54.0).abs() < 0.1);
    }

    #[test]
    fn test_derive_horizontal_path_dog_leg() {
        // two straight legs with a turn between them
        let mut lats = vec![];
        let mut lons = vec![];
        for i in 0..=8 {
            lats.push(0.0);
            lons.push(i as f64 * 0.25);
        }
        for i in 1..=8 {
            lats.push(i as f64 * 0.25);
            lons.push(2.0);
        }
        let points = calculate_points(&lats, &lons);
        let path = derive_horizontal_path(&points, nm2rad(0.25), false).unwrap();

        assert_eq!(path.len(), 3);
        // the waypoint is at the great circle intersection near the corner
        let corner = Point3d::from_lat_lon(0.0, 2.0);
        assert!(distance_radians(&path.points()[1], &corner) < nm2rad(1.0));
        // the left turn has a negative angle
        assert!(path.turn_angles()[1] < 0.0);
    }

    #[test]
    fn test_derive_horizontal_path_too_few_points() {
        let points = equator_points(2);
        assert!(matches!(
            derive_horizontal_path(&points, nm2rad(0.25), false),
            Err(PathError::InvalidInput(_))
        ));
    }
}
