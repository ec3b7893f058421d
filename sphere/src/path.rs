//! A trajectory path over the sphere: an ordered sequence of waypoints
//! with turn initiation distances and the geometry derived from them.
//!

use retrace_common::{calculate_value_reference, nm2rad, rad2nm, MIN_LENGTH};

use crate::arc::{calculate_arcs, calculate_closest_distances, calculate_turn_angles, Arc3d};
use crate::error::PathError;
use crate::point::{
    calculate_latitudes, calculate_leg_lengths, calculate_longitudes, Point3d,
};
use crate::turn::{calculate_arc_length, SphereTurnArc, MAX_TURN_ANGLE, MIN_TURN_ANGLE};

/// The types of path points reported by `section_distances_and_types`.
///
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PointType {
    Waypoint,
    TurnStart,
    TurnFinish,
}

/// Calculate the position of a point at index and ratio along a sequence
/// of points.
///
pub fn calculate_position(points: &[Point3d], index: usize, ratio: f64) -> Point3d {
    let point = points[index];
    if ratio > 0.0 {
        if index < points.len() - 1 {
            let arc = Arc3d::new(&point, &points[index + 1]);
            arc.position(ratio * arc.length())
        } else {
            points[points.len() - 1]
        }
    } else {
        point
    }
}

/// Calculate the index and ratio of the closest point along a sequence of
/// points to `point`.
///
pub fn find_index_and_ratio(points: &[Point3d], point: &Point3d) -> (usize, f64) {
    // The index of the closest leg
    let arcs = calculate_arcs(points);
    let distances = calculate_closest_distances(&arcs, point);
    let mut index = distances
        .iter()
        .enumerate()
        .min_by(|a, b| a.1.total_cmp(b.1))
        .map_or(0, |(i, _)| i);

    // Calculate the ratio along the closest leg
    let arc = Arc3d::new(&points[index], &points[index + 1]);
    let atd = arc.along_track_distance(point);
    let mut ratio = atd / arc.length();

    // if the closest point is at the end of the leg, use start of next leg
    if ratio >= 1.0 {
        ratio = 0.0;
        index += 1;
    }

    (index, ratio)
}

/// Calculate the half lengths of the turn arcs at each waypoint.
///
/// Only waypoints with a turn initiation distance have a turn arc.
///
fn calculate_arc_half_lengths(turn_angles: &[f64], turn_initiation_distances: &[f64]) -> Vec<f64> {
    turn_angles
        .iter()
        .zip(turn_initiation_distances.iter())
        .map(|(angle, distance)| {
            if *distance > 0.0 {
                calculate_arc_length(*angle, *distance) / 2.0
            } else {
                0.0
            }
        })
        .collect()
}

/// Calculate the lengths of the path between waypoints: the leg lengths
/// shortened by `turn_initiation_distance - arc_half_length` at each end.
///
fn calculate_path_leg_lengths(
    leg_lengths: &[f64],
    turn_initiation_distances: &[f64],
    arc_half_lengths: &[f64],
) -> Vec<f64> {
    let count = leg_lengths.len();
    let mut lengths = vec![0.0; count];
    let mut prev_delta = 0.0;
    for i in 1..count - 1 {
        // delta is the shortened distance of the arc before the point
        let delta = turn_initiation_distances[i] - arc_half_lengths[i];
        lengths[i] = leg_lengths[i] - (prev_delta + delta);
        prev_delta = delta;
    }

    // The last leg is only shortened by the turn onto it
    lengths[count - 1] = leg_lengths[count - 1] - prev_delta;

    lengths
}

/// An ordered sequence of waypoints with their turn initiation distances
/// and relative geometry: leg lengths, turn angles and path lengths.
///
/// All distances are radians on the unit sphere unless a method says
/// otherwise.
///
#[derive(Clone, Debug)]
pub struct SpherePath {
    points: Vec<Point3d>,
    turn_initiation_distances: Vec<f64>,
    leg_lengths: Vec<f64>,
    turn_angles: Vec<f64>,
    turn_half_lengths: Vec<f64>,
    path_lengths: Vec<f64>,
}

impl SpherePath {
    /// Create a path from waypoints and turn initiation distances.
    ///
    /// There must be at least two points and as many turn initiation
    /// distances as points; consecutive points must be at least
    /// `MIN_LENGTH` apart. Waypoints whose turn angle lies outside
    /// `(MIN_TURN_ANGLE, MAX_TURN_ANGLE]` have their turn initiation
    /// distance coerced to zero, as do the path ends.
    ///
    pub fn new(
        points: Vec<Point3d>,
        turn_initiation_distances: Vec<f64>,
    ) -> Result<Self, PathError> {
        if points.len() < 2 {
            return Err(PathError::InvalidInput(
                "a path requires at least two points".into(),
            ));
        }
        if points.len() != turn_initiation_distances.len() {
            return Err(PathError::InvalidInput(
                "points and turn initiation distances differ in length".into(),
            ));
        }

        let leg_lengths = calculate_leg_lengths(&points);

        // validate leg lengths before constructing arcs
        // Note: the first leg length is zero
        if leg_lengths[1..].iter().any(|l| *l < MIN_LENGTH) {
            return Err(PathError::ShortLeg);
        }

        let leg_arcs = calculate_arcs(&points);
        let mut turn_angles = calculate_turn_angles(&leg_arcs);

        // clear turn initiation distances and angles for invalid turns
        let mut turn_initiation_distances = turn_initiation_distances;
        let last = points.len() - 1;
        turn_initiation_distances[0] = 0.0;
        turn_initiation_distances[last] = 0.0;
        for i in 1..last {
            let angle = turn_angles[i].abs();
            if !((MIN_TURN_ANGLE < angle) && (angle <= MAX_TURN_ANGLE)) {
                turn_initiation_distances[i] = 0.0;
                turn_angles[i] = 0.0;
            }
        }

        let turn_half_lengths =
            calculate_arc_half_lengths(&turn_angles, &turn_initiation_distances);
        let path_lengths =
            calculate_path_leg_lengths(&leg_lengths, &turn_initiation_distances, &turn_half_lengths);

        Ok(SpherePath {
            points,
            turn_initiation_distances,
            leg_lengths,
            turn_angles,
            turn_half_lengths,
            path_lengths,
        })
    }

    /// The waypoints.
    pub fn points(&self) -> &[Point3d] {
        &self.points
    }

    /// The turn initiation distances in [radians].
    pub fn turn_initiation_distances(&self) -> &[f64] {
        &self.turn_initiation_distances
    }

    /// The leg lengths in [radians].
    pub fn leg_lengths(&self) -> &[f64] {
        &self.leg_lengths
    }

    /// The turn angles in [radians].
    pub fn turn_angles(&self) -> &[f64] {
        &self.turn_angles
    }

    /// The turn arc half lengths in [radians].
    pub fn turn_half_lengths(&self) -> &[f64] {
        &self.turn_half_lengths
    }

    /// The path lengths between waypoints in [radians].
    pub fn path_lengths(&self) -> &[f64] {
        &self.path_lengths
    }

    /// The number of waypoints.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the path has no waypoints.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// The waypoints as latitude and longitude arrays in [degrees].
    ///
    pub fn point_lat_longs(&self) -> (Vec<f64>, Vec<f64>) {
        (
            calculate_latitudes(&self.points),
            calculate_longitudes(&self.points),
        )
    }

    /// The turn initiation distances in [Nautical Miles].
    ///
    pub fn turn_initiation_distances_nm(&self) -> Vec<f64> {
        self.turn_initiation_distances.iter().map(|d| rad2nm(*d)).collect()
    }

    /// The cumulative distances along the path to the abeam points of the
    /// waypoints [radians].
    ///
    pub fn path_distances(&self) -> Vec<f64> {
        self.path_lengths
            .iter()
            .scan(0.0, |total, length| {
                *total += length;
                Some(*total)
            })
            .collect()
    }

    /// The path flown along route legs and around turns, with
    /// `number_of_points` intermediate points inside each turn.
    ///
    pub fn turn_points(&self, number_of_points: usize) -> Vec<Point3d> {
        // Add the path start point
        let mut points = vec![self.points[0]];

        for i in 1..self.len() - 1 {
            let turn_distance = self.turn_initiation_distances[i];
            if turn_distance > 0.0 {
                let inbound_leg = Arc3d::new(&self.points[i - 1], &self.points[i]);
                let outbound_leg = Arc3d::new(&self.points[i], &self.points[i + 1]);
                let turn_arc = SphereTurnArc::new(&inbound_leg, &outbound_leg, turn_distance);
                if turn_arc.is_valid() {
                    points.push(turn_arc.start());

                    if number_of_points > 0 {
                        // the angle between each intermediate point
                        let delta_angle = turn_arc.angle() / (1.0 + number_of_points as f64);
                        let mut angle = delta_angle;
                        for _ in 0..number_of_points {
                            points.push(turn_arc.position(angle));
                            angle += delta_angle;
                        }
                    }

                    points.push(turn_arc.finish());
                } else {
                    points.push(self.points[i]);
                }
            } else {
                points.push(self.points[i]);
            }
        }

        // Add the path finish point
        points.push(self.points[self.len() - 1]);

        points
    }

    /// Calculate the position of a point along the path at `index` and
    /// `ratio` of the path length of the leg starting there.
    ///
    /// The point may lie on the straight section of the leg or within a
    /// turn at either end of it.
    ///
    pub fn calculate_position_at(&self, index: usize, ratio: f64) -> Point3d {
        if index < self.len() - 1 {
            let arc = Arc3d::new(&self.points[index], &self.points[index + 1]);

            let path_length = self.path_lengths[index + 1];
            let mut distance = ratio * path_length;

            // the distance to the turn at the far end of the leg
            let next_turn_distance = path_length - self.turn_half_lengths[index + 1];

            let inside_start_turn = (self.turn_initiation_distances[index] > 0.0)
                && (distance < self.turn_half_lengths[index]);
            let inside_finish_turn = (self.turn_initiation_distances[index + 1] > 0.0)
                && (distance > next_turn_distance);
            if (inside_start_turn && (index > 0)) || (inside_finish_turn && (index < self.len() - 2))
            {
                let mut inbound_leg = arc;
                let mut outbound_leg = arc;
                let turn_initiation_distance;
                let turn_ratio;
                if inside_finish_turn {
                    turn_initiation_distance = self.turn_initiation_distances[index + 1];
                    outbound_leg = Arc3d::new(&self.points[index + 1], &self.points[index + 2]);
                    distance -= next_turn_distance;
                    turn_ratio = 0.5 * distance / self.turn_half_lengths[index + 1];
                } else {
                    turn_initiation_distance = self.turn_initiation_distances[index];
                    inbound_leg = Arc3d::new(&self.points[index - 1], &self.points[index]);
                    distance += self.turn_half_lengths[index];
                    turn_ratio = 0.5 * distance / self.turn_half_lengths[index];
                }

                let turn_arc =
                    SphereTurnArc::new(&inbound_leg, &outbound_leg, turn_initiation_distance);
                turn_arc.position(turn_ratio * turn_arc.angle())
            } else {
                // along the straight section; if the leg starts with a
                // turn the distance is measured from the abeam point
                if self.turn_initiation_distances[index] > 0.0 {
                    distance +=
                        self.turn_initiation_distances[index] - self.turn_half_lengths[index];
                }
                arc.position(distance)
            }
        } else {
            self.points[self.len() - 1]
        }
    }

    /// Calculate the distance of a point along the path leg starting at
    /// `index`, turn aware at both ends [radians].
    ///
    pub fn calculate_path_leg_distance(&self, point: &Point3d, index: usize) -> f64 {
        // the route leg arc and the point's distance along it
        let arc = Arc3d::new(&self.points[index], &self.points[index + 1]);
        let mut distance = arc.along_track_distance(point);

        // if there is a start turn and the point is within it
        let prev_turn_initiation_distance = if index > 0 {
            self.turn_initiation_distances[index]
        } else {
            0.0
        };
        let inside_prev_turn =
            (prev_turn_initiation_distance > 0.0) && (distance < prev_turn_initiation_distance);
        if inside_prev_turn {
            let inbound_leg = Arc3d::new(&self.points[index - 1], &self.points[index]);
            let turn_arc = SphereTurnArc::new(&inbound_leg, &arc, prev_turn_initiation_distance);
            distance = turn_arc.along_track_distance(point) - self.turn_half_lengths[index];
        } else {
            // the distance to the turn by the next point
            let next_turn_initiation_distance = if index < self.len() - 2 {
                self.turn_initiation_distances[index + 1]
            } else {
                0.0
            };
            let next_turn_distance = arc.length() - next_turn_initiation_distance;
            let inside_next_turn =
                (next_turn_initiation_distance > 0.0) && (distance > next_turn_distance);
            if inside_next_turn {
                let outbound_leg = Arc3d::new(&self.points[index + 1], &self.points[index + 2]);
                let turn_arc =
                    SphereTurnArc::new(&arc, &outbound_leg, next_turn_initiation_distance);
                distance = turn_arc.along_track_distance(point) + self.path_lengths[index + 1]
                    - self.turn_half_lengths[index + 1];
            } else if prev_turn_initiation_distance > 0.0 {
                // along a straight section that starts with a turn
                distance += self.turn_half_lengths[index] - prev_turn_initiation_distance;
            }
        }

        distance
    }

    /// Calculate the distance of a point along the path, searching the leg
    /// at `index` and its neighbours, falling back to a global nearest leg
    /// search when none is within `across_track_tolerance` [radians].
    ///
    pub fn calculate_path_distance(
        &self,
        point: &Point3d,
        index: usize,
        across_track_tolerance: f64,
    ) -> f64 {
        // the closest distance between the point and the leg
        let arc = Arc3d::new(&self.points[index], &self.points[index + 1]);
        let closest_distance = arc.closest_distance(point);

        let prev_distance = if index > 0 {
            let arc = Arc3d::new(&self.points[index - 1], &self.points[index]);
            arc.closest_distance(point)
        } else {
            closest_distance + 1.0
        };

        let next_distance = if index < self.len() - 2 {
            let arc = Arc3d::new(&self.points[index + 1], &self.points[index + 2]);
            arc.closest_distance(point)
        } else {
            closest_distance + 1.0
        };

        let mut index = index;
        let min_distance = closest_distance.min(prev_distance.min(next_distance));
        if min_distance < across_track_tolerance {
            // the index of the closest leg
            if (prev_distance < closest_distance) || (next_distance < closest_distance) {
                index = if prev_distance < next_distance {
                    index - 1
                } else {
                    index + 1
                };
            }
        } else {
            // none of the legs is within across_track_tolerance
            let (found, _) = find_index_and_ratio(&self.points, point);
            index = found.min(self.len() - 2);
        }

        // the path distance along the closest leg
        let path_length = self.path_lengths[index + 1];
        let distance = self
            .calculate_path_leg_distance(point, index)
            .clamp(0.0, path_length);

        // plus the cumulative path lengths before it
        distance + self.path_lengths[..=index].iter().sum::<f64>()
    }

    /// Calculate the distances along the path of an ordered sequence of
    /// points, advancing the leg hint as the points progress [radians].
    ///
    pub fn calculate_path_distances(
        &self,
        points: &[Point3d],
        across_track_tolerance: f64,
        start_index: usize,
    ) -> Vec<f64> {
        let mut distances = Vec::with_capacity(points.len());

        let mut index = start_index;
        let mut path_distance = self.path_lengths[..=index + 1].iter().sum::<f64>();
        for point in points {
            let distance = self.calculate_path_distance(point, index, across_track_tolerance);
            distances.push(distance);

            let past_current_leg = distance > path_distance;
            let is_last_leg = index >= self.len() - 2;
            if past_current_leg && !is_last_leg {
                index += 1;
                path_distance += self.path_lengths[index + 1];
            }
        }

        distances
    }

    /// Find the index and ratio of the closest point along the path.
    ///
    pub fn find_index_and_ratio(&self, point: &Point3d) -> (usize, f64) {
        let (mut index, mut ratio) = find_index_and_ratio(&self.points, point);

        if index < self.len() - 1 {
            let distance = self.calculate_path_leg_distance(point, index);
            ratio = distance / self.path_lengths[index + 1];

            if ratio >= 1.0 {
                index += 1;
                ratio = 0.0;

                if index < self.len() - 1 {
                    let distance = self.calculate_path_leg_distance(point, index);
                    ratio = distance / self.path_lengths[index + 1];
                }
            }
        }

        (index, ratio)
    }

    /// Calculate the cross track distance of a point from the path leg at
    /// `index`, using the radial distance from the turn centre when the
    /// point falls within a turn [radians].
    ///
    pub fn calculate_path_cross_track_distance(&self, point: &Point3d, index: usize) -> f64 {
        let arc = Arc3d::new(&self.points[index], &self.points[index + 1]);
        let mut xtd = arc.cross_track_distance(point);

        let prev_turn_initiation_distance = if index > 0 {
            self.turn_initiation_distances[index]
        } else {
            0.0
        };
        let next_turn_initiation_distance = if index < self.len() - 2 {
            self.turn_initiation_distances[index + 1]
        } else {
            0.0
        };

        // if there is a turn at either end
        if (prev_turn_initiation_distance > 0.0) || (next_turn_initiation_distance > 0.0) {
            let distance = arc.along_track_distance(point);
            let inside_prev_turn =
                (prev_turn_initiation_distance > 0.0) && (distance < prev_turn_initiation_distance);
            if inside_prev_turn {
                let inbound_leg = Arc3d::new(&self.points[index - 1], &self.points[index]);
                let turn_arc =
                    SphereTurnArc::new(&inbound_leg, &arc, prev_turn_initiation_distance);
                xtd = turn_arc.cross_track_distance(point);
            } else {
                let next_turn_distance = arc.length() - next_turn_initiation_distance;
                let inside_next_turn =
                    (next_turn_initiation_distance > 0.0) && (distance > next_turn_distance);
                if inside_next_turn {
                    let outbound_leg = Arc3d::new(&self.points[index + 1], &self.points[index + 2]);
                    let turn_arc =
                        SphereTurnArc::new(&arc, &outbound_leg, next_turn_initiation_distance);
                    xtd = turn_arc.cross_track_distance(point);
                }
            }
        }

        xtd
    }

    /// Calculate the cross track distances of points ordered by their path
    /// distances [Nautical Miles].
    ///
    pub fn calculate_cross_track_distances(
        &self,
        points: &[Point3d],
        distances_nm: &[f64],
    ) -> Vec<f64> {
        let mut xtds = Vec::with_capacity(points.len());

        let path_distances_nm = self.path_distances().iter().map(|d| rad2nm(*d)).collect::<Vec<_>>();
        let mut path_index = 0;
        let mut next_distance = path_distances_nm[path_index + 1];
        for (point, distance) in points.iter().zip(distances_nm.iter()) {
            // Determine whether to advance the path index
            if (*distance > next_distance) && (path_index < self.len() - 2) {
                path_index += 1;
                next_distance = path_distances_nm[path_index + 1];
            }

            xtds.push(rad2nm(
                self.calculate_path_cross_track_distance(point, path_index),
            ));
        }

        xtds
    }

    /// The distances and types of the waypoints and the turn starts and
    /// finishes along the path [Nautical Miles].
    ///
    pub fn section_distances_and_types(&self) -> (Vec<f64>, Vec<PointType>) {
        let mut distances = vec![0.0];
        let mut point_types = vec![PointType::Waypoint];

        let mut waypoint_distance = 0.0;
        for i in 1..self.len() {
            waypoint_distance += self.path_lengths[i];
            let turn_half_length = self.turn_half_lengths[i];
            if turn_half_length > 0.0 {
                // the turn start and finish straddle the abeam point
                distances.push(rad2nm(waypoint_distance - turn_half_length));
                point_types.push(PointType::TurnStart);

                distances.push(rad2nm(waypoint_distance + turn_half_length));
                point_types.push(PointType::TurnFinish);
            } else {
                distances.push(rad2nm(waypoint_distance));
                point_types.push(PointType::Waypoint);
            }
        }

        (distances, point_types)
    }

    /// Calculate the positions of points at ordered distances along the
    /// path in [Nautical Miles].
    ///
    pub fn calculate_positions(&self, distances_nm: &[f64]) -> Vec<Point3d> {
        let mut positions = Vec::with_capacity(distances_nm.len());

        let mut path_index = 0;
        let mut path_distance_nm = 0.0;
        let mut path_length_nm = rad2nm(self.path_lengths[path_index + 1]);
        let mut next_distance = path_distance_nm + path_length_nm;
        for distance in distances_nm {
            // Determine whether to advance the path index
            if (*distance > next_distance) && (path_index < self.len() - 2) {
                path_index += 1;
                path_distance_nm += path_length_nm;
                path_length_nm = rad2nm(self.path_lengths[path_index + 1]);
                next_distance = path_distance_nm + path_length_nm;
            }

            let ratio = (distance - path_distance_nm) / path_length_nm;
            positions.push(self.calculate_position_at(path_index, ratio));
        }

        positions
    }

    /// The point sequence tracing the path between two distances in
    /// [Nautical Miles], inclusive of the interpolated end points.
    ///
    pub fn subsection_positions(&self, start_distance: f64, finish_distance: f64) -> Vec<Point3d> {
        let distances_nm = self
            .path_distances()
            .iter()
            .map(|d| rad2nm(*d))
            .collect::<Vec<_>>();
        let (start_index, start_ratio) = calculate_value_reference(&distances_nm, start_distance);
        let (finish_index, finish_ratio) =
            calculate_value_reference(&distances_nm, finish_distance);

        let arc = Arc3d::new(&self.points[start_index], &self.points[start_index + 1]);
        let mut positions = vec![arc.position(start_ratio * arc.length())];

        for i in start_index + 1..=finish_index {
            positions.push(self.points[i]);
        }

        if finish_ratio > 0.0 {
            let arc = Arc3d::new(&self.points[finish_index], &self.points[finish_index + 1]);
            positions.push(arc.position(finish_ratio * arc.length()));
        }

        positions
    }

    /// Calculate the ground track of a point along the path at `index`
    /// and `ratio`, turn aware, in [radians].
    ///
    pub fn calculate_ground_track(&self, index: usize, ratio: f64) -> f64 {
        if index < self.len() - 1 {
            let arc = Arc3d::new(&self.points[index], &self.points[index + 1]);

            let path_length = self.path_lengths[index + 1];
            let mut distance = ratio * path_length;

            let next_turn_distance = path_length - self.turn_half_lengths[index + 1];

            let inside_start_turn = (self.turn_half_lengths[index] > 0.0)
                && (distance < self.turn_half_lengths[index]);
            let inside_finish_turn = (self.turn_half_lengths[index + 1] > 0.0)
                && (distance > next_turn_distance);
            if (inside_start_turn && (index > 0)) || (inside_finish_turn && (index < self.len() - 2))
            {
                let mut inbound_leg = arc;
                let mut outbound_leg = arc;
                let turn_initiation_distance;
                let turn_ratio;
                if inside_finish_turn {
                    turn_initiation_distance = self.turn_initiation_distances[index + 1];
                    outbound_leg = Arc3d::new(&self.points[index + 1], &self.points[index + 2]);
                    distance -= next_turn_distance;
                    turn_ratio = 0.5 * distance / self.turn_half_lengths[index + 1];
                } else {
                    turn_initiation_distance = self.turn_initiation_distances[index];
                    inbound_leg = Arc3d::new(&self.points[index - 1], &self.points[index]);
                    distance += self.turn_half_lengths[index];
                    turn_ratio = 0.5 * distance / self.turn_half_lengths[index];
                }

                let turn_arc =
                    SphereTurnArc::new(&inbound_leg, &outbound_leg, turn_initiation_distance);
                inbound_leg.calculate_azimuth(&turn_arc.start()) + turn_ratio * turn_arc.angle()
            } else {
                // along the straight section
                if self.turn_initiation_distances[index] > 0.0 {
                    distance +=
                        self.turn_initiation_distances[index] - self.turn_half_lengths[index];
                }
                let point = arc.position(distance);
                arc.calculate_azimuth(&point)
            }
        } else {
            let arc = Arc3d::new(&self.points[self.len() - 2], &self.points[self.len() - 1]);
            arc.calculate_azimuth(&self.points[self.len() - 1])
        }
    }

    /// Calculate the ground tracks at ordered distances along the path in
    /// [Nautical Miles], output in [radians].
    ///
    pub fn calculate_ground_tracks(&self, distances_nm: &[f64]) -> Vec<f64> {
        let mut ground_tracks = Vec::with_capacity(distances_nm.len());

        let mut path_index = 0;
        let mut path_distance_nm = 0.0;
        let mut path_length_nm = rad2nm(self.path_lengths[path_index + 1]);
        let mut next_distance = path_distance_nm + path_length_nm;
        for distance in distances_nm {
            if (*distance > next_distance) && (path_index < self.len() - 2) {
                path_index += 1;
                path_distance_nm += path_length_nm;
                path_length_nm = rad2nm(self.path_lengths[path_index + 1]);
                next_distance = path_distance_nm + path_length_nm;
            }

            let ratio = (distance - path_distance_nm) / path_length_nm;
            ground_tracks.push(self.calculate_ground_track(path_index, ratio));
        }

        ground_tracks
    }
}

/// Create a path from latitude, longitude and turn initiation distance
/// arrays, with distances in [Nautical Miles].
///
pub fn path_from_lat_lons(
    lats: &[f64],
    lons: &[f64],
    tids_nm: &[f64],
) -> Result<SpherePath, PathError> {
    if lats.len() != lons.len() || lats.len() != tids_nm.len() {
        return Err(PathError::InvalidInput(
            "latitude, longitude and turn distance arrays differ in length".into(),
        ));
    }
    let points = crate::point::calculate_points(lats, lons);
    let tids = tids_nm.iter().map(|d| nm2rad(*d)).collect();
    SpherePath::new(points, tids)
}

#[cfg(test)]
mod tests {
    use super::*;

    use retrace_common::NM;

    use crate::point::{calculate_points, distance_radians};

    /// An equatorial dog leg: East for 60 NM, then 90 degrees right for
    /// another 60 NM, with a 5 NM turn at the corner.
    fn dog_leg() -> SpherePath {
        let points = calculate_points(&[0.0, 0.0, -1.0], &[-1.0, 0.0, 0.0]);
        let tids = vec![0.0, nm2rad(5.0), 0.0];
        SpherePath::new(points, tids).unwrap()
    }

    fn straight_path() -> SpherePath {
        let points = calculate_points(&[0.0, 0.0, 0.0], &[0.0, 0.5, 1.0]);
        let tids = vec![0.0, 0.0, 0.0];
        SpherePath::new(points, tids).unwrap()
    }

    #[test]
    fn test_invalid_paths() {
        let single = calculate_points(&[0.0], &[0.0]);
        assert!(matches!(
            SpherePath::new(single, vec![0.0]),
            Err(PathError::InvalidInput(_))
        ));

        let coincident = calculate_points(&[0.0, 0.0, 1.0], &[0.0, 0.0, 0.0]);
        assert!(matches!(
            SpherePath::new(coincident, vec![0.0, 0.0, 0.0]),
            Err(PathError::ShortLeg)
        ));
    }

    #[test]
    fn test_straight_path_geometry() {
        let path = straight_path();
        assert_eq!(path.len(), 3);
        assert_eq!(path.turn_angles()[1], 0.0);
        assert_eq!(path.turn_half_lengths()[1], 0.0);

        let distances = path.path_distances();
        assert!((rad2nm(distances[2]) - 60.0).abs() < 1.0e-6);
    }

    #[test]
    fn test_turn_geometry() {
        let path = dog_leg();
        // the turn shortens the path through the corner
        let angle = path.turn_angles()[1];
        assert!(angle > 0.0);
        let half_length = path.turn_half_lengths()[1];
        assert!((0.0 < half_length) && (half_length < nm2rad(5.0)));

        let total = path.path_distances()[2];
        let leg_sum = path.leg_lengths().iter().sum::<f64>();
        assert!(total < leg_sum);
        // total = legs - 2 * tid + arc length
        let expected = leg_sum - 2.0 * nm2rad(5.0) + 2.0 * half_length;
        assert!((total - expected).abs() < 1.0e-12);
    }

    #[test]
    fn test_position_distance_round_trip() {
        let path = dog_leg();
        let total_nm = rad2nm(path.path_distances()[2]);
        let tolerance = nm2rad(0.5);

        for i in 0..=20 {
            let distance_nm = total_nm * (i as f64) / 20.0;
            let position = path.calculate_positions(&[distance_nm])[0];
            let distance = path.calculate_path_distance(&position, 0, tolerance);
            assert!(
                (rad2nm(distance) - distance_nm).abs() < 0.5,
                "distance {distance_nm} round tripped to {}",
                rad2nm(distance)
            );
        }
    }

    #[test]
    fn test_cross_track_distance_at_waypoints() {
        let path = straight_path();
        for (i, point) in path.points().iter().enumerate() {
            let index = i.min(path.len() - 2);
            let xtd = path.calculate_path_cross_track_distance(point, index);
            assert!(xtd.abs() <= retrace_common::MIN_LENGTH);
        }
    }

    #[test]
    fn test_path_distances_monotone() {
        let path = dog_leg();
        let samples = (0..=30)
            .map(|i| {
                let d = rad2nm(path.path_distances()[2]) * (i as f64) / 30.0;
                path.calculate_positions(&[d])[0]
            })
            .collect::<Vec<_>>();
        let distances = path.calculate_path_distances(&samples, nm2rad(0.5), 0);
        for pair in distances.windows(2) {
            assert!(pair[1] >= pair[0] - 1.0e-9);
        }
    }

    #[test]
    fn test_section_distances_and_types() {
        let path = dog_leg();
        let (distances, types) = path.section_distances_and_types();
        assert_eq!(
            types,
            vec![
                PointType::Waypoint,
                PointType::TurnStart,
                PointType::TurnFinish,
                PointType::Waypoint
            ]
        );
        // turn start and finish straddle the corner abeam distance
        let half_length_nm = rad2nm(path.turn_half_lengths()[1]);
        let abeam_nm = rad2nm(path.path_distances()[1]);
        assert!((distances[1] - (abeam_nm - half_length_nm)).abs() < 1.0e-9);
        assert!((distances[2] - (abeam_nm + half_length_nm)).abs() < 1.0e-9);
        assert!(distances.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn test_turn_points_trace_the_turn() {
        let path = dog_leg();
        let flown = path.turn_points(3);
        // start, turn start, 3 turn points, turn finish, end
        assert_eq!(flown.len(), 7);
        assert!(distance_radians(&flown[0], &path.points()[0]) < 1.0e-12);
        assert!(distance_radians(&flown[6], &path.points()[2]) < 1.0e-12);
        // intermediate turn points stay close to the corner
        for point in &flown[1..6] {
            assert!(distance_radians(point, &path.points()[1]) < nm2rad(6.0));
        }
    }

    #[test]
    fn test_subsection_positions() {
        let path = straight_path();
        let positions = path.subsection_positions(15.0, 45.0);
        assert_eq!(positions.len(), 3);
        assert!((positions[0].longitude() - 0.25).abs() < 1.0e-6);
        assert!((positions[1].longitude() - 0.5).abs() < 1.0e-9);
        assert!((positions[2].longitude() - 0.75).abs() < 1.0e-6);
    }

    #[test]
    fn test_ground_track_on_straight_leg() {
        let path = straight_path();
        let tracks = path.calculate_ground_tracks(&[0.0, 30.0, 59.9]);
        for track in tracks {
            assert!((track - std::f64::consts::FRAC_PI_2).abs() < 1.0e-6);
        }
    }

    #[test]
    fn test_ground_track_changes_through_turn() {
        let path = dog_leg();
        let (distances, types) = path.section_distances_and_types();
        let start = distances[1];
        let finish = distances[2];
        assert_eq!(types[1], PointType::TurnStart);

        let mid = 0.5 * (start + finish);
        let tracks = path
            .calculate_ground_tracks(&[start - 5.0, mid, finish + 5.0])
            .iter()
            .map(|t| retrace_common::convert_angle_to_track_angle(*t))
            .collect::<Vec<_>>();
        // East, South-East, South
        assert!((tracks[0] - 90.0).abs() < 1.5);
        assert!((tracks[1] - 135.0).abs() < 3.0);
        assert!((tracks[2] - 180.0).abs() < 1.5);
    }

    #[test]
    fn test_find_index_and_ratio_on_path() {
        let path = straight_path();
        let point = path.calculate_positions(&[45.0])[0];
        let (index, ratio) = path.find_index_and_ratio(&point);
        assert_eq!(index, 1);
        assert!((ratio - 0.5).abs() < 1.0e-6);
    }

    #[test]
    fn test_calculate_position_free_fn() {
        let points = calculate_points(&[0.0, 0.0], &[0.0, 1.0]);
        let mid = calculate_position(&points, 0, 0.5);
        assert!((mid.longitude() - 0.5).abs() < 1.0e-9);
        let end = calculate_position(&points, 1, 0.5);
        assert!(distance_radians(&end, &points[1]) < 1.0e-12);
    }

    #[test]
    fn test_path_from_lat_lons() {
        let path = path_from_lat_lons(&[0.0, 0.0, -1.0], &[-1.0, 0.0, 0.0], &[0.0, 5.0, 0.0])
            .unwrap();
        assert_eq!(path.len(), 3);
        assert!((path.turn_initiation_distances()[1] - 5.0 * NM).abs() < 1.0e-12);
    }
}
