//! Oriented great circle arcs.
//!

use retrace_common::MIN_LENGTH;

use crate::point::{distance_radians, Point3d};

/// An oriented great circle arc between two points.
///
/// The arc is held as its start point, the pole of its great circle and
/// its length in [radians]. The pole is on the left hand side of the
/// direction of travel, so positive cross track distances are to the left
/// and positive turn angles are turns to the right.
///
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Arc3d {
    a: Point3d,
    pole: Point3d,
    length: f64,
}

impl Arc3d {
    /// Create an arc from its start and end points.
    ///
    /// A degenerate pair (coincident or antipodal points) yields a zero
    /// (or π) length arc with an arbitrary pole; callers that care test
    /// the length against `MIN_LENGTH`.
    ///
    pub fn new(a: &Point3d, b: &Point3d) -> Self {
        let cross = a.cross(b);
        let pole = if cross.norm() > 0.0 {
            cross.normalize()
        } else {
            // any perpendicular will do for a degenerate arc
            let axis = if a.x.abs() < 0.5 {
                Point3d::new(1.0, 0.0, 0.0)
            } else {
                Point3d::new(0.0, 0.0, 1.0)
            };
            a.cross(&axis).normalize()
        };
        Arc3d {
            a: *a,
            pole,
            length: distance_radians(a, b),
        }
    }

    /// The start point of the arc.
    pub fn a(&self) -> Point3d {
        self.a
    }

    /// The end point of the arc.
    pub fn b(&self) -> Point3d {
        self.position(self.length)
    }

    /// The pole of the great circle of the arc.
    pub fn pole(&self) -> Point3d {
        self.pole
    }

    /// The length of the arc in [radians].
    pub fn length(&self) -> f64 {
        self.length
    }

    /// The position of a point at distance along the arc in [radians].
    ///
    pub fn position(&self, distance: f64) -> Point3d {
        let direction = self.pole.cross(&self.a);
        (self.a * distance.cos() + direction * distance.sin()).normalize()
    }

    /// The direction of travel of the great circle at a point on it.
    ///
    pub fn direction_at(&self, point: &Point3d) -> Point3d {
        self.pole.cross(point).normalize()
    }

    /// The signed along track distance of a point from the arc start,
    /// positive in the direction of travel [radians].
    ///
    pub fn along_track_distance(&self, point: &Point3d) -> f64 {
        let direction = self.pole.cross(&self.a);
        point.dot(&direction).atan2(point.dot(&self.a))
    }

    /// The signed cross track distance of a point from the arc, positive
    /// on the pole (left hand) side [radians].
    ///
    pub fn cross_track_distance(&self, point: &Point3d) -> f64 {
        point.dot(&self.pole).clamp(-1.0, 1.0).asin()
    }

    /// The closest distance of a point to the arc [radians].
    ///
    /// The perpendicular distance where the point projects onto the arc,
    /// otherwise the distance to the nearer end point.
    ///
    pub fn closest_distance(&self, point: &Point3d) -> f64 {
        let atd = self.along_track_distance(point);
        if (0.0..=self.length).contains(&atd) {
            self.cross_track_distance(point).abs()
        } else {
            distance_radians(point, &self.a).min(distance_radians(point, &self.b()))
        }
    }

    /// The position at a perpendicular offset from a point on the arc,
    /// positive toward the pole [radians].
    ///
    pub fn perp_position(&self, point: &Point3d, distance: f64) -> Point3d {
        (*point * distance.cos() + self.pole * distance.sin()).normalize()
    }

    /// The signed angle to turn at the arc end onto the great circle
    /// toward `to_point`, positive for a turn to the right [radians].
    ///
    pub fn turn_angle(&self, to_point: &Point3d) -> f64 {
        let b = self.b();
        let outbound_cross = b.cross(to_point);
        if outbound_cross.norm() < MIN_LENGTH {
            return 0.0;
        }
        let outbound_pole = outbound_cross.normalize();

        let t_in = self.pole.cross(&b);
        let t_out = outbound_pole.cross(&b);
        t_out.cross(&t_in).dot(&b).atan2(t_in.dot(&t_out))
    }

    /// The azimuth of the direction of travel at a point on the arc,
    /// clockwise from true North [radians].
    ///
    pub fn calculate_azimuth(&self, point: &Point3d) -> f64 {
        let up = Point3d::new(0.0, 0.0, 1.0);
        let east = up.cross(point);
        if east.norm() < MIN_LENGTH {
            // meridians converge at the poles
            return 0.0;
        }
        let east = east.normalize();
        let north = point.cross(&east);

        let direction = self.direction_at(point);
        direction.dot(&east).atan2(direction.dot(&north))
    }

    /// The signed angle of a point around the arc start (`a`) from the arc
    /// end direction (`b`), in the sense used by `angle_position`.
    ///
    /// For a turn arc built as `Arc3d(centre, turn_start)` this is the
    /// angle swept from the start of the turn to the point.
    ///
    pub fn start_angle(&self, point: &Point3d) -> f64 {
        let axis = self.a;
        let b = self.b();
        let e1 = (b - axis * axis.dot(&b)).normalize();
        let e2 = axis.cross(&e1);

        let u = *point - axis * axis.dot(point);
        if u.norm() < MIN_LENGTH {
            return 0.0;
        }
        let u = u.normalize();

        -u.dot(&e2).atan2(u.dot(&e1))
    }

    /// The position of the arc end (`b`) swept by `angle` around the arc
    /// start (`a`), the inverse of `start_angle`.
    ///
    pub fn angle_position(&self, angle: f64) -> Point3d {
        let axis = self.a;
        let v = self.b();
        let (sin_a, cos_a) = angle.sin_cos();
        (v * cos_a - axis.cross(&v) * sin_a + axis * (axis.dot(&v) * (1.0 - cos_a))).normalize()
    }
}

/// Create the arcs between adjacent points.
///
pub fn calculate_arcs(points: &[Point3d]) -> Vec<Arc3d> {
    points.windows(2).map(|pair| Arc3d::new(&pair[0], &pair[1])).collect()
}

/// The signed turn angles at the interior points of a sequence of arcs.
///
/// The first and last values are always zero; there is no turn at the
/// path ends.
///
pub fn calculate_turn_angles(arcs: &[Arc3d]) -> Vec<f64> {
    let mut angles = vec![0.0; arcs.len() + 1];
    for i in 1..arcs.len() {
        angles[i] = arcs[i - 1].turn_angle(&arcs[i].b());
    }
    angles
}

/// The closest distances of a point to each of the arcs [radians].
///
pub fn calculate_closest_distances(arcs: &[Arc3d], point: &Point3d) -> Vec<f64> {
    arcs.iter().map(|arc| arc.closest_distance(point)).collect()
}

/// The along track distances of points from the arc start [radians].
///
pub fn calculate_atds(arc: &Arc3d, points: &[Point3d]) -> Vec<f64> {
    points.iter().map(|p| arc.along_track_distance(p)).collect()
}

/// The cross track distances of points from the arc [radians].
///
pub fn calculate_xtds(arc: &Arc3d, points: &[Point3d]) -> Vec<f64> {
    points.iter().map(|p| arc.cross_track_distance(p)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    use retrace_common::{nm2rad, NM};

    use crate::point::calculate_points;

    fn equator_arc(start_lon: f64, finish_lon: f64) -> Arc3d {
        Arc3d::new(
            &Point3d::from_lat_lon(0.0, start_lon),
            &Point3d::from_lat_lon(0.0, finish_lon),
        )
    }

    #[test]
    fn test_arc_length_and_position() {
        let arc = equator_arc(0.0, 1.0);
        assert!((arc.length() - 1.0_f64.to_radians()).abs() < 1.0e-12);

        let mid = arc.position(arc.length() / 2.0);
        assert!((mid.latitude()).abs() < 1.0e-12);
        assert!((mid.longitude() - 0.5).abs() < 1.0e-12);

        let b = arc.b();
        assert!((b.longitude() - 1.0).abs() < 1.0e-12);
    }

    #[test]
    fn test_along_and_cross_track_distances() {
        let arc = equator_arc(0.0, 1.0);

        // a point half way along, 6 NM north of the arc
        let point = Point3d::from_lat_lon(0.1, 0.5);
        let atd = arc.along_track_distance(&point);
        let xtd = arc.cross_track_distance(&point);
        assert!((atd - nm2rad(30.0)).abs() < nm2rad(0.001));
        assert!((xtd - nm2rad(6.0)).abs() < nm2rad(0.001));

        // south of the arc the cross track distance is negative
        let south = Point3d::from_lat_lon(-0.1, 0.5);
        assert!(arc.cross_track_distance(&south) < 0.0);

        // before the start the along track distance is negative
        let before = Point3d::from_lat_lon(0.0, -0.25);
        assert!(arc.along_track_distance(&before) < 0.0);
    }

    #[test]
    fn test_closest_distance() {
        let arc = equator_arc(0.0, 1.0);

        let abeam = Point3d::from_lat_lon(0.5, 0.5);
        assert!((arc.closest_distance(&abeam) - 0.5_f64.to_radians()).abs() < 1.0e-9);

        let past_end = Point3d::from_lat_lon(0.0, 2.0);
        assert!((arc.closest_distance(&past_end) - 1.0_f64.to_radians()).abs() < 1.0e-9);
    }

    #[test]
    fn test_turn_angle_sign() {
        let arc = equator_arc(-1.0, 0.0);

        // continuing straight on
        let straight = Point3d::from_lat_lon(0.0, 1.0);
        assert!(arc.turn_angle(&straight).abs() < 1.0e-9);

        // turning right (south) is positive
        let south = Point3d::from_lat_lon(-1.0, 1.0);
        let right = arc.turn_angle(&south);
        assert!(right > 0.0);
        assert!((right - std::f64::consts::FRAC_PI_4).abs() < 0.02);

        // turning left (north) is negative
        let north = Point3d::from_lat_lon(1.0, 1.0);
        assert!(arc.turn_angle(&north) < 0.0);
    }

    #[test]
    fn test_perp_position() {
        let arc = equator_arc(0.0, 1.0);
        let offset = arc.perp_position(&arc.a(), NM);
        // pole side of an eastward equatorial arc is north
        assert!((offset.latitude() - 1.0 / 60.0).abs() < 1.0e-9);
        let opposite = arc.perp_position(&arc.a(), -NM);
        assert!((opposite.latitude() + 1.0 / 60.0).abs() < 1.0e-9);
    }

    #[test]
    fn test_calculate_azimuth() {
        let east = equator_arc(0.0, 1.0);
        let azimuth = east.calculate_azimuth(&east.a());
        assert!((azimuth - std::f64::consts::FRAC_PI_2).abs() < 1.0e-9);

        let north = Arc3d::new(
            &Point3d::from_lat_lon(0.0, 0.0),
            &Point3d::from_lat_lon(1.0, 0.0),
        );
        assert!(north.calculate_azimuth(&north.a()).abs() < 1.0e-9);
    }

    #[test]
    fn test_start_angle_round_trip() {
        // quarter circle around the North pole at 60N
        let centre = Point3d::from_lat_lon(90.0, 0.0);
        let start = Point3d::from_lat_lon(60.0, 0.0);
        let arc = Arc3d::new(&centre, &start);

        for angle in [-1.0_f64, -0.5, 0.25, 1.0] {
            let point = arc.angle_position(angle);
            assert!((arc.start_angle(&point) - angle).abs() < 1.0e-9);
            assert!((distance_radians(&centre, &point) - arc.length()).abs() < 1.0e-12);
        }
    }

    #[test]
    fn test_calculate_turn_angles() {
        let points = calculate_points(&[0.0, 0.0, 1.0], &[-1.0, 0.0, 1.0]);
        let arcs = calculate_arcs(&points);
        let angles = calculate_turn_angles(&arcs);
        assert_eq!(angles.len(), 3);
        assert_eq!(angles[0], 0.0);
        assert!(angles[1] < 0.0);
        assert_eq!(angles[2], 0.0);
    }
}
