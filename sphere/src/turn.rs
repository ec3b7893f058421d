//! Turning arcs between great circle legs.
//!

use crate::arc::Arc3d;
use crate::point::{distance_radians, Point3d};

/// The minimum turn angle to model, 1 degree [radians].
pub const MIN_TURN_ANGLE: f64 = std::f64::consts::PI / 180.0;

/// The maximum turn angle to model, 150 degrees [radians].
pub const MAX_TURN_ANGLE: f64 = 150.0 * std::f64::consts::PI / 180.0;

/// Calculate the radius of a turn from its angle and initiation distance.
///
/// Note: `turn_angle` must be positive and greater than `MIN_TURN_ANGLE`.
///
pub fn calculate_radius(turn_angle: f64, initiation_distance: f64) -> f64 {
    initiation_distance / (0.5 * turn_angle).tan()
}

/// Calculate the length of a turn arc from its angle and initiation
/// distance, or the straight distance through the waypoint when the angle
/// is too small to model [radians].
///
pub fn calculate_arc_length(angle: f64, initiation_distance: f64) -> f64 {
    let turn_angle = angle.abs();
    if turn_angle > MIN_TURN_ANGLE {
        turn_angle * calculate_radius(turn_angle, initiation_distance)
    } else {
        2.0 * initiation_distance
    }
}

/// The arc of a turn between two great circle legs.
///
/// Holds the start, centre and finish points of the arc together with its
/// radius [radians] and signed angle [radians], positive for a turn to
/// the right.
///
/// A turn is only valid when its angle lies in
/// `(MIN_TURN_ANGLE, MAX_TURN_ANGLE]`; an invalid turn has zero radius
/// and angle with all three points at the waypoint.
///
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SphereTurnArc {
    start: Point3d,
    centre: Point3d,
    finish: Point3d,
    angle: f64,
    radius: f64,
}

impl SphereTurnArc {
    /// Create a turn arc from the inbound and outbound legs and the turn
    /// initiation distance [radians].
    ///
    pub fn new(inbound: &Arc3d, outbound: &Arc3d, distance: f64) -> Self {
        let waypoint = outbound.a();
        let mut arc = SphereTurnArc {
            start: waypoint,
            centre: waypoint,
            finish: waypoint,
            angle: 0.0,
            radius: 0.0,
        };

        let angle = inbound.turn_angle(&outbound.b());
        let turn_angle = angle.abs();
        if (MIN_TURN_ANGLE < turn_angle) && (turn_angle <= MAX_TURN_ANGLE) {
            arc.angle = angle;
            arc.radius = calculate_radius(turn_angle, distance);

            arc.start = inbound.position(inbound.length() - distance);
            let r = if angle > 0.0 { -arc.radius } else { arc.radius };
            arc.centre = inbound.perp_position(&arc.start, r);
            arc.finish = outbound.position(distance);
        }

        arc
    }

    /// Whether the turn is valid, i.e. has a non zero radius.
    pub fn is_valid(&self) -> bool {
        self.radius > 0.0
    }

    /// The start point of the turn arc.
    pub fn start(&self) -> Point3d {
        self.start
    }

    /// The centre point of the turn arc.
    pub fn centre(&self) -> Point3d {
        self.centre
    }

    /// The finish point of the turn arc.
    pub fn finish(&self) -> Point3d {
        self.finish
    }

    /// The signed turn angle [radians].
    pub fn angle(&self) -> f64 {
        self.angle
    }

    /// The turn radius [radians].
    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// The length of the turn arc [radians].
    pub fn length(&self) -> f64 {
        self.radius * self.angle.abs()
    }

    /// The distance of a point from the centre of the turn [radians].
    ///
    pub fn radial_distance(&self, point: &Point3d) -> f64 {
        distance_radians(&self.centre, point)
    }

    /// The distance of a point outside (+ve) or inside (-ve) the turn
    /// [radians].
    ///
    pub fn cross_track_distance(&self, point: &Point3d) -> f64 {
        self.radial_distance(point) - self.radius
    }

    /// The angle of a point from the start of the turn arc [radians].
    ///
    pub fn point_angle(&self, point: &Point3d) -> f64 {
        let start_arc = Arc3d::new(&self.centre, &self.start);
        start_arc.start_angle(point)
    }

    /// The signed distance of a point along the turn from the start of
    /// the arc, +ve in the direction of the turn [radians].
    ///
    pub fn along_track_distance(&self, point: &Point3d) -> f64 {
        let distance = self.radius * self.point_angle(point);
        if self.angle < 0.0 {
            -distance
        } else {
            distance
        }
    }

    /// The position of the point at `angle` from the start along the turn.
    ///
    pub fn position(&self, angle: f64) -> Point3d {
        let start_arc = Arc3d::new(&self.centre, &self.start);
        start_arc.angle_position(angle)
    }
}
