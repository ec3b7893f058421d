//! Units and conversions used throughout the workspace.
//!
//! Angles are radians internally, distances are Nautical Miles at the
//! interfaces, altitudes are feet and speeds are Knots.
//!

/// One Nautical Mile on the unit sphere, i.e. one minute of arc.
pub const NM: f64 = std::f64::consts::PI / 10_800.0;

/// One degree of a great circle in Nautical Miles.
pub const ONE_DEG_NM: f64 = 60.0;

/// The shortest great circle arc considered non degenerate [radians].
pub const MIN_LENGTH: f64 = 1.0e-9;

/// Convert a distance in radians on the unit sphere to Nautical Miles.
///
pub fn rad2nm(d: f64) -> f64 {
    ONE_DEG_NM * d.to_degrees()
}

/// Convert a distance in Nautical Miles to radians on the unit sphere.
///
pub fn nm2rad(d: f64) -> f64 {
    (d / ONE_DEG_NM).to_radians()
}

/// Calculate a speed in Knots from a distance and a duration.
///
/// Durations at or below zero are clamped to `min_time` to keep the
/// speed finite.
///
pub fn calculate_speed(distance_nm: f64, time_s: f64, min_time: f64) -> f64 {
    let time_s = if time_s > 0.0 { time_s } else { min_time };
    3600.0 * distance_nm / time_s
}

/// Calculate the slowest plausible speed in Knots between two positions,
/// given the surveillance distance accuracy and time stamp precision.
///
pub fn calculate_min_speed(
    distance_nm: f64,
    time_s: f64,
    distance_accuracy: f64,
    time_precision: f64,
) -> f64 {
    calculate_speed(distance_nm - distance_accuracy, time_s + time_precision, 0.5)
}

/// Calculate a vertical speed in feet per minute from an altitude change
/// and a duration.
///
pub fn calculate_vertical_speed(altitude_ft: f64, time_s: f64, min_time: f64) -> f64 {
    let time_s = if time_s > 0.0 { time_s } else { min_time };
    60.0 * altitude_ft / time_s
}

/// Convert an angle in radians to a ground track angle in degrees,
/// where `0.0 <= angle < 360.0`.
///
pub fn convert_angle_to_track_angle(angle: f64) -> f64 {
    let angle = if angle < 0.0 {
        angle + 2.0 * std::f64::consts::PI
    } else {
        angle
    };
    angle.to_degrees()
}
