//! Surface points as unit vectors in an Earth Centred Earth Fixed frame.
//!

use std::ops::{Add, Mul, Neg, Sub};

use serde::{Deserialize, Serialize};

/// A point on (or a vector relative to) the unit sphere.
///
/// Surface positions are unit vectors; intermediate cross products and
/// differences are ordinary vectors and are normalised where a surface
/// point is required.
///
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct Point3d {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3d {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Point3d { x, y, z }
    }

    /// The unit vector of a (latitude, longitude) pair in [degrees].
    ///
    pub fn from_lat_lon(lat: f64, lon: f64) -> Self {
        let (sin_lat, cos_lat) = lat.to_radians().sin_cos();
        let (sin_lon, cos_lon) = lon.to_radians().sin_cos();
        Point3d {
            x: cos_lat * cos_lon,
            y: cos_lat * sin_lon,
            z: sin_lat,
        }
    }

    /// The latitude of the point in [degrees].
    ///
    pub fn latitude(&self) -> f64 {
        self.z.clamp(-1.0, 1.0).asin().to_degrees()
    }

    /// The longitude of the point in [degrees].
    ///
    pub fn longitude(&self) -> f64 {
        self.y.atan2(self.x).to_degrees()
    }

    pub fn dot(&self, other: &Point3d) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn cross(&self, other: &Point3d) -> Point3d {
        Point3d {
            x: self.y * other.z - self.z * other.y,
            y: self.z * other.x - self.x * other.z,
            z: self.x * other.y - self.y * other.x,
        }
    }

    pub fn norm(&self) -> f64 {
        self.dot(self).sqrt()
    }

    /// The unit vector in the direction of the point.
    ///
    /// The zero vector is returned unchanged.
    ///
    pub fn normalize(&self) -> Point3d {
        let norm = self.norm();
        if norm > 0.0 {
            *self * (1.0 / norm)
        } else {
            *self
        }
    }
}

impl Add for Point3d {
    type Output = Point3d;

    fn add(self, other: Point3d) -> Point3d {
        Point3d::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }
}

impl Sub for Point3d {
    type Output = Point3d;

    fn sub(self, other: Point3d) -> Point3d {
        Point3d::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }
}

impl Mul<f64> for Point3d {
    type Output = Point3d;

    fn mul(self, factor: f64) -> Point3d {
        Point3d::new(self.x * factor, self.y * factor, self.z * factor)
    }
}

impl Neg for Point3d {
    type Output = Point3d;

    fn neg(self) -> Point3d {
        Point3d::new(-self.x, -self.y, -self.z)
    }
}

/// The great circle distance between a pair of points in [radians].
///
pub fn distance_radians(a: &Point3d, b: &Point3d) -> f64 {
    a.cross(b).norm().atan2(a.dot(b))
}

/// Convert (latitude, longitude) arrays in [degrees] into points.
///
pub fn calculate_points(lats: &[f64], lons: &[f64]) -> Vec<Point3d> {
    lats.iter()
        .zip(lons.iter())
        .map(|(lat, lon)| Point3d::from_lat_lon(*lat, *lon))
        .collect()
}

/// The latitudes of points in [degrees].
///
pub fn calculate_latitudes(points: &[Point3d]) -> Vec<f64> {
    points.iter().map(Point3d::latitude).collect()
}

/// The longitudes of points in [degrees].
///
pub fn calculate_longitudes(points: &[Point3d]) -> Vec<f64> {
    points.iter().map(Point3d::longitude).collect()
}

/// The great circle distances of points from a point in [radians].
///
pub fn calculate_distances(points: &[Point3d], point: &Point3d) -> Vec<f64> {
    points.iter().map(|p| distance_radians(p, point)).collect()
}

/// The great circle distances between adjacent points in [radians].
///
/// The first value is always zero.
///
pub fn calculate_leg_lengths(points: &[Point3d]) -> Vec<f64> {
    let mut lengths = Vec::with_capacity(points.len());
    if !points.is_empty() {
        lengths.push(0.0);
        for pair in points.windows(2) {
            lengths.push(distance_radians(&pair[0], &pair[1]));
        }
    }
    lengths
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;

    #[rstest]
    #[case(0.0, 0.0)]
    #[case(45.0, 45.0)]
    #[case(-30.0, 120.0)]
    #[case(51.47, -0.4543)]
    fn test_lat_lon_round_trip(#[case] lat: f64, #[case] lon: f64) {
        let point = Point3d::from_lat_lon(lat, lon);
        assert!((point.norm() - 1.0).abs() < 1.0e-15);
        assert!((point.latitude() - lat).abs() < 1.0e-12);
        assert!((point.longitude() - lon).abs() < 1.0e-12);
    }

    #[test]
    fn test_distance_radians() {
        let equator = Point3d::from_lat_lon(0.0, 0.0);
        let pole = Point3d::from_lat_lon(90.0, 0.0);
        assert!(
            (distance_radians(&equator, &pole) - std::f64::consts::FRAC_PI_2).abs() < 1.0e-15
        );

        // one minute of arc along the equator is one Nautical Mile
        let one_minute = Point3d::from_lat_lon(0.0, 1.0 / 60.0);
        assert!(
            (distance_radians(&equator, &one_minute) - retrace_common::NM).abs() < 1.0e-12
        );
    }

    #[test]
    fn test_calculate_leg_lengths() {
        let points = calculate_points(&[0.0, 0.0, 0.0], &[0.0, 1.0, 3.0]);
        let lengths = calculate_leg_lengths(&points);
        assert_eq!(lengths.len(), 3);
        assert_eq!(lengths[0], 0.0);
        assert!((lengths[1] - 1.0_f64.to_radians()).abs() < 1.0e-12);
        assert!((lengths[2] - 2.0_f64.to_radians()).abs() < 1.0e-12);
    }
}
