//! An airspace volume: a named vertical extent over a horizontal
//! footprint held by the geometry oracle.
//!

use serde::{Deserialize, Serialize};

/// An airspace volume with a half open vertical extent
/// `[bottom_altitude, top_altitude)`.
///
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct AirspaceVolume {
    /// The display name of the volume
    pub name: String,
    /// The bottom altitude [feet]
    pub bottom_altitude: f64,
    /// The top altitude [feet]
    pub top_altitude: f64,
}

impl AirspaceVolume {
    pub fn new(name: &str, bottom_altitude: f64, top_altitude: f64) -> Self {
        AirspaceVolume {
            name: name.into(),
            bottom_altitude,
            top_altitude,
        }
    }

    /// Whether the altitude is within the range from bottom to top.
    ///
    pub fn is_inside(&self, altitude: f64) -> bool {
        (self.bottom_altitude <= altitude) && (altitude < self.top_altitude)
    }

    /// Whether the altitude range intersects the range from bottom to top.
    ///
    pub fn vertical_intersection(&self, min_alt: f64, max_alt: f64) -> bool {
        (self.bottom_altitude <= max_alt) && (min_alt < self.top_altitude)
    }

    /// Whether the altitude range spans the bottom altitude.
    ///
    pub fn bottom_intersection(&self, min_alt: f64, max_alt: f64) -> bool {
        (min_alt < self.bottom_altitude) && (self.bottom_altitude < max_alt)
    }

    /// Whether the altitude range spans the top altitude.
    ///
    pub fn top_intersection(&self, min_alt: f64, max_alt: f64) -> bool {
        (min_alt < self.top_altitude) && (self.top_altitude < max_alt)
    }
}
