//! The geometry oracle interface.
//!
//! The oracle owns the horizontal footprints of the airspace volumes; it
//! answers 2D intersection queries for a polyline and altitude band and
//! resolves volume ids and airport codes. Production implementations
//! wrap a geospatial database; the fixture oracle serves tests with
//! rectangular footprints.
//!

use std::collections::BTreeMap;

use retrace_common::AirportTable;

use crate::error::IntersectionError;

/// Unordered 2D intersections of a polyline with volume footprints.
///
/// The arrays are index aligned: one (lat, lon, volume id) triple per
/// crossing.
///
#[derive(Clone, Debug, Default)]
pub struct Intersections2d {
    /// Intersection latitudes [degrees]
    pub lats: Vec<f64>,
    /// Intersection longitudes [degrees]
    pub lons: Vec<f64>,
    /// The ids of the intersected volumes
    pub volume_ids: Vec<String>,
}

impl Intersections2d {
    pub fn is_empty(&self) -> bool {
        self.volume_ids.is_empty()
    }

    pub fn len(&self) -> usize {
        self.volume_ids.len()
    }
}

/// The geometry oracle consumed by the intersection resolver.
///
/// This is the only component that may block (on a database round trip);
/// implementations should pool clients and must not serialise across
/// unrelated flights.
///
pub trait GeometryOracle {
    /// 2D intersections of a polyline with the airspace sectors.
    fn find_sector_intersections_2d(
        &self,
        flight_id: &str,
        lats: &[f64],
        lons: &[f64],
        min_alt: f64,
        max_alt: f64,
    ) -> Result<Intersections2d, IntersectionError>;

    /// 2D intersections of a polyline with the user defined volumes.
    fn find_user_volume_intersections_2d(
        &self,
        flight_id: &str,
        lats: &[f64],
        lons: &[f64],
        min_alt: f64,
        max_alt: f64,
    ) -> Result<Intersections2d, IntersectionError>;

    /// The (bottom, top) altitudes of a sector in [feet].
    fn sector_vertical_extent(&self, volume_id: &str) -> Result<(f64, f64), IntersectionError>;

    /// The display name of a sector.
    fn sector_display_name(&self, volume_id: &str) -> Result<String, IntersectionError>;

    /// The (bottom, top) altitudes of a user volume in [feet].
    fn user_volume_vertical_extent(&self, volume_id: &str)
        -> Result<(f64, f64), IntersectionError>;

    /// The display name of a user volume.
    fn user_volume_display_name(&self, volume_id: &str) -> Result<String, IntersectionError>;

    /// The (latitude, longitude) of an airport in [degrees].
    fn airport_location(&self, icao: &str) -> Result<(f64, f64), IntersectionError>;
}

/// A volume with a rectangular horizontal footprint, for the fixture
/// oracle.
///
#[derive(Clone, Debug)]
pub struct RectangleVolume {
    /// The volume id
    pub id: String,
    /// The display name
    pub name: String,
    /// The bottom altitude [feet]
    pub bottom_altitude: f64,
    /// The top altitude [feet]
    pub top_altitude: f64,
    /// The latitude extent [degrees]
    pub min_lat: f64,
    pub max_lat: f64,
    /// The longitude extent [degrees]
    pub min_lon: f64,
    pub max_lon: f64,
}

/// An in-memory oracle with rectangular footprints, used by tests.
///
#[derive(Clone, Debug, Default)]
pub struct FixtureOracle {
    sectors: BTreeMap<String, RectangleVolume>,
    user_volumes: BTreeMap<String, RectangleVolume>,
    airports: AirportTable,
}

impl FixtureOracle {
    pub fn new(
        sectors: Vec<RectangleVolume>,
        user_volumes: Vec<RectangleVolume>,
        airports: AirportTable,
    ) -> Self {
        FixtureOracle {
            sectors: sectors.into_iter().map(|v| (v.id.clone(), v)).collect(),
            user_volumes: user_volumes.into_iter().map(|v| (v.id.clone(), v)).collect(),
            airports,
        }
    }

    /// 2D crossings of the polyline with the footprints that overlap the
    /// altitude band.
    ///
    fn find_intersections(
        volumes: &BTreeMap<String, RectangleVolume>,
        lats: &[f64],
        lons: &[f64],
        min_alt: f64,
        max_alt: f64,
    ) -> Intersections2d {
        let mut intersections = Intersections2d::default();
        for volume in volumes.values() {
            if (max_alt < volume.bottom_altitude) || (volume.top_altitude <= min_alt) {
                continue;
            }
            for i in 1..lats.len() {
                let segment = ((lons[i - 1], lats[i - 1]), (lons[i], lats[i]));
                for (lon, lat) in rectangle_crossings(volume, segment) {
                    intersections.lats.push(lat);
                    intersections.lons.push(lon);
                    intersections.volume_ids.push(volume.id.clone());
                }
            }
        }
        intersections
    }
}

/// The crossings of a (lon, lat) segment with the rectangle boundary.
///
fn rectangle_crossings(
    volume: &RectangleVolume,
    ((x0, y0), (x1, y1)): ((f64, f64), (f64, f64)),
) -> Vec<(f64, f64)> {
    let mut crossings = vec![];

    // vertical edges at min_lon and max_lon
    for x_edge in [volume.min_lon, volume.max_lon] {
        if ((x0 < x_edge) != (x1 < x_edge)) && (x1 != x0) {
            let t = (x_edge - x0) / (x1 - x0);
            let y = y0 + t * (y1 - y0);
            if (volume.min_lat..=volume.max_lat).contains(&y) {
                crossings.push((x_edge, y));
            }
        }
    }

    // horizontal edges at min_lat and max_lat
    for y_edge in [volume.min_lat, volume.max_lat] {
        if ((y0 < y_edge) != (y1 < y_edge)) && (y1 != y0) {
            let t = (y_edge - y0) / (y1 - y0);
            let x = x0 + t * (x1 - x0);
            if (volume.min_lon..=volume.max_lon).contains(&x) {
                crossings.push((x, y_edge));
            }
        }
    }

    crossings
}

fn vertical_extent(
    volumes: &BTreeMap<String, RectangleVolume>,
    volume_id: &str,
) -> Result<(f64, f64), IntersectionError> {
    volumes
        .get(volume_id)
        .map(|v| (v.bottom_altitude, v.top_altitude))
        .ok_or_else(|| IntersectionError::NotFound(volume_id.into()))
}

fn display_name(
    volumes: &BTreeMap<String, RectangleVolume>,
    volume_id: &str,
) -> Result<String, IntersectionError> {
    volumes
        .get(volume_id)
        .map(|v| v.name.clone())
        .ok_or_else(|| IntersectionError::NotFound(volume_id.into()))
}

impl GeometryOracle for FixtureOracle {
    fn find_sector_intersections_2d(
        &self,
        _flight_id: &str,
        lats: &[f64],
        lons: &[f64],
        min_alt: f64,
        max_alt: f64,
    ) -> Result<Intersections2d, IntersectionError> {
        Ok(Self::find_intersections(&self.sectors, lats, lons, min_alt, max_alt))
    }

    fn find_user_volume_intersections_2d(
        &self,
        _flight_id: &str,
        lats: &[f64],
        lons: &[f64],
        min_alt: f64,
        max_alt: f64,
    ) -> Result<Intersections2d, IntersectionError> {
        Ok(Self::find_intersections(&self.user_volumes, lats, lons, min_alt, max_alt))
    }

    fn sector_vertical_extent(&self, volume_id: &str) -> Result<(f64, f64), IntersectionError> {
        vertical_extent(&self.sectors, volume_id)
    }

    fn sector_display_name(&self, volume_id: &str) -> Result<String, IntersectionError> {
        display_name(&self.sectors, volume_id)
    }

    fn user_volume_vertical_extent(
        &self,
        volume_id: &str,
    ) -> Result<(f64, f64), IntersectionError> {
        vertical_extent(&self.user_volumes, volume_id)
    }

    fn user_volume_display_name(&self, volume_id: &str) -> Result<String, IntersectionError> {
        display_name(&self.user_volumes, volume_id)
    }

    fn airport_location(&self, icao: &str) -> Result<(f64, f64), IntersectionError> {
        self.airports
            .location(icao)
            .ok_or_else(|| IntersectionError::NotFound(icao.into()))
    }
}
