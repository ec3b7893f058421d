//! CSV output of intersection events.
//!
//! Times are ISO 8601 with microseconds and a trailing `Z`; distances
//! are Nautical Miles and altitudes feet.
//!

use std::io::Write;

use retrace_common::format_iso8601_us;

use crate::cylinders::AirportIntersection;
use crate::error::IntersectionError;
use crate::sectors::SectorIntersection;

/// The fields of an airspace intersection record.
pub const AIRSPACE_INTERSECTION_FIELDS: [&str; 8] = [
    "FLIGHT_ID",
    "SECTOR_ID",
    "IS_EXIT",
    "LAT",
    "LON",
    "ALT",
    "TIME",
    "DISTANCE",
];

/// The fields of an airport intersection record.
pub const AIRPORT_INTERSECTION_FIELDS: [&str; 9] = [
    "FLIGHT_ID",
    "AIRPORT_ID",
    "RADIUS",
    "IS_DESTINATION",
    "LAT",
    "LON",
    "ALT",
    "TIME",
    "DISTANCE",
];

/// Write airspace intersection events as CSV.
///
pub fn write_sector_intersections<W: Write>(
    writer: W,
    events: &[SectorIntersection],
) -> Result<(), IntersectionError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(AIRSPACE_INTERSECTION_FIELDS)?;
    for event in events {
        csv_writer.write_record(&[
            event.flight_id.clone(),
            event.sector_id.clone(),
            event.is_exit.to_string(),
            format!("{:.6}", event.lat),
            format!("{:.6}", event.lon),
            format!("{:.1}", event.alt),
            format_iso8601_us(event.time),
            format!("{:.6}", event.distance),
        ])?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Write airport intersection events as CSV.
///
pub fn write_airport_intersections<W: Write>(
    writer: W,
    events: &[AirportIntersection],
) -> Result<(), IntersectionError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(AIRPORT_INTERSECTION_FIELDS)?;
    for event in events {
        csv_writer.write_record(&[
            event.flight_id.clone(),
            event.airport_id.clone(),
            format!("{:.6}", event.radius),
            event.is_destination.to_string(),
            format!("{:.6}", event.lat),
            format!("{:.6}", event.lon),
            format!("{:.1}", event.alt),
            format_iso8601_us(event.time),
            format!("{:.6}", event.distance),
        ])?;
    }
    csv_writer.flush()?;
    Ok(())
}
