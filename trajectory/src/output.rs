//! CSV output of positions, error counts and quality metrics.
//!
//! Times are written as ISO 8601 with microseconds and a trailing `Z`;
//! distances are Nautical Miles and altitudes feet.
//!

use std::io::Write;

use retrace_common::format_iso8601_us;

use crate::analysis::TrajectoryMetrics;
use crate::cleaning::PositionErrorCounts;
use crate::error::AnalysisError;
use crate::interpolation::InterpolatedPosition;

/// The fields of a positions record.
pub const POSITION_FIELDS: [&str; 9] = [
    "FLIGHT_ID",
    "DISTANCE",
    "TIME",
    "LAT",
    "LON",
    "ALT",
    "SPEED_GND",
    "TRACK_GND",
    "VERT_SPEED",
];

/// The fields of a position errors record.
pub const POSITION_ERROR_FIELDS: [&str; 6] = [
    "FLIGHT_ID",
    "TOTAL",
    "DUPLICATES",
    "ADDRESSES",
    "DISTANCE",
    "ALTITUDE",
];

/// The fields of a position metrics record.
pub const POSITION_METRICS_FIELDS: [&str; 15] = [
    "FLIGHT_ID",
    "PROFILE_TYPE",
    "AV_PERIOD",
    "CLIMB_PERIOD",
    "CRUISE_PERIOD",
    "DESCENT_PERIOD",
    "IS_UNORDERED",
    "TIME_SD",
    "TIME_MAX",
    "TIME_MAX_INDEX",
    "XT_SD",
    "XT_MAX",
    "XT_MAX_INDEX",
    "ALT_SD",
    "ALT_MAX",
];

/// Write interpolated positions as CSV.
///
pub fn write_positions<W: Write>(
    writer: W,
    positions: &[InterpolatedPosition],
) -> Result<(), AnalysisError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(POSITION_FIELDS)?;
    for position in positions {
        csv_writer.write_record(&[
            position.flight_id.clone(),
            format!("{:.6}", position.distance),
            format_iso8601_us(position.time),
            format!("{:.6}", position.lat),
            format!("{:.6}", position.lon),
            format!("{:.1}", position.alt),
            format!("{:.1}", position.speed_gnd),
            format!("{:.1}", position.track_gnd),
            format!("{:.1}", position.vert_speed),
        ])?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Write per flight position error counts as CSV.
///
pub fn write_position_errors<'a, W, I>(writer: W, errors: I) -> Result<(), AnalysisError>
where
    W: Write,
    I: IntoIterator<Item = (&'a str, &'a PositionErrorCounts)>,
{
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(POSITION_ERROR_FIELDS)?;
    for (flight_id, counts) in errors {
        csv_writer.write_record(&[
            flight_id.to_owned(),
            counts.total.to_string(),
            counts.duplicate_positions.to_string(),
            counts.invalid_addresses.to_string(),
            counts.distance_errors.to_string(),
            counts.altitude_errors.to_string(),
        ])?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Write per flight trajectory quality metrics as CSV.
///
pub fn write_position_metrics<W: Write>(
    writer: W,
    metrics: &[TrajectoryMetrics],
) -> Result<(), AnalysisError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(POSITION_METRICS_FIELDS)?;
    for row in metrics {
        csv_writer.write_record(&[
            row.flight_id.clone(),
            row.profile_type.to_string(),
            format!("{:.6}", row.average_period),
            format!("{:.6}", row.climb_period),
            format!("{:.6}", row.cruise_period),
            format!("{:.6}", row.descent_period),
            (row.is_unordered as i32).to_string(),
            format!("{:.6}", row.time_sd),
            format!("{:.6}", row.max_time_diff),
            row.max_time_index.to_string(),
            format!("{:.6}", row.xte_sd),
            format!("{:.6}", row.max_xte),
            row.max_xte_index.to_string(),
            format!("{:.6}", row.alt_sd),
            format!("{:.6}", row.max_alt),
        ])?;
    }
    csv_writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use eyre::Result;

    use retrace_common::parse_iso8601;

    #[test]
    fn test_write_positions() -> Result<()> {
        let positions = vec![InterpolatedPosition {
            flight_id: "259599".into(),
            distance: 12.345678,
            time: parse_iso8601("2017-08-01T08:47:31.000250Z")?,
            lat: 49.0097,
            lon: 2.5479,
            alt: 12000.0,
            speed_gnd: 420.0,
            track_gnd: 182.5,
            vert_speed: -800.0,
        }];

        let mut buffer = Vec::new();
        write_positions(&mut buffer, &positions)?;
        let text = String::from_utf8(buffer)?;

        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("FLIGHT_ID,DISTANCE,TIME,LAT,LON,ALT,SPEED_GND,TRACK_GND,VERT_SPEED")
        );
        assert_eq!(
            lines.next(),
            Some(
                "259599,12.345678,2017-08-01T08:47:31.000250Z,49.009700,2.547900,12000.0,420.0,182.5,-800.0"
            )
        );
        Ok(())
    }

    #[test]
    fn test_write_position_errors() -> Result<()> {
        let counts = PositionErrorCounts {
            total: 2,
            duplicate_positions: 1,
            invalid_addresses: 0,
            distance_errors: 1,
            altitude_errors: 0,
        };

        let mut buffer = Vec::new();
        write_position_errors(&mut buffer, [("259599", &counts)])?;
        let text = String::from_utf8(buffer)?;

        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("FLIGHT_ID,TOTAL,DUPLICATES,ADDRESSES,DISTANCE,ALTITUDE")
        );
        assert_eq!(lines.next(), Some("259599,2,1,0,1,0"));
        Ok(())
    }
}
