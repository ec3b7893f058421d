//! Time fields and helpers for trajectory records.
//!
//! All user facing times are ISO 8601 with microseconds and a trailing `Z`;
//! internally a trajectory carries an origin instant plus elapsed seconds.
//!

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use eyre::Result;

/// The ISO 8601 format of a date time string in microseconds.
pub const ISO8601_DATETIME_US_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";

/// Format an instant as an ISO 8601 string with microseconds and `Z`.
///
pub fn format_iso8601_us(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse an ISO 8601 date time string into an instant.
///
pub fn parse_iso8601(s: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(s)?.with_timezone(&Utc))
}

/// Calculate the difference between a pair of instants in seconds.
///
pub fn calculate_delta_time(time0: DateTime<Utc>, time1: DateTime<Utc>) -> f64 {
    (time1 - time0).num_microseconds().map_or_else(
        || (time1 - time0).num_milliseconds() as f64 / 1.0e3,
        |us| us as f64 / 1.0e6,
    )
}

/// Calculate the elapsed times in seconds of instants from a reference.
///
pub fn calculate_elapsed_times(times: &[DateTime<Utc>], origin: DateTime<Utc>) -> Vec<f64> {
    times.iter().map(|t| calculate_delta_time(origin, *t)).collect()
}

/// Calculate the instant at `elapsed` seconds from an origin, to
/// microsecond resolution.
///
pub fn calculate_date_time(origin: DateTime<Utc>, elapsed: f64) -> DateTime<Utc> {
    origin + Duration::microseconds((elapsed * 1.0e6).round() as i64)
}

/// Calculate durations in seconds between adjacent instants.
///
/// The first value is always zero.
///
pub fn calculate_leg_durations(times: &[DateTime<Utc>]) -> Vec<f64> {
    let mut durations = Vec::with_capacity(times.len());
    if !times.is_empty() {
        durations.push(0.0);
        for pair in times.windows(2) {
            durations.push(calculate_delta_time(pair[0], pair[1]));
        }
    }
    durations
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_parse_round_trip() -> Result<()> {
        let t = parse_iso8601("2017-08-01T08:47:31.000250Z")?;
        assert_eq!(format_iso8601_us(t), "2017-08-01T08:47:31.000250Z");
        Ok(())
    }

    #[test]
    fn test_calculate_delta_time() -> Result<()> {
        let t0 = parse_iso8601("2017-08-01T08:47:31.000000Z")?;
        let t1 = parse_iso8601("2017-08-01T08:52:23.500000Z")?;
        assert!((calculate_delta_time(t0, t1) - 292.5).abs() < 1.0e-9);
        assert!((calculate_delta_time(t1, t0) + 292.5).abs() < 1.0e-9);
        Ok(())
    }

    #[test]
    fn test_calculate_date_time_microseconds() -> Result<()> {
        let t0 = parse_iso8601("2017-08-01T23:59:45.000000Z")?;
        // crosses midnight without any discontinuity
        let t1 = calculate_date_time(t0, 45.000001);
        assert_eq!(format_iso8601_us(t1), "2017-08-02T00:00:30.000001Z");
        Ok(())
    }

    #[test]
    fn test_calculate_leg_durations() -> Result<()> {
        let times = vec![
            parse_iso8601("2017-08-01T08:47:31Z")?,
            parse_iso8601("2017-08-01T08:52:23Z")?,
            parse_iso8601("2017-08-01T08:59:29Z")?,
        ];
        let durations = calculate_leg_durations(&times);
        assert_eq!(durations, vec![0.0, 292.0, 426.0]);
        Ok(())
    }
}
