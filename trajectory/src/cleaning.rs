//! Cleaning of raw trajectory position reports.
//!
//! The cleaner searches a time ordered sequence of reports for:
//! - duplicate positions carrying an aircraft address,
//! - positions with a different aircraft address to the flight,
//! - horizontal jumps that would require flying over the maximum speed,
//! - climb/descend reversals that disagree with the SSR code changes.
//!

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::trace;

use retrace_common::{calculate_elapsed_times, calculate_min_speed};
use retrace_sphere::{distance_radians, Point3d};

/// The maximum speed between positions [Knots].
pub const DEFAULT_MAX_SPEED: f64 = 750.0;

/// Maximum distance between positions at the same time [Nautical Miles].
pub const DEFAULT_DISTANCE_ACCURACY: f64 = 0.25;

/// The precision of the time stamps [Seconds].
pub const DEFAULT_TIME_PRECISION: f64 = 1.0;

/// A raw surveillance position report for one flight.
///
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct PositionReport {
    /// The report time
    pub time: DateTime<Utc>,
    /// Latitude [degrees]
    pub lat: f64,
    /// Longitude [degrees]
    pub lon: f64,
    /// Altitude [feet]
    pub alt: f64,
    /// The 24 bit aircraft address, empty if not reported
    pub aircraft_address: String,
    /// The SSR code, empty if not reported
    pub ssr_code: String,
}

/// Position cleaning parameters.
///
#[derive(Clone, Debug)]
pub struct CleaningOptions {
    /// The maximum ground speed between positions [Knots].
    pub max_speed: f64,
    /// The maximum distance between positions at the same time [NM].
    pub distance_accuracy: f64,
    /// The precision of time measurement [Seconds].
    pub time_precision: f64,
    /// Whether to search for invalid aircraft addresses.
    pub find_invalid_addresses: bool,
}

impl Default for CleaningOptions {
    fn default() -> Self {
        CleaningOptions {
            max_speed: DEFAULT_MAX_SPEED,
            distance_accuracy: DEFAULT_DISTANCE_ACCURACY,
            time_precision: DEFAULT_TIME_PRECISION,
            find_invalid_addresses: true,
        }
    }
}

/// Error counts from a cleaning pass.
///
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
pub struct PositionErrorCounts {
    /// The total number of invalid positions
    pub total: usize,
    /// The number of duplicate positions
    pub duplicate_positions: usize,
    /// The number of positions with an invalid aircraft address
    pub invalid_addresses: usize,
    /// The number of positions failing the speed check
    pub distance_errors: usize,
    /// The number of positions with inconsistent vertical behaviour
    pub altitude_errors: usize,
}

/// The duplicate key of a report, with exact float semantics.
///
fn duplicate_key(report: &PositionReport) -> (i64, u64, u64, u64, String, String) {
    (
        report.time.timestamp_micros(),
        report.lat.to_bits(),
        report.lon.to_bits(),
        report.alt.to_bits(),
        report.aircraft_address.clone(),
        report.ssr_code.clone(),
    )
}

/// The sign of the altitude change: 1 climbing, -1 descending, 0 level.
///
fn attitude_sign(delta: f64) -> i8 {
    if delta > 0.0 {
        1
    } else if delta < 0.0 {
        -1
    } else {
        0
    }
}

/// Find invalid positions in a time ordered sequence of reports.
///
/// Returns a validity mask (`true` marks an invalid position) and the
/// error counts. The function is pure and never fails on sensible input.
///
#[tracing::instrument(skip(reports, options))]
pub fn find_invalid_positions(
    reports: &[PositionReport],
    options: &CleaningOptions,
) -> (Vec<bool>, PositionErrorCounts) {
    let mut invalid = vec![false; reports.len()];
    let mut counts = PositionErrorCounts::default();

    // Duplicate positions with an aircraft address are invalid
    let mut seen = HashSet::new();
    for (i, report) in reports.iter().enumerate() {
        let is_duplicate = !seen.insert(duplicate_key(report));
        if is_duplicate && !report.aircraft_address.is_empty() {
            invalid[i] = true;
            counts.duplicate_positions += 1;
        }
    }

    // Different aircraft addresses to the modal one are invalid
    if options.find_invalid_addresses {
        let mut address_counts: HashMap<&str, usize> = HashMap::new();
        for report in reports {
            if !report.aircraft_address.is_empty() {
                *address_counts.entry(report.aircraft_address.as_str()).or_default() += 1;
            }
        }
        if address_counts.len() > 1 {
            let canonical = address_counts
                .iter()
                .max_by(|a, b| a.1.cmp(b.1).then(b.0.cmp(a.0)))
                .map(|(address, _)| *address)
                .unwrap_or_default()
                .to_owned();
            for (i, report) in reports.iter().enumerate() {
                if !report.aircraft_address.is_empty() && report.aircraft_address != canonical {
                    counts.invalid_addresses += 1;
                    invalid[i] = true;
                }
            }
        }
    }

    // Positions, elapsed times and the kinematic consistency walk
    let points = reports
        .iter()
        .map(|r| Point3d::from_lat_lon(r.lat, r.lon))
        .collect::<Vec<_>>();
    let times = reports.iter().map(|r| r.time).collect::<Vec<_>>();
    let elapsed = if reports.is_empty() {
        vec![]
    } else {
        calculate_elapsed_times(&times, times[0])
    };

    let mut ref_attitude = 0_i8;
    let mut ref_i = 0_usize; // the last known good index
    let mut prev_i = 0_usize; // the previous position index used
    for i in 1..reports.len() {
        // Only consider valid positions
        if !invalid[i] {
            // Speed from the previous known good position
            let distance = retrace_common::rad2nm(distance_radians(&points[i], &points[ref_i]));
            let delta_time = elapsed[i] - elapsed[ref_i];
            let speed = calculate_min_speed(
                distance,
                delta_time,
                options.distance_accuracy,
                options.time_precision,
            );

            let mut is_invalid = false;
            if speed > options.max_speed {
                is_invalid = true;
                counts.distance_errors += 1;
            }

            let attitude = attitude_sign(reports[i].alt - reports[prev_i].alt);

            // if the attitude has changed
            if ref_attitude != attitude {
                // and the SSR code hasn't
                if reports[i].ssr_code == reports[ref_i].ssr_code {
                    ref_attitude = attitude;
                } else if reports[i].ssr_code != reports[prev_i].ssr_code {
                    // but the SSR code is definitely different
                    is_invalid = true;
                    counts.altitude_errors += 1;
                }
            }

            if is_invalid {
                invalid[i] = true;
            } else {
                ref_i = i;
            }

            prev_i = i;
        }
    }

    counts.total = invalid.iter().filter(|i| **i).count();
    trace!("{} invalid positions of {}", counts.total, reports.len());

    (invalid, counts)
}

#[cfg(test)]
mod tests {
    use super::*;

    use retrace_common::parse_iso8601;

    fn report(
        time: &str,
        lat: f64,
        lon: f64,
        alt: f64,
        address: &str,
        ssr: &str,
    ) -> PositionReport {
        PositionReport {
            time: parse_iso8601(time).unwrap(),
            lat,
            lon,
            alt,
            aircraft_address: address.into(),
            ssr_code: ssr.into(),
        }
    }

    #[test]
    fn test_duplicate_rejection() {
        // two identical reports with a non empty address
        let reports = vec![
            report("2017-08-01T08:47:31Z", 45.0, 1.0, 30000.0, "4CA123", "1234"),
            report("2017-08-01T08:47:31Z", 45.0, 1.0, 30000.0, "4CA123", "1234"),
        ];
        let (invalid, counts) = find_invalid_positions(&reports, &CleaningOptions::default());

        assert_eq!(invalid, vec![false, true]);
        assert_eq!(counts.total, 1);
        assert_eq!(counts.duplicate_positions, 1);
        assert_eq!(counts.invalid_addresses, 0);
        assert_eq!(counts.distance_errors, 0);
        assert_eq!(counts.altitude_errors, 0);
    }

    #[test]
    fn test_duplicate_without_address_is_kept() {
        let reports = vec![
            report("2017-08-01T08:47:31Z", 45.0, 1.0, 30000.0, "", "1234"),
            report("2017-08-01T08:47:31Z", 45.0, 1.0, 30000.0, "", "1234"),
        ];
        let (invalid, counts) = find_invalid_positions(&reports, &CleaningOptions::default());
        assert_eq!(invalid, vec![false, false]);
        assert_eq!(counts.total, 0);
    }

    #[test]
    fn test_invalid_address() {
        let reports = vec![
            report("2017-08-01T08:47:31Z", 45.0, 1.0, 30000.0, "4CA123", "1234"),
            report("2017-08-01T08:48:31Z", 45.0, 1.1, 30000.0, "4CA123", "1234"),
            report("2017-08-01T08:49:31Z", 45.0, 1.2, 30000.0, "AB0000", "1234"),
            report("2017-08-01T08:50:31Z", 45.0, 1.3, 30000.0, "4CA123", "1234"),
        ];
        let (invalid, counts) = find_invalid_positions(&reports, &CleaningOptions::default());
        assert_eq!(invalid, vec![false, false, true, false]);
        assert_eq!(counts.invalid_addresses, 1);
        assert_eq!(counts.total, 1);

        // with the address search disabled the position is kept
        let options = CleaningOptions {
            find_invalid_addresses: false,
            ..CleaningOptions::default()
        };
        let (invalid, counts) = find_invalid_positions(&reports, &options);
        assert_eq!(invalid, vec![false, false, false, false]);
        assert_eq!(counts.total, 0);
    }

    #[test]
    fn test_kinematic_check() {
        // the third report jumps a degree of latitude in ten seconds
        let reports = vec![
            report("2017-08-01T08:47:31Z", 45.0, 1.0, 30000.0, "4CA123", "1234"),
            report("2017-08-01T08:48:31Z", 45.0, 1.1, 30000.0, "4CA123", "1234"),
            report("2017-08-01T08:48:41Z", 46.0, 1.1, 30000.0, "4CA123", "1234"),
            report("2017-08-01T08:49:31Z", 45.0, 1.2, 30000.0, "4CA123", "1234"),
        ];
        let (invalid, counts) = find_invalid_positions(&reports, &CleaningOptions::default());
        assert_eq!(invalid, vec![false, false, true, false]);
        assert_eq!(counts.distance_errors, 1);
        assert_eq!(counts.total, 1);
    }

    #[test]
    fn test_altitude_error_with_ssr_change() {
        // a descent report in the middle of a climb with a different SSR
        // code to both its neighbours
        let reports = vec![
            report("2017-08-01T08:47:31Z", 45.0, 1.0, 30000.0, "4CA123", "1234"),
            report("2017-08-01T08:48:31Z", 45.0, 1.1, 31000.0, "4CA123", "1234"),
            report("2017-08-01T08:49:31Z", 45.0, 1.2, 29000.0, "4CA123", "7700"),
            report("2017-08-01T08:50:31Z", 45.0, 1.3, 32000.0, "4CA123", "1234"),
        ];
        let (invalid, counts) = find_invalid_positions(&reports, &CleaningOptions::default());
        assert_eq!(invalid, vec![false, false, true, false]);
        assert_eq!(counts.altitude_errors, 1);
    }

    #[test]
    fn test_attitude_change_with_same_ssr_is_kept() {
        let reports = vec![
            report("2017-08-01T08:47:31Z", 45.0, 1.0, 30000.0, "4CA123", "1234"),
            report("2017-08-01T08:48:31Z", 45.0, 1.1, 31000.0, "4CA123", "1234"),
            report("2017-08-01T08:49:31Z", 45.0, 1.2, 30500.0, "4CA123", "1234"),
        ];
        let (invalid, counts) = find_invalid_positions(&reports, &CleaningOptions::default());
        assert_eq!(invalid, vec![false, false, false]);
        assert_eq!(counts.total, 0);
    }

    #[test]
    fn test_cleaner_idempotence() {
        let reports = vec![
            report("2017-08-01T08:47:31Z", 45.0, 1.0, 30000.0, "4CA123", "1234"),
            report("2017-08-01T08:47:31Z", 45.0, 1.0, 30000.0, "4CA123", "1234"),
            report("2017-08-01T08:48:31Z", 45.0, 1.1, 30000.0, "4CA123", "1234"),
            report("2017-08-01T08:48:41Z", 46.0, 1.1, 30000.0, "4CA123", "1234"),
            report("2017-08-01T08:49:31Z", 45.0, 1.2, 30000.0, "4CA123", "1234"),
        ];
        let options = CleaningOptions::default();
        let (invalid, _) = find_invalid_positions(&reports, &options);

        let kept = reports
            .iter()
            .zip(invalid.iter())
            .filter(|(_, invalid)| !**invalid)
            .map(|(r, _)| r.clone())
            .collect::<Vec<_>>();

        let (invalid_again, counts) = find_invalid_positions(&kept, &options);
        assert!(invalid_again.iter().all(|i| !i));
        assert_eq!(counts, PositionErrorCounts::default());
    }
}
