//! A trajectory time profile.
//!

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use retrace_common::{calculate_value, calculate_value_reference, format_iso8601_us, parse_iso8601};

use crate::error::AnalysisError;
use crate::spline::CubicSpline;

/// Serialize an instant as ISO 8601 with microseconds and `Z`.
mod iso8601_us {
    use super::*;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(t: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&format_iso8601_us(*t))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let text = String::deserialize(d)?;
        parse_iso8601(&text).map_err(de::Error::custom)
    }
}

/// A trajectory time profile: elapsed times at distances along a path.
///
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct TimeProfile {
    /// The origin instant of the trajectory
    #[serde(with = "iso8601_us")]
    pub start_time: DateTime<Utc>,
    /// Path distances [Nautical Miles]
    pub distances: Vec<f64>,
    /// Elapsed times from `start_time` at the distances [Seconds]
    pub elapsed_times: Vec<f64>,
}

impl TimeProfile {
    pub fn new(start_time: DateTime<Utc>, distances: Vec<f64>, elapsed_times: Vec<f64>) -> Self {
        TimeProfile {
            start_time,
            distances,
            elapsed_times,
        }
    }

    /// Interpolate the elapsed times at the given distances with a cubic
    /// spline [Seconds].
    ///
    pub fn interpolate_by_distance(&self, distances: &[f64]) -> Result<Vec<f64>, AnalysisError> {
        let spline = CubicSpline::new(&self.distances, &self.elapsed_times)?;
        Ok(spline.interpolate(distances))
    }

    /// Interpolate the distances at the given elapsed times with a cubic
    /// spline [Nautical Miles].
    ///
    pub fn interpolate_by_elapsed_time(&self, times: &[f64]) -> Result<Vec<f64>, AnalysisError> {
        let spline = CubicSpline::new(&self.elapsed_times, &self.distances)?;
        Ok(spline.interpolate(times))
    }

    /// Calculate the average period between the points between two
    /// distances [Seconds], zero if there are not enough points.
    ///
    pub fn calculate_average_period(&self, start_distance: f64, finish_distance: f64) -> f64 {
        let mut average_period = 0.0;
        if start_distance < finish_distance {
            let (start_index, _) = calculate_value_reference(&self.distances, start_distance);
            let (finish_index, _) = calculate_value_reference(&self.distances, finish_distance);
            let delta_index = finish_index - start_index;
            if delta_index > 2 {
                // the first point after the start and the last before the finish
                let first_time = calculate_value(&self.elapsed_times, start_index + 1, 0.0);
                let last_time = calculate_value(&self.elapsed_times, finish_index, 0.0);
                average_period = (last_time - first_time) / (delta_index - 1) as f64;
            }
        }

        average_period
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use eyre::Result;

    const NM: f64 = 1.0;

    fn profile() -> TimeProfile {
        let distances = vec![
            0.,
            27.171707 * NM,
            76.922726 * NM,
            224.561621 * NM,
            226.056657 * NM,
            227.510208 * NM,
            228.901381 * NM,
            230.240527 * NM,
            231.299789 * NM,
            232.358631 * NM,
            233.438427 * NM,
            233.645865 * NM,
        ];
        let elapsed_times = vec![
            0., 292., 718., 2543., 2573., 2603., 2633., 2663., 2693., 2723., 2753., 2759.,
        ];
        TimeProfile::new(
            parse_iso8601("2017-08-01T08:47:31Z").unwrap(),
            distances,
            elapsed_times,
        )
    }

    #[test]
    fn test_interpolate_by_distance_end_points() -> Result<()> {
        let timep = profile();
        let times = timep.interpolate_by_distance(&[0.0, 2.0, 8.0, 76.922726])?;
        assert_eq!(times.len(), 4);
        assert!((times[0] - 0.0).abs() < 1.0e-9);
        assert!((times[3] - 718.0).abs() < 1.0e-9);
        assert!(times.windows(2).all(|pair| pair[0] < pair[1]));
        Ok(())
    }

    #[test]
    fn test_interpolate_by_elapsed_time_end_points() -> Result<()> {
        let timep = profile();
        let distances = timep.interpolate_by_elapsed_time(&[0.0, 292.0, 500.0, 718.0])?;
        assert_eq!(distances.len(), 4);
        assert!((distances[0] - 0.0).abs() < 1.0e-9);
        assert!((distances[1] - 27.171707).abs() < 1.0e-9);
        assert!((distances[3] - 76.922726).abs() < 1.0e-9);
        assert!(distances.windows(2).all(|pair| pair[0] < pair[1]));
        Ok(())
    }

    #[test]
    fn test_interpolation_round_trip() -> Result<()> {
        let timep = profile();
        let times = timep.interpolate_by_distance(&timep.distances)?;
        for (time, expected) in times.iter().zip(timep.elapsed_times.iter()) {
            assert!((time - expected).abs() < 1.0e-9);
        }
        Ok(())
    }

    #[test]
    fn test_calculate_average_period() {
        let timep = profile();

        // over the dense tail of the profile one sample every ~30 s
        let period = timep.calculate_average_period(224.0, 233.645865);
        assert!((period - 27.0).abs() < 1.0e-9);

        // not enough points between the distances
        assert_eq!(timep.calculate_average_period(0.0, 30.0), 0.0);
        // inverted distances
        assert_eq!(timep.calculate_average_period(30.0, 0.0), 0.0);
    }

    #[test]
    fn test_json_round_trip() -> Result<()> {
        let timep = profile();
        let text = serde_json::to_string(&timep)?;
        assert!(text.contains("2017-08-01T08:47:31.000000Z"));
        let back: TimeProfile = serde_json::from_str(&text)?;
        assert_eq!(timep, back);
        Ok(())
    }
}
