//! Smoothing of elapsed times along a path.
//!
//! The moving average speed method derives per leg ground speeds, filters
//! them with a moving median then a moving mean and re-integrates the
//! elapsed times. The polynomial method (feature `polynomial-fit`) fits a
//! degree 5 polynomial to the (distance, time) samples instead.
//!

use chrono::{DateTime, Utc};

use retrace_common::{
    calculate_elapsed_times, calculate_speed, find_most_extreme_value,
};

use crate::timeprofile::TimeProfile;

/// The minimum duration used when a leg duration is not positive [Seconds].
const MIN_LEG_TIME: f64 = 0.5;

/// Population standard deviation.
///
fn standard_deviation(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    (values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / values.len() as f64).sqrt()
}

/// The differences between adjacent values, with a leading zero.
///
fn leg_differences(values: &[f64]) -> Vec<f64> {
    let mut deltas = Vec::with_capacity(values.len());
    if !values.is_empty() {
        deltas.push(0.0);
        for pair in values.windows(2) {
            deltas.push(pair[1] - pair[0]);
        }
    }
    deltas
}

/// Calculate the centred moving median of the values in place.
///
/// The values at the start and end of the array are not smoothed.
///
pub fn moving_median(values: &mut [f64], n: usize) {
    if (n > 1) && (values.len() > n) {
        let original = values.to_vec();
        let half = n / 2;
        for i in half..values.len() - half {
            let mut window = original[i - half..=i + half].to_vec();
            window.sort_by(f64::total_cmp);
            values[i] = window[half];
        }
    }
}

/// Calculate the centred moving average of the values in place.
///
/// The values at the start and end of the array are not smoothed.
///
pub fn moving_average(values: &mut [f64], n: usize) {
    if (n > 1) && (values.len() > n) {
        let original = values.to_vec();
        let half = n / 2;
        for i in half..values.len() - half {
            values[i] = original[i - half..=i + half].iter().sum::<f64>() / n as f64;
        }
    }
}

/// Calculate per leg ground speeds, averaging short legs whose speed is
/// not monotone with its neighbours [Knots].
///
/// The first speed is always zero.
///
pub fn calculate_ground_speeds(
    path_distances: &[f64],
    elapsed_times: &[f64],
    max_duration: f64,
) -> Vec<f64> {
    let leg_lengths = leg_differences(path_distances);
    let durations = leg_differences(elapsed_times);
    let mut speeds = leg_lengths
        .iter()
        .zip(durations.iter())
        .map(|(length, duration)| calculate_speed(*length, *duration, MIN_LEG_TIME))
        .collect::<Vec<_>>();

    if leg_lengths.len() > 2 {
        // the first leg has no previous speed to compare with
        if durations[1] < max_duration / 10.0 {
            speeds[1] = calculate_speed(
                leg_lengths[1] + leg_lengths[2],
                durations[1] + durations[2],
                MIN_LEG_TIME,
            );
        }

        for i in 2..leg_lengths.len() - 1 {
            let increasing = (speeds[i - 1] <= speeds[i]) && (speeds[i] <= speeds[i + 1]);
            let decreasing = (speeds[i - 1] >= speeds[i]) && (speeds[i] >= speeds[i + 1]);
            if (durations[i] < max_duration) && !increasing && !decreasing {
                // average the speed over the legs either side
                speeds[i] = calculate_speed(
                    leg_lengths[i] + leg_lengths[i + 1],
                    durations[i] + durations[i + 1],
                    MIN_LEG_TIME,
                );
            }
        }
    }

    speeds
}

/// Smooth elapsed times by filtering ground speeds and re-integrating.
///
/// `n` and `m` are the moving median and moving average window sizes;
/// 0 or 1 disables a filter. The first (zero) speed sample is excluded
/// from the filters.
///
pub fn smooth_times(
    path_distances: &[f64],
    elapsed_times: &[f64],
    n: usize,
    m: usize,
    max_duration: f64,
) -> Vec<f64> {
    let mut speeds = calculate_ground_speeds(path_distances, elapsed_times, max_duration);

    if (n > 1) && (speeds.len() > n + 1) {
        moving_median(&mut speeds[1..], n);
    }
    if (m > 1) && (speeds.len() > m + 1) {
        moving_average(&mut speeds[1..], m);
    }

    // re-derive the durations from the smoothed speeds
    let leg_lengths = leg_differences(path_distances);
    let durations = leg_differences(elapsed_times);
    let mut smoothed = Vec::with_capacity(path_distances.len());
    if path_distances.is_empty() {
        return smoothed;
    }
    let mut total = 0.0;
    smoothed.push(total);
    for i in 1..path_distances.len() {
        let duration = if speeds[i] > 0.0 {
            3600.0 * leg_lengths[i] / speeds[i]
        } else {
            durations[i]
        };
        total += duration;
        smoothed.push(total);
    }

    smoothed
}

/// Create a `TimeProfile` by the moving average speed method, with
/// quality metrics.
///
/// Duplicate positions are excluded from the profile. Returns the
/// profile, the standard deviation of the time residuals, the maximum
/// residual and its index.
///
pub fn analyse_speeds(
    distances: &[f64],
    times: &[DateTime<Utc>],
    duplicate_positions: &[bool],
    n: usize,
    m: usize,
    max_duration: f64,
) -> (TimeProfile, f64, f64, usize) {
    // elapsed times and distances of the non duplicate positions
    let valid_times = times
        .iter()
        .zip(duplicate_positions.iter())
        .filter(|(_, dup)| !**dup)
        .map(|(t, _)| *t)
        .collect::<Vec<_>>();
    let valid_distances = distances
        .iter()
        .zip(duplicate_positions.iter())
        .filter(|(_, dup)| !**dup)
        .map(|(d, _)| *d)
        .collect::<Vec<_>>();
    let elapsed_times = calculate_elapsed_times(&valid_times, times[0]);

    let mut smoothed_times = smooth_times(&valid_distances, &elapsed_times, n, m, max_duration);

    // shift the smoothed series onto the observed mean
    let deltas = smoothed_times
        .iter()
        .zip(elapsed_times.iter())
        .map(|(s, e)| s - e)
        .collect::<Vec<_>>();
    let mean_delta = deltas.iter().sum::<f64>() / deltas.len() as f64;
    for time in &mut smoothed_times {
        *time -= mean_delta;
    }

    // residuals of the adjusted times
    let deltas = smoothed_times
        .iter()
        .zip(elapsed_times.iter())
        .map(|(s, e)| s - e)
        .collect::<Vec<_>>();
    let time_sd = standard_deviation(&deltas);
    let (max_time_diff, max_time_index) = find_most_extreme_value(&deltas);

    (
        TimeProfile::new(times[0], valid_distances, smoothed_times),
        time_sd,
        max_time_diff,
        max_time_index,
    )
}

/// Create a `TimeProfile` by fitting a degree 5 polynomial to the non
/// duplicate (distance, time) samples, with quality metrics.
///
/// The least squares variant is selected by the smoothing method; for a
/// polynomial model all variants minimise the same normal equations.
///
#[cfg(feature = "polynomial-fit")]
pub fn analyse_times(
    distances: &[f64],
    times: &[DateTime<Utc>],
    duplicate_positions: &[bool],
) -> Result<(TimeProfile, f64, f64, usize), crate::error::AnalysisError> {
    use crate::error::AnalysisError;

    const DEGREE: usize = 5;

    let valid_times = times
        .iter()
        .zip(duplicate_positions.iter())
        .filter(|(_, dup)| !**dup)
        .map(|(t, _)| *t)
        .collect::<Vec<_>>();
    let valid_distances = distances
        .iter()
        .zip(duplicate_positions.iter())
        .filter(|(_, dup)| !**dup)
        .map(|(d, _)| *d)
        .collect::<Vec<_>>();
    let elapsed_times = calculate_elapsed_times(&valid_times, times[0]);

    if valid_distances.len() <= DEGREE {
        return Err(AnalysisError::NumericalFailure(
            "too few positions for a degree 5 fit".into(),
        ));
    }

    // scale distances to [0, 1] to condition the normal equations
    let scale = valid_distances
        .iter()
        .fold(f64::NEG_INFINITY, |a, b| a.max(*b))
        .max(1.0);
    let scaled = valid_distances.iter().map(|d| d / scale).collect::<Vec<_>>();

    // build and solve the Vandermonde normal equations
    let terms = DEGREE + 1;
    let mut matrix = vec![vec![0.0; terms + 1]; terms];
    for (x, y) in scaled.iter().zip(elapsed_times.iter()) {
        let mut powers = [0.0; 6];
        let mut value = 1.0;
        for power in &mut powers {
            *power = value;
            value *= x;
        }
        for r in 0..terms {
            for c in 0..terms {
                matrix[r][c] += powers[r] * powers[c];
            }
            matrix[r][terms] += powers[r] * y;
        }
    }

    let coefficients = solve_linear_system(&mut matrix)
        .ok_or_else(|| AnalysisError::NumericalFailure("singular polynomial fit".into()))?;

    let evaluate = |x: f64| {
        let x = x / scale;
        coefficients.iter().rev().fold(0.0, |acc, c| acc * x + c)
    };
    let smoothed_times = valid_distances.iter().map(|d| evaluate(*d)).collect::<Vec<_>>();

    let deltas = smoothed_times
        .iter()
        .zip(elapsed_times.iter())
        .map(|(s, e)| s - e)
        .collect::<Vec<_>>();
    let time_sd = standard_deviation(&deltas);
    let (max_time_diff, max_time_index) = find_most_extreme_value(&deltas);

    Ok((
        TimeProfile::new(times[0], valid_distances, smoothed_times),
        time_sd,
        max_time_diff,
        max_time_index,
    ))
}

/// Solve a small augmented linear system by Gaussian elimination with
/// partial pivoting. Returns `None` when the system is singular.
///
#[cfg(feature = "polynomial-fit")]
fn solve_linear_system(matrix: &mut [Vec<f64>]) -> Option<Vec<f64>> {
    let n = matrix.len();
    for col in 0..n {
        let pivot = (col..n).max_by(|a, b| matrix[*a][col].abs().total_cmp(&matrix[*b][col].abs()))?;
        if matrix[pivot][col].abs() < 1.0e-12 {
            return None;
        }
        matrix.swap(col, pivot);
        for row in col + 1..n {
            let factor = matrix[row][col] / matrix[col][col];
            for c in col..=n {
                matrix[row][c] -= factor * matrix[col][c];
            }
        }
    }

    let mut solution = vec![0.0; n];
    for row in (0..n).rev() {
        let mut value = matrix[row][n];
        for col in row + 1..n {
            value -= matrix[row][col] * solution[col];
        }
        solution[row] = value / matrix[row][row];
    }

    Some(solution)
}
