//! A trajectory altitude profile and cruise section detection.
//!
//! A level section is a maximal run of consecutive samples at exactly the
//! same altitude. Level sections high enough to be cruising are snapped
//! to the closest standard flight level; their interior samples carry no
//! information and are removed from the profile.
//!

use serde::{Deserialize, Serialize};

use retrace_common::{calculate_value, calculate_value_reference};

/// A level run qualifies as cruise at or above this fraction of the
/// maximum altitude of the flight.
const CRUISE_ALTITUDE_RATIO: f64 = 0.5;

/// The classification of an altitude profile.
///
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(i32)]
pub enum AltitudeProfileType {
    Cruising = 0,
    Climbing = 1,
    Descending = 2,
    ClimbingAndDescending = 3,
}

/// Find pairs of start/finish indices of consecutive samples at the same
/// altitude, i.e. where an aircraft was in level flight.
///
/// Only runs of two or more samples count as level.
///
pub fn find_level_sections(alts: &[f64]) -> Vec<(usize, usize)> {
    let mut sections = vec![];

    let mut start = 0_usize;
    let mut is_level = false;
    for index in 1..alts.len() {
        if alts[index] == alts[index - 1] {
            if !is_level {
                start = index - 1;
                is_level = true;
            }
        } else if is_level {
            sections.push((start, index - 1));
            is_level = false;
        }
    }
    if is_level {
        sections.push((start, alts.len() - 1));
    }

    sections
}

/// The closest standard cruising flight level to an altitude, i.e. the
/// closest multiple of 1000 feet.
///
pub fn closest_cruising_altitude(altitude: f64) -> f64 {
    1000.0 * (altitude / 1000.0).round()
}

/// Find the start/finish index pairs of the cruising sections.
///
/// Level sections at or above the cruise threshold qualify; adjacent
/// sections snapping to the same cruising flight level merge into one.
///
pub fn find_cruise_sections(alts: &[f64]) -> Vec<(usize, usize)> {
    let max_altitude = alts.iter().fold(f64::NEG_INFINITY, |a, b| a.max(*b));
    let threshold = CRUISE_ALTITUDE_RATIO * max_altitude;

    let mut sections: Vec<(usize, usize)> = vec![];
    for (start, finish) in find_level_sections(alts) {
        if alts[start] < threshold {
            continue;
        }
        let level = closest_cruising_altitude(alts[start]);
        if let Some(last) = sections.last_mut() {
            // merge a section abutting the previous one at the same level
            if (start == last.1 + 1) && (closest_cruising_altitude(alts[last.0]) == level) {
                last.1 = finish;
                continue;
            }
        }
        sections.push((start, finish));
    }

    sections
}

/// Mark the interior positions of the cruise sections.
///
/// The entry and exit samples of each section are kept.
///
pub fn find_cruise_positions(count: usize, cruise_sections: &[(usize, usize)]) -> Vec<bool> {
    let mut positions = vec![false; count];
    for (start, finish) in cruise_sections {
        for position in positions.iter_mut().take(*finish).skip(start + 1) {
            *position = true;
        }
    }
    positions
}

/// Snap the altitudes within the cruise sections to their cruising
/// flight levels.
///
pub fn set_cruise_altitudes(alts: &[f64], cruise_sections: &[(usize, usize)]) -> Vec<f64> {
    let mut altitudes = alts.to_vec();
    for (start, finish) in cruise_sections {
        let cruise_altitude = closest_cruising_altitude(alts[start + 1]);
        for altitude in altitudes.iter_mut().take(finish + 1).skip(start + 1) {
            *altitude = cruise_altitude;
        }
    }
    altitudes
}

/// Calculate the differences between the cruising altitudes and their
/// cruising flight levels.
///
/// The result is empty if there are no cruising sections.
///
pub fn calculate_cruise_delta_alts(alts: &[f64], cruise_sections: &[(usize, usize)]) -> Vec<f64> {
    let mut deltas = vec![];
    for (start, finish) in cruise_sections {
        let start = start + 1;
        if start < *finish {
            let cruise_altitude = closest_cruising_altitude(alts[start]);
            for altitude in &alts[start..*finish] {
                deltas.push(altitude - cruise_altitude);
            }
        }
    }
    deltas
}

/// A trajectory altitude profile: altitudes at distances along a path.
///
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct AltitudeProfile {
    /// Path distances [Nautical Miles]
    pub distances: Vec<f64>,
    /// Altitudes at the distances [feet]
    pub altitudes: Vec<f64>,
}

impl AltitudeProfile {
    pub fn new(distances: Vec<f64>, altitudes: Vec<f64>) -> Self {
        AltitudeProfile { distances, altitudes }
    }

    /// Interpolate the altitude at a distance along the path [feet].
    ///
    pub fn altitude_at(&self, distance: f64) -> f64 {
        let (index, ratio) = calculate_value_reference(&self.distances, distance);
        calculate_value(&self.altitudes, index, ratio)
    }

    /// Interpolate the altitudes at distances along the path [feet].
    ///
    pub fn interpolate(&self, distances: &[f64]) -> Vec<f64> {
        distances.iter().map(|d| self.altitude_at(*d)).collect()
    }

    /// The minimum and maximum altitude between two path distances [feet].
    ///
    pub fn altitude_range(&self, start_distance: f64, finish_distance: f64) -> (f64, f64) {
        let mut min_alt = self.altitude_at(start_distance);
        let mut max_alt = self.altitude_at(finish_distance);
        if min_alt > max_alt {
            std::mem::swap(&mut min_alt, &mut max_alt);
        }

        for (distance, altitude) in self.distances.iter().zip(self.altitudes.iter()) {
            if (start_distance < *distance) && (*distance < finish_distance) {
                min_alt = min_alt.min(*altitude);
                max_alt = max_alt.max(*altitude);
            }
        }

        (min_alt, max_alt)
    }

    /// The path distances where the profile crosses an altitude, strictly
    /// between two path distances [Nautical Miles].
    ///
    pub fn intersection_distances(
        &self,
        altitude: f64,
        start_distance: f64,
        finish_distance: f64,
    ) -> Vec<f64> {
        let mut crossings = vec![];
        for i in 1..self.distances.len() {
            let a0 = self.altitudes[i - 1] - altitude;
            let a1 = self.altitudes[i] - altitude;
            if (a0 < 0.0) == (a1 < 0.0) || a0 == a1 {
                continue;
            }
            let d0 = self.distances[i - 1];
            let d1 = self.distances[i];
            let distance = d0 + (d1 - d0) * (a0 / (a0 - a1));
            if (start_distance < distance) && (distance < finish_distance) {
                crossings.push(distance);
            }
        }
        crossings
    }

    /// Classify the profile from the signs of its altitude changes.
    ///
    pub fn profile_type(&self) -> AltitudeProfileType {
        let mut climbing = false;
        let mut descending = false;
        for pair in self.altitudes.windows(2) {
            if pair[1] > pair[0] {
                climbing = true;
            } else if pair[1] < pair[0] {
                descending = true;
            }
        }

        match (climbing, descending) {
            (false, false) => AltitudeProfileType::Cruising,
            (true, false) => AltitudeProfileType::Climbing,
            (false, true) => AltitudeProfileType::Descending,
            (true, true) => AltitudeProfileType::ClimbingAndDescending,
        }
    }

    /// The path distance of the top of climb: the first sample at the
    /// maximum altitude [Nautical Miles].
    ///
    pub fn top_of_climb_distance(&self) -> f64 {
        let max_alt = self.altitudes.iter().fold(f64::NEG_INFINITY, |a, b| a.max(*b));
        self.altitudes
            .iter()
            .position(|a| *a == max_alt)
            .map_or(0.0, |i| self.distances[i])
    }

    /// The path distance of the top of descent: the last sample at the
    /// maximum altitude [Nautical Miles].
    ///
    pub fn top_of_descent_distance(&self) -> f64 {
        let max_alt = self.altitudes.iter().fold(f64::NEG_INFINITY, |a, b| a.max(*b));
        self.altitudes
            .iter()
            .rposition(|a| *a == max_alt)
            .map_or(0.0, |i| self.distances[i])
    }
}

/// Create an `AltitudeProfile` and its quality metrics.
///
/// The interior cruise positions are removed and the cruise altitudes
/// snapped to their cruising flight levels. Returns the profile, the
/// standard deviation and the maximum of the cruise altitude residuals.
///
pub fn analyse_altitudes(
    distances: &[f64],
    altitudes: &[f64],
    cruise_sections: &[(usize, usize)],
) -> (AltitudeProfile, f64, f64) {
    let mut alt_sd = 0.0;
    let mut max_alt = 0.0;

    let cruise_deltas = calculate_cruise_delta_alts(altitudes, cruise_sections);
    if !cruise_deltas.is_empty() {
        let mean = cruise_deltas.iter().sum::<f64>() / cruise_deltas.len() as f64;
        alt_sd = (cruise_deltas.iter().map(|d| (d - mean) * (d - mean)).sum::<f64>()
            / cruise_deltas.len() as f64)
            .sqrt();
        max_alt = retrace_common::max_delta(&cruise_deltas);
    }

    // Only keep the climbing and descending sections and the cruise
    // section boundaries, at cruising flight levels
    let cruise_positions = find_cruise_positions(altitudes.len(), cruise_sections);
    let snapped = set_cruise_altitudes(altitudes, cruise_sections);

    let mut dists = vec![];
    let mut alts = vec![];
    for i in 0..altitudes.len() {
        if !cruise_positions[i] {
            dists.push(distances[i]);
            alts.push(snapped[i]);
        }
    }

    (AltitudeProfile::new(dists, alts), alt_sd, max_alt)
}
