//! Airspace volume intersections for a smoothed trajectory.
//!
//! The 2D intersections reported by the geometry oracle are projected
//! onto the path and walked in distance order, maintaining per volume
//! entry state; each closed horizontal section is then resolved against
//! the vertical extent of its volume to produce the 3D entry/exit
//! events.
//!

use std::collections::BTreeMap;
use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, trace};

use retrace_common::{calculate_date_time, nm2rad, rad2nm, IntersectionOptions};
use retrace_sphere::{calculate_points, Point3d, SpherePath};
use retrace_trajectory::{AltitudeProfile, AltitudeProfileType, SmoothedTrajectory};

use crate::error::IntersectionError;
use crate::oracle::GeometryOracle;
use crate::volume::AirspaceVolume;

/// The tolerance of an initial position from the start of a trajectory
/// [Nautical Miles].
pub const INITIAL_POSITION_TOLERANCE: f64 = 0.01;

/// A 3D intersection event of a trajectory with an airspace volume.
///
#[derive(Clone, Debug, Serialize)]
pub struct SectorIntersection {
    /// The flight id
    pub flight_id: String,
    /// The display name of the intersected volume
    pub sector_id: String,
    /// Whether the event is an exit (`false` marks an entry)
    pub is_exit: bool,
    /// Latitude [degrees]
    pub lat: f64,
    /// Longitude [degrees]
    pub lon: f64,
    /// Altitude [feet]
    pub alt: f64,
    /// The event time
    pub time: DateTime<Utc>,
    /// The path distance [Nautical Miles]
    pub distance: f64,
}

/// Set exit flags on each second occurrence of a volume id.
///
pub fn set_exit_flags(ids: &[String]) -> Vec<bool> {
    let mut is_exits = vec![false; ids.len()];
    let mut open = std::collections::HashSet::new();
    for (index, volume_id) in ids.iter().enumerate() {
        if open.contains(volume_id) {
            open.remove(volume_id);
            is_exits[index] = true;
        } else {
            open.insert(volume_id.clone());
        }
    }
    is_exits
}

/// Project 2D intersection points onto the path and sort them by their
/// path distance [Nautical Miles].
///
pub fn calculate_2d_intersection_distances(
    path: &SpherePath,
    intersection_points: &[Point3d],
    volume_ids: &[String],
    start_distance: f64,
    across_track_tolerance: f64,
) -> Vec<(String, f64)> {
    let mut start_index = 0;
    if start_distance > 0.0 {
        let distances_nm = path.path_distances().iter().map(|d| rad2nm(*d)).collect::<Vec<_>>();
        let (index, _) = retrace_common::calculate_value_reference(&distances_nm, start_distance);
        start_index = index.min(path.len() - 2);
    }

    let tolerance_radians = nm2rad(across_track_tolerance);
    let distances = path.calculate_path_distances(intersection_points, tolerance_radians, start_index);

    let mut sections = volume_ids
        .iter()
        .cloned()
        .zip(distances.iter().map(|d| rad2nm(*d)))
        .collect::<Vec<_>>();
    sections.sort_by(|a, b| a.1.total_cmp(&b.1));
    sections
}

/// The 3D intersection distances of a horizontal volume section against
/// the volume's vertical extent, unordered [Nautical Miles].
///
pub fn calculate_3d_intersection_distances(
    altitude_profile: &AltitudeProfile,
    volume: &AirspaceVolume,
    entry_distance: f64,
    exit_distance: f64,
    entry_altitude: f64,
    exit_altitude: f64,
    include_horizontal_exit: bool,
) -> Vec<f64> {
    let mut distances = vec![];

    let (min_alt, max_alt) = altitude_profile.altitude_range(entry_distance, exit_distance);
    if volume.vertical_intersection(min_alt, max_alt) {
        // is the horizontal entry inside the vertical extent?
        if volume.is_inside(entry_altitude) {
            distances.push(entry_distance);
        }

        // crossings of the bottom of the volume
        if volume.bottom_intersection(min_alt, max_alt) {
            distances.extend(altitude_profile.intersection_distances(
                volume.bottom_altitude,
                entry_distance,
                exit_distance,
            ));
        }

        // crossings of the top of the volume
        if volume.top_intersection(min_alt, max_alt) {
            distances.extend(altitude_profile.intersection_distances(
                volume.top_altitude,
                entry_distance,
                exit_distance,
            ));
        }

        // is the horizontal exit inside the vertical extent?
        if include_horizontal_exit && volume.is_inside(exit_altitude) {
            distances.push(exit_distance);
        }
    }

    distances
}

/// Resolve the distance ordered 2D intersections against the vertical
/// extents of their volumes, yielding the sorted 3D intersections.
///
pub fn calculate_3d_intersections(
    altitude_profile: &AltitudeProfile,
    volumes: &BTreeMap<String, AirspaceVolume>,
    intersections_2d: &[(String, f64)],
) -> Vec<(String, f64)> {
    let mut intersections_3d: Vec<(String, f64)> = vec![];

    let altitudes_2d = altitude_profile.interpolate(
        &intersections_2d.iter().map(|(_, d)| *d).collect::<Vec<_>>(),
    );

    // per volume open entry indices
    let mut entries: HashMap<&str, usize> = HashMap::new();

    for (index, (volume_id, distance)) in intersections_2d.iter().enumerate() {
        if let Some(entry_index) = entries.remove(volume_id.as_str()) {
            // a closed horizontal section of this volume
            let entry_distance = intersections_2d[entry_index].1;
            let entry_altitude = altitudes_2d[entry_index];
            let exit_distance = *distance;
            let exit_altitude = altitudes_2d[index];

            if let Some(volume) = volumes.get(volume_id) {
                let distances = calculate_3d_intersection_distances(
                    altitude_profile,
                    volume,
                    entry_distance,
                    exit_distance,
                    entry_altitude,
                    exit_altitude,
                    true,
                );
                intersections_3d
                    .extend(distances.into_iter().map(|d| (volume_id.clone(), d)));
            }
        } else {
            entries.insert(volume_id.as_str(), index);
        }
    }

    // volumes still open close at the end of the trajectory, without the
    // final horizontal exit: that is the end of data, not a crossing
    let finish_distance = *altitude_profile.distances.last().unwrap();
    let finish_altitude = *altitude_profile.altitudes.last().unwrap();
    let mut remaining = entries.into_iter().collect::<Vec<_>>();
    remaining.sort_by_key(|(_, index)| *index);
    for (volume_id, entry_index) in remaining {
        let entry_distance = intersections_2d[entry_index].1;
        let entry_altitude = altitudes_2d[entry_index];

        if let Some(volume) = volumes.get(volume_id) {
            let distances = calculate_3d_intersection_distances(
                altitude_profile,
                volume,
                entry_distance,
                finish_distance,
                entry_altitude,
                finish_altitude,
                false,
            );
            intersections_3d.extend(distances.into_iter().map(|d| (volume_id.to_owned(), d)));
        }
    }

    intersections_3d.sort_by(|a, b| a.1.total_cmp(&b.1));
    intersections_3d
}

/// Find the 3D airspace intersection events of a smoothed trajectory.
///
/// For purely cruising trajectories the 2D intersections are used
/// directly; otherwise each closed horizontal section is resolved
/// against its volume's vertical extent. Events within
/// `INITIAL_POSITION_TOLERANCE` of the trajectory start are suppressed.
///
#[tracing::instrument(skip_all, fields(flight_id = %trajectory.flight_id))]
pub fn find_3d_airspace_intersections(
    trajectory: &SmoothedTrajectory,
    path: &SpherePath,
    intersection_points: &[Point3d],
    volume_ids: &[String],
    volumes: &BTreeMap<String, AirspaceVolume>,
    start_distance: f64,
    is_cruising: bool,
    across_track_tolerance: f64,
) -> Result<Vec<SectorIntersection>, IntersectionError> {
    let intersections_2d = calculate_2d_intersection_distances(
        path,
        intersection_points,
        volume_ids,
        start_distance,
        across_track_tolerance,
    );

    // no need for the vertical resolution of a cruising flight
    let intersections_3d = if is_cruising {
        intersections_2d
    } else {
        calculate_3d_intersections(&trajectory.altitude_profile, volumes, &intersections_2d)
    };
    if intersections_3d.is_empty() {
        return Ok(vec![]);
    }

    let is_exits = set_exit_flags(
        &intersections_3d.iter().map(|(id, _)| id.clone()).collect::<Vec<_>>(),
    );

    // suppress spurious entries at the start of the trajectory
    let initial_position_distance = start_distance + INITIAL_POSITION_TOLERANCE;
    let kept = intersections_3d
        .iter()
        .zip(is_exits.iter())
        .filter(|((_, distance), _)| *distance >= initial_position_distance)
        .map(|((id, distance), is_exit)| (id.clone(), *distance, *is_exit))
        .collect::<Vec<_>>();
    if kept.is_empty() {
        return Ok(vec![]);
    }

    // interpolate the event positions, altitudes and times
    let distances = kept.iter().map(|(_, d, _)| *d).collect::<Vec<_>>();
    let positions = path.calculate_positions(&distances);
    let altitudes = trajectory.altitude_profile.interpolate(&distances);
    let times = trajectory.time_profile.interpolate_by_distance(&distances)?;

    let events = kept
        .iter()
        .enumerate()
        .map(|(i, (volume_id, distance, is_exit))| {
            let name = volumes
                .get(volume_id)
                .map_or_else(|| volume_id.clone(), |v| v.name.clone());
            SectorIntersection {
                flight_id: trajectory.flight_id.clone(),
                sector_id: name,
                is_exit: *is_exit,
                lat: positions[i].latitude(),
                lon: positions[i].longitude(),
                alt: altitudes[i],
                time: calculate_date_time(trajectory.time_profile.start_time, times[i]),
                distance: *distance,
            }
        })
        .collect();

    Ok(events)
}

/// Collect the volumes intersected by the 2D query from the oracle
/// lookups.
///
fn collect_volumes<N, E>(
    volume_ids: &[String],
    name_of: N,
    extent_of: E,
) -> Result<BTreeMap<String, AirspaceVolume>, IntersectionError>
where
    N: Fn(&str) -> Result<String, IntersectionError>,
    E: Fn(&str) -> Result<(f64, f64), IntersectionError>,
{
    let mut volumes = BTreeMap::new();
    for volume_id in volume_ids {
        if !volumes.contains_key(volume_id) {
            let name = name_of(volume_id)?;
            let (bottom_alt, top_alt) = extent_of(volume_id)?;
            volumes.insert(volume_id.clone(), AirspaceVolume::new(&name, bottom_alt, top_alt));
        }
    }
    Ok(volumes)
}

/// Find the airspace sector intersection events of a smoothed
/// trajectory.
///
#[tracing::instrument(skip_all, fields(flight_id = %trajectory.flight_id))]
pub fn find_trajectory_sector_intersections<O: GeometryOracle>(
    trajectory: &SmoothedTrajectory,
    oracle: &O,
    options: &IntersectionOptions,
) -> Result<Vec<SectorIntersection>, IntersectionError> {
    let min_altitude = trajectory
        .altitude_profile
        .altitudes
        .iter()
        .fold(f64::INFINITY, |a, b| a.min(*b));
    let max_altitude = trajectory
        .altitude_profile
        .altitudes
        .iter()
        .fold(f64::NEG_INFINITY, |a, b| a.max(*b));

    let found = oracle.find_sector_intersections_2d(
        &trajectory.flight_id,
        &trajectory.horizontal_path.lats,
        &trajectory.horizontal_path.lons,
        min_altitude,
        max_altitude,
    )?;
    if found.is_empty() {
        trace!("no 2D sector intersections");
        return Ok(vec![]);
    }
    debug!("{} 2D sector intersections", found.len());

    let volumes = collect_volumes(
        &found.volume_ids,
        |id| oracle.sector_display_name(id),
        |id| oracle.sector_vertical_extent(id),
    )?;

    let path = trajectory.horizontal_path.sphere_path()?;
    let intersection_points = calculate_points(&found.lats, &found.lons);
    let is_cruising =
        trajectory.altitude_profile.profile_type() == AltitudeProfileType::Cruising;

    find_3d_airspace_intersections(
        trajectory,
        &path,
        &intersection_points,
        &found.volume_ids,
        &volumes,
        0.0,
        is_cruising,
        options.across_track_tolerance,
    )
}

/// Find the user defined airspace intersection events of a smoothed
/// trajectory.
///
#[tracing::instrument(skip_all, fields(flight_id = %trajectory.flight_id))]
pub fn find_trajectory_user_airspace_intersections<O: GeometryOracle>(
    trajectory: &SmoothedTrajectory,
    oracle: &O,
    options: &IntersectionOptions,
) -> Result<Vec<SectorIntersection>, IntersectionError> {
    let min_altitude = trajectory
        .altitude_profile
        .altitudes
        .iter()
        .fold(f64::INFINITY, |a, b| a.min(*b));
    let max_altitude = trajectory
        .altitude_profile
        .altitudes
        .iter()
        .fold(f64::NEG_INFINITY, |a, b| a.max(*b));

    let found = oracle.find_user_volume_intersections_2d(
        &trajectory.flight_id,
        &trajectory.horizontal_path.lats,
        &trajectory.horizontal_path.lons,
        min_altitude,
        max_altitude,
    )?;
    if found.is_empty() {
        trace!("no 2D user volume intersections");
        return Ok(vec![]);
    }

    let volumes = collect_volumes(
        &found.volume_ids,
        |id| oracle.user_volume_display_name(id),
        |id| oracle.user_volume_vertical_extent(id),
    )?;

    let path = trajectory.horizontal_path.sphere_path()?;
    let intersection_points = calculate_points(&found.lats, &found.lons);
    let is_cruising =
        trajectory.altitude_profile.profile_type() == AltitudeProfileType::Cruising;

    find_3d_airspace_intersections(
        trajectory,
        &path,
        &intersection_points,
        &found.volume_ids,
        &volumes,
        0.0,
        is_cruising,
        options.across_track_tolerance,
    )
}
