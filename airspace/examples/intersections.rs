//! Resolve sector and airport cylinder intersections for a synthetic
//! trajectory against the fixture oracle, writing CSV to stdout.
//!
//! ```sh
//! cargo run --example intersections
//! ```

use eyre::Result;

use retrace_airspace::{
    find_trajectory_airport_intersection, find_trajectory_sector_intersections,
    write_airport_intersections, write_sector_intersections, FixtureOracle, RectangleVolume,
};
use retrace_common::{parse_iso8601, AirportTable, IntersectionOptions};
use retrace_trajectory::{AltitudeProfile, HorizontalPath, SmoothedTrajectory, TimeProfile};

fn main() -> Result<()> {
    // an eastbound descent toward LFPG at 49N
    let count = 25;
    let lons = (0..count).map(|i| 0.3 + 0.1 * i as f64).collect::<Vec<_>>();
    let leg_nm = 0.1 * 60.0 * 49.0_f64.to_radians().cos();
    let distances = (0..count).map(|i| leg_nm * i as f64).collect::<Vec<_>>();
    let times = (0..count).map(|i| 45.0 * i as f64).collect::<Vec<_>>();
    let altitudes = (0..count).map(|i| 25_000.0 - 700.0 * i as f64).collect::<Vec<_>>();

    let trajectory = SmoothedTrajectory {
        flight_id: "257463".into(),
        horizontal_path: HorizontalPath {
            lats: vec![49.0; count],
            lons,
            tids: vec![0.0; count],
        },
        time_profile: TimeProfile::new(
            parse_iso8601("2017-08-01T17:00:00Z")?,
            distances.clone(),
            times,
        ),
        altitude_profile: AltitudeProfile::new(distances, altitudes),
    };

    let sector = RectangleVolume {
        id: "4601".into(),
        name: "LFFFUIR".into(),
        bottom_altitude: 19_500.0,
        top_altitude: 66_000.0,
        min_lat: 47.0,
        max_lat: 51.0,
        min_lon: 1.0,
        max_lon: 4.0,
    };
    let oracle = FixtureOracle::new(vec![sector], vec![], AirportTable::load(None)?);
    let options = IntersectionOptions::default();

    let events = find_trajectory_sector_intersections(&trajectory, &oracle, &options)?;
    let mut stdout = std::io::stdout().lock();
    write_sector_intersections(&mut stdout, &events)?;

    if let Some(arrival) = find_trajectory_airport_intersection(
        &trajectory,
        &oracle,
        "LFPG",
        options.radius,
        true,
        &options,
    )? {
        write_airport_intersections(&mut stdout, &[arrival])?;
    }

    Ok(())
}
