//! Derive a horizontal path from a synthetic dog leg flight and print
//! the waypoints with their turn initiation distances.
//!
//! ```sh
//! cargo run --example derive_path
//! ```

use retrace_common::{nm2rad, rad2nm};
use retrace_sphere::{calculate_points, derive_horizontal_path};

fn main() {
    // East along the equator, then North, sampled every ~0.6 NM
    let mut lats = vec![];
    let mut lons = vec![];
    for i in 0..200 {
        lats.push(0.0);
        lons.push(i as f64 * 0.01);
    }
    for i in 1..200 {
        lats.push(i as f64 * 0.01);
        lons.push(2.0 - 0.01);
    }

    let points = calculate_points(&lats, &lons);
    let path = derive_horizontal_path(&points, nm2rad(0.25), false).expect("a valid path");

    println!("{} waypoints:", path.len());
    let (lats, lons) = path.point_lat_longs();
    let tids = path.turn_initiation_distances_nm();
    for ((lat, lon), tid) in lats.iter().zip(lons.iter()).zip(tids.iter()) {
        println!("  ({lat:9.4}, {lon:9.4})  turn initiation {tid:6.2} NM");
    }
    println!(
        "path length: {:.2} NM",
        rad2nm(*path.path_distances().last().unwrap())
    );
}
