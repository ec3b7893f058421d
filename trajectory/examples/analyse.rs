//! Clean and analyse a synthetic flight, then write the smoothed
//! trajectory collection to stdout.
//!
//! ```sh
//! cargo run --example analyse
//! ```

use eyre::Result;

use retrace_common::{init_logging, parse_iso8601, AnalysisOptions};
use retrace_trajectory::{
    analyse_flights, find_invalid_positions, write_trajectories, CleaningOptions,
    CollectionHeader, FlightPositions, PositionData, PositionReport,
};

fn main() -> Result<()> {
    init_logging("analyse", false)?;

    // a southbound climb sampled every 30 seconds
    let start = parse_iso8601("2017-08-01T10:00:00Z")?;
    let reports = (0..40)
        .map(|i| PositionReport {
            time: start + chrono::Duration::seconds(30 * i),
            lat: 50.0 - 0.05 * i as f64,
            lon: 2.0,
            alt: (28_000.0 + 200.0 * i as f64).min(32_000.0),
            aircraft_address: "4CA123".into(),
            ssr_code: "1234".into(),
        })
        .collect::<Vec<_>>();

    let (invalid, counts) = find_invalid_positions(&reports, &CleaningOptions::default());
    eprintln!("{} of {} positions invalid", counts.total, reports.len());

    let mut positions = PositionData::default();
    for (report, invalid) in reports.iter().zip(invalid.iter()) {
        if !invalid {
            positions.times.push(report.time);
            positions.lats.push(report.lat);
            positions.lons.push(report.lon);
            positions.alts.push(report.alt);
        }
    }

    let options = AnalysisOptions::default();
    let flights = vec![FlightPositions {
        flight_id: "259599".into(),
        positions,
    }];
    let (trajectories, metrics) = analyse_flights(&flights, &options);
    for row in &metrics {
        eprintln!(
            "flight {}: profile type {}, time sd {:.2} s, max xte {:.3} NM",
            row.flight_id, row.profile_type, row.time_sd, row.max_xte
        );
    }

    let header = CollectionHeader::from(&options);
    let mut stdout = std::io::stdout().lock();
    write_trajectories(&mut stdout, &header, &trajectories)?;

    Ok(())
}
