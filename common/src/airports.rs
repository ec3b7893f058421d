//! Airport reference data.
//!
//! A read-only snapshot of airport locations, loaded once at startup and
//! shared freely across worker threads. Lookups are by ICAO code.
//!

use std::collections::BTreeMap;
use std::fs;

use eyre::Result;
use serde::Deserialize;
use tracing::trace;

/// One airport reference record (this is the same schema as `airports.csv`).
///
#[derive(Clone, Debug, Deserialize)]
pub struct Airport {
    /// ICAO airport code
    pub icao: String,
    /// Airport name
    pub name: String,
    /// Latitude [degrees]
    pub latitude: f64,
    /// Longitude [degrees]
    pub longitude: f64,
}

/// The immutable in-memory airport snapshot.
///
#[derive(Clone, Debug, Default)]
pub struct AirportTable {
    airports: BTreeMap<String, Airport>,
}

impl AirportTable {
    /// Load all airports from a CSV file, or the embedded `airports.csv`
    /// if no file is specified.
    ///
    #[tracing::instrument]
    pub fn load(fname: Option<String>) -> Result<Self> {
        trace!("enter");

        // Load from file if specified
        //
        let data = if let Some(fname) = fname {
            fs::read_to_string(fname)?
        } else {
            include_str!("airports.csv").to_owned()
        };

        let mut airports = BTreeMap::<String, Airport>::new();
        let mut rdr = csv::Reader::from_reader(data.as_bytes());
        for line in rdr.deserialize() {
            let rec: Airport = line?;
            airports.insert(rec.icao.clone(), rec);
        }

        Ok(AirportTable { airports })
    }

    /// Look an airport up by ICAO code.
    ///
    pub fn get(&self, icao: &str) -> Option<&Airport> {
        self.airports.get(icao)
    }

    /// The (latitude, longitude) of an airport in [degrees], if known.
    ///
    pub fn location(&self, icao: &str) -> Option<(f64, f64)> {
        self.get(icao).map(|a| (a.latitude, a.longitude))
    }

    /// The number of airports in the snapshot.
    pub fn len(&self) -> usize {
        self.airports.len()
    }

    /// Whether the snapshot is empty.
    pub fn is_empty(&self) -> bool {
        self.airports.is_empty()
    }
}
