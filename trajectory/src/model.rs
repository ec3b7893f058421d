//! The smoothed trajectory data model and its JSON document format.
//!
//! A trajectory document holds the flight id, horizontal path, time
//! profile and altitude profile. A collection file wraps an array of
//! documents with a header describing the smoothing parameters; the
//! reader pulls one trajectory at a time to bound memory on large files.
//!

use std::io::{BufRead, Write};

use serde::{Deserialize, Serialize};

use retrace_common::{nm2rad, AnalysisOptions};
use retrace_sphere::{PathError, SpherePath};

use crate::altitude::AltitudeProfile;
use crate::error::AnalysisError;
use crate::timeprofile::TimeProfile;

/// The horizontal path of a smoothed trajectory: the serializable
/// projection of a `SpherePath`.
///
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct HorizontalPath {
    /// Waypoint latitudes [degrees]
    pub lats: Vec<f64>,
    /// Waypoint longitudes [degrees]
    pub lons: Vec<f64>,
    /// Turn initiation distances [Nautical Miles]
    pub tids: Vec<f64>,
}

impl HorizontalPath {
    /// Reconstruct the `SpherePath` of the horizontal path.
    ///
    pub fn sphere_path(&self) -> Result<SpherePath, PathError> {
        let points = retrace_sphere::calculate_points(&self.lats, &self.lons);
        let tids = self.tids.iter().map(|d| nm2rad(*d)).collect();
        SpherePath::new(points, tids)
    }
}

/// A smoothed trajectory: the horizontal path, time profile and altitude
/// profile of a flight. Immutable after assembly.
///
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct SmoothedTrajectory {
    /// The flight id
    pub flight_id: String,
    /// The horizontal path
    pub horizontal_path: HorizontalPath,
    /// The time profile
    pub time_profile: TimeProfile,
    /// The altitude profile
    pub altitude_profile: AltitudeProfile,
}

/// The header of a trajectory collection file.
///
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct CollectionHeader {
    /// The time smoothing method
    pub method: String,
    /// The across track distance tolerance [Nautical Miles]
    pub distance_tolerance: f64,
    /// The speed moving median window
    pub moving_median_samples: usize,
    /// The speed moving average window
    pub moving_average_samples: usize,
    /// The maximum duration between positions for speed smoothing [Seconds]
    pub max_speed_duration: f64,
}

impl From<&AnalysisOptions> for CollectionHeader {
    fn from(options: &AnalysisOptions) -> Self {
        CollectionHeader {
            method: options.method.to_string(),
            distance_tolerance: options.across_track_tolerance,
            moving_median_samples: options.moving_median_samples,
            moving_average_samples: options.moving_average_samples,
            max_speed_duration: options.max_speed_duration,
        }
    }
}

/// Write a collection of smoothed trajectories as a JSON document,
/// streaming one trajectory at a time.
///
pub fn write_trajectories<'a, W, I>(
    writer: &mut W,
    header: &CollectionHeader,
    trajectories: I,
) -> Result<(), AnalysisError>
where
    W: Write,
    I: IntoIterator<Item = &'a SmoothedTrajectory>,
{
    writeln!(writer, "{{")?;
    writeln!(writer, "\"method\" : {},", serde_json::to_string(&header.method)?)?;
    writeln!(writer, "\"distance_tolerance\" : {},", header.distance_tolerance)?;
    writeln!(writer, "\"moving_median_samples\" : {},", header.moving_median_samples)?;
    writeln!(writer, "\"moving_average_samples\" : {},", header.moving_average_samples)?;
    writeln!(writer, "\"max_speed_duration\" : {},", header.max_speed_duration)?;
    writeln!(writer, "\"data\" : [")?;

    let mut first = true;
    for trajectory in trajectories {
        if !first {
            writeln!(writer, ",")?;
        }
        first = false;
        serde_json::to_writer(&mut *writer, trajectory)?;
    }

    writeln!(writer)?;
    writeln!(writer, "]")?;
    writeln!(writer, "}}")?;

    Ok(())
}

/// A pull reader over a trajectory collection document.
///
/// The header is parsed on construction; each call to `next` scans one
/// balanced JSON object from the `data` array and deserializes it, so
/// the whole array is never held in memory.
///
pub struct TrajectoryReader<R: BufRead> {
    reader: R,
    header: CollectionHeader,
    finished: bool,
}

impl<R: BufRead> TrajectoryReader<R> {
    /// Open a collection document and parse its header.
    ///
    pub fn new(mut reader: R) -> Result<Self, AnalysisError> {
        // collect the document prefix up to the "data" key
        let mut prefix = Vec::new();
        let mut in_string = false;
        let mut escaped = false;
        loop {
            let byte = read_byte(&mut reader)?.ok_or_else(|| {
                AnalysisError::InvalidInput("no data array in trajectory document".into())
            })?;
            prefix.push(byte);
            if escaped {
                escaped = false;
                continue;
            }
            match byte {
                b'\\' if in_string => escaped = true,
                b'"' => in_string = !in_string,
                _ => {}
            }
            if !in_string && prefix.ends_with(b"\"data\"") {
                break;
            }
        }

        // the prefix minus the data key, closed, is the header object
        prefix.truncate(prefix.len() - "\"data\"".len());
        let mut header_text = String::from_utf8(prefix)
            .map_err(|_| AnalysisError::InvalidInput("trajectory document is not UTF-8".into()))?;
        let trimmed = header_text.trim_end().trim_end_matches(',').to_owned();
        header_text = format!("{trimmed}}}");
        let header: CollectionHeader = serde_json::from_str(&header_text)?;

        // skip to the opening bracket of the data array
        loop {
            match read_byte(&mut reader)? {
                Some(b'[') => break,
                Some(byte) if byte.is_ascii_whitespace() || byte == b':' => {}
                _ => {
                    return Err(AnalysisError::InvalidInput(
                        "no data array in trajectory document".into(),
                    ))
                }
            }
        }

        Ok(TrajectoryReader {
            reader,
            header,
            finished: false,
        })
    }

    /// The collection header.
    pub fn header(&self) -> &CollectionHeader {
        &self.header
    }

    /// Scan the next balanced trajectory object from the data array.
    ///
    fn next_object(&mut self) -> Result<Option<String>, AnalysisError> {
        if self.finished {
            return Ok(None);
        }

        // skip separators to the start of the next object
        loop {
            match read_byte(&mut self.reader)? {
                Some(b'{') => break,
                Some(b']') | None => {
                    self.finished = true;
                    return Ok(None);
                }
                Some(byte) if byte.is_ascii_whitespace() || byte == b',' => {}
                Some(byte) => {
                    return Err(AnalysisError::InvalidInput(format!(
                        "unexpected byte {byte:#x} in data array"
                    )))
                }
            }
        }

        let mut object = vec![b'{'];
        let mut depth = 1_usize;
        let mut in_string = false;
        let mut escaped = false;
        while depth > 0 {
            let byte = read_byte(&mut self.reader)?.ok_or_else(|| {
                AnalysisError::InvalidInput("unterminated trajectory object".into())
            })?;
            object.push(byte);
            if escaped {
                escaped = false;
                continue;
            }
            match byte {
                b'\\' if in_string => escaped = true,
                b'"' => in_string = !in_string,
                b'{' if !in_string => depth += 1,
                b'}' if !in_string => depth -= 1,
                _ => {}
            }
        }

        String::from_utf8(object)
            .map(Some)
            .map_err(|_| AnalysisError::InvalidInput("trajectory document is not UTF-8".into()))
    }
}

fn read_byte<R: BufRead>(reader: &mut R) -> Result<Option<u8>, AnalysisError> {
    let mut byte = [0_u8; 1];
    match reader.read(&mut byte)? {
        0 => Ok(None),
        _ => Ok(Some(byte[0])),
    }
}

impl<R: BufRead> Iterator for TrajectoryReader<R> {
    type Item = Result<SmoothedTrajectory, AnalysisError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_object() {
            Ok(Some(text)) => Some(serde_json::from_str(&text).map_err(AnalysisError::from)),
            Ok(None) => None,
            Err(e) => Some(Err(e)),
        }
    }
}
