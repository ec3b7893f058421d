//! Analysis and intersection options.
//!
//! All tunables live in explicit option structs handed to the engines, so
//! there is no environment driven or global configuration in the core.
//! Options may be loaded from a version checked HCL file.
//!

use std::fs;
use std::path::Path;

use eyre::{eyre, Result};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tracing::trace;

/// Current options file version
const OPTIONS_FILE_VER: usize = 1;

/// The time smoothing methods.
///
/// `Mas` smooths ground speeds with moving median/mean filters; the other
/// three select the least squares variant of the polynomial curve fit.
///
#[derive(Clone, Copy, Debug, Default, Deserialize, Display, EnumString, Eq, PartialEq, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SmoothingMethod {
    /// Moving average speed
    #[default]
    Mas,
    /// Levenberg-Marquardt curve fit
    Lm,
    /// Trust region reflective curve fit
    Trf,
    /// Dogbox curve fit
    Dogbox,
}

impl SmoothingMethod {
    /// Whether the method is one of the polynomial curve fits.
    pub fn is_curve_fit(self) -> bool {
        !matches!(self, SmoothingMethod::Mas)
    }
}

/// Options for trajectory analysis and smoothing.
///
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct AnalysisOptions {
    /// The time smoothing method.
    pub method: SmoothingMethod,
    /// The maximum across track distance [Nautical Miles].
    pub across_track_tolerance: f64,
    /// The number of samples for the speed moving median filter.
    pub moving_median_samples: usize,
    /// The number of samples for the speed moving average filter.
    pub moving_average_samples: usize,
    /// The maximum time between positions for speed smoothing [Seconds].
    pub max_speed_duration: f64,
    /// The tolerance on the cleaned positions path length [Nautical Miles].
    pub path_length_tolerance: f64,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        AnalysisOptions {
            method: SmoothingMethod::Mas,
            across_track_tolerance: 0.5,
            moving_median_samples: 5,
            moving_average_samples: 3,
            max_speed_duration: 120.0,
            path_length_tolerance: 0.5,
        }
    }
}

/// Options for the intersection resolver and the interpolator.
///
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct IntersectionOptions {
    /// The maximum across track distance to project intersection points
    /// onto a path [Nautical Miles].
    pub across_track_tolerance: f64,
    /// The airport cylinder radius [Nautical Miles].
    pub radius: f64,
    /// The tolerance on the realised cylinder radius [Nautical Miles].
    pub distance_tolerance: f64,
    /// The interpolation interval along straight legs [Seconds].
    pub straight_interval: f64,
    /// The interpolation interval around turns [Seconds].
    pub turn_interval: f64,
}

impl Default for IntersectionOptions {
    fn default() -> Self {
        IntersectionOptions {
            across_track_tolerance: 0.5,
            radius: 40.0,
            distance_tolerance: 0.25,
            straight_interval: 5.0,
            turn_interval: 5.0,
        }
    }
}

/// On-disk structure for the options file
///
#[derive(Debug, Deserialize)]
struct OptionsFile {
    /// Version number for safety
    pub version: usize,
    /// Analysis options
    #[serde(default)]
    pub analysis: AnalysisOptions,
    /// Intersection options
    #[serde(default)]
    pub intersection: IntersectionOptions,
}

/// Load analysis and intersection options from an HCL file.
///
#[tracing::instrument]
pub fn load_options<P: AsRef<Path> + std::fmt::Debug>(
    fname: P,
) -> Result<(AnalysisOptions, IntersectionOptions)> {
    trace!("enter");

    let data = fs::read_to_string(fname)?;
    let opts: OptionsFile = hcl::from_str(&data)?;
    if opts.version != OPTIONS_FILE_VER {
        return Err(eyre!("Bad options file version, aborting…"));
    }
    Ok((opts.analysis, opts.intersection))
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::str::FromStr;

    #[test]
    fn test_method_from_str() -> Result<()> {
        assert_eq!(SmoothingMethod::from_str("mas")?, SmoothingMethod::Mas);
        assert_eq!(SmoothingMethod::from_str("lm")?, SmoothingMethod::Lm);
        assert_eq!(SmoothingMethod::from_str("dogbox")?, SmoothingMethod::Dogbox);
        assert!(SmoothingMethod::from_str("bogus").is_err());
        assert!(!SmoothingMethod::Mas.is_curve_fit());
        assert!(SmoothingMethod::Trf.is_curve_fit());
        Ok(())
    }

    #[test]
    fn test_default_options() {
        let a = AnalysisOptions::default();
        assert_eq!(a.across_track_tolerance, 0.5);
        assert_eq!(a.moving_median_samples, 5);
        assert_eq!(a.moving_average_samples, 3);
        assert_eq!(a.max_speed_duration, 120.0);

        let i = IntersectionOptions::default();
        assert_eq!(i.radius, 40.0);
        assert_eq!(i.distance_tolerance, 0.25);
        assert_eq!(i.straight_interval, 5.0);
    }

    #[test]
    fn test_options_from_hcl() -> Result<()> {
        let data = r##"
version = 1

analysis {
  method = "lm"
  across_track_tolerance = 0.25
}

intersection {
  radius = 30.0
}
"##;
        let opts: OptionsFile = hcl::from_str(data)?;
        assert_eq!(opts.version, 1);
        assert_eq!(opts.analysis.method, SmoothingMethod::Lm);
        assert_eq!(opts.analysis.across_track_tolerance, 0.25);
        // defaulted fields
        assert_eq!(opts.analysis.moving_median_samples, 5);
        assert_eq!(opts.intersection.radius, 30.0);
        assert_eq!(opts.intersection.distance_tolerance, 0.25);
        Ok(())
    }
}
