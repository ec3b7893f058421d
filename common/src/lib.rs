//! This library shares code common to all retrace crates: units, time
//! fields, logging, options and reference data.
//!

mod airports;
mod logging;
mod options;
mod series;
mod timefields;
mod units;

pub use airports::*;
pub use logging::*;
pub use options::*;
pub use series::*;
pub use timefields::*;
pub use units::*;
