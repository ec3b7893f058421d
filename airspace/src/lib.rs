//! Airspace and airport intersections for smoothed trajectories.
//!
//! The resolver consumes a `SmoothedTrajectory` and a geometry oracle
//! (the only component allowed to block) and produces ordered 3D
//! entry/exit events for sector volumes, user defined volumes and
//! airport cylinders.
//!

mod cylinders;
mod driver;
mod error;
mod oracle;
mod output;
mod sectors;
mod volume;

pub use cylinders::*;
pub use driver::*;
pub use error::*;
pub use oracle::*;
pub use output::*;
pub use sectors::*;
pub use volume::*;
