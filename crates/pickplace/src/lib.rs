//! Vision-guided pick-and-place planning for a camera-over-table robot cell.
//!
//! This crate provides:
//! - stable re-exports of the `pickplace-*` crates
//! - [`PickPlaceEngine`], which runs one camera frame end to end: detected
//!   contours are matched to workpiece templates, the templates are aligned
//!   onto the parts, each part gets a slot on the drop-off plane and the
//!   pickup and drop-off poses are computed in robot coordinates
//! - JSON job and report files ([`JobConfig`], [`JobReport`]) and the
//!   `pickplace` command-line tool (feature `cli`)
//!
//! ## Quickstart
//!
//! ```no_run
//! use pickplace::JobConfig;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let job = JobConfig::load_json("job.json")?;
//! let report = job.run()?;
//! for part in report.frame.planned() {
//!     println!("{} -> {}", part.instance.template_id, part.drop.approach_low);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - `pickplace::core`: contours, moments, homographies, silhouette overlap, templates.
//! - `pickplace::matching`: contour matching, rotation refinement, template alignment.
//! - `pickplace::nesting`: drop-off plane shelf packing.
//! - `pickplace::robot`: camera-to-robot mapping and pose sequences.

pub use pickplace_core as core;
pub use pickplace_match as matching;
pub use pickplace_nesting as nesting;
pub use pickplace_robot as robot;

pub use pickplace_core::{Contour, GripperId, PickupArea, WorkpieceTemplate};
pub use pickplace_match::{AlignedWorkpieceInstance, MatcherParams, RefinerParams};
pub use pickplace_nesting::PlaneConfig;
pub use pickplace_robot::{CalibrationConfig, RobotPose};

mod engine;
mod io;

pub use engine::{
    EngineError, EngineParams, FailedPart, FailureKind, FrameReport, PartError, PartOutcome,
    PickPlaceEngine, PlannedPart, UnmatchedContour,
};
pub use io::{JobConfig, JobIoError, JobReport};
