//! Drop-off placement for picked parts.
//!
//! Parts are laid out on a rectangular plane in rows, left to right, starting
//! at the top edge (`y_max`) and moving down. Placement is greedy and online:
//! a part is placed as soon as it is seen and never moved afterwards.

mod error;
mod footprint;
mod plane;
mod planner;

pub use error::NestingError;
pub use footprint::Footprint;
pub use plane::{PlacementPlane, PlacementSlot, PlaneConfig, PlaneState};
pub use planner::{DropPlacement, NestingPlanner};
