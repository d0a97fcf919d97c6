//! Rotation refinement by silhouette overlap.
//!
//! Moment-based orientation is only defined up to 180 degrees and is
//! unstable for near-symmetric parts. The refiner searches rotation offsets
//! around the moment estimate in three bounded stages (coarse sweep, local
//! bracket, fine linear sweep) that all run through [`run_stage`].

mod observer;
mod params;
mod refiner;
mod scorer;
mod search;

pub use observer::{AlignmentObserver, Stage};
pub use params::{Neighborhood, RefinerParams, StageSpec, StepPolicy, StopPolicy};
pub use refiner::{AlignmentRefiner, Refinement};
pub use scorer::{OverlapScorer, RasterOverlap};
pub use search::{run_stage, StageOutcome};
