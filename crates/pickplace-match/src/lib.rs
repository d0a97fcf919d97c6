//! Matching detected contours to workpiece templates and aligning the
//! templates onto them.
//!
//! The flow for one camera frame is:
//! - [`ContourMatcher`] pairs each detected contour with the most similar
//!   template,
//! - [`AlignmentRefiner`] resolves the rotation ambiguity of moment-based
//!   orientation by maximizing silhouette overlap,
//! - [`TransformApplier`] moves the whole template (main contour, pattern
//!   groups, pickup point) onto the detected part.

mod error;
mod matcher;
mod refine;
mod transform;

pub use error::AlignError;
pub use matcher::{
    area_similarity, AreaRatioStrategy, ClassifierStrategy, ContourMatcher, MatchOutcome,
    MatchResult, MatchStrategy, MatcherParams, ShapeClassifier, Unmatched, Verdict, VerdictKind,
};
pub use refine::{
    run_stage, AlignmentObserver, AlignmentRefiner, Neighborhood, OverlapScorer, RasterOverlap,
    Refinement, RefinerParams, Stage, StageOutcome, StageSpec, StepPolicy, StopPolicy,
};
pub use transform::{AlignedWorkpieceInstance, TransformApplier};
