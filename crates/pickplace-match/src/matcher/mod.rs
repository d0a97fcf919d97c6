//! Pairing detected contours with templates.

mod params;
mod pipeline;
mod result;
mod strategy;

pub use params::MatcherParams;
pub use pipeline::ContourMatcher;
pub use result::{MatchOutcome, MatchResult, Unmatched};
pub use strategy::{
    area_similarity, AreaRatioStrategy, ClassifierStrategy, MatchStrategy, ShapeClassifier,
    Verdict, VerdictKind,
};
