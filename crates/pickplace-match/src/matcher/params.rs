use serde::{Deserialize, Serialize};

/// Parameters of [`ContourMatcher`](super::ContourMatcher).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatcherParams {
    /// Area-ratio similarity (0..=100) a pair must strictly exceed to match.
    pub similarity_threshold: f64,
    /// Detected contours with fewer points are reported unmatched without
    /// being scored.
    pub min_contour_points: usize,
}

impl Default for MatcherParams {
    fn default() -> Self {
        Self {
            similarity_threshold: 80.0,
            min_contour_points: 3,
        }
    }
}
