use nalgebra::Vector2;
use pickplace_core::{Contour, WorkpieceTemplate};
use serde::Serialize;

use super::Verdict;

/// A detected contour paired with the template it was recognized as.
#[derive(Clone, Debug, Serialize)]
pub struct MatchResult<'a> {
    #[serde(skip)]
    pub template: &'a WorkpieceTemplate,
    pub template_index: usize,
    /// Index into the detected contour list given to the matcher.
    pub contour_index: usize,
    /// Detected contour, closed.
    pub contour: Contour,
    /// Detected centroid minus template centroid.
    pub centroid_delta: Vector2<f64>,
    /// Rotation taking the template onto the contour, in (-180, 180].
    pub rotation_delta_deg: f64,
    pub template_orientation_deg: f64,
    pub contour_orientation_deg: f64,
    pub verdict: Verdict,
}

impl MatchResult<'_> {
    #[inline]
    pub fn template_id(&self) -> &str {
        &self.template.id
    }

    #[inline]
    pub fn score(&self) -> f64 {
        self.verdict.confidence
    }
}

/// Detected contour no template accepted.
#[derive(Clone, Debug, Serialize)]
pub struct Unmatched {
    pub contour_index: usize,
    pub contour: Contour,
    /// Best verdict seen for this contour and the template that produced it;
    /// `None` when no template was scored.
    pub best: Option<(usize, Verdict)>,
}

/// Matches and leftovers of one matching pass.
#[derive(Clone, Debug, Default, Serialize)]
pub struct MatchOutcome<'a> {
    pub matches: Vec<MatchResult<'a>>,
    pub unmatched: Vec<Unmatched>,
}

impl MatchOutcome<'_> {
    pub fn matched_contours(&self) -> Vec<&Contour> {
        self.matches.iter().map(|m| &m.contour).collect()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }
}
