use log::{debug, warn};
use pickplace_core::{normalize_angle_deg, Contour, WorkpieceTemplate};

#[cfg(feature = "tracing")]
use tracing::instrument;

use super::{
    AreaRatioStrategy, MatchOutcome, MatchResult, MatchStrategy, MatcherParams, Unmatched, Verdict,
};

/// Pairs detected contours with templates.
///
/// Each detected contour is considered exactly once, in input order, and
/// takes the best accepting template. Several contours may match the same
/// template; a contour never matches twice.
#[derive(Clone, Debug)]
pub struct ContourMatcher<S = AreaRatioStrategy> {
    params: MatcherParams,
    strategy: S,
}

impl ContourMatcher<AreaRatioStrategy> {
    /// Area-ratio matcher using `params.similarity_threshold`.
    pub fn new(params: MatcherParams) -> Self {
        let strategy = AreaRatioStrategy::new(params.similarity_threshold);
        Self { params, strategy }
    }
}

impl Default for ContourMatcher<AreaRatioStrategy> {
    fn default() -> Self {
        Self::new(MatcherParams::default())
    }
}

impl<S: MatchStrategy> ContourMatcher<S> {
    pub fn with_strategy(params: MatcherParams, strategy: S) -> Self {
        Self { params, strategy }
    }

    #[inline]
    pub fn params(&self) -> &MatcherParams {
        &self.params
    }

    #[inline]
    pub fn strategy(&self) -> &S {
        &self.strategy
    }

    /// Match every detected contour against `templates`.
    ///
    /// Inputs are left untouched; contours nobody accepted are returned in
    /// [`MatchOutcome::unmatched`].
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip_all, fields(templates = templates.len(), contours = detected.len()))
    )]
    pub fn match_contours<'a>(
        &self,
        templates: &'a [WorkpieceTemplate],
        detected: &[Contour],
    ) -> MatchOutcome<'a> {
        let mut outcome = MatchOutcome::default();

        for (contour_index, contour) in detected.iter().enumerate() {
            if contour.len() < self.params.min_contour_points.max(3) {
                warn!(
                    "contour #{contour_index} has {} points, skipping",
                    contour.len()
                );
                outcome.unmatched.push(Unmatched {
                    contour_index,
                    contour: contour.clone(),
                    best: None,
                });
                continue;
            }

            let mut best: Option<(usize, Verdict)> = None;
            for (template_index, template) in templates.iter().enumerate() {
                let verdict = self.strategy.evaluate(template, contour);
                debug!(
                    "contour #{contour_index} vs {:?}: {:?} {:.2}",
                    template.id, verdict.kind, verdict.confidence
                );
                if verdict.beats(best.as_ref().map(|(_, v)| v)) {
                    best = Some((template_index, verdict));
                }
            }

            match best {
                Some((template_index, verdict)) if verdict.is_match() => {
                    let m = build_match(
                        &templates[template_index],
                        template_index,
                        contour_index,
                        contour,
                        verdict,
                    );
                    debug!(
                        "contour #{contour_index} -> {:?} (score {:.2}, rotation {:.2} deg)",
                        m.template_id(),
                        m.score(),
                        m.rotation_delta_deg
                    );
                    outcome.matches.push(m);
                }
                best => outcome.unmatched.push(Unmatched {
                    contour_index,
                    contour: contour.clone(),
                    best,
                }),
            }
        }

        outcome
    }
}

fn build_match<'a>(
    template: &'a WorkpieceTemplate,
    template_index: usize,
    contour_index: usize,
    contour: &Contour,
    verdict: Verdict,
) -> MatchResult<'a> {
    let contour = contour.ensure_closed();
    let template_orientation_deg = template.main_contour.orientation_deg();
    let contour_orientation_deg = contour.orientation_deg();
    MatchResult {
        template,
        template_index,
        contour_index,
        centroid_delta: contour.centroid() - template.main_contour.centroid(),
        rotation_delta_deg: normalize_angle_deg(contour_orientation_deg - template_orientation_deg),
        template_orientation_deg,
        contour_orientation_deg,
        contour,
        verdict,
    }
}
