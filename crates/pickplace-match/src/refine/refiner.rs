use log::debug;
use pickplace_core::{normalize_angle_deg, Contour, GeometryError};
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

use super::{run_stage, AlignmentObserver, OverlapScorer, RasterOverlap, RefinerParams, Stage};
use crate::AlignError;

/// Result of refining a rotation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Refinement {
    /// Extra rotation about the moving contour's centroid, in (-180, 180].
    pub rotation_deg: f64,
    /// Overlap reached at `rotation_deg`.
    pub overlap: f64,
    /// Overlap before refinement (rotation 0).
    pub baseline_overlap: f64,
    pub evaluations: usize,
}

impl Refinement {
    /// Whether the rotation is large enough to be worth applying.
    #[inline]
    pub fn is_significant(&self, threshold_deg: f64) -> bool {
        self.rotation_deg.abs() > threshold_deg
    }
}

/// Finds the rotation of a contour about its own centroid that maximizes
/// overlap with a target contour.
#[derive(Clone, Debug)]
pub struct AlignmentRefiner<S = RasterOverlap> {
    params: RefinerParams,
    scorer: S,
}

impl AlignmentRefiner<RasterOverlap> {
    pub fn new(params: RefinerParams) -> Self {
        let scorer = RasterOverlap::new(params.raster);
        Self { params, scorer }
    }
}

impl Default for AlignmentRefiner<RasterOverlap> {
    fn default() -> Self {
        Self::new(RefinerParams::default())
    }
}

impl<S: OverlapScorer> AlignmentRefiner<S> {
    pub fn with_scorer(params: RefinerParams, scorer: S) -> Self {
        Self { params, scorer }
    }

    #[inline]
    pub fn params(&self) -> &RefinerParams {
        &self.params
    }

    /// Refine without observing intermediate evaluations.
    pub fn refine(&self, moving: &Contour, target: &Contour) -> Result<Refinement, AlignError> {
        self.refine_observed(moving, target, &mut ())
    }

    /// Run baseline, coarse, local and fine stages, reporting every
    /// evaluation to `observer`.
    ///
    /// Fails with [`AlignError::DegenerateOverlapInput`] when either contour
    /// cannot be scored; callers then keep the unrefined rotation.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip_all, fields(moving = moving.len(), target = target.len()))
    )]
    pub fn refine_observed(
        &self,
        moving: &Contour,
        target: &Contour,
        observer: &mut dyn AlignmentObserver,
    ) -> Result<Refinement, AlignError> {
        let pivot = moving.centroid();
        let evaluate = |angle: f64| -> Result<f64, GeometryError> {
            self.scorer.overlap(&moving.rotated(angle, pivot), target)
        };

        let baseline = evaluate(0.0).map_err(AlignError::DegenerateOverlapInput)?;
        observer.on_evaluation(Stage::Baseline, 0.0, baseline);
        observer.on_stage_complete(Stage::Baseline, 0.0, baseline);

        let coarse = run_stage(
            Stage::Coarse,
            &self.params.coarse,
            0.0,
            baseline,
            evaluate,
            observer,
        )
        .map_err(AlignError::DegenerateOverlapInput)?;
        debug!(
            "coarse: {:.2} deg overlap {:.4} ({} evals)",
            coarse.angle_deg, coarse.score, coarse.evaluations
        );

        let local = run_stage(
            Stage::Local,
            &self.params.local,
            coarse.angle_deg,
            coarse.score,
            evaluate,
            observer,
        )
        .map_err(AlignError::DegenerateOverlapInput)?;
        debug!(
            "local: {:.2} deg overlap {:.4} ({} evals)",
            local.angle_deg, local.score, local.evaluations
        );

        let fine = run_stage(
            Stage::Fine,
            &self.params.fine,
            local.angle_deg,
            local.score,
            evaluate,
            observer,
        )
        .map_err(AlignError::DegenerateOverlapInput)?;

        let refinement = Refinement {
            rotation_deg: normalize_angle_deg(fine.angle_deg),
            overlap: fine.score,
            baseline_overlap: baseline,
            evaluations: 1 + coarse.evaluations + local.evaluations + fine.evaluations,
        };
        debug!(
            "refined rotation {:.2} deg, overlap {:.4} -> {:.4}",
            refinement.rotation_deg, refinement.baseline_overlap, refinement.overlap
        );
        Ok(refinement)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{Point2, Vector2};
    use pickplace_core::angular_distance_deg;

    fn l_shape() -> Contour {
        Contour::from_xy(&[
            [0.0, 0.0],
            [120.0, 0.0],
            [120.0, 30.0],
            [35.0, 30.0],
            [35.0, 80.0],
            [0.0, 80.0],
        ])
    }

    #[test]
    fn recovers_a_47_degree_turn() {
        let template = l_shape();
        let target = template.rotated(47.0, template.centroid());

        let r = AlignmentRefiner::default()
            .refine(&template, &target)
            .expect("refine");
        assert!(
            angular_distance_deg(r.rotation_deg, 47.0) <= 1.0,
            "rotation {:.3}",
            r.rotation_deg
        );
        assert!(r.overlap > 0.95, "overlap {:.4}", r.overlap);
        assert!(r.is_significant(0.1));
    }

    #[test]
    fn resolves_half_turn_ambiguity() {
        let template = l_shape();
        let target = template
            .rotated(180.0, template.centroid())
            .translated(Vector2::new(0.4, -0.3));
        let r = AlignmentRefiner::default()
            .refine(&template, &target)
            .expect("refine");
        assert!(angular_distance_deg(r.rotation_deg, 180.0) <= 1.0, "{r:?}");
    }

    #[test]
    fn final_overlap_never_drops_below_baseline() {
        let template = l_shape();
        for (angle, shift) in [(0.0, 0.0), (3.0, 2.0), (-95.0, 6.0), (160.0, -4.0)] {
            let target = template
                .rotated(angle, Point2::new(10.0, 20.0))
                .translated(Vector2::new(shift, shift));
            let r = AlignmentRefiner::default()
                .refine(&template, &target)
                .expect("refine");
            assert!(
                r.overlap >= r.baseline_overlap,
                "{angle}: {:.4} < {:.4}",
                r.overlap,
                r.baseline_overlap
            );
        }
    }

    #[test]
    fn aligned_input_needs_no_rotation() {
        let template = l_shape();
        let r = AlignmentRefiner::default()
            .refine(&template, &template)
            .expect("refine");
        assert_eq!(r.rotation_deg, 0.0);
        assert_eq!(r.overlap, 1.0);
        assert!(!r.is_significant(0.1));
    }

    #[test]
    fn observer_sees_every_stage() {
        let template = l_shape();
        let target = template.rotated(-30.0, template.centroid());
        let mut seen: Vec<(Stage, f64, f64)> = Vec::new();
        let r = AlignmentRefiner::default()
            .refine_observed(&template, &target, &mut seen)
            .expect("refine");
        assert_eq!(seen.len(), r.evaluations);
        assert_eq!(seen[0].0, Stage::Baseline);
        for stage in [Stage::Coarse, Stage::Local, Stage::Fine] {
            assert!(seen.iter().any(|(s, _, _)| *s == stage), "{stage:?} missing");
        }
    }

    #[test]
    fn degenerate_input_is_reported() {
        let template = l_shape();
        let line = Contour::from_xy(&[[0.0, 0.0], [10.0, 0.0], [20.0, 0.0]]);
        assert!(matches!(
            AlignmentRefiner::default().refine(&template, &line),
            Err(AlignError::DegenerateOverlapInput(_))
        ));
    }
}
