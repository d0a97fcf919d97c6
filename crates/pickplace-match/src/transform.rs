//! Rigid transform of a whole template onto its matched contour.

use std::collections::BTreeMap;

use log::{debug, warn};
use nalgebra::{Point2, Vector2};
use pickplace_core::{normalize_angle_deg, rotate_point, Contour, GripperId, PatternEntry};
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{
    AlignError, AlignmentObserver, AlignmentRefiner, MatchResult, OverlapScorer, RasterOverlap,
    Refinement, RefinerParams,
};

/// Template geometry moved onto a detected part.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AlignedWorkpieceInstance {
    pub template_id: String,
    /// Index of the detected contour this instance was aligned to.
    pub contour_index: usize,
    pub gripper: GripperId,
    pub height_mm: f64,
    pub main_contour: Contour,
    pub pattern_groups: BTreeMap<String, Vec<PatternEntry>>,
    /// Template pickup point override after the transform, if the template has one.
    pub pickup_point: Option<Point2<f64>>,
    /// Moment-based rotation applied about the template centroid.
    pub rotation_deg: f64,
    /// Refinement result when refinement ran, applied or not.
    pub refinement: Option<Refinement>,
    pub refinement_applied: bool,
    /// Score of the originating match.
    pub confidence: f64,
}

impl AlignedWorkpieceInstance {
    /// Total rotation from template to part.
    pub fn total_rotation_deg(&self) -> f64 {
        match (self.refinement, self.refinement_applied) {
            (Some(r), true) => normalize_angle_deg(self.rotation_deg + r.rotation_deg),
            _ => self.rotation_deg,
        }
    }

    /// Where the part is picked: the transformed override, or the centroid of
    /// the aligned main contour.
    pub fn pickup_location(&self) -> Point2<f64> {
        self.pickup_point
            .unwrap_or_else(|| self.main_contour.centroid())
    }

    /// Overlap reached by the refiner, for diagnostics.
    pub fn overlap(&self) -> Option<f64> {
        self.refinement.map(|r| r.overlap)
    }
}

/// Geometry being moved, kept together so every step touches all of it.
struct Moving {
    main: Contour,
    groups: BTreeMap<String, Vec<PatternEntry>>,
    pickup: Option<Point2<f64>>,
}

impl Moving {
    fn rotate(&mut self, angle_deg: f64, pivot: Point2<f64>) {
        self.main.rotate_in_place(angle_deg, pivot);
        for entry in self.groups.values_mut().flatten() {
            entry.contour.rotate_in_place(angle_deg, pivot);
        }
        if let Some(p) = self.pickup.as_mut() {
            *p = rotate_point(*p, angle_deg, pivot);
        }
    }

    fn translate(&mut self, delta: Vector2<f64>) {
        self.main.translate_in_place(delta);
        for entry in self.groups.values_mut().flatten() {
            entry.contour.translate_in_place(delta);
        }
        if let Some(p) = self.pickup.as_mut() {
            *p += delta;
        }
    }
}

/// Applies matched rotation and translation (and optionally a refinement)
/// to every piece of a template's geometry.
///
/// Order is fixed: rotate about the template's original centroid, translate
/// by the centroid delta, then rotate by the refinement about the new
/// centroid.
#[derive(Clone, Debug)]
pub struct TransformApplier<S = RasterOverlap> {
    refiner: Option<AlignmentRefiner<S>>,
    apply_threshold_deg: f64,
}

impl TransformApplier<RasterOverlap> {
    pub fn new(params: RefinerParams) -> Self {
        Self::with_refiner(AlignmentRefiner::new(params))
    }

    /// Applier that only uses the moment-based rotation.
    pub fn without_refinement() -> Self {
        Self {
            refiner: None,
            apply_threshold_deg: RefinerParams::default().apply_threshold_deg,
        }
    }
}

impl Default for TransformApplier<RasterOverlap> {
    fn default() -> Self {
        Self::new(RefinerParams::default())
    }
}

impl<S: OverlapScorer> TransformApplier<S> {
    pub fn with_refiner(refiner: AlignmentRefiner<S>) -> Self {
        let apply_threshold_deg = refiner.params().apply_threshold_deg;
        Self {
            refiner: Some(refiner),
            apply_threshold_deg,
        }
    }

    #[inline]
    pub fn refiner(&self) -> Option<&AlignmentRefiner<S>> {
        self.refiner.as_ref()
    }

    /// Transform with an externally supplied refinement (or none).
    ///
    /// The refinement is applied only when it exceeds the apply threshold.
    pub fn apply(
        &self,
        m: &MatchResult<'_>,
        refinement: Option<Refinement>,
    ) -> Result<AlignedWorkpieceInstance, AlignError> {
        let mut moving = self.place(m)?;
        Ok(self.finish(m, &mut moving, refinement))
    }

    /// Place the template, refine against the detected contour and finish.
    pub fn align(&self, m: &MatchResult<'_>) -> Result<AlignedWorkpieceInstance, AlignError> {
        self.align_observed(m, &mut ())
    }

    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip_all, fields(template = %m.template.id, contour = m.contour_index))
    )]
    pub fn align_observed(
        &self,
        m: &MatchResult<'_>,
        observer: &mut dyn AlignmentObserver,
    ) -> Result<AlignedWorkpieceInstance, AlignError> {
        let mut moving = self.place(m)?;
        let refinement = match &self.refiner {
            None => None,
            Some(refiner) => match refiner.refine_observed(&moving.main, &m.contour, observer) {
                Ok(r) => Some(r),
                Err(err @ AlignError::DegenerateOverlapInput(_)) => {
                    warn!(
                        "template {:?} on contour #{}: {err}; keeping moment rotation",
                        m.template.id, m.contour_index
                    );
                    None
                }
                Err(err) => return Err(err),
            },
        };
        Ok(self.finish(m, &mut moving, refinement))
    }

    /// Align a batch. Each item succeeds or fails on its own.
    pub fn align_all(
        &self,
        matches: &[MatchResult<'_>],
    ) -> Vec<Result<AlignedWorkpieceInstance, AlignError>> {
        matches.iter().map(|m| self.align(m)).collect()
    }

    // Steps 1 and 2: rotate about the original centroid, then translate.
    fn place(&self, m: &MatchResult<'_>) -> Result<Moving, AlignError> {
        let template = m.template;
        template
            .main_contour
            .validate()
            .map_err(|source| AlignError::InvalidTemplateGeometry {
                template_id: template.id.clone(),
                source,
            })?;

        let mut moving = Moving {
            main: template.main_contour.clone(),
            groups: template.pattern_groups.clone(),
            pickup: template.pickup_point(),
        };
        let pivot = template.main_contour.centroid();
        moving.rotate(m.rotation_delta_deg, pivot);
        moving.translate(m.centroid_delta);
        Ok(moving)
    }

    // Step 3 plus bookkeeping.
    fn finish(
        &self,
        m: &MatchResult<'_>,
        moving: &mut Moving,
        refinement: Option<Refinement>,
    ) -> AlignedWorkpieceInstance {
        let refinement_applied = refinement
            .as_ref()
            .is_some_and(|r| r.is_significant(self.apply_threshold_deg));
        if let (true, Some(r)) = (refinement_applied, refinement.as_ref()) {
            let pivot = moving.main.centroid();
            moving.rotate(r.rotation_deg, pivot);
        }
        debug!(
            "aligned {:?} on contour #{}: rotation {:.2} deg, refinement {:?} (applied: {})",
            m.template.id,
            m.contour_index,
            m.rotation_delta_deg,
            refinement.map(|r| r.rotation_deg),
            refinement_applied
        );

        AlignedWorkpieceInstance {
            template_id: m.template.id.clone(),
            contour_index: m.contour_index,
            gripper: m.template.gripper,
            height_mm: m.template.height_mm,
            main_contour: std::mem::take(&mut moving.main),
            pattern_groups: std::mem::take(&mut moving.groups),
            pickup_point: moving.pickup,
            rotation_deg: m.rotation_delta_deg,
            refinement,
            refinement_applied,
            confidence: m.verdict.confidence,
        }
    }
}
