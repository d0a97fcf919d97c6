//! One camera frame through matching, alignment, nesting and pose planning.

use log::{debug, info, warn};
use nalgebra::Point2;
use pickplace_core::{Contour, PickupArea, WorkpieceTemplate};
use pickplace_match::{
    AlignError, AlignedWorkpieceInstance, ContourMatcher, MatchResult, MatcherParams,
    RefinerParams, TransformApplier,
};
use pickplace_nesting::{DropPlacement, NestingError, NestingPlanner, PlaneConfig, PlaneState};
use pickplace_robot::{
    CalibrationConfig, CoordinateTransformPipeline, DropPlan, PickupPlan, PoseError,
};
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Tuning of the per-frame engine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineParams {
    pub matcher: MatcherParams,
    pub refiner: RefinerParams,
    /// Run the overlap refiner after the moment-based alignment.
    pub refine: bool,
    /// Contours not fully inside this polygon (camera pixels) are skipped.
    pub pickup_area: Option<PickupArea>,
}

impl Default for EngineParams {
    fn default() -> Self {
        Self {
            matcher: MatcherParams::default(),
            refiner: RefinerParams::default(),
            refine: true,
            pickup_area: None,
        }
    }
}

/// Errors building an engine.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("calibration: {0}")]
    Pose(#[from] PoseError),
    #[error("placement plane: {0}")]
    Nesting(#[from] NestingError),
}

/// Why a single matched part could not be planned.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum PartError {
    #[error(transparent)]
    Align(#[from] AlignError),
    #[error(transparent)]
    Pose(#[from] PoseError),
    #[error(transparent)]
    Nesting(#[from] NestingError),
}

/// Serializable class of a [`PartError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    InvalidTemplateGeometry,
    /// Any other alignment failure. Degenerate overlap input never lands
    /// here: the applier falls back to the moment rotation instead.
    Alignment,
    UnknownGripper,
    PlaneFull,
    Placement,
    Pose,
}

impl PartError {
    pub fn kind(&self) -> FailureKind {
        match self {
            PartError::Align(AlignError::InvalidTemplateGeometry { .. }) => {
                FailureKind::InvalidTemplateGeometry
            }
            PartError::Align(_) => FailureKind::Alignment,
            PartError::Pose(PoseError::UnknownGripper(_)) => FailureKind::UnknownGripper,
            PartError::Pose(_) => FailureKind::Pose,
            PartError::Nesting(NestingError::PlaneFull) => FailureKind::PlaneFull,
            PartError::Nesting(_) => FailureKind::Placement,
        }
    }
}

/// Everything needed to move one part.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlannedPart {
    /// Template geometry aligned onto the part, camera pixels.
    pub instance: AlignedWorkpieceInstance,
    /// Pickup point in robot millimetres.
    pub world_pickup: Point2<f64>,
    /// Principal-axis orientation of the part in the robot frame.
    pub world_orientation_deg: f64,
    pub placement: DropPlacement,
    pub pickup: PickupPlan,
    pub drop: DropPlan,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FailedPart {
    pub contour_index: usize,
    pub template_id: String,
    pub kind: FailureKind,
    pub message: String,
}

/// Result for one matched contour.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PartOutcome {
    Planned(Box<PlannedPart>),
    Failed(FailedPart),
}

impl PartOutcome {
    pub fn contour_index(&self) -> usize {
        match self {
            PartOutcome::Planned(p) => p.instance.contour_index,
            PartOutcome::Failed(f) => f.contour_index,
        }
    }

    pub fn template_id(&self) -> &str {
        match self {
            PartOutcome::Planned(p) => &p.instance.template_id,
            PartOutcome::Failed(f) => &f.template_id,
        }
    }

    pub fn planned(&self) -> Option<&PlannedPart> {
        match self {
            PartOutcome::Planned(p) => Some(p.as_ref()),
            PartOutcome::Failed(_) => None,
        }
    }
}

/// Detected contour no template accepted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UnmatchedContour {
    pub contour_index: usize,
    pub best_template: Option<String>,
    pub best_confidence: Option<f64>,
}

/// Structured result of [`PickPlaceEngine::process_frame`].
///
/// Contour indices always refer to the detected list given to the engine.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameReport {
    pub parts: Vec<PartOutcome>,
    pub unmatched: Vec<UnmatchedContour>,
    pub outside_pickup_area: Vec<usize>,
    /// Matched contours left untouched because the plane filled up earlier
    /// in the frame.
    pub deferred: Vec<usize>,
    pub plane_full: bool,
}

impl FrameReport {
    pub fn planned(&self) -> impl Iterator<Item = &PlannedPart> {
        self.parts.iter().filter_map(PartOutcome::planned)
    }

    pub fn failed(&self) -> impl Iterator<Item = &FailedPart> {
        self.parts.iter().filter_map(|p| match p {
            PartOutcome::Failed(f) => Some(f),
            PartOutcome::Planned(_) => None,
        })
    }
}

/// Per-frame driver owning the nesting session.
///
/// Matching, alignment and pose math are stateless; the placement plane
/// keeps its cursor across frames until [`reset_plane`](Self::reset_plane).
#[derive(Clone, Debug)]
pub struct PickPlaceEngine {
    matcher: ContourMatcher,
    applier: TransformApplier,
    poses: CoordinateTransformPipeline,
    planner: NestingPlanner,
    pickup_area: Option<PickupArea>,
}

impl PickPlaceEngine {
    pub fn new(
        params: EngineParams,
        calibration: CalibrationConfig,
        plane: PlaneConfig,
    ) -> Result<Self, EngineError> {
        let applier = if params.refine {
            TransformApplier::new(params.refiner)
        } else {
            TransformApplier::without_refinement()
        };
        Ok(Self {
            matcher: ContourMatcher::new(params.matcher),
            applier,
            poses: CoordinateTransformPipeline::new(calibration)?,
            planner: NestingPlanner::new(plane)?,
            pickup_area: params.pickup_area,
        })
    }

    #[inline]
    pub fn poses(&self) -> &CoordinateTransformPipeline {
        &self.poses
    }

    #[inline]
    pub fn plane_state(&self) -> &PlaneState {
        self.planner.plane().state()
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.planner.is_full()
    }

    /// Start a new nesting session (empty drop-off plane).
    pub fn reset_plane(&mut self) {
        self.planner.reset();
    }

    /// Match, align and plan every part of one frame.
    ///
    /// A failing part is reported and skipped. Once the plane is full the
    /// remaining matches are only listed in [`FrameReport::deferred`].
    #[cfg_attr(
        feature = "tracing",
        instrument(
            level = "info",
            skip_all,
            fields(templates = templates.len(), contours = detected.len())
        )
    )]
    pub fn process_frame(
        &mut self,
        templates: &[WorkpieceTemplate],
        detected: &[Contour],
    ) -> FrameReport {
        let mut report = FrameReport::default();

        let mut kept_index = Vec::with_capacity(detected.len());
        let mut kept = Vec::with_capacity(detected.len());
        for (i, contour) in detected.iter().enumerate() {
            match &self.pickup_area {
                Some(area) if !area.contains_contour(contour) => {
                    report.outside_pickup_area.push(i)
                }
                _ => {
                    kept_index.push(i);
                    kept.push(contour.clone());
                }
            }
        }
        if !report.outside_pickup_area.is_empty() {
            info!(
                "{} contour(s) outside the pickup area",
                report.outside_pickup_area.len()
            );
        }

        let outcome = self.matcher.match_contours(templates, &kept);
        report.unmatched = outcome
            .unmatched
            .iter()
            .map(|u| UnmatchedContour {
                contour_index: kept_index[u.contour_index],
                best_template: u
                    .best
                    .and_then(|(t, _)| templates.get(t))
                    .map(|t| t.id.clone()),
                best_confidence: u.best.map(|(_, v)| v.confidence),
            })
            .collect();

        for m in &outcome.matches {
            let contour_index = kept_index[m.contour_index];
            if self.planner.is_full() {
                report.deferred.push(contour_index);
                continue;
            }
            match self.plan_part(m, contour_index) {
                Ok(part) => report.parts.push(PartOutcome::Planned(Box::new(part))),
                Err(err) => {
                    warn!("contour #{contour_index} ({}): {err}", m.template_id());
                    report.parts.push(PartOutcome::Failed(FailedPart {
                        contour_index,
                        template_id: m.template_id().to_string(),
                        kind: err.kind(),
                        message: err.to_string(),
                    }));
                }
            }
        }
        report.plane_full = self.planner.is_full();

        info!(
            "frame: {} planned, {} failed, {} unmatched, {} deferred",
            report.planned().count(),
            report.failed().count(),
            report.unmatched.len(),
            report.deferred.len()
        );
        report
    }

    fn plan_part(
        &mut self,
        m: &MatchResult<'_>,
        contour_index: usize,
    ) -> Result<PlannedPart, PartError> {
        let mut instance = self.applier.align(m)?;
        instance.contour_index = contour_index;

        let world_contour = self.poses.contour_to_world(&instance.main_contour);
        let world_pickup = self.poses.pixel_to_world(instance.pickup_location());
        let world_orientation_deg = world_contour.orientation_deg();

        // Pose checks come first so a rejected part never consumes a slot.
        let pickup = self.poses.pickup_plan(
            world_pickup,
            world_orientation_deg,
            instance.gripper,
            instance.height_mm,
        )?;
        let placement =
            self.planner
                .plan_drop(&world_contour, world_orientation_deg, world_pickup)?;
        let drop = self
            .poses
            .drop_plan(placement.drop_point, instance.gripper, pickup.pickup_z_mm)?;

        debug!(
            "{} on contour #{contour_index}: rotation {:.2} deg, pick {} drop {}",
            instance.template_id,
            instance.total_rotation_deg(),
            pickup.contact,
            drop.approach_low
        );
        Ok(PlannedPart {
            instance,
            world_pickup,
            world_orientation_deg,
            placement,
            pickup,
            drop,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pickplace_core::{GeometryError, GripperId};

    fn square(side: f64) -> Contour {
        Contour::from_xy(&[[0.0, 0.0], [side, 0.0], [side, side], [0.0, side]])
    }

    #[test]
    fn failure_kinds_follow_error_variants() {
        let cases = [
            (
                PartError::from(PoseError::UnknownGripper(GripperId(4))),
                FailureKind::UnknownGripper,
            ),
            (PartError::from(NestingError::PlaneFull), FailureKind::PlaneFull),
            (
                PartError::from(NestingError::EmptyFootprint),
                FailureKind::Placement,
            ),
            (
                PartError::from(PoseError::SingularHomography),
                FailureKind::Pose,
            ),
            (
                PartError::from(AlignError::DegenerateOverlapInput(
                    GeometryError::DegenerateSilhouette { reason: "flat" },
                )),
                FailureKind::Alignment,
            ),
        ];
        for (err, kind) in cases {
            assert_eq!(err.kind(), kind, "{err}");
        }
    }

    #[test]
    fn empty_frame_produces_empty_report() {
        let mut engine = PickPlaceEngine::new(
            EngineParams::default(),
            CalibrationConfig::default(),
            PlaneConfig::default(),
        )
        .expect("engine");
        let report = engine.process_frame(&[], &[square(10.0)]);
        assert!(report.parts.is_empty());
        assert_eq!(report.unmatched.len(), 1);
        assert_eq!(report.unmatched[0].best_template, None);
        assert!(!report.plane_full);
    }

    #[test]
    fn invalid_plane_is_rejected_up_front() {
        let plane = PlaneConfig {
            y_min: 10.0,
            y_max: 0.0,
            ..PlaneConfig::default()
        };
        assert!(matches!(
            PickPlaceEngine::new(EngineParams::default(), CalibrationConfig::default(), plane),
            Err(EngineError::Nesting(NestingError::InvalidPlane { .. }))
        ));
    }

    #[test]
    fn outcome_serializes_with_status_tag() {
        let failed = PartOutcome::Failed(FailedPart {
            contour_index: 2,
            template_id: "plate".into(),
            kind: FailureKind::PlaneFull,
            message: "placement plane is full".into(),
        });
        let json = serde_json::to_value(&failed).expect("json");
        assert_eq!(json["status"], "failed");
        assert_eq!(json["kind"], "plane_full");
        let back: PartOutcome = serde_json::from_value(json).expect("back");
        assert_eq!(back, failed);
    }
}
