use log::debug;
use nalgebra::{Point2, Vector2};
use pickplace_core::{normalize_angle_deg, rotate_point, Contour, GripperId};
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{CalibrationConfig, CameraToRobot, GripperProfile, PoseError, RobotPose};

/// Pick the final tool yaw for a part with orientation `orientation_deg`.
///
/// Both `reference - orientation` and `reference + orientation` are valid
/// grips; the one with the smaller magnitude after normalization to
/// (-180, 180] is returned, the first one on ties.
pub fn choose_yaw_deg(reference_deg: f64, orientation_deg: f64) -> f64 {
    let a = normalize_angle_deg(reference_deg - orientation_deg);
    let b = normalize_angle_deg(reference_deg + orientation_deg);
    if a.abs() <= b.abs() {
        a
    } else {
        b
    }
}

/// Ordered pickup motion.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PickupPlan {
    pub descent: RobotPose,
    pub contact: RobotPose,
    pub lift: RobotPose,
    /// Above the part without tool offset, for the height sensor.
    pub height_probe: RobotPose,
    pub yaw_deg: f64,
    /// Flange height at contact, mm.
    pub pickup_z_mm: f64,
}

impl PickupPlan {
    /// Descent, contact and lift in execution order.
    pub fn sequence(&self) -> [RobotPose; 3] {
        [self.descent, self.contact, self.lift]
    }
}

/// Ordered drop-off motion.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DropPlan {
    pub approach_high: RobotPose,
    pub approach_low: RobotPose,
    pub yaw_deg: f64,
}

impl DropPlan {
    pub fn sequence(&self) -> [RobotPose; 2] {
        [self.approach_high, self.approach_low]
    }
}

/// Turns pixel-space results into robot poses.
#[derive(Clone, Debug)]
pub struct CoordinateTransformPipeline {
    camera: CameraToRobot,
    config: CalibrationConfig,
}

impl CoordinateTransformPipeline {
    pub fn new(config: CalibrationConfig) -> Result<Self, PoseError> {
        config.validate()?;
        let camera = CameraToRobot::new(config.homography, config.frame_rotation_deg)?;
        Ok(Self { camera, config })
    }

    #[inline]
    pub fn config(&self) -> &CalibrationConfig {
        &self.config
    }

    #[inline]
    pub fn camera(&self) -> &CameraToRobot {
        &self.camera
    }

    #[inline]
    pub fn pixel_to_world(&self, p: Point2<f64>) -> Point2<f64> {
        self.camera.pixel_to_world(p)
    }

    #[inline]
    pub fn contour_to_world(&self, contour: &Contour) -> Contour {
        self.camera.contour_to_world(contour)
    }

    pub fn gripper(&self, id: GripperId) -> Result<&GripperProfile, PoseError> {
        self.config.gripper(id)
    }

    /// Tool offset expressed in world coordinates for a tool turned by `yaw_deg`.
    pub fn rotated_tool_offset(&self, yaw_deg: f64) -> Vector2<f64> {
        let tip = rotate_point(Point2::from(self.config.tool_offset_mm), yaw_deg, Point2::origin());
        tip.coords
    }

    /// Pickup motion for a part whose pickup point is `world` (robot mm) and
    /// whose orientation in the robot frame is `orientation_deg`.
    ///
    /// `thickness_mm` is the measured or nominal part height.
    #[cfg_attr(feature = "tracing", instrument(level = "debug", skip(self)))]
    pub fn pickup_plan(
        &self,
        world: Point2<f64>,
        orientation_deg: f64,
        gripper: GripperId,
        thickness_mm: f64,
    ) -> Result<PickupPlan, PoseError> {
        let profile = self.gripper(gripper)?;
        if !world.x.is_finite() || !world.y.is_finite() {
            return Err(PoseError::NonFinite {
                what: "pickup point",
            });
        }
        if !orientation_deg.is_finite() || !thickness_mm.is_finite() {
            return Err(PoseError::NonFinite {
                what: "part orientation or thickness",
            });
        }

        let yaw_deg = choose_yaw_deg(profile.reference_yaw_deg, orientation_deg);
        let target = world + self.rotated_tool_offset(yaw_deg);
        let cfg = &self.config;
        let descent_z = cfg.z_min_mm + cfg.descent_clearance_mm;
        let pickup_z_mm = cfg.z_min_mm + profile.z_offset_mm + thickness_mm;

        let plan = PickupPlan {
            descent: RobotPose::downward(target.x, target.y, descent_z, yaw_deg),
            contact: RobotPose::downward(target.x, target.y, pickup_z_mm, yaw_deg),
            lift: RobotPose::downward(target.x, target.y, descent_z, yaw_deg),
            height_probe: RobotPose::downward(world.x, world.y, descent_z, yaw_deg),
            yaw_deg,
            pickup_z_mm,
        };
        debug!(
            "{gripper} pickup at {} (orientation {orientation_deg:.2}, yaw {yaw_deg:.2})",
            plan.contact
        );
        Ok(plan)
    }

    /// Drop-off motion for a part whose pickup point must land on `world`.
    pub fn drop_plan(
        &self,
        world: Point2<f64>,
        gripper: GripperId,
        pickup_z_mm: f64,
    ) -> Result<DropPlan, PoseError> {
        let profile = self.gripper(gripper)?;
        if !world.x.is_finite() || !world.y.is_finite() || !pickup_z_mm.is_finite() {
            return Err(PoseError::NonFinite {
                what: "drop-off point",
            });
        }
        let yaw_deg = normalize_angle_deg(profile.drop_yaw_deg);
        let target = world + self.rotated_tool_offset(yaw_deg);
        let cfg = &self.config;
        Ok(DropPlan {
            approach_high: RobotPose::downward(
                target.x,
                target.y,
                pickup_z_mm + cfg.drop_high_mm,
                yaw_deg,
            ),
            approach_low: RobotPose::downward(
                target.x,
                target.y,
                pickup_z_mm + cfg.drop_low_mm,
                yaw_deg,
            ),
            yaw_deg,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use pickplace_core::Homography;

    fn pipeline() -> CoordinateTransformPipeline {
        CoordinateTransformPipeline::new(CalibrationConfig {
            homography: Homography::from_array([
                [0.5, 0.0, -100.0],
                [0.0, 0.5, 300.0],
                [0.0, 0.0, 1.0],
            ]),
            z_min_mm: 10.0,
            ..CalibrationConfig::default()
        })
        .expect("pipeline")
    }

    #[test]
    fn yaw_choice_prefers_smaller_magnitude() {
        assert_abs_diff_eq!(choose_yaw_deg(90.0, 30.0), 60.0);
        assert_abs_diff_eq!(choose_yaw_deg(90.0, -30.0), 60.0);
        assert_abs_diff_eq!(choose_yaw_deg(0.0, 170.0), -170.0);
        assert_abs_diff_eq!(choose_yaw_deg(90.0, 135.0), -45.0);
        // both candidates equal in magnitude: first wins
        assert_abs_diff_eq!(choose_yaw_deg(0.0, 45.0), -45.0);
    }

    #[test]
    fn single_gripper_pickup_sequence() {
        let p = pipeline();
        let world = p.pixel_to_world(Point2::new(400.0, 200.0));
        assert_abs_diff_eq!(world.x, 100.0);
        assert_abs_diff_eq!(world.y, 400.0);

        let plan = p.pickup_plan(world, 20.0, GripperId(0), 6.0).expect("plan");
        assert_abs_diff_eq!(plan.yaw_deg, 70.0);
        let (s, c) = 70.0_f64.to_radians().sin_cos();
        let off = Vector2::new(100.429 * c - 1.991 * s, 100.429 * s + 1.991 * c);
        assert_abs_diff_eq!(plan.contact.x, 100.0 + off.x, epsilon = 1e-9);
        assert_abs_diff_eq!(plan.contact.y, 400.0 + off.y, epsilon = 1e-9);
        assert_abs_diff_eq!(plan.contact.z, 10.0 + 19.0 + 6.0);
        assert_abs_diff_eq!(plan.descent.z, 160.0);
        assert_eq!(plan.lift, plan.descent);
        assert_eq!((plan.contact.rx, plan.contact.ry, plan.contact.rz), (180.0, 0.0, 70.0));
        assert_abs_diff_eq!(plan.height_probe.x, 100.0);
        assert_abs_diff_eq!(plan.height_probe.y, 400.0);
        assert_eq!(plan.sequence()[1], plan.contact);
    }

    #[test]
    fn double_gripper_uses_its_own_profile() {
        let p = pipeline();
        let world = Point2::new(0.0, 500.0);
        let plan = p.pickup_plan(world, 20.0, GripperId(1), 0.0).expect("plan");
        assert_abs_diff_eq!(plan.yaw_deg, -20.0);
        assert_abs_diff_eq!(plan.pickup_z_mm, 10.0 + 14.0);

        let drop = p.drop_plan(Point2::new(-200.0, 600.0), GripperId(1), plan.pickup_z_mm).expect("drop");
        assert_abs_diff_eq!(drop.yaw_deg, -90.0);
        // offset (100.429, 1.991) turned by -90 deg is (1.991, -100.429)
        assert_abs_diff_eq!(drop.approach_low.x, -200.0 + 1.991, epsilon = 1e-9);
        assert_abs_diff_eq!(drop.approach_low.y, 600.0 - 100.429, epsilon = 1e-9);
        assert_abs_diff_eq!(drop.approach_high.z, 24.0 + 50.0);
        assert_abs_diff_eq!(drop.approach_low.z, 24.0 + 20.0);
    }

    #[test]
    fn unknown_gripper_is_not_guessed() {
        let p = pipeline();
        assert_eq!(
            p.pickup_plan(Point2::origin(), 0.0, GripperId(9), 1.0),
            Err(PoseError::UnknownGripper(GripperId(9)))
        );
        assert_eq!(
            p.drop_plan(Point2::origin(), GripperId(9), 1.0),
            Err(PoseError::UnknownGripper(GripperId(9)))
        );
    }

    #[test]
    fn offset_follows_final_yaw_not_orientation() {
        let p = pipeline();
        // reference 90, orientation 135: candidates -45 and -135 -> -45
        let plan = p.pickup_plan(Point2::origin(), 135.0, GripperId(0), 0.0).expect("plan");
        let expected = p.rotated_tool_offset(-45.0);
        assert_abs_diff_eq!(plan.contact.x, expected.x, epsilon = 1e-12);
        assert_abs_diff_eq!(plan.contact.y, expected.y, epsilon = 1e-12);
        assert_abs_diff_eq!(expected.norm(), Vector2::new(100.429, 1.991).norm(), epsilon = 1e-9);
    }
}
