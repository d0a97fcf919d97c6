use std::collections::BTreeMap;

use nalgebra::Vector2;
use pickplace_core::{GripperId, Homography};
use serde::{Deserialize, Serialize};

use crate::PoseError;

/// Handling data of one gripper variant.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GripperProfile {
    pub name: String,
    /// Tool yaw that holds a part with orientation 0, degrees.
    pub reference_yaw_deg: f64,
    /// Tool yaw used when putting parts down, degrees.
    pub drop_yaw_deg: f64,
    /// Z stack-up between the flange at `z_min` and the gripping surface, mm.
    pub z_offset_mm: f64,
}

impl Default for GripperProfile {
    fn default() -> Self {
        Self {
            name: String::new(),
            reference_yaw_deg: 90.0,
            drop_yaw_deg: 0.0,
            z_offset_mm: 0.0,
        }
    }
}

impl GripperProfile {
    pub fn single() -> Self {
        Self {
            name: "single".to_string(),
            reference_yaw_deg: 90.0,
            drop_yaw_deg: 0.0,
            z_offset_mm: 19.0,
        }
    }

    /// Two-finger gripper mounted a quarter turn from the single one.
    pub fn double() -> Self {
        Self {
            name: "double".to_string(),
            reference_yaw_deg: 0.0,
            drop_yaw_deg: -90.0,
            z_offset_mm: 14.0,
        }
    }
}

/// Calibration of the cell: camera mapping, tool geometry and heights.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    /// Maps camera pixels to the robot's XY plane.
    pub homography: Homography,
    /// Fixed rotation applied after the homography, degrees.
    pub frame_rotation_deg: f64,
    /// Tool centre relative to the flange, in the tool frame, mm.
    pub tool_offset_mm: Vector2<f64>,
    /// Lowest allowed flange height, mm.
    pub z_min_mm: f64,
    /// Clearance above `z_min_mm` for descent, lift and height probing, mm.
    pub descent_clearance_mm: f64,
    /// Drop-off approach heights above the pickup height, mm.
    pub drop_high_mm: f64,
    pub drop_low_mm: f64,
    pub grippers: BTreeMap<GripperId, GripperProfile>,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            homography: Homography::identity(),
            frame_rotation_deg: 0.0,
            tool_offset_mm: Vector2::new(100.429, 1.991),
            z_min_mm: 0.0,
            descent_clearance_mm: 150.0,
            drop_high_mm: 50.0,
            drop_low_mm: 20.0,
            grippers: BTreeMap::from([
                (GripperId(0), GripperProfile::single()),
                (GripperId(1), GripperProfile::double()),
            ]),
        }
    }
}

impl CalibrationConfig {
    pub fn gripper(&self, id: GripperId) -> Result<&GripperProfile, PoseError> {
        self.grippers.get(&id).ok_or(PoseError::UnknownGripper(id))
    }

    pub fn validate(&self) -> Result<(), PoseError> {
        let scalars = [
            ("frame rotation", self.frame_rotation_deg),
            ("tool offset x", self.tool_offset_mm.x),
            ("tool offset y", self.tool_offset_mm.y),
            ("z_min", self.z_min_mm),
            ("descent clearance", self.descent_clearance_mm),
            ("drop high", self.drop_high_mm),
            ("drop low", self.drop_low_mm),
        ];
        if let Some(&(what, _)) = scalars.iter().find(|(_, v)| !v.is_finite()) {
            return Err(PoseError::NonFinite { what });
        }
        if self.homography.h.iter().any(|v| !v.is_finite()) {
            return Err(PoseError::NonFinite { what: "homography" });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_gripper_is_an_error() {
        let cfg = CalibrationConfig::default();
        assert_eq!(cfg.gripper(GripperId(1)).expect("double").name, "double");
        assert_eq!(
            cfg.gripper(GripperId(7)),
            Err(PoseError::UnknownGripper(GripperId(7)))
        );
    }

    #[test]
    fn json_round_trip_keeps_gripper_table() {
        let cfg = CalibrationConfig::default();
        let json = serde_json::to_string(&cfg).expect("ser");
        let back: CalibrationConfig = serde_json::from_str(&json).expect("de");
        assert_eq!(back, cfg);

        let partial: CalibrationConfig =
            serde_json::from_str(r#"{ "z_min_mm": 12.5, "grippers": { "3": { "z_offset_mm": 7 } } }"#)
                .expect("partial");
        assert_eq!(partial.z_min_mm, 12.5);
        assert_eq!(partial.grippers.len(), 1);
        assert_eq!(partial.gripper(GripperId(3)).expect("g3").z_offset_mm, 7.0);
        assert_eq!(partial.descent_clearance_mm, 150.0);
    }

    #[test]
    fn validation_flags_non_finite_values() {
        let cfg = CalibrationConfig {
            drop_low_mm: f64::INFINITY,
            ..CalibrationConfig::default()
        };
        assert_eq!(cfg.validate(), Err(PoseError::NonFinite { what: "drop low" }));
    }
}
