//! Robot-frame poses for picking and placing matched parts.
//!
//! Pixel coordinates go through a camera-to-robot homography (plus an
//! optional fixed frame rotation). Tool offsets are defined in the tool's own
//! frame, so they are rotated by the final yaw of the gripper before being
//! added to the target point.

mod calibration;
mod error;
mod frame;
mod pipeline;
mod pose;

pub use calibration::{CalibrationConfig, GripperProfile};
pub use error::PoseError;
pub use frame::CameraToRobot;
pub use pipeline::{choose_yaw_deg, CoordinateTransformPipeline, DropPlan, PickupPlan};
pub use pose::RobotPose;
