use nalgebra::Point2;
use pickplace_core::{rotate_point, Contour, Homography};

use crate::PoseError;

/// Camera pixel <-> robot XY mapping.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraToRobot {
    forward: Homography,
    inverse: Homography,
    frame_rotation_deg: f64,
}

impl CameraToRobot {
    pub fn new(homography: Homography, frame_rotation_deg: f64) -> Result<Self, PoseError> {
        if !frame_rotation_deg.is_finite() {
            return Err(PoseError::NonFinite {
                what: "frame rotation",
            });
        }
        let inverse = homography.inverse().ok_or(PoseError::SingularHomography)?;
        Ok(Self {
            forward: homography,
            inverse,
            frame_rotation_deg,
        })
    }

    #[inline]
    pub fn homography(&self) -> &Homography {
        &self.forward
    }

    #[inline]
    pub fn pixel_to_world(&self, p: Point2<f64>) -> Point2<f64> {
        rotate_point(self.forward.apply(p), self.frame_rotation_deg, Point2::origin())
    }

    #[inline]
    pub fn world_to_pixel(&self, p: Point2<f64>) -> Point2<f64> {
        self.inverse
            .apply(rotate_point(p, -self.frame_rotation_deg, Point2::origin()))
    }

    pub fn contour_to_world(&self, contour: &Contour) -> Contour {
        contour.map_points(|p| self.pixel_to_world(p))
    }
}
