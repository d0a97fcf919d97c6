use nalgebra::Point2;
use pickplace_core::Contour;
use serde::{Deserialize, Serialize};

use crate::NestingError;

/// Size of a part once it has been turned to lie along the X axis.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Footprint {
    /// Long side of the minimum-area rectangle.
    pub width: f64,
    /// Short side of the minimum-area rectangle.
    pub height: f64,
    /// Rectangle center in the levelled frame.
    pub center: Point2<f64>,
    /// Part contour rotated by `-orientation_deg` about the pivot.
    pub levelled: Contour,
}

impl Footprint {
    /// Rotate `contour` by `-orientation_deg` about `pivot` and measure its
    /// minimum-area rectangle, sides ordered so `width >= height`.
    pub fn measure(
        contour: &Contour,
        orientation_deg: f64,
        pivot: Point2<f64>,
    ) -> Result<Self, NestingError> {
        let levelled = contour.rotated(-orientation_deg, pivot);
        let rect = levelled
            .min_area_rect()
            .ok_or(NestingError::EmptyFootprint)?;
        let (width, height) = rect.sides_long_short();
        if height <= 0.0 || !height.is_finite() || !width.is_finite() {
            return Err(NestingError::EmptyFootprint);
        }
        Ok(Self {
            width,
            height,
            center: rect.center,
            levelled,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn measures_turned_rectangle() {
        let upright = Contour::from_xy(&[[0.0, 0.0], [30.0, 0.0], [30.0, 90.0], [0.0, 90.0]]);
        let turned = upright.rotated(25.0, Point2::new(15.0, 45.0));
        let fp = Footprint::measure(&turned, 25.0, Point2::new(15.0, 45.0)).expect("footprint");
        assert_abs_diff_eq!(fp.width, 90.0, epsilon = 1e-9);
        assert_abs_diff_eq!(fp.height, 30.0, epsilon = 1e-9);
        assert_abs_diff_eq!(fp.center.x, 15.0, epsilon = 1e-9);
        assert_abs_diff_eq!(fp.center.y, 45.0, epsilon = 1e-9);
    }

    #[test]
    fn flat_contour_has_no_footprint() {
        let flat = Contour::from_xy(&[[0.0, 0.0], [10.0, 0.0], [20.0, 0.0]]);
        assert_eq!(
            Footprint::measure(&flat, 0.0, Point2::origin()),
            Err(NestingError::EmptyFootprint)
        );
    }
}
