//! Region of the camera image the robot can reach for pickup.

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::Contour;

/// Polygonal pickup region in camera pixels, usually the four corners of the
/// conveyor or table window.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PickupArea {
    pub corners: Vec<Point2<f64>>,
}

/// Contours split by [`PickupArea::split`], in input order.
#[derive(Clone, Debug, Default)]
pub struct PickupAreaSplit<'a> {
    pub inside: Vec<&'a Contour>,
    pub rejected: Vec<&'a Contour>,
}

impl PickupArea {
    pub fn new(corners: Vec<Point2<f64>>) -> Self {
        Self { corners }
    }

    /// Even-odd point-in-polygon test. Points exactly on an edge may land on
    /// either side.
    pub fn contains(&self, p: Point2<f64>) -> bool {
        let n = self.corners.len();
        if n < 3 {
            return false;
        }
        let mut inside = false;
        let mut j = n - 1;
        for i in 0..n {
            let a = self.corners[i];
            let b = self.corners[j];
            if (a.y > p.y) != (b.y > p.y) {
                let x = a.x + (p.y - a.y) * (b.x - a.x) / (b.y - a.y);
                if p.x < x {
                    inside = !inside;
                }
            }
            j = i;
        }
        inside
    }

    /// A contour is accepted when all of its points and all four corners of
    /// its bounding box lie inside the area.
    pub fn contains_contour(&self, contour: &Contour) -> bool {
        let Some(bb) = contour.bounding_box() else {
            return false;
        };
        contour.points().iter().all(|&p| self.contains(p))
            && bb.corners().iter().all(|&p| self.contains(p))
    }

    pub fn split<'a>(&self, contours: &'a [Contour]) -> PickupAreaSplit<'a> {
        let mut out = PickupAreaSplit::default();
        for c in contours {
            if self.contains_contour(c) {
                out.inside.push(c);
            } else {
                out.rejected.push(c);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn area() -> PickupArea {
        PickupArea::new(vec![
            Point2::new(100.0, 50.0),
            Point2::new(900.0, 60.0),
            Point2::new(920.0, 700.0),
            Point2::new(80.0, 690.0),
        ])
    }

    #[test]
    fn point_membership() {
        let a = area();
        assert!(a.contains(Point2::new(500.0, 400.0)));
        assert!(!a.contains(Point2::new(50.0, 400.0)));
        assert!(!a.contains(Point2::new(500.0, 10.0)));
    }

    #[test]
    fn split_keeps_input_order() {
        let inside1 = Contour::from_xy(&[[200.0, 200.0], [260.0, 200.0], [260.0, 240.0]]);
        let straddling = Contour::from_xy(&[[850.0, 300.0], [960.0, 300.0], [960.0, 340.0]]);
        let inside2 = Contour::from_xy(&[[400.0, 600.0], [450.0, 600.0], [450.0, 650.0]]);
        let contours = vec![inside1.clone(), straddling.clone(), inside2.clone()];

        let split = area().split(&contours);
        assert_eq!(split.inside, vec![&inside1, &inside2]);
        assert_eq!(split.rejected, vec![&straddling]);
    }

    #[test]
    fn bounding_box_corner_outside_rejects() {
        // A thin diagonal triangle whose box corner pokes out past the slanted edge.
        let a = PickupArea::new(vec![
            Point2::new(0.0, 0.0),
            Point2::new(100.0, 0.0),
            Point2::new(0.0, 100.0),
        ]);
        let c = Contour::from_xy(&[[10.0, 10.0], [80.0, 10.0], [10.0, 80.0]]);
        assert!(c.points().iter().all(|&p| a.contains(p)));
        assert!(!a.contains_contour(&c));
    }
}
