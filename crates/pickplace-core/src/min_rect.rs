//! Convex hull and minimum-area enclosing rectangle.

use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};

use crate::contour::rotate_point;

fn cross(o: Point2<f64>, a: Point2<f64>, b: Point2<f64>) -> f64 {
    (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
}

/// Convex hull by Andrew's monotone chain, counter-clockwise in a y-up frame,
/// without a repeated closing point. Collinear points are dropped.
pub fn convex_hull(points: &[Point2<f64>]) -> Vec<Point2<f64>> {
    let mut pts: Vec<Point2<f64>> = points
        .iter()
        .copied()
        .filter(|p| p.x.is_finite() && p.y.is_finite())
        .collect();
    pts.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));
    pts.dedup();
    if pts.len() < 3 {
        return pts;
    }

    let mut hull: Vec<Point2<f64>> = Vec::with_capacity(2 * pts.len());
    for &p in &pts {
        while hull.len() >= 2 && cross(hull[hull.len() - 2], hull[hull.len() - 1], p) <= 0.0 {
            hull.pop();
        }
        hull.push(p);
    }
    let lower_len = hull.len() + 1;
    for &p in pts.iter().rev().skip(1) {
        while hull.len() >= lower_len
            && cross(hull[hull.len() - 2], hull[hull.len() - 1], p) <= 0.0
        {
            hull.pop();
        }
        hull.push(p);
    }
    hull.pop();
    hull
}

/// Rotated rectangle of minimal area enclosing a point set.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MinAreaRect {
    pub center: Point2<f64>,
    /// Extent along the direction given by `angle_deg`.
    pub width: f64,
    /// Extent perpendicular to `angle_deg`.
    pub height: f64,
    /// Direction of the `width` side, degrees.
    pub angle_deg: f64,
}

impl MinAreaRect {
    /// Rotating calipers over the convex hull. `None` for an empty input.
    pub fn from_points(points: &[Point2<f64>]) -> Option<Self> {
        let hull = convex_hull(points);
        match hull.len() {
            0 => None,
            1 => Some(Self {
                center: hull[0],
                width: 0.0,
                height: 0.0,
                angle_deg: 0.0,
            }),
            2 => {
                let d = hull[1] - hull[0];
                Some(Self {
                    center: Point2::from((hull[0].coords + hull[1].coords) * 0.5),
                    width: d.norm(),
                    height: 0.0,
                    angle_deg: d.y.atan2(d.x).to_degrees(),
                })
            }
            n => {
                let mut best: Option<(f64, Self)> = None;
                for i in 0..n {
                    let edge = hull[(i + 1) % n] - hull[i];
                    let len = edge.norm();
                    if len <= f64::EPSILON {
                        continue;
                    }
                    let u = edge / len;
                    let v = Vector2::new(-u.y, u.x);
                    let (mut umin, mut umax) = (f64::INFINITY, f64::NEG_INFINITY);
                    let (mut vmin, mut vmax) = (f64::INFINITY, f64::NEG_INFINITY);
                    for p in &hull {
                        let pu = p.coords.dot(&u);
                        let pv = p.coords.dot(&v);
                        umin = umin.min(pu);
                        umax = umax.max(pu);
                        vmin = vmin.min(pv);
                        vmax = vmax.max(pv);
                    }
                    let area = (umax - umin) * (vmax - vmin);
                    if best.as_ref().is_none_or(|(a, _)| area < *a) {
                        let cu = 0.5 * (umin + umax);
                        let cv = 0.5 * (vmin + vmax);
                        best = Some((
                            area,
                            Self {
                                center: Point2::from(u * cu + v * cv),
                                width: umax - umin,
                                height: vmax - vmin,
                                angle_deg: u.y.atan2(u.x).to_degrees(),
                            },
                        ));
                    }
                }
                best.map(|(_, r)| r)
            }
        }
    }

    #[inline]
    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// `(long, short)` side lengths.
    #[inline]
    pub fn sides_long_short(&self) -> (f64, f64) {
        if self.width >= self.height {
            (self.width, self.height)
        } else {
            (self.height, self.width)
        }
    }

    pub fn corners(&self) -> [Point2<f64>; 4] {
        let hw = 0.5 * self.width;
        let hh = 0.5 * self.height;
        [
            Point2::new(self.center.x - hw, self.center.y - hh),
            Point2::new(self.center.x + hw, self.center.y - hh),
            Point2::new(self.center.x + hw, self.center.y + hh),
            Point2::new(self.center.x - hw, self.center.y + hh),
        ]
        .map(|p| rotate_point(p, self.angle_deg, self.center))
    }
}
