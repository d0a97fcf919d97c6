//! Closed polygon contours and their area moments.

use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};

use crate::min_rect::{convex_hull, MinAreaRect};
use crate::GeometryError;

/// Below this magnitude `mu20` is treated as zero and the orientation is 0°.
const MU20_EPS: f64 = 1e-10;
/// Polygons whose |area| is below this are considered degenerate.
const AREA_EPS: f64 = 1e-12;
/// Tolerance used when deciding whether first and last points coincide.
const CLOSE_EPS: f64 = 1e-9;

/// Rotate `p` by `angle_deg` about `pivot`.
///
/// Positive angles turn counter-clockwise in the point's own coordinate frame
/// (`[[c, -s], [s, c]]`).
#[inline]
pub fn rotate_point(p: Point2<f64>, angle_deg: f64, pivot: Point2<f64>) -> Point2<f64> {
    let (s, c) = angle_deg.to_radians().sin_cos();
    let d = p - pivot;
    Point2::new(pivot.x + c * d.x - s * d.y, pivot.y + s * d.x + c * d.y)
}

/// Axis-aligned bounding box.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: Point2<f64>,
    pub max: Point2<f64>,
}

impl BoundingBox {
    #[inline]
    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    #[inline]
    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    #[inline]
    pub fn center(&self) -> Point2<f64> {
        Point2::new(
            0.5 * (self.min.x + self.max.x),
            0.5 * (self.min.y + self.max.y),
        )
    }

    /// Corners in the order top-left, top-right, bottom-right, bottom-left
    /// (image convention, y down).
    pub fn corners(&self) -> [Point2<f64>; 4] {
        [
            self.min,
            Point2::new(self.max.x, self.min.y),
            self.max,
            Point2::new(self.min.x, self.max.y),
        ]
    }

    /// Smallest box containing both `self` and `other`.
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            min: Point2::new(self.min.x.min(other.min.x), self.min.y.min(other.min.y)),
            max: Point2::new(self.max.x.max(other.max.x), self.max.y.max(other.max.y)),
        }
    }
}

/// Raw and central polygon moments up to second order.
///
/// Computed with Green's theorem over the polygon boundary, so the values are
/// those of the filled region. The sign is normalized so that `m00 >= 0`
/// regardless of winding direction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Moments {
    pub m00: f64,
    pub m10: f64,
    pub m01: f64,
    pub mu20: f64,
    pub mu11: f64,
    pub mu02: f64,
}

impl Moments {
    /// Principal-axis angle in degrees, `0.5 * atan2(2 mu11, mu20 - mu02)`.
    ///
    /// Returns 0 when `|mu20|` is negligible.
    pub fn orientation_deg(&self) -> f64 {
        if self.mu20.abs() < MU20_EPS {
            return 0.0;
        }
        (0.5 * (2.0 * self.mu11).atan2(self.mu20 - self.mu02)).to_degrees()
    }
}

/// Ordered boundary of a closed polygon.
///
/// The edge from the last point back to the first is implied, so a contour
/// may or may not repeat its first point at the end; see [`Contour::ensure_closed`].
/// Serialized as a plain list of `[x, y]` pairs.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Contour {
    points: Vec<Point2<f64>>,
}

impl Contour {
    pub fn new(points: Vec<Point2<f64>>) -> Self {
        Self { points }
    }

    pub fn from_xy(xy: &[[f64; 2]]) -> Self {
        xy.iter().map(|&[x, y]| Point2::new(x, y)).collect()
    }

    #[inline]
    pub fn points(&self) -> &[Point2<f64>] {
        &self.points
    }

    pub fn into_points(self) -> Vec<Point2<f64>> {
        self.points
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Check the contour can describe a polygon: at least 3 finite points.
    pub fn validate(&self) -> Result<(), GeometryError> {
        if self.points.len() < 3 {
            return Err(GeometryError::TooFewPoints {
                points: self.points.len(),
            });
        }
        if let Some(index) = self
            .points
            .iter()
            .position(|p| !p.x.is_finite() || !p.y.is_finite())
        {
            return Err(GeometryError::NonFinite { index });
        }
        Ok(())
    }

    /// True when the first and last points coincide.
    pub fn is_closed(&self) -> bool {
        match (self.points.first(), self.points.last()) {
            (Some(a), Some(b)) if self.points.len() > 1 => (a - b).norm() <= CLOSE_EPS,
            _ => false,
        }
    }

    /// Return a copy whose last point repeats the first.
    pub fn ensure_closed(&self) -> Contour {
        let mut out = self.clone();
        if let Some(&first) = self.points.first() {
            if !self.is_closed() {
                out.points.push(first);
            }
        }
        out
    }

    pub fn moments(&self) -> Moments {
        let n = self.points.len();
        if n < 3 {
            return Moments::default();
        }

        let (mut a00, mut a10, mut a01) = (0.0, 0.0, 0.0);
        let (mut a20, mut a11, mut a02) = (0.0, 0.0, 0.0);
        for i in 0..n {
            let p = self.points[i];
            let q = self.points[(i + 1) % n];
            let cross = p.x * q.y - q.x * p.y;
            a00 += cross;
            a10 += cross * (p.x + q.x);
            a01 += cross * (p.y + q.y);
            a20 += cross * (p.x * p.x + p.x * q.x + q.x * q.x);
            a11 += cross * (2.0 * p.x * p.y + p.x * q.y + q.x * p.y + 2.0 * q.x * q.y);
            a02 += cross * (p.y * p.y + p.y * q.y + q.y * q.y);
        }

        let sign = if a00 < 0.0 { -1.0 } else { 1.0 };
        let m00 = sign * a00 / 2.0;
        let m10 = sign * a10 / 6.0;
        let m01 = sign * a01 / 6.0;
        let m20 = sign * a20 / 12.0;
        let m11 = sign * a11 / 24.0;
        let m02 = sign * a02 / 12.0;

        if m00.abs() < AREA_EPS {
            return Moments {
                m00,
                m10,
                m01,
                ..Moments::default()
            };
        }

        let cx = m10 / m00;
        let cy = m01 / m00;
        Moments {
            m00,
            m10,
            m01,
            mu20: m20 - cx * m10,
            mu11: m11 - cx * m01,
            mu02: m02 - cy * m01,
        }
    }

    /// Shoelace area, positive for counter-clockwise winding in a y-up frame.
    pub fn signed_area(&self) -> f64 {
        let n = self.points.len();
        if n < 3 {
            return 0.0;
        }
        let twice: f64 = (0..n)
            .map(|i| {
                let p = self.points[i];
                let q = self.points[(i + 1) % n];
                p.x * q.y - q.x * p.y
            })
            .sum();
        0.5 * twice
    }

    #[inline]
    pub fn area(&self) -> f64 {
        self.signed_area().abs()
    }

    /// Area centroid.
    ///
    /// Falls back to the bounding-box center for zero-area contours and to the
    /// origin for empty ones.
    pub fn centroid(&self) -> Point2<f64> {
        let m = self.moments();
        if m.m00.abs() >= AREA_EPS {
            return Point2::new(m.m10 / m.m00, m.m01 / m.m00);
        }
        match self.bounding_box() {
            Some(bb) => bb.center(),
            None => Point2::origin(),
        }
    }

    /// Principal-axis orientation in degrees, in (-90, 90].
    pub fn orientation_deg(&self) -> f64 {
        self.moments().orientation_deg()
    }

    pub fn bounding_box(&self) -> Option<BoundingBox> {
        let first = *self.points.first()?;
        let mut bb = BoundingBox {
            min: first,
            max: first,
        };
        for p in &self.points[1..] {
            bb.min.x = bb.min.x.min(p.x);
            bb.min.y = bb.min.y.min(p.y);
            bb.max.x = bb.max.x.max(p.x);
            bb.max.y = bb.max.y.max(p.y);
        }
        Some(bb)
    }

    pub fn convex_hull(&self) -> Contour {
        Contour::new(convex_hull(&self.points))
    }

    pub fn min_area_rect(&self) -> Option<MinAreaRect> {
        MinAreaRect::from_points(&self.points)
    }

    pub fn rotated(&self, angle_deg: f64, pivot: Point2<f64>) -> Contour {
        let mut out = self.clone();
        out.rotate_in_place(angle_deg, pivot);
        out
    }

    pub fn rotate_in_place(&mut self, angle_deg: f64, pivot: Point2<f64>) {
        for p in &mut self.points {
            *p = rotate_point(*p, angle_deg, pivot);
        }
    }

    pub fn translated(&self, delta: Vector2<f64>) -> Contour {
        let mut out = self.clone();
        out.translate_in_place(delta);
        out
    }

    pub fn translate_in_place(&mut self, delta: Vector2<f64>) {
        for p in &mut self.points {
            *p += delta;
        }
    }

    /// Apply `f` to every point.
    pub fn map_points(&self, f: impl Fn(Point2<f64>) -> Point2<f64>) -> Contour {
        self.points.iter().map(|&p| f(p)).collect()
    }
}

impl From<Vec<Point2<f64>>> for Contour {
    fn from(points: Vec<Point2<f64>>) -> Self {
        Self::new(points)
    }
}

impl FromIterator<Point2<f64>> for Contour {
    fn from_iter<I: IntoIterator<Item = Point2<f64>>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
