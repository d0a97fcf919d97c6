//! Filled-silhouette rasterization and mask overlap.
//!
//! Two contours are compared by filling both on one shared pixel grid that
//! covers their union bounding box and taking intersection over union. The
//! grid is fitted to the shapes, so the score does not depend on where the
//! contours sit in their coordinate frame.

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::{BoundingBox, Contour, GeometryError};

/// Parameters for silhouette rasterization.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RasterParams {
    /// Pixel count along the longer side of the shared grid.
    pub resolution_px: usize,
    /// Empty border in pixels around the union bounding box.
    pub margin_px: usize,
}

impl Default for RasterParams {
    fn default() -> Self {
        Self {
            resolution_px: 400,
            margin_px: 2,
        }
    }
}

/// Mapping from contour coordinates to a pixel grid.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RasterGrid {
    pub origin: Point2<f64>,
    /// Pixels per contour unit.
    pub scale: f64,
    pub width: usize,
    pub height: usize,
}

impl RasterGrid {
    /// Fit a grid around `bbox`.
    pub fn fit(bbox: &BoundingBox, params: &RasterParams) -> Result<Self, GeometryError> {
        let extent = bbox.width().max(bbox.height());
        if !extent.is_finite() || extent <= 0.0 {
            return Err(GeometryError::DegenerateSilhouette {
                reason: "empty bounding box",
            });
        }
        let inner = params.resolution_px.max(1) as f64;
        let scale = inner / extent;
        let margin = params.margin_px as f64 / scale;
        let width = (bbox.width() * scale).ceil() as usize + 2 * params.margin_px + 1;
        let height = (bbox.height() * scale).ceil() as usize + 2 * params.margin_px + 1;
        Ok(Self {
            origin: Point2::new(bbox.min.x - margin, bbox.min.y - margin),
            scale,
            width,
            height,
        })
    }

    #[inline]
    fn to_pixel(&self, p: Point2<f64>) -> Point2<f64> {
        Point2::new(
            (p.x - self.origin.x) * self.scale,
            (p.y - self.origin.y) * self.scale,
        )
    }
}

/// Row-major binary mask, 1 = inside.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SilhouetteMask {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

impl SilhouetteMask {
    /// Fill `contour` on `grid` with the even-odd rule, sampling pixel centers.
    pub fn rasterize(contour: &Contour, grid: &RasterGrid) -> Self {
        let mut data = vec![0u8; grid.width * grid.height];
        let pts: Vec<Point2<f64>> = contour.points().iter().map(|&p| grid.to_pixel(p)).collect();
        let n = pts.len();
        let mut crossings: Vec<f64> = Vec::with_capacity(n);

        for row in 0..grid.height {
            let yc = row as f64 + 0.5;
            crossings.clear();
            for i in 0..n {
                let p = pts[i];
                let q = pts[(i + 1) % n];
                if (p.y <= yc) != (q.y <= yc) {
                    crossings.push(p.x + (yc - p.y) * (q.x - p.x) / (q.y - p.y));
                }
            }
            crossings.sort_by(f64::total_cmp);

            let line = &mut data[row * grid.width..(row + 1) * grid.width];
            for span in crossings.chunks_exact(2) {
                let start = (span[0] - 0.5).ceil().max(0.0) as usize;
                let end = ((span[1] - 0.5).ceil().max(0.0) as usize).min(grid.width);
                if start < end {
                    line[start..end].fill(1);
                }
            }
        }

        Self {
            width: grid.width,
            height: grid.height,
            data,
        }
    }

    pub fn count(&self) -> usize {
        self.data.iter().filter(|&&v| v != 0).count()
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> bool {
        self.data[y * self.width + x] != 0
    }

    /// `(intersection, union)` pixel counts. Masks must share a grid.
    pub fn intersection_union(&self, other: &SilhouetteMask) -> (usize, usize) {
        debug_assert_eq!((self.width, self.height), (other.width, other.height));
        self.data
            .iter()
            .zip(&other.data)
            .fold((0, 0), |(i, u), (&a, &b)| {
                let (a, b) = (a != 0, b != 0);
                (i + usize::from(a && b), u + usize::from(a || b))
            })
    }
}

fn check_silhouette(c: &Contour) -> Result<(), GeometryError> {
    c.validate()
        .map_err(|_| GeometryError::DegenerateSilhouette {
            reason: "contour needs at least 3 finite points",
        })?;
    if c.area() <= f64::EPSILON {
        return Err(GeometryError::DegenerateSilhouette {
            reason: "contour has zero area",
        });
    }
    Ok(())
}

/// Intersection over union of the filled silhouettes of `a` and `b`, in [0, 1].
pub fn mask_overlap(a: &Contour, b: &Contour, params: &RasterParams) -> Result<f64, GeometryError> {
    check_silhouette(a)?;
    check_silhouette(b)?;
    let (Some(ba), Some(bb)) = (a.bounding_box(), b.bounding_box()) else {
        return Err(GeometryError::DegenerateSilhouette {
            reason: "empty contour",
        });
    };
    let grid = RasterGrid::fit(&ba.union(&bb), params)?;
    let ma = SilhouetteMask::rasterize(a, &grid);
    let mb = SilhouetteMask::rasterize(b, &grid);
    let (inter, union) = ma.intersection_union(&mb);
    if union == 0 {
        return Err(GeometryError::DegenerateSilhouette {
            reason: "empty union",
        });
    }
    Ok(inter as f64 / union as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use nalgebra::Vector2;

    fn square(x: f64, y: f64, side: f64) -> Contour {
        Contour::from_xy(&[[x, y], [x + side, y], [x + side, y + side], [x, y + side]])
    }

    #[test]
    fn identical_shapes_overlap_fully() {
        let s = square(10.0, 10.0, 50.0);
        let iou = mask_overlap(&s, &s, &RasterParams::default()).expect("overlap");
        assert_abs_diff_eq!(iou, 1.0);
    }

    #[test]
    fn half_shifted_squares() {
        let a = square(0.0, 0.0, 100.0);
        let b = a.translated(Vector2::new(50.0, 0.0));
        let iou = mask_overlap(&a, &b, &RasterParams::default()).expect("overlap");
        // 5000 / 15000
        assert_abs_diff_eq!(iou, 1.0 / 3.0, epsilon = 0.01);
    }

    #[test]
    fn disjoint_shapes_do_not_overlap() {
        let a = square(0.0, 0.0, 10.0);
        let b = square(100.0, 100.0, 10.0);
        let iou = mask_overlap(&a, &b, &RasterParams::default()).expect("overlap");
        assert_eq!(iou, 0.0);
    }

    #[test]
    fn filled_pixel_count_tracks_area() {
        let tri = Contour::from_xy(&[[0.0, 0.0], [200.0, 0.0], [0.0, 200.0]]);
        let grid = RasterGrid::fit(
            &tri.bounding_box().expect("bbox"),
            &RasterParams {
                resolution_px: 200,
                margin_px: 0,
            },
        )
        .expect("grid");
        let mask = SilhouetteMask::rasterize(&tri, &grid);
        let expected = tri.area() * grid.scale * grid.scale;
        let got = mask.count() as f64;
        assert!((got - expected).abs() / expected < 0.02, "{got} vs {expected}");
        assert!(mask.get(5, 5));
        assert!(!mask.get(195, 195));
    }

    #[test]
    fn degenerate_inputs_are_rejected() {
        let line = Contour::from_xy(&[[0.0, 0.0], [10.0, 0.0], [5.0, 0.0]]);
        let ok = square(0.0, 0.0, 10.0);
        assert!(matches!(
            mask_overlap(&line, &ok, &RasterParams::default()),
            Err(GeometryError::DegenerateSilhouette { .. })
        ));
        assert!(matches!(
            mask_overlap(&ok, &Contour::default(), &RasterParams::default()),
            Err(GeometryError::DegenerateSilhouette { .. })
        ));
    }
}
