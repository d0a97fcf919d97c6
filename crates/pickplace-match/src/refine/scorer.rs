use pickplace_core::{mask_overlap, Contour, GeometryError, RasterParams};

/// Silhouette similarity used as the refiner's objective, in [0, 1].
///
/// Implementations must fail with [`GeometryError::DegenerateSilhouette`]
/// (or another geometry error) rather than return a made-up score when a
/// contour cannot be rendered.
pub trait OverlapScorer {
    fn overlap(&self, candidate: &Contour, target: &Contour) -> Result<f64, GeometryError>;
}

/// Intersection over union of rasterized filled silhouettes.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RasterOverlap {
    pub params: RasterParams,
}

impl RasterOverlap {
    pub fn new(params: RasterParams) -> Self {
        Self { params }
    }
}

impl OverlapScorer for RasterOverlap {
    fn overlap(&self, candidate: &Contour, target: &Contour) -> Result<f64, GeometryError> {
        mask_overlap(candidate, target, &self.params)
    }
}
