/// Errors raised by the geometry primitives.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    #[error("contour needs at least 3 points, got {points}")]
    TooFewPoints { points: usize },
    #[error("contour contains a non-finite coordinate at index {index}")]
    NonFinite { index: usize },
    #[error("silhouette cannot be rasterized: {reason}")]
    DegenerateSilhouette { reason: &'static str },
    #[error("homography estimation needs matching point sets of at least 4, got {src} and {dst}")]
    CorrespondenceCount { src: usize, dst: usize },
    #[error("homography is singular")]
    SingularHomography,
}
