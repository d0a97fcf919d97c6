/// Errors returned by the placement plane.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum NestingError {
    /// No further part fits; terminal for the session until `reset`.
    #[error("placement plane is full")]
    PlaneFull,
    #[error("part size {width} x {height} is invalid (need finite, positive, width >= height)")]
    InvalidPartSize { width: f64, height: f64 },
    #[error("part width {width} exceeds plane width {available}")]
    PartTooWide { width: f64, available: f64 },
    #[error("plane bounds are invalid: {reason}")]
    InvalidPlane { reason: &'static str },
    #[error("part contour has no usable footprint")]
    EmptyFootprint,
}
