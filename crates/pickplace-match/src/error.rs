use pickplace_core::GeometryError;

/// Errors raised while aligning a template onto a detected part.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum AlignError {
    /// The template cannot be transformed; the match must be dropped.
    #[error("template {template_id:?} has unusable main contour: {source}")]
    InvalidTemplateGeometry {
        template_id: String,
        #[source]
        source: GeometryError,
    },
    /// Overlap scoring is impossible for these contours; refinement is skipped.
    #[error("overlap cannot be computed: {0}")]
    DegenerateOverlapInput(#[source] GeometryError),
}
