use pickplace_core::GripperId;

/// Errors raised while computing robot poses.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum PoseError {
    /// No profile is configured for this gripper; never guessed.
    #[error("unknown gripper {0}")]
    UnknownGripper(GripperId),
    #[error("camera-to-robot homography is not invertible")]
    SingularHomography,
    #[error("{what} is not finite")]
    NonFinite { what: &'static str },
}
