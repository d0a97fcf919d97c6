//! Angle helpers. All angles in this workspace are degrees.

/// Wrap an angle into the half-open interval (-180, 180].
///
/// Idempotent: `normalize_angle_deg(normalize_angle_deg(a)) == normalize_angle_deg(a)`.
/// Non-finite input is returned unchanged.
#[inline]
pub fn normalize_angle_deg(angle: f64) -> f64 {
    if !angle.is_finite() || (angle > -180.0 && angle <= 180.0) {
        return angle;
    }
    let wrapped = (angle + 180.0).rem_euclid(360.0) - 180.0;
    // rem_euclid yields [-180, 180); fold the lower edge onto +180.
    if wrapped <= -180.0 {
        wrapped + 360.0
    } else {
        wrapped
    }
}

/// Smallest absolute difference between two angles, in [0, 180].
#[inline]
pub fn angular_distance_deg(a: f64, b: f64) -> f64 {
    normalize_angle_deg(a - b).abs()
}
