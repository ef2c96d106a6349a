//! Angle helpers shared by the rotation search and geometry code.

/// Wraps an angle in degrees to the range (-180, 180].
pub(crate) fn wrap_deg(angle_deg: f64) -> f64 {
    let mut wrapped = angle_deg % 360.0;
    if wrapped <= -180.0 {
        wrapped += 360.0;
    }
    if wrapped > 180.0 {
        wrapped -= 360.0;
    }
    wrapped
}

/// Computes sine and cosine for an angle in degrees.
pub(crate) fn sin_cos_deg(angle_deg: f64) -> (f64, f64) {
    angle_deg.to_radians().sin_cos()
}

/// Rotates `(x, y)` around `(cx, cy)` by `angle_deg`, counter-clockwise on screen.
///
/// Matches the forward transform of a standard 2x3 rotation matrix with the
/// y axis pointing down.
pub(crate) fn rotate_point(x: f64, y: f64, cx: f64, cy: f64, angle_deg: f64) -> (f64, f64) {
    let (sin, cos) = sin_cos_deg(angle_deg);
    let dx = x - cx;
    let dy = y - cy;
    (dx * cos + dy * sin + cx, -dx * sin + dy * cos + cy)
}
