//! Angle sampling for the rotation search.

/// Tolerances below this are treated as "no rotation".
pub const MIN_TOLERANCE_DEG: f64 = 1e-7;

/// Angle step for a template of `width x height`, in degrees.
///
/// Rotating by `atan(2 / max(w, h))` moves the far corner of the template by
/// about two pixels, so adjacent samples stay within one pixel of each other
/// at the template center.
pub fn angle_step_deg(width: usize, height: usize) -> f64 {
    let longest = width.max(height).max(1) as f64;
    (2.0 / longest).atan().to_degrees()
}

/// Angles sampled by the full-range search at the coarsest level.
///
/// Starts at 0 and walks up past `+tolerance`, then walks down from `-step`
/// past `-tolerance`, so both ends of the window are covered. A tolerance
/// below [`MIN_TOLERANCE_DEG`] yields `[0.0]`.
pub fn coarse_angles(tolerance_deg: f64, step_deg: f64) -> Vec<f64> {
    if tolerance_deg < MIN_TOLERANCE_DEG || !(step_deg > 0.0) {
        return vec![0.0];
    }
    let limit = tolerance_deg + step_deg;
    let mut angles = Vec::new();
    let mut k = 0usize;
    loop {
        let a = k as f64 * step_deg;
        if a >= limit {
            break;
        }
        angles.push(a);
        k += 1;
    }
    let mut k = 1usize;
    loop {
        let a = -(k as f64) * step_deg;
        if a <= -limit {
            break;
        }
        angles.push(a);
        k += 1;
    }
    angles
}

/// Three samples around `center` during refinement, or `[0.0]` without rotation.
pub fn local_angles(center_deg: f64, step_deg: f64, tolerance_deg: f64) -> Vec<f64> {
    if tolerance_deg < MIN_TOLERANCE_DEG {
        return vec![0.0];
    }
    vec![center_deg - step_deg, center_deg, center_deg + step_deg]
}
