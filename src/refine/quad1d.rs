//! One-dimensional parabola vertex.

/// Estimates the sub-sample offset of a maximum from three samples.
///
/// Given samples at `x = -1, 0, +1` (`fm`, `f0`, `fp`), returns the vertex
/// offset in `[-1, 1]` when the fitted parabola opens downwards. Flat or
/// upward curvature yields `None`.
pub fn quad_peak_offset_1d(fm: f64, f0: f64, fp: f64) -> Option<f64> {
    if !fm.is_finite() || !f0.is_finite() || !fp.is_finite() {
        return None;
    }

    let denom = fm - 2.0 * f0 + fp;
    if denom > -1e-9 {
        return None;
    }

    let dx = 0.5 * (fm - fp) / denom;
    (dx.is_finite() && dx.abs() <= 1.0).then_some(dx)
}

#[cfg(test)]
mod tests {
    use super::quad_peak_offset_1d;

    #[test]
    fn symmetric_samples_peak_at_center() {
        let dx = quad_peak_offset_1d(0.9, 1.0, 0.9).unwrap();
        assert!(dx.abs() < 1e-12);
    }

    #[test]
    fn shifted_parabola_is_recovered() {
        let f = |x: f64| 1.0 - (x - 0.25).powi(2);
        let dx = quad_peak_offset_1d(f(-1.0), f(0.0), f(1.0)).unwrap();
        assert!((dx - 0.25).abs() < 1e-12);
    }

    #[test]
    fn valley_is_rejected() {
        assert!(quad_peak_offset_1d(1.0, 0.5, 1.0).is_none());
    }
}
