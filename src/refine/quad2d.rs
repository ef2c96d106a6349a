//! Separable sub-pixel refinement in x and y.

use crate::refine::quad1d::quad_peak_offset_1d;

/// Offset `(dx, dy)` of the maximum inside a 3x3 neighbourhood indexed `[y][x]`.
///
/// `dx` comes from the center row and `dy` from the center column; an
/// ill-conditioned axis contributes 0.
pub fn subpixel_offset(s: [[f32; 3]; 3]) -> (f64, f64) {
    let at = |y: usize, x: usize| f64::from(s[y][x]);
    let dx = quad_peak_offset_1d(at(1, 0), at(1, 1), at(1, 2)).unwrap_or(0.0);
    let dy = quad_peak_offset_1d(at(0, 1), at(1, 1), at(2, 1)).unwrap_or(0.0);
    (dx, dy)
}

#[cfg(test)]
mod tests {
    use super::subpixel_offset;

    #[test]
    fn separable_paraboloid() {
        let coords = [-1.0f32, 0.0, 1.0];
        let mut s = [[0.0f32; 3]; 3];
        for (yi, &y) in coords.iter().enumerate() {
            for (xi, &x) in coords.iter().enumerate() {
                s[yi][xi] = 1.0 - (x - 0.3).powi(2) - (y + 0.2).powi(2);
            }
        }

        let (dx, dy) = subpixel_offset(s);
        assert!((dx - 0.3).abs() < 1e-4);
        assert!((dy + 0.2).abs() < 1e-4);
    }
}
