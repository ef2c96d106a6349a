//! Summed-area tables for O(1) window statistics.

use crate::image::ImageView;

/// Integral image of pixel values and of their squares.
///
/// Tables have one extra leading row and column of zeros, so the sum over
/// `[x, x + w) x [y, y + h)` is `t[y+h][x+w] - t[y][x+w] - t[y+h][x] + t[y][x]`.
pub struct IntegralTables {
    stride: usize,
    sum: Vec<f64>,
    sq_sum: Vec<f64>,
}

impl IntegralTables {
    pub fn new(image: ImageView<'_, u8>) -> Self {
        let width = image.width();
        let height = image.height();
        let stride = width + 1;
        let mut sum = vec![0.0f64; stride * (height + 1)];
        let mut sq_sum = vec![0.0f64; stride * (height + 1)];
        for y in 0..height {
            let Some(row) = image.row(y) else {
                break;
            };
            let mut row_sum = 0.0f64;
            let mut row_sq = 0.0f64;
            for (x, &v) in row.iter().enumerate() {
                let v = f64::from(v);
                row_sum += v;
                row_sq += v * v;
                let idx = (y + 1) * stride + x + 1;
                sum[idx] = sum[idx - stride] + row_sum;
                sq_sum[idx] = sq_sum[idx - stride] + row_sq;
            }
        }
        Self {
            stride,
            sum,
            sq_sum,
        }
    }

    fn window(table: &[f64], stride: usize, x: usize, y: usize, w: usize, h: usize) -> f64 {
        let top = y * stride;
        let bottom = (y + h) * stride;
        table[bottom + x + w] - table[top + x + w] - table[bottom + x] + table[top + x]
    }

    /// Sum of pixel values in the window.
    pub fn window_sum(&self, x: usize, y: usize, w: usize, h: usize) -> f64 {
        Self::window(&self.sum, self.stride, x, y, w, h)
    }

    /// Sum of squared pixel values in the window.
    pub fn window_sq_sum(&self, x: usize, y: usize, w: usize, h: usize) -> f64 {
        Self::window(&self.sq_sum, self.stride, x, y, w, h)
    }
}

#[cfg(test)]
mod tests {
    use super::IntegralTables;
    use crate::image::ImageView;

    #[test]
    fn window_sums_match_brute_force() {
        let data: Vec<u8> = (0..30).map(|v| (v * 7 % 23) as u8).collect();
        let view = ImageView::from_slice(&data, 6, 5).unwrap();
        let tables = IntegralTables::new(view);
        let (x, y, w, h) = (1, 2, 3, 2);
        let mut sum = 0.0;
        let mut sq = 0.0;
        for yy in y..y + h {
            for xx in x..x + w {
                let v = f64::from(data[yy * 6 + xx]);
                sum += v;
                sq += v * v;
            }
        }
        assert_eq!(tables.window_sum(x, y, w, h), sum);
        assert_eq!(tables.window_sq_sum(x, y, w, h), sq);
    }
}
