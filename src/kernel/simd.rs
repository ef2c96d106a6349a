//! SIMD kernel using the `wide` crate.
//!
//! Each template row is processed 8 pixels at a time with `f32x8`. Row
//! partial sums stay below `2^24` for templates up to 258 pixels wide, so
//! they are exact in `f32` before being accumulated in `f64`.

use crate::image::ImageView;
use crate::kernel::Kernel;
use crate::template::TemplatePlan;
use wide::f32x8;

const LANES: usize = 8;

/// Load 8 u8 values and convert to f32x8.
#[inline]
fn load_u8x8_as_f32x8(slice: &[u8]) -> f32x8 {
    f32x8::from([
        slice[0] as f32,
        slice[1] as f32,
        slice[2] as f32,
        slice[3] as f32,
        slice[4] as f32,
        slice[5] as f32,
        slice[6] as f32,
        slice[7] as f32,
    ])
}

#[inline]
fn load_f32x8(slice: &[f32]) -> f32x8 {
    f32x8::from([
        slice[0], slice[1], slice[2], slice[3], slice[4], slice[5], slice[6], slice[7],
    ])
}

/// Horizontal sum of f32x8.
#[inline]
fn hsum(v: f32x8) -> f32 {
    let arr = v.to_array();
    arr[0] + arr[1] + arr[2] + arr[3] + arr[4] + arr[5] + arr[6] + arr[7]
}

/// SIMD-accelerated cross-correlation kernel.
pub struct SimdKernel;

impl Kernel for SimdKernel {
    fn correlate_row(image: ImageView<'_, u8>, plan: &TemplatePlan, y: usize, out: &mut [f64]) {
        let tpl_width = plan.width();
        let values = plan.values();
        let simd_end = tpl_width / LANES * LANES;
        out.fill(0.0);

        for ty in 0..plan.height() {
            let Some(img_row) = image.row(y + ty) else {
                return;
            };
            let tpl_row = &values[ty * tpl_width..(ty + 1) * tpl_width];
            for (x, acc) in out.iter_mut().enumerate() {
                let window = &img_row[x..x + tpl_width];
                let mut dot_vec = f32x8::ZERO;
                let mut tx = 0;
                while tx < simd_end {
                    dot_vec += load_f32x8(&tpl_row[tx..]) * load_u8x8_as_f32x8(&window[tx..]);
                    tx += LANES;
                }
                let mut dot = f64::from(hsum(dot_vec));
                while tx < tpl_width {
                    dot += f64::from(tpl_row[tx]) * f64::from(window[tx]);
                    tx += 1;
                }
                *acc += dot;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::SimdKernel;
    use crate::image::ImageView;
    use crate::kernel::scalar::ScalarKernel;
    use crate::kernel::Kernel;
    use crate::template::TemplatePlan;

    #[test]
    fn simd_matches_scalar() {
        let img: Vec<u8> = (0..40 * 12).map(|i| ((i * 31) % 256) as u8).collect();
        let image = ImageView::from_slice(&img, 40, 12).unwrap();
        let tpl: Vec<u8> = (0..19 * 5).map(|i| ((i * 17) % 256) as u8).collect();
        let plan = TemplatePlan::from_view(ImageView::from_slice(&tpl, 19, 5).unwrap()).unwrap();
        let mut a = vec![0.0f64; 22];
        let mut b = vec![0.0f64; 22];
        for y in 0..8 {
            ScalarKernel::correlate_row(image, &plan, y, &mut a);
            SimdKernel::correlate_row(image, &plan, y, &mut b);
            assert_eq!(a, b);
        }
    }
}
