//! Scalar reference kernel.

use crate::image::ImageView;
use crate::kernel::Kernel;
use crate::template::TemplatePlan;

/// Scalar kernel accumulating in `f64`.
pub struct ScalarKernel;

impl Kernel for ScalarKernel {
    fn correlate_row(image: ImageView<'_, u8>, plan: &TemplatePlan, y: usize, out: &mut [f64]) {
        let tpl_width = plan.width();
        let values = plan.values();
        out.fill(0.0);
        for ty in 0..plan.height() {
            let Some(img_row) = image.row(y + ty) else {
                return;
            };
            let tpl_row = &values[ty * tpl_width..(ty + 1) * tpl_width];
            for (x, acc) in out.iter_mut().enumerate() {
                let window = &img_row[x..x + tpl_width];
                let dot: f64 = tpl_row
                    .iter()
                    .zip(window)
                    .map(|(&t, &v)| f64::from(t) * f64::from(v))
                    .sum();
                *acc += dot;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ScalarKernel;
    use crate::image::ImageView;
    use crate::kernel::Kernel;
    use crate::template::TemplatePlan;

    #[test]
    fn row_matches_hand_computed_dot() {
        let img = [1u8, 2, 3, 4, 5, 6];
        let image = ImageView::from_slice(&img, 3, 2).unwrap();
        let tpl = [1u8, 1, 2, 2];
        let plan = TemplatePlan::from_view(ImageView::from_slice(&tpl, 2, 2).unwrap()).unwrap();
        let mut out = [0.0f64; 2];
        ScalarKernel::correlate_row(image, &plan, 0, &mut out);
        assert_eq!(out, [1.0 + 2.0 + 8.0 + 10.0, 2.0 + 3.0 + 10.0 + 12.0]);
    }
}
