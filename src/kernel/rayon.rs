//! Row-parallel correlation (feature-gated).
//!
//! Every output row is computed independently by the same kernel, so the
//! result is identical to the sequential path.

use crate::image::ImageView;
use crate::kernel::Kernel;
use crate::template::TemplatePlan;
use rayon::prelude::*;

/// Fills `out` (rows of `out_w` placements) in parallel over rows.
pub(crate) fn correlate_rows_par<K: Kernel>(
    image: ImageView<'_, u8>,
    plan: &TemplatePlan,
    out: &mut [f64],
    out_w: usize,
) {
    out.par_chunks_mut(out_w)
        .enumerate()
        .for_each(|(y, row)| K::correlate_row(image, plan, y, row));
}
