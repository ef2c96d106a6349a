//! Correlation kernels and response normalization.
//!
//! The raw cross-correlation `sum(T * I)` is the only part that touches every
//! template pixel per placement; it is delegated to a [`Kernel`]. Window means
//! and energies come from [`IntegralTables`] in O(1), and the six methods are
//! derived from those three quantities in [`match_template`].

use crate::image::ImageView;
use crate::template::TemplatePlan;
use crate::trace::trace_span;
use crate::util::{NeedleFindError, NeedleFindResult};

pub mod integral;
pub mod method;
pub mod response;
pub mod scalar;

#[cfg(feature = "simd")]
pub mod simd;

#[cfg(feature = "rayon")]
pub mod rayon;

pub use integral::IntegralTables;
pub use method::{Extremum, Method, MethodStrategy};
pub use response::{Peak, ResponseMap};

/// Raw cross-correlation for one row of placements.
pub trait Kernel {
    /// Writes `sum(T * I)` for placements `(0..out.len(), y)` into `out`.
    ///
    /// The caller guarantees that every placement fits inside `image`.
    fn correlate_row(image: ImageView<'_, u8>, plan: &TemplatePlan, y: usize, out: &mut [f64]);
}

/// Kernel selected by the enabled features.
#[cfg(feature = "simd")]
pub type DefaultKernel = simd::SimdKernel;

/// Kernel selected by the enabled features.
#[cfg(not(feature = "simd"))]
pub type DefaultKernel = scalar::ScalarKernel;

fn placements(image: ImageView<'_, u8>, plan: &TemplatePlan) -> NeedleFindResult<(usize, usize)> {
    if image.width() < plan.width() || image.height() < plan.height() {
        return Err(NeedleFindError::OversizedNeedle {
            needle_width: plan.width(),
            needle_height: plan.height(),
            haystack_width: image.width(),
            haystack_height: image.height(),
            scale: 1.0,
        });
    }
    Ok((
        image.width() - plan.width() + 1,
        image.height() - plan.height() + 1,
    ))
}

/// Computes the raw cross-correlation surface with kernel `K`.
pub fn cross_correlate_with<K: Kernel>(
    image: ImageView<'_, u8>,
    plan: &TemplatePlan,
) -> NeedleFindResult<(Vec<f64>, usize, usize)> {
    let (out_w, out_h) = placements(image, plan)?;
    let mut raw = vec![0.0f64; out_w * out_h];

    #[cfg(feature = "rayon")]
    self::rayon::correlate_rows_par::<K>(image, plan, &mut raw, out_w);

    #[cfg(not(feature = "rayon"))]
    for (y, row) in raw.chunks_mut(out_w).enumerate() {
        K::correlate_row(image, plan, y, row);
    }

    Ok((raw, out_w, out_h))
}

/// Computes the response surface of `plan` over `image` for `method`.
///
/// Normalized methods guard against near-zero window energy: if the window
/// variance is below `min(0.5, 10 * f32::EPSILON * window_sq_sum)` the score
/// is treated as uncorrelated, and values within 12.5% beyond the bound are
/// saturated to +-1. A flat template under `CcoeffNormed` yields a surface of
/// ones.
pub fn match_template(
    image: ImageView<'_, u8>,
    plan: &TemplatePlan,
    method: Method,
) -> NeedleFindResult<ResponseMap> {
    let _span = trace_span!("match_template", method = method.name()).entered();
    let (out_w, out_h) = placements(image, plan)?;
    if method == Method::CcoeffNormed && plan.is_flat() {
        return Ok(ResponseMap::from_vec(vec![1.0; out_w * out_h], out_w, out_h));
    }

    let (raw, out_w, out_h) = cross_correlate_with::<DefaultKernel>(image, plan)?;
    let tables = IntegralTables::new(image);
    let norm = Normalizer::new(plan, method);
    let (tw, th) = (plan.width(), plan.height());

    let mut data = Vec::with_capacity(raw.len());
    for y in 0..out_h {
        for x in 0..out_w {
            let cross = raw[y * out_w + x];
            let score = if norm.needs_window() {
                let sum = tables.window_sum(x, y, tw, th);
                let sq_sum = tables.window_sq_sum(x, y, tw, th);
                norm.apply(cross, sum, sq_sum)
            } else {
                cross
            };
            data.push(score as f32);
        }
    }
    Ok(ResponseMap::from_vec(data, out_w, out_h))
}

/// Per-call constants of the normalization.
struct Normalizer {
    method: Method,
    mean: f64,
    inv_area: f64,
    sum_sq: f64,
    norm: f64,
}

impl Normalizer {
    fn new(plan: &TemplatePlan, method: Method) -> Self {
        let inv_area = plan.inv_area();
        let (mean, norm) = if method.is_centered() {
            (plan.mean(), plan.norm())
        } else {
            (0.0, plan.sum_sq().sqrt())
        };
        Self {
            method,
            mean,
            inv_area,
            sum_sq: plan.sum_sq(),
            norm,
        }
    }

    fn needs_window(&self) -> bool {
        self.method != Method::Ccorr
    }

    fn apply(&self, cross: f64, window_sum: f64, window_sq_sum: f64) -> f64 {
        let mut num = cross;
        let mut window_mean2 = 0.0;
        if self.method.is_centered() {
            num -= window_sum * self.mean;
            window_mean2 = window_sum * window_sum * self.inv_area;
        }
        if self.method.is_sqdiff() {
            num = (window_sq_sum - 2.0 * num + self.sum_sq).max(0.0);
        }
        if !self.method.is_normed() {
            return num;
        }

        let diff2 = (window_sq_sum - window_mean2).max(0.0);
        let t = if diff2 <= f64::min(0.5, 10.0 * f64::from(f32::EPSILON) * window_sq_sum) {
            0.0
        } else {
            diff2.sqrt() * self.norm
        };
        if num.abs() < t {
            num / t
        } else if num.abs() < t * 1.125 {
            if num > 0.0 {
                1.0
            } else {
                -1.0
            }
        } else if self.method == Method::SqdiffNormed {
            1.0
        } else {
            0.0
        }
    }
}
