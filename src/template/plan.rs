//! Template statistics shared by every correlation method.

use crate::image::ImageView;
use crate::util::{NeedleFindError, NeedleFindResult};

/// Precomputed pixel values and moments of a template.
///
/// Moments are population statistics over all `width * height` pixels and are
/// kept in `f64` so the window normalization stays exact for large templates.
#[derive(Clone, Debug)]
pub struct TemplatePlan {
    width: usize,
    height: usize,
    values: Vec<f32>,
    mean: f64,
    variance: f64,
    sum_sq: f64,
}

impl TemplatePlan {
    /// Builds a plan from a template view.
    pub fn from_view(tpl: ImageView<'_, u8>) -> NeedleFindResult<Self> {
        let width = tpl.width();
        let height = tpl.height();
        let count = width
            .checked_mul(height)
            .ok_or(NeedleFindError::InvalidDimensions { width, height })?;

        let mut values = Vec::with_capacity(count);
        let mut sum = 0.0f64;
        let mut sum_sq = 0.0f64;
        for y in 0..height {
            let row = tpl.row(y).ok_or(NeedleFindError::BufferTooSmall {
                needed: (y + 1) * tpl.stride(),
                got: tpl.as_slice().len(),
            })?;
            for &value in row {
                let v = f64::from(value);
                sum += v;
                sum_sq += v * v;
                values.push(f32::from(value));
            }
        }

        let n = count as f64;
        let mean = sum / n;
        let variance = (sum_sq / n - mean * mean).max(0.0);

        Ok(Self {
            width,
            height,
            values,
            mean,
            variance,
            sum_sq,
        })
    }

    /// Returns the template width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the template height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the pixel values in row-major order.
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Mean intensity.
    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Population variance of the intensities.
    pub fn variance(&self) -> f64 {
        self.variance
    }

    /// Sum of squared intensities.
    pub fn sum_sq(&self) -> f64 {
        self.sum_sq
    }

    /// Reciprocal of the pixel count.
    pub fn inv_area(&self) -> f64 {
        1.0 / (self.width * self.height) as f64
    }

    /// Norm of the zero-mean template, `sqrt(variance * area)`.
    pub fn norm(&self) -> f64 {
        (self.variance / self.inv_area()).sqrt()
    }

    /// True when the variance is below machine epsilon.
    pub fn is_flat(&self) -> bool {
        self.variance < f64::EPSILON
    }

    /// Padding value for rotated crops: white behind dark needles, black otherwise.
    pub fn border_color(&self) -> u8 {
        if self.mean < 128.0 {
            255
        } else {
            0
        }
    }
}
