//! Area resampling for the scale ladder.
//!
//! Each destination pixel averages the source pixels its footprint covers,
//! weighting partially covered pixels by the covered fraction. The filter is
//! separable and runs as a horizontal pass into an `f32` buffer followed by a
//! vertical pass with rounding.

use crate::image::{ImageView, OwnedImage};
use crate::util::{NeedleFindError, NeedleFindResult};

/// Returns `floor(dim * factor)` for both axes.
///
/// Non-positive or non-finite factors are treated as 1.
pub fn scaled_size(width: usize, height: usize, factor: f64) -> (usize, usize) {
    let factor = if factor.is_finite() && factor > 0.0 {
        factor
    } else {
        1.0
    };
    (
        (width as f64 * factor).floor() as usize,
        (height as f64 * factor).floor() as usize,
    )
}

/// Resizes `src` by `factor` using area resampling.
pub fn resize_by(src: ImageView<'_, u8>, factor: f64) -> NeedleFindResult<OwnedImage> {
    let (width, height) = scaled_size(src.width(), src.height(), factor);
    resize_area(src, width, height)
}

/// Resizes `src` to exactly `dst_width x dst_height`.
pub fn resize_area(
    src: ImageView<'_, u8>,
    dst_width: usize,
    dst_height: usize,
) -> NeedleFindResult<OwnedImage> {
    if dst_width == 0 || dst_height == 0 {
        return Err(NeedleFindError::InvalidDimensions {
            width: dst_width,
            height: dst_height,
        });
    }
    if dst_width == src.width() && dst_height == src.height() {
        return Ok(src.to_owned_image());
    }

    let x_taps = footprints(src.width(), dst_width);
    let y_taps = footprints(src.height(), dst_height);

    let mut horizontal = vec![0.0f32; dst_width * src.height()];
    for y in 0..src.height() {
        let Some(row) = src.row(y) else {
            return Err(NeedleFindError::BufferTooSmall {
                needed: (y + 1) * src.stride(),
                got: src.as_slice().len(),
            });
        };
        let out = &mut horizontal[y * dst_width..(y + 1) * dst_width];
        for (dst, taps) in out.iter_mut().zip(&x_taps) {
            *dst = taps
                .iter()
                .map(|&(sx, w)| f32::from(row[sx]) * w)
                .sum();
        }
    }

    let mut data = vec![0u8; dst_width * dst_height];
    for (dy, taps) in y_taps.iter().enumerate() {
        for dx in 0..dst_width {
            let value: f32 = taps
                .iter()
                .map(|&(sy, w)| horizontal[sy * dst_width + dx] * w)
                .sum();
            data[dy * dst_width + dx] = value.round().clamp(0.0, 255.0) as u8;
        }
    }

    OwnedImage::new(data, dst_width, dst_height)
}

/// For each destination index, the covered source indices and normalized weights.
fn footprints(src_len: usize, dst_len: usize) -> Vec<Vec<(usize, f32)>> {
    let ratio = src_len as f64 / dst_len as f64;
    (0..dst_len)
        .map(|d| {
            let start = d as f64 * ratio;
            let end = ((d + 1) as f64 * ratio).min(src_len as f64);
            let first = start.floor() as usize;
            let last = (end.ceil() as usize).clamp(first + 1, src_len);
            let span = end - start;
            (first..last)
                .filter_map(|s| {
                    let lo = start.max(s as f64);
                    let hi = end.min((s + 1) as f64);
                    let cover = hi - lo;
                    (cover > 0.0).then(|| (s, (cover / span) as f32))
                })
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{resize_area, scaled_size};
    use crate::image::ImageView;

    #[test]
    fn scaled_size_floors_and_guards_factor() {
        assert_eq!(scaled_size(45, 31, 0.5), (22, 15));
        assert_eq!(scaled_size(45, 31, 0.0), (45, 31));
        assert_eq!(scaled_size(45, 31, -2.0), (45, 31));
    }

    #[test]
    fn halving_matches_box_average() {
        let data = [10u8, 20, 30, 40, 50, 60, 70, 80];
        let view = ImageView::from_slice(&data, 4, 2).unwrap();
        let out = resize_area(view, 2, 1).unwrap();
        assert_eq!(out.data(), &[35u8, 55u8]);
    }

    #[test]
    fn constant_image_stays_constant() {
        let data = vec![77u8; 10 * 7];
        let view = ImageView::from_slice(&data, 10, 7).unwrap();
        let out = resize_area(view, 7, 5).unwrap();
        assert!(out.data().iter().all(|&v| v == 77));
        let up = resize_area(view, 13, 9).unwrap();
        assert!(up.data().iter().all(|&v| v == 77));
    }
}
