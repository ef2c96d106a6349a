//! Image pyramid construction for grayscale `u8` images.
//!
//! Downsampling uses a 2x2 box filter with integer rounding:
//! `dst = ((a + b + c + d) + 2) / 4`. Odd trailing rows and columns are
//! dropped, so level `k` has size `floor(w / 2^k) x floor(h / 2^k)`.

use crate::image::{ImageView, OwnedImage};
use crate::util::{NeedleFindError, NeedleFindResult};

/// Returns the index of the coarsest level for an image of `width x height`.
///
/// The area is divided by four per level while it still exceeds
/// `min_reduced_area`, so the top level is the first one whose area is at or
/// below the target.
pub fn top_layer(width: usize, height: usize, min_reduced_area: usize) -> usize {
    let mut area = width.saturating_mul(height);
    let mut layer = 0;
    while area > min_reduced_area.max(1) {
        area /= 4;
        layer += 1;
    }
    layer
}

/// Owned image pyramid built from a base level.
#[derive(Clone, Debug)]
pub struct ImagePyramid {
    levels: Vec<OwnedImage>,
}

impl ImagePyramid {
    /// Builds a pyramid with at most `max_levels` levels from a base view.
    ///
    /// `max_levels` is clamped to at least 1 so the base level is always
    /// present. Construction stops early once a level would drop below 1x1.
    pub fn build_u8(base: ImageView<'_, u8>, max_levels: usize) -> NeedleFindResult<Self> {
        let max_levels = max_levels.max(1);
        let mut levels = Vec::with_capacity(max_levels);
        let mut current = base.to_owned_image();

        while levels.len() + 1 < max_levels {
            if current.width() < 2 || current.height() < 2 {
                break;
            }
            let next = downsample_2x(current.view())?;
            levels.push(std::mem::replace(&mut current, next));
        }
        levels.push(current);

        Ok(Self { levels })
    }

    /// Returns all pyramid levels (level 0 is the base resolution).
    pub fn levels(&self) -> &[OwnedImage] {
        &self.levels
    }

    /// Returns the number of levels.
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Returns a view for a specific pyramid level.
    pub fn level(&self, index: usize) -> Option<ImageView<'_, u8>> {
        self.levels.get(index).map(|level| level.view())
    }
}

fn downsample_2x(src: ImageView<'_, u8>) -> NeedleFindResult<OwnedImage> {
    let dst_width = src.width() / 2;
    let dst_height = src.height() / 2;
    let dst_len = dst_width
        .checked_mul(dst_height)
        .ok_or(NeedleFindError::InvalidDimensions {
            width: dst_width,
            height: dst_height,
        })?;
    let mut dst = vec![0u8; dst_len];

    for y in 0..dst_height {
        let (Some(row0), Some(row1)) = (src.row(y * 2), src.row(y * 2 + 1)) else {
            return Err(NeedleFindError::BufferTooSmall {
                needed: (y * 2 + 2) * src.stride(),
                got: src.as_slice().len(),
            });
        };
        for x in 0..dst_width {
            let sum = u16::from(row0[2 * x])
                + u16::from(row0[2 * x + 1])
                + u16::from(row1[2 * x])
                + u16::from(row1[2 * x + 1]);
            dst[y * dst_width + x] = ((sum + 2) / 4) as u8;
        }
    }

    OwnedImage::new(dst, dst_width, dst_height)
}

#[cfg(test)]
mod tests {
    use super::{top_layer, ImagePyramid};
    use crate::image::ImageView;

    #[test]
    fn top_layer_divides_area_by_four() {
        assert_eq!(top_layer(32, 32, 2048), 0);
        assert_eq!(top_layer(64, 64, 2048), 1);
        assert_eq!(top_layer(128, 128, 2048), 2);
        assert_eq!(top_layer(10, 10, 0), 3);
    }

    #[test]
    fn downsample_rounds_box_average() {
        let data = [0u8, 1, 2, 3, 4, 5, 6, 7];
        let view = ImageView::from_slice(&data, 4, 2).unwrap();
        let pyramid = ImagePyramid::build_u8(view, 3).unwrap();
        assert_eq!(pyramid.len(), 2);
        let top = pyramid.level(1).unwrap();
        assert_eq!(top.width(), 2);
        assert_eq!(top.height(), 1);
        assert_eq!(top.row(0).unwrap(), &[3u8, 5u8]);
    }
}
