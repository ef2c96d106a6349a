//! Decoded source images as handed over by image sources and screen grabbers.

use crate::image::OwnedImage;
use crate::util::{NeedleFindError, NeedleFindResult};

/// Channel order of interleaved color data.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ColorOrder {
    #[default]
    Rgb,
    Bgr,
}

/// Ratio between physical and logical pixels on each axis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PixelDensity {
    pub scale_x: f64,
    pub scale_y: f64,
}

impl PixelDensity {
    pub const IDENTITY: Self = Self {
        scale_x: 1.0,
        scale_y: 1.0,
    };

    pub const fn uniform(scale: f64) -> Self {
        Self {
            scale_x: scale,
            scale_y: scale,
        }
    }

    pub fn is_uniform(&self) -> bool {
        self.scale_x == self.scale_y
    }
}

impl Default for PixelDensity {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Interleaved 8-bit image with 1, 3 or 4 channels.
///
/// A 4-channel buffer is treated as color plus alpha; alpha is dropped when
/// converting to grayscale.
#[derive(Clone, Debug, PartialEq)]
pub struct PixelBuffer {
    pub data: Vec<u8>,
    pub width: usize,
    pub height: usize,
    pub channels: usize,
    pub order: ColorOrder,
    pub density: PixelDensity,
    pub id: String,
}

impl PixelBuffer {
    /// Wraps grayscale data.
    pub fn gray(data: Vec<u8>, width: usize, height: usize) -> Self {
        Self::with_channels(data, width, height, 1)
    }

    /// Wraps interleaved RGB or RGBA data (`channels` of 3 or 4).
    pub fn with_channels(data: Vec<u8>, width: usize, height: usize, channels: usize) -> Self {
        Self {
            data,
            width,
            height,
            channels,
            order: ColorOrder::Rgb,
            density: PixelDensity::IDENTITY,
            id: String::new(),
        }
    }

    pub fn with_order(mut self, order: ColorOrder) -> Self {
        self.order = order;
        self
    }

    pub fn with_density(mut self, density: PixelDensity) -> Self {
        self.density = density;
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn has_alpha(&self) -> bool {
        self.channels == 4
    }

    /// Converts to a grayscale working image.
    ///
    /// Uses BT.601 luma weights in 14-bit fixed point. Zero-sized buffers are
    /// reported as [`NeedleFindError::EmptyImage`].
    pub fn to_gray(&self) -> NeedleFindResult<OwnedImage> {
        if self.width == 0 || self.height == 0 || self.data.is_empty() {
            return Err(NeedleFindError::EmptyImage {
                id: self.id.clone(),
            });
        }
        let pixels = self.width * self.height;
        let needed = pixels * self.channels;
        if self.data.len() < needed {
            return Err(NeedleFindError::BufferTooSmall {
                needed,
                got: self.data.len(),
            });
        }

        let gray = match self.channels {
            1 => self.data[..pixels].to_vec(),
            3 | 4 => {
                let (ri, bi) = match self.order {
                    ColorOrder::Rgb => (0, 2),
                    ColorOrder::Bgr => (2, 0),
                };
                self.data[..needed]
                    .chunks_exact(self.channels)
                    .map(|px| luma(px[ri], px[1], px[bi]))
                    .collect()
            }
            channels => return Err(NeedleFindError::UnsupportedChannels { channels }),
        };
        OwnedImage::new(gray, self.width, self.height)
    }
}

fn luma(r: u8, g: u8, b: u8) -> u8 {
    const R: u32 = 4899;
    const G: u32 = 9617;
    const B: u32 = 1868;
    let y = R * u32::from(r) + G * u32::from(g) + B * u32::from(b);
    ((y + (1 << 13)) >> 14) as u8
}

#[cfg(test)]
mod tests {
    use super::{ColorOrder, PixelBuffer};
    use crate::util::NeedleFindError;

    #[test]
    fn gray_of_white_and_primaries() {
        let rgb = PixelBuffer::with_channels(vec![255, 255, 255, 255, 0, 0], 2, 1, 3);
        assert_eq!(rgb.to_gray().unwrap().data(), &[255, 76]);

        let bgr = rgb.clone().with_order(ColorOrder::Bgr);
        assert_eq!(bgr.to_gray().unwrap().data(), &[255, 29]);
    }

    #[test]
    fn alpha_is_ignored() {
        let opaque = PixelBuffer::with_channels(vec![10, 200, 30, 255], 1, 1, 4);
        let clear = PixelBuffer::with_channels(vec![10, 200, 30, 0], 1, 1, 4);
        assert_eq!(opaque.to_gray().unwrap(), clear.to_gray().unwrap());
    }

    #[test]
    fn empty_buffer_is_rejected() {
        let empty = PixelBuffer::gray(Vec::new(), 0, 0).with_id("blank.png");
        assert_eq!(
            empty.to_gray().unwrap_err(),
            NeedleFindError::EmptyImage {
                id: "blank.png".to_string()
            }
        );
    }
}
