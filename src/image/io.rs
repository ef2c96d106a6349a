//! Decoding image files via the `image` crate.
//!
//! Available when the `image-io` feature is enabled.

use std::path::Path;

use crate::image::buffer::PixelBuffer;
use crate::image::OwnedImage;
use crate::util::{NeedleFindError, NeedleFindResult};

/// Converts a decoded image into a pixel buffer, keeping alpha if present.
pub fn buffer_from_dynamic_image(img: &image::DynamicImage) -> PixelBuffer {
    let width = img.width() as usize;
    let height = img.height() as usize;
    let color = img.color();
    if color.channel_count() <= 2 && !color.has_alpha() {
        return PixelBuffer::gray(img.to_luma8().into_raw(), width, height);
    }
    if color.has_alpha() {
        PixelBuffer::with_channels(img.to_rgba8().into_raw(), width, height, 4)
    } else {
        PixelBuffer::with_channels(img.to_rgb8().into_raw(), width, height, 3)
    }
}

/// Loads an image file into a pixel buffer tagged with its path.
pub fn load_image<P: AsRef<Path>>(path: P) -> NeedleFindResult<PixelBuffer> {
    let path = path.as_ref();
    let id = path.display().to_string();
    let img = image::open(path).map_err(|err| NeedleFindError::LoadFailure {
        id: id.clone(),
        reason: err.to_string(),
    })?;
    if img.width() == 0 || img.height() == 0 {
        return Err(NeedleFindError::EmptyImage { id });
    }
    Ok(buffer_from_dynamic_image(&img).with_id(id))
}

/// Converts a grayscale working image back into an `image` buffer.
pub fn to_gray_image(img: &OwnedImage) -> NeedleFindResult<image::GrayImage> {
    image::GrayImage::from_raw(img.width() as u32, img.height() as u32, img.data().to_vec())
        .ok_or(NeedleFindError::BufferTooSmall {
            needed: img.width() * img.height(),
            got: img.data().len(),
        })
}
