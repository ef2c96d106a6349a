//! Needle storage and per-level statistics.

use crate::image::{ImageView, OwnedImage};
use crate::util::NeedleFindResult;

mod plan;
pub mod rotate;

pub use plan::TemplatePlan;

/// Owned needle image in contiguous grayscale format.
#[derive(Clone, Debug)]
pub struct Template {
    img: OwnedImage,
}

impl Template {
    /// Creates a template from a contiguous grayscale buffer.
    pub fn new(data: Vec<u8>, width: usize, height: usize) -> NeedleFindResult<Self> {
        let img = OwnedImage::new(data, width, height)?;
        Ok(Self { img })
    }

    pub fn from_image(img: OwnedImage) -> Self {
        Self { img }
    }

    /// Returns a borrowed view of the template data.
    pub fn view(&self) -> ImageView<'_, u8> {
        self.img.view()
    }

    pub fn width(&self) -> usize {
        self.img.width()
    }

    pub fn height(&self) -> usize {
        self.img.height()
    }

    pub fn image(&self) -> &OwnedImage {
        &self.img
    }
}
