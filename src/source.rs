//! Providers of haystack and needle buffers.
//!
//! Decoding files and grabbing the screen happen outside the matcher; these
//! traits are the seams the matcher and the CLI consume.

use std::collections::HashMap;

use crate::image::buffer::PixelBuffer;
use crate::util::{NeedleFindError, NeedleFindResult};

/// Loads images by identifier.
pub trait ImageSource {
    /// Returns the decoded image for `id`, or `LoadFailure` / `EmptyImage`.
    fn load(&self, id: &str) -> NeedleFindResult<PixelBuffer>;
}

/// Supplies full frames of the screen on demand.
pub trait ScreenCapture {
    fn grab(&mut self) -> NeedleFindResult<PixelBuffer>;
}

fn check_not_empty(buffer: PixelBuffer) -> NeedleFindResult<PixelBuffer> {
    if buffer.width == 0 || buffer.height == 0 || buffer.data.is_empty() {
        return Err(NeedleFindError::EmptyImage { id: buffer.id });
    }
    Ok(buffer)
}

/// Image source backed by a map of already decoded buffers.
#[derive(Clone, Debug, Default)]
pub struct MemorySource {
    images: HashMap<String, PixelBuffer>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `buffer` under `id`, replacing any previous entry.
    pub fn insert(&mut self, id: impl Into<String>, buffer: PixelBuffer) {
        let id = id.into();
        self.images.insert(id.clone(), buffer.with_id(id));
    }
}

impl ImageSource for MemorySource {
    fn load(&self, id: &str) -> NeedleFindResult<PixelBuffer> {
        let buffer = self
            .images
            .get(id)
            .cloned()
            .ok_or_else(|| NeedleFindError::LoadFailure {
                id: id.to_string(),
                reason: "unknown image id".to_string(),
            })?;
        check_not_empty(buffer)
    }
}

/// Image source reading files relative to an optional base directory.
#[cfg(feature = "image-io")]
#[derive(Clone, Debug, Default)]
pub struct FileSource {
    root: Option<std::path::PathBuf>,
}

#[cfg(feature = "image-io")]
impl FileSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_root(root: impl Into<std::path::PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }
}

#[cfg(feature = "image-io")]
impl ImageSource for FileSource {
    fn load(&self, id: &str) -> NeedleFindResult<PixelBuffer> {
        let path = match &self.root {
            Some(root) => root.join(id),
            None => std::path::PathBuf::from(id),
        };
        crate::image::io::load_image(path).and_then(check_not_empty)
    }
}

/// Screen stand-in that replays recorded frames, repeating the last one.
#[derive(Clone, Debug)]
pub struct ReplayScreen {
    frames: Vec<PixelBuffer>,
    next: usize,
}

impl ReplayScreen {
    pub fn new(frames: Vec<PixelBuffer>) -> Self {
        Self { frames, next: 0 }
    }
}

impl ScreenCapture for ReplayScreen {
    fn grab(&mut self) -> NeedleFindResult<PixelBuffer> {
        let index = self.next.min(self.frames.len().saturating_sub(1));
        let frame = self
            .frames
            .get(index)
            .cloned()
            .ok_or_else(|| NeedleFindError::EmptyImage {
                id: "screen".to_string(),
            })?;
        self.next = self.next.saturating_add(1);
        check_not_empty(frame)
    }
}
