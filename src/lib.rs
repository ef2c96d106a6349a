//! needlefind locates a needle image inside a haystack image.
//!
//! The crate offers the six classic correlation methods, an exhaustive
//! matcher that reports every occurrence, a multi-scale sweep, and a
//! rotation-tolerant coarse-to-fine search over image pyramids. Optional
//! features add parallel correlation (`rayon`), SIMD kernels (`simd`), file
//! decoding (`image-io`), debug overlays (`visualize`) and spans/events
//! (`tracing`).

pub mod bank;
mod candidate;
pub mod geometry;
pub mod image;
pub mod kernel;
pub mod lowlevel;
mod refine;
pub mod search;
pub mod source;
pub mod template;
mod trace;
pub mod util;
#[cfg(feature = "visualize")]
pub mod visualize;

pub use geometry::{Point2, Region, RotatedRect, Size2};
pub use image::buffer::{ColorOrder, PixelBuffer, PixelDensity};
pub use image::pyramid::ImagePyramid;
pub use image::{ImageView, OwnedImage};
pub use kernel::{match_template, Method, ResponseMap};
pub use search::{
    DensityCorrection, Finder, MatchOptions, MatchOverrides, MatchResult, RotatedMatch,
    RotationOptions,
};
pub use source::{ImageSource, MemorySource, ReplayScreen, ScreenCapture};
#[cfg(feature = "image-io")]
pub use source::FileSource;
pub use template::{Template, TemplatePlan};
pub use util::{NeedleFindError, NeedleFindResult};
