//! Sub-pixel peak refinement from a 3x3 response neighbourhood.

pub mod quad1d;
pub mod quad2d;

pub use quad1d::quad_peak_offset_1d;
pub use quad2d::subpixel_offset;
