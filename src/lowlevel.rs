//! Low-level building blocks for custom matching pipelines.
//!
//! These re-exports expose the correlation kernels, peak extraction and
//! overlap filters behind [`Finder`](crate::Finder). Most users should prefer
//! the `Finder` API.

pub use crate::bank::{angle_step_deg, coarse_angles, local_angles, PatternBank};
pub use crate::candidate::nms::{suppress_boxes, DEFAULT_NMS_OVERLAP};
pub use crate::candidate::{filter_overlapping, select_peaks, ScoredRect, SelectParams};
pub use crate::image::pyramid::top_layer;
pub use crate::image::resize::{resize_area, resize_by, scaled_size};
pub use crate::kernel::{
    cross_correlate_with, DefaultKernel, Extremum, IntegralTables, Kernel, MethodStrategy, Peak,
};
pub use crate::refine::{quad_peak_offset_1d, subpixel_offset};
pub use crate::template::rotate::{best_rotation_size, rotated_roi, warp_affine_u8, Affine2};
