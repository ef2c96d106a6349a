//! Learned needle pyramid used by the rotation search.
//!
//! A `PatternBank` is built once per search call: the needle is reduced with
//! the same 2x box pyramid as the haystack, and each level carries its own
//! statistics so the correlation can be normalized without touching the
//! needle pixels again.

use crate::image::pyramid::{top_layer, ImagePyramid};
use crate::image::ImageView;
use crate::template::TemplatePlan;
use crate::util::NeedleFindResult;

pub mod angles;

pub use angles::{angle_step_deg, coarse_angles, local_angles};

/// Needle pyramid with per-level statistics.
#[derive(Clone, Debug)]
pub struct PatternBank {
    pyramid: ImagePyramid,
    plans: Vec<TemplatePlan>,
    border_color: u8,
}

impl PatternBank {
    /// Learns a needle, reducing it until a level's area is at most `min_reduced_area`.
    pub fn learn(needle: ImageView<'_, u8>, min_reduced_area: usize) -> NeedleFindResult<Self> {
        let top = top_layer(needle.width(), needle.height(), min_reduced_area);
        let pyramid = ImagePyramid::build_u8(needle, top + 1)?;
        let plans = pyramid
            .levels()
            .iter()
            .map(|level| TemplatePlan::from_view(level.view()))
            .collect::<NeedleFindResult<Vec<_>>>()?;
        let border_color = plans[0].border_color();
        Ok(Self {
            pyramid,
            plans,
            border_color,
        })
    }

    /// Number of levels, including the base.
    pub fn num_levels(&self) -> usize {
        self.plans.len()
    }

    /// Index of the coarsest level.
    pub fn top_level(&self) -> usize {
        self.plans.len() - 1
    }

    pub fn level(&self, index: usize) -> Option<ImageView<'_, u8>> {
        self.pyramid.level(index)
    }

    pub fn plan(&self, index: usize) -> Option<&TemplatePlan> {
        self.plans.get(index)
    }

    /// Size of the needle at `index`.
    pub fn level_size(&self, index: usize) -> Option<(usize, usize)> {
        self.plans.get(index).map(|p| (p.width(), p.height()))
    }

    /// Angle step at a level, in degrees.
    pub fn angle_step(&self, index: usize) -> Option<f64> {
        self.level_size(index).map(|(w, h)| angle_step_deg(w, h))
    }

    /// Padding value for rotated crops, derived from the base level mean.
    pub fn border_color(&self) -> u8 {
        self.border_color
    }
}
