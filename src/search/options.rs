//! Search options and per-call overrides.
//!
//! `MatchOptions` holds the defaults a [`Finder`](crate::search::Finder) is
//! created with. Each call may pass `MatchOverrides`; the two are merged once
//! into a fresh options value, so no call can leak settings into the next.

use crate::geometry::Region;
use crate::kernel::Method;
use crate::util::{NeedleFindError, NeedleFindResult};

/// Default scale ladder, largest first.
pub const DEFAULT_SCALE_STEPS: [f64; 6] = [1.0, 0.9, 0.8, 0.7, 0.6, 0.5];

/// How pixel density is removed from reported coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DensityCorrection {
    /// Divide by the density only when both axes share the same factor.
    #[default]
    UniformOnly,
    /// Divide x and width by `scale_x`, y and height by `scale_y`.
    PerAxis,
}

/// Rotation-tolerant search settings.
#[derive(Clone, Debug, PartialEq)]
pub struct RotationOptions {
    /// Half-width of the searched angle window in degrees.
    pub tolerance_deg: f64,
    /// Allowed overlap between detections; defaults to `1 - min(scale_steps)`.
    pub max_overlap: Option<f64>,
    /// The needle pyramid is reduced until a level's area is at most this.
    pub min_reduced_area: usize,
    /// Maximum number of detections returned.
    pub max_results: usize,
    /// Finest pyramid level refined to (0 or 1).
    pub stop_layer: usize,
    /// Refine the final position with a quadratic fit.
    pub subpixel: bool,
}

impl Default for RotationOptions {
    fn default() -> Self {
        Self {
            tolerance_deg: 180.0,
            max_overlap: None,
            min_reduced_area: 2048,
            max_results: 70,
            stop_layer: 0,
            subpixel: false,
        }
    }
}

/// Options for one search.
#[derive(Clone, Debug, PartialEq)]
pub struct MatchOptions {
    /// Minimum confidence in `[0, 1]`, higher is better for every method.
    pub confidence: f64,
    /// Sweep the scale ladder over needle and haystack.
    pub search_multiple_scales: bool,
    pub method: Method,
    /// Descending scale factors used by the multi-scale sweep.
    pub scale_steps: Vec<f64>,
    /// Enables the rotation search when set.
    pub rotation: Option<RotationOptions>,
    /// Search region in logical pixels of the haystack.
    pub roi: Option<Region>,
    /// Emits per-iteration debug events.
    pub debug: bool,
    pub density_correction: DensityCorrection,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            confidence: 0.8,
            search_multiple_scales: false,
            method: Method::CcoeffNormed,
            scale_steps: DEFAULT_SCALE_STEPS.to_vec(),
            rotation: None,
            roi: None,
            debug: false,
            density_correction: DensityCorrection::UniformOnly,
        }
    }
}

/// Per-call replacements for individual options.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MatchOverrides {
    pub confidence: Option<f64>,
    pub search_multiple_scales: Option<bool>,
    pub method: Option<Method>,
    pub scale_steps: Option<Vec<f64>>,
    pub rotation: Option<RotationOptions>,
    pub roi: Option<Region>,
    pub debug: Option<bool>,
    pub density_correction: Option<DensityCorrection>,
}

impl MatchOptions {
    /// Returns these options with every set override applied.
    pub fn merged(&self, overrides: &MatchOverrides) -> Self {
        Self {
            confidence: overrides.confidence.unwrap_or(self.confidence),
            search_multiple_scales: overrides
                .search_multiple_scales
                .unwrap_or(self.search_multiple_scales),
            method: overrides.method.unwrap_or(self.method),
            scale_steps: overrides
                .scale_steps
                .clone()
                .unwrap_or_else(|| self.scale_steps.clone()),
            rotation: overrides.rotation.clone().or_else(|| self.rotation.clone()),
            roi: overrides.roi.or(self.roi),
            debug: overrides.debug.unwrap_or(self.debug),
            density_correction: overrides
                .density_correction
                .unwrap_or(self.density_correction),
        }
    }

    /// Smallest factor of the scale ladder, 1 when the ladder is empty.
    pub fn min_scale(&self) -> f64 {
        self.scale_steps
            .iter()
            .copied()
            .filter(|s| s.is_finite())
            .fold(None, |acc: Option<f64>, s| Some(acc.map_or(s, |a| a.min(s))))
            .unwrap_or(1.0)
    }

    /// Overlap allowed by the rotation search.
    pub fn rotation_max_overlap(&self) -> f64 {
        self.rotation
            .as_ref()
            .and_then(|r| r.max_overlap)
            .unwrap_or(1.0 - self.min_scale())
            .clamp(0.0, 1.0)
    }

    pub(crate) fn validate(&self) -> NeedleFindResult<()> {
        if !self.confidence.is_finite() || !(0.0..=1.0).contains(&self.confidence) {
            return Err(NeedleFindError::InvalidInput("confidence must be within [0, 1]"));
        }
        if self.search_multiple_scales && self.scale_steps.is_empty() {
            return Err(NeedleFindError::InvalidInput("scale ladder is empty"));
        }
        if self.scale_steps.iter().any(|s| !s.is_finite()) {
            return Err(NeedleFindError::InvalidInput("scale factors must be finite"));
        }
        if let Some(rotation) = &self.rotation {
            if !rotation.tolerance_deg.is_finite() || rotation.tolerance_deg < 0.0 {
                return Err(NeedleFindError::InvalidInput(
                    "rotation tolerance must be a non-negative angle",
                ));
            }
            if rotation.stop_layer > 1 {
                return Err(NeedleFindError::InvalidInput("stop layer must be 0 or 1"));
            }
        }
        Ok(())
    }
}
