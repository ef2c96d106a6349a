//! Needle search over a haystack.
//!
//! [`Finder`] is the entry point: it converts both buffers to grayscale,
//! applies the search region, dispatches to the single-shot, exhaustive,
//! multi-scale or rotation search, and validates the raw detections.

pub(crate) mod coarse;
pub(crate) mod exhaustive;
pub mod options;
pub(crate) mod refine;
pub mod rotation;
pub mod validate;

pub use options::{
    DensityCorrection, MatchOptions, MatchOverrides, RotationOptions, DEFAULT_SCALE_STEPS,
};
pub use rotation::RotatedMatch;
pub use validate::validate_search_region;

use crate::candidate::nms::{suppress_boxes, DEFAULT_NMS_OVERLAP};
use crate::geometry::Region;
use crate::image::buffer::{PixelBuffer, PixelDensity};
use crate::image::OwnedImage;
use crate::search::exhaustive::{
    best_match, overwrite_matches, search_multiple_scales, Sweep, SweepParams,
};
use crate::search::rotation::{rotation_search, RotationParams};
use crate::search::validate::{physical_crop, validated_matches, Correction};
use crate::source::ScreenCapture;
use crate::template::Template;
use crate::trace::{trace_event, trace_span};
use crate::util::{NeedleFindError, NeedleFindResult};

/// One accepted detection.
#[derive(Clone, Debug, PartialEq)]
pub struct MatchResult {
    /// Confidence in `[0, 1]`, higher is better.
    pub confidence: f64,
    /// Needle placement in logical haystack pixels.
    pub location: Region,
    /// Failure attached to a search that could not run.
    pub error: Option<NeedleFindError>,
}

/// Grayscale inputs of one search, after the search region was applied.
struct Prepared {
    haystack: OwnedImage,
    needle: Template,
    correction: Correction,
}

impl Prepared {
    fn needle_fits(&self, scale: f64) -> bool {
        let w = self.needle.width() as f64 * scale;
        let h = self.needle.height() as f64 * scale;
        w <= self.haystack.width() as f64 && h <= self.haystack.height() as f64
    }

    fn oversized(&self, scale: f64) -> NeedleFindError {
        NeedleFindError::OversizedNeedle {
            needle_width: self.needle.width(),
            needle_height: self.needle.height(),
            haystack_width: self.haystack.width(),
            haystack_height: self.haystack.height(),
            scale,
        }
    }

    /// Placeholder result carrying the oversize error for single-scale searches.
    fn oversized_result(&self) -> MatchResult {
        MatchResult {
            confidence: 0.0,
            location: Region::default(),
            error: Some(self.oversized(1.0)),
        }
    }
}

/// Template matcher configured with default options.
///
/// ```no_run
/// use needlefind::{Finder, MatchOptions, PixelBuffer};
///
/// let haystack = PixelBuffer::gray(vec![0; 64 * 64], 64, 64);
/// let needle = PixelBuffer::gray(vec![0; 8 * 8], 8, 8);
/// let finder = Finder::new(MatchOptions::default());
/// let best = finder.find_match(&haystack, &needle);
/// ```
#[derive(Clone, Debug, Default)]
pub struct Finder {
    options: MatchOptions,
}

impl Finder {
    pub fn new(options: MatchOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &MatchOptions {
        &self.options
    }

    /// Best single match using the default options.
    pub fn find_match(
        &self,
        haystack: &PixelBuffer,
        needle: &PixelBuffer,
    ) -> NeedleFindResult<MatchResult> {
        self.find_match_with(haystack, needle, &MatchOverrides::default())
    }

    /// Best single match with per-call overrides.
    pub fn find_match_with(
        &self,
        haystack: &PixelBuffer,
        needle: &PixelBuffer,
        overrides: &MatchOverrides,
    ) -> NeedleFindResult<MatchResult> {
        let opts = self.options.merged(overrides);
        let _span = trace_span!("find_match", method = opts.method.name()).entered();
        let prepared = prepare(haystack, needle, &opts)?;

        let (found, best_rejected) = if let Some(params) = rotation_params(&opts) {
            let rotated = rotation_search(prepared.haystack.view(), prepared.needle.view(), &params)?;
            (rotated_to_results(&rotated), None)
        } else if opts.search_multiple_scales {
            let mut working = prepared.haystack.clone();
            let sweep = search_multiple_scales(
                &mut working,
                prepared.needle.view(),
                &opts.scale_steps,
                &sweep_params(&opts, true),
            )?;
            (sweep.hits.into_iter().take(1).collect(), sweep.best_rejected)
        } else if !prepared.needle_fits(1.0) {
            (vec![prepared.oversized_result()], None)
        } else {
            let best = best_match(prepared.haystack.view(), prepared.needle.view(), opts.method)?;
            (best.into_iter().collect(), None)
        };

        validated_matches(found, best_rejected, &prepared.correction, opts.confidence)?
            .into_iter()
            .next()
            .ok_or(NeedleFindError::NoMatchFound {
                threshold: opts.confidence,
                best: None,
            })
    }

    /// Every match using the default options, best first.
    pub fn find_matches(
        &self,
        haystack: &PixelBuffer,
        needle: &PixelBuffer,
    ) -> NeedleFindResult<Vec<MatchResult>> {
        self.find_matches_with(haystack, needle, &MatchOverrides::default())
    }

    /// Every match with per-call overrides, best first.
    pub fn find_matches_with(
        &self,
        haystack: &PixelBuffer,
        needle: &PixelBuffer,
        overrides: &MatchOverrides,
    ) -> NeedleFindResult<Vec<MatchResult>> {
        let opts = self.options.merged(overrides);
        let _span = trace_span!("find_matches", method = opts.method.name()).entered();
        let prepared = prepare(haystack, needle, &opts)?;

        let (found, best_rejected) = if let Some(params) = rotation_params(&opts) {
            let rotated = rotation_search(prepared.haystack.view(), prepared.needle.view(), &params)?;
            (rotated_to_results(&rotated), None)
        } else if !opts.search_multiple_scales && !prepared.needle_fits(1.0) {
            (vec![prepared.oversized_result()], None)
        } else {
            let mut working = prepared.haystack.clone();
            let params = sweep_params(&opts, false);
            let sweep = if opts.search_multiple_scales {
                search_multiple_scales(&mut working, prepared.needle.view(), &opts.scale_steps, &params)?
            } else {
                overwrite_matches(&mut working, prepared.needle.view(), &params)?
            };
            let Sweep { hits, best_rejected } = sweep;
            (suppress(hits), best_rejected)
        };

        validated_matches(found, best_rejected, &prepared.correction, opts.confidence)
    }

    /// Rotated detections with their corners and angles, best first.
    pub fn find_rotated_matches(
        &self,
        haystack: &PixelBuffer,
        needle: &PixelBuffer,
        overrides: &MatchOverrides,
    ) -> NeedleFindResult<Vec<RotatedMatch>> {
        let mut opts = self.options.merged(overrides);
        if opts.rotation.is_none() {
            opts.rotation = Some(RotationOptions {
                tolerance_deg: 0.0,
                ..RotationOptions::default()
            });
        }
        let _span = trace_span!("find_rotated_matches").entered();
        let prepared = prepare(haystack, needle, &opts)?;
        let params = rotation_params(&opts).ok_or(NeedleFindError::InvalidInput(
            "rotation search is not configured",
        ))?;
        let rotated = rotation_search(prepared.haystack.view(), prepared.needle.view(), &params)?;
        validated_matches(rotated, None, &prepared.correction, opts.confidence)
    }

    /// Grabs a frame from `screen` and returns the best match in it.
    pub fn find_match_on_screen<S: ScreenCapture + ?Sized>(
        &self,
        screen: &mut S,
        needle: &PixelBuffer,
        overrides: &MatchOverrides,
    ) -> NeedleFindResult<MatchResult> {
        let frame = screen.grab()?;
        self.find_match_with(&frame, needle, overrides)
    }

    /// Grabs a frame from `screen` and returns every match in it.
    pub fn find_matches_on_screen<S: ScreenCapture + ?Sized>(
        &self,
        screen: &mut S,
        needle: &PixelBuffer,
        overrides: &MatchOverrides,
    ) -> NeedleFindResult<Vec<MatchResult>> {
        let frame = screen.grab()?;
        self.find_matches_with(&frame, needle, overrides)
    }
}

fn sweep_params(opts: &MatchOptions, first_only: bool) -> SweepParams {
    SweepParams {
        method: opts.method,
        confidence: opts.confidence,
        first_only,
        debug: opts.debug,
    }
}

fn rotation_params(opts: &MatchOptions) -> Option<RotationParams> {
    let rotation = opts.rotation.as_ref()?;
    Some(RotationParams {
        tolerance_deg: rotation.tolerance_deg,
        confidence: opts.confidence,
        max_overlap: opts.rotation_max_overlap(),
        min_reduced_area: rotation.min_reduced_area,
        max_results: rotation.max_results,
        stop_layer: rotation.stop_layer,
        subpixel: rotation.subpixel,
        debug: opts.debug,
    })
}

fn rotated_to_results(rotated: &[RotatedMatch]) -> Vec<MatchResult> {
    rotated
        .iter()
        .map(|m| MatchResult {
            confidence: m.score,
            location: m.region(),
            error: None,
        })
        .collect()
}

fn suppress(hits: Vec<MatchResult>) -> Vec<MatchResult> {
    let boxes: Vec<Region> = hits.iter().map(|m| m.location).collect();
    let keep = suppress_boxes(&boxes, DEFAULT_NMS_OVERLAP);
    trace_event!("nms", before = hits.len(), after = keep.len());
    let mut slots: Vec<Option<MatchResult>> = hits.into_iter().map(Some).collect();
    keep.into_iter().filter_map(|i| slots[i].take()).collect()
}

/// Validates options and the search region, converts both buffers to
/// grayscale and crops the haystack.
fn prepare(
    haystack: &PixelBuffer,
    needle: &PixelBuffer,
    opts: &MatchOptions,
) -> NeedleFindResult<Prepared> {
    opts.validate()?;
    let needle_gray = needle.to_gray()?;
    let haystack_gray = haystack.to_gray()?;
    let density = haystack.density;

    let (haystack_gray, origin) = match &opts.roi {
        Some(roi) => {
            let (frame_w, frame_h) = logical_size(haystack);
            validate_search_region(roi, frame_w, frame_h)?;
            let (x, y, w, h) =
                physical_crop(roi, haystack_gray.view(), density, opts.density_correction)?;
            let cropped = haystack_gray.view().crop(x, y, w, h)?.to_owned_image();
            (cropped, (x as f64, y as f64))
        }
        None => (haystack_gray, (0.0, 0.0)),
    };

    let prepared = Prepared {
        haystack: haystack_gray,
        needle: Template::from_image(needle_gray),
        correction: Correction::new(origin, density, opts.density_correction),
    };
    if opts.rotation.is_some() && !prepared.needle_fits(1.0) {
        return Err(prepared.oversized(1.0));
    }
    if opts.rotation.is_none() && opts.search_multiple_scales {
        let min_scale = opts.min_scale();
        if !prepared.needle_fits(min_scale) {
            return Err(prepared.oversized(min_scale));
        }
    }
    Ok(prepared)
}

fn logical_extent(physical: usize, scale: f64) -> f64 {
    if scale.is_finite() && scale > 0.0 {
        physical as f64 / scale
    } else {
        physical as f64
    }
}

/// Size of `buffer` in logical pixels.
pub fn logical_size(buffer: &PixelBuffer) -> (f64, f64) {
    let PixelDensity { scale_x, scale_y } = buffer.density;
    (
        logical_extent(buffer.width, scale_x),
        logical_extent(buffer.height, scale_y),
    )
}
