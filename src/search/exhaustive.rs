//! Exhaustive matching by repeated correlate-and-erase.
//!
//! Every accepted hit is painted black in a working copy of the haystack
//! before the next correlation, so the same placement is never reported
//! twice. The scale sweeps repeat this over a ladder of needle or haystack
//! sizes while sharing one working copy.

use crate::geometry::Region;
use crate::image::resize::{resize_area, scaled_size};
use crate::image::{ImageView, OwnedImage};
use crate::kernel::{match_template, Method, Peak};
use crate::search::MatchResult;
use crate::template::TemplatePlan;
use crate::trace::{trace_debug, trace_event, trace_span};
use crate::util::NeedleFindResult;

/// Scaled operands at or below this size end a sweep.
pub(crate) const MIN_SCALED_DIM: usize = 10;

/// Extra pixels erased beyond the needle on the right and bottom.
const ERASE_MARGIN: i64 = 2;

#[derive(Clone, Copy, Debug)]
pub(crate) struct SweepParams {
    pub(crate) method: Method,
    pub(crate) confidence: f64,
    /// Stop after the first accepted hit.
    pub(crate) first_only: bool,
    pub(crate) debug: bool,
}

/// Hits of a sweep plus the best confidence that failed the threshold.
#[derive(Clone, Debug, Default)]
pub(crate) struct Sweep {
    pub(crate) hits: Vec<MatchResult>,
    pub(crate) best_rejected: Option<f64>,
}

impl Sweep {
    fn note_rejected(&mut self, confidence: f64) {
        if self.best_rejected.map_or(true, |b| confidence > b) {
            self.best_rejected = Some(confidence);
        }
    }

    fn absorb(&mut self, other: Sweep) {
        self.hits.extend(other.hits);
        if let Some(c) = other.best_rejected {
            self.note_rejected(c);
        }
    }
}

fn hit(peak: Peak, method: Method, width: usize, height: usize) -> MatchResult {
    MatchResult {
        confidence: method.strategy().confidence(f64::from(peak.value)),
        location: Region::new(peak.x as f64, peak.y as f64, width as f64, height as f64),
        error: None,
    }
}

/// Correlates once and reports the global extremum.
pub(crate) fn best_match(
    haystack: ImageView<'_, u8>,
    needle: ImageView<'_, u8>,
    method: Method,
) -> NeedleFindResult<Option<MatchResult>> {
    let plan = TemplatePlan::from_view(needle)?;
    let response = match_template(haystack, &plan, method)?;
    Ok(response
        .locate(method.strategy().extremum)
        .map(|peak| hit(peak, method, plan.width(), plan.height())))
}

/// Finds every placement of `needle` passing the threshold, erasing each hit.
///
/// The loop ends when the extremum fails the threshold, or when it is
/// identical in position and value to the previous one (the erase had no
/// effect).
pub(crate) fn overwrite_matches(
    haystack: &mut OwnedImage,
    needle: ImageView<'_, u8>,
    params: &SweepParams,
) -> NeedleFindResult<Sweep> {
    let plan = TemplatePlan::from_view(needle)?;
    let strategy = params.method.strategy();
    let (w, h) = (plan.width(), plan.height());
    let _span = trace_span!("exhaustive_sweep", width = w, height = h).entered();
    let mut sweep = Sweep::default();
    let mut previous: Option<Peak> = None;

    loop {
        let response = match_template(haystack.view(), &plan, params.method)?;
        let Some(peak) = response.locate(strategy.extremum) else {
            break;
        };
        if previous == Some(peak) {
            trace_event!("stagnation_stop", x = peak.x, y = peak.y);
            break;
        }
        previous = Some(peak);

        let value = f64::from(peak.value);
        trace_debug!(
            params.debug,
            "erase_iteration",
            x = peak.x,
            y = peak.y,
            value = value
        );
        if !strategy.passes(value, params.confidence) {
            sweep.note_rejected(strategy.confidence(value));
            trace_event!("best_rejected", confidence = strategy.confidence(value));
            break;
        }
        let (x, y) = (peak.x as i64, peak.y as i64);
        haystack.fill_rect(x, y, x + w as i64 + ERASE_MARGIN, y + h as i64 + ERASE_MARGIN, 0);
        sweep.hits.push(hit(peak, params.method, w, h));
        if params.first_only {
            break;
        }
    }
    Ok(sweep)
}

fn too_small(width: usize, height: usize) -> bool {
    width <= MIN_SCALED_DIM || height <= MIN_SCALED_DIM
}

/// Sweeps the scale ladder over the needle against the working haystack.
///
/// Hits are in haystack coordinates and carry the scaled needle size.
pub(crate) fn scale_needle(
    haystack: &mut OwnedImage,
    needle: ImageView<'_, u8>,
    scales: &[f64],
    params: &SweepParams,
) -> NeedleFindResult<Sweep> {
    let _span = trace_span!("scale_needle", steps = scales.len()).entered();
    let mut sweep = Sweep::default();
    for &scale in scales {
        let (sw, sh) = scaled_size(needle.width(), needle.height(), scale);
        if too_small(sw, sh) || sw > haystack.width() || sh > haystack.height() {
            break;
        }
        let scaled = resize_area(needle, sw, sh)?;
        let step = overwrite_matches(haystack, scaled.view(), params)?;
        trace_debug!(params.debug, "scale_step", scale = scale, hits = step.hits.len());
        let found = !step.hits.is_empty();
        sweep.absorb(step);
        if params.first_only && found {
            break;
        }
    }
    Ok(sweep)
}

/// Sweeps the scale ladder over the haystack.
///
/// Each step rescales the full-resolution working copy, so erasures from
/// earlier steps carry over. Hit positions are mapped back to full
/// resolution; the reported size stays the needle size.
pub(crate) fn scale_haystack(
    haystack: &mut OwnedImage,
    needle: ImageView<'_, u8>,
    scales: &[f64],
    params: &SweepParams,
) -> NeedleFindResult<Sweep> {
    let _span = trace_span!("scale_haystack", steps = scales.len()).entered();
    let mut sweep = Sweep::default();
    for &scale in scales {
        let (sw, sh) = scaled_size(haystack.width(), haystack.height(), scale);
        if too_small(sw, sh) || needle.width() > sw || needle.height() > sh {
            break;
        }
        let mut scaled = resize_area(haystack.view(), sw, sh)?;
        let factor = if scale.is_finite() && scale > 0.0 { scale } else { 1.0 };
        let mut step = overwrite_matches(&mut scaled, needle, params)?;
        for found in &mut step.hits {
            let loc = found.location;
            haystack.fill_rect(
                (loc.left / factor).floor() as i64,
                (loc.top / factor).floor() as i64,
                ((loc.right() + ERASE_MARGIN as f64) / factor).ceil() as i64,
                ((loc.bottom() + ERASE_MARGIN as f64) / factor).ceil() as i64,
                0,
            );
            found.location = Region::new(loc.left / factor, loc.top / factor, loc.width, loc.height);
        }
        trace_debug!(params.debug, "scale_step", scale = scale, hits = step.hits.len());
        let found = !step.hits.is_empty();
        sweep.absorb(step);
        if params.first_only && found {
            break;
        }
    }
    Ok(sweep)
}

/// Needle sweep followed by a haystack sweep on the same working copy.
pub(crate) fn search_multiple_scales(
    haystack: &mut OwnedImage,
    needle: ImageView<'_, u8>,
    scales: &[f64],
    params: &SweepParams,
) -> NeedleFindResult<Sweep> {
    let mut sweep = scale_needle(haystack, needle, scales, params)?;
    if params.first_only && !sweep.hits.is_empty() {
        return Ok(sweep);
    }
    let rest = scale_haystack(haystack, needle, scales, params)?;
    sweep.absorb(rest);
    trace_event!("multi_scale_hits", count = sweep.hits.len());
    Ok(sweep)
}
