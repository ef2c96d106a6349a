//! Coarse-to-fine refinement of rotation candidates.
//!
//! A candidate found at the coarsest level is carried down the pyramid one
//! level at a time. At each level a padded window is cut out of the haystack
//! as it appears when rotated by the candidate angle, the needle is correlated
//! against it for three neighbouring angles, and the best response moves the
//! candidate. A candidate whose best score drops below the level threshold is
//! abandoned.

use crate::bank::{local_angles, PatternBank};
use crate::geometry::Point2;
use crate::image::pyramid::ImagePyramid;
use crate::kernel::{match_template, Extremum, Method};
use crate::refine::subpixel_offset;
use crate::template::rotate::{rotated_roi, ROI_PADDING};
use crate::trace::trace_debug;
use crate::util::math::rotate_point;
use crate::util::{NeedleFindError, NeedleFindResult};

/// Position, score and angle of one candidate.
///
/// `pt` is the needle's top-left corner at the level the candidate was
/// produced on. `angle_window` brackets the angles still plausible for it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Candidate {
    pub(crate) pt: Point2,
    pub(crate) score: f64,
    pub(crate) angle_deg: f64,
    pub(crate) angle_window: (f64, f64),
}

/// Settings shared by every refinement step of one search.
#[derive(Clone, Copy, Debug)]
pub(crate) struct RefineParams<'a> {
    pub(crate) tolerance_deg: f64,
    pub(crate) stop_layer: usize,
    pub(crate) subpixel: bool,
    /// Minimum score per level, indexed by level.
    pub(crate) layer_scores: &'a [f64],
    pub(crate) debug: bool,
}

/// Best response over the angles tried at one level.
#[derive(Clone, Copy, Debug)]
struct LevelBest {
    x: usize,
    y: usize,
    score: f64,
    angle_deg: f64,
    on_border: bool,
    neighborhood: Option<[[f32; 3]; 3]>,
}

fn center_of(width: usize, height: usize) -> Point2 {
    Point2::new((width as f64 - 1.0) / 2.0, (height as f64 - 1.0) / 2.0)
}

fn level_scale(level: usize) -> f64 {
    if level == 0 {
        1.0
    } else {
        2.0
    }
}

/// Refines a coarse candidate from level `top` down to the stop layer.
///
/// Returns `None` when the candidate is abandoned. The returned position is
/// expressed at level 0 if the stop layer is 0, otherwise at level
/// `stop_layer - 1` (one step finer than the stop layer).
pub(crate) fn refine_candidate(
    haystack: &ImagePyramid,
    bank: &PatternBank,
    top: usize,
    coarse: Candidate,
    params: &RefineParams<'_>,
) -> NeedleFindResult<Option<Candidate>> {
    let top_view = haystack
        .level(top)
        .ok_or(NeedleFindError::InvalidInput("haystack level missing"))?;
    let top_center = center_of(top_view.width(), top_view.height());
    let (x, y) = rotate_point(
        coarse.pt.x,
        coarse.pt.y,
        top_center.x,
        top_center.y,
        -coarse.angle_deg,
    );
    let mut pt_lt = Point2::new(x, y);

    if top <= params.stop_layer {
        let s = level_scale(top);
        return Ok(Some(Candidate {
            pt: Point2::new(pt_lt.x * s, pt_lt.y * s),
            ..coarse
        }));
    }

    let mut angle = coarse.angle_deg;
    let mut window = coarse.angle_window;
    for level in (params.stop_layer..top).rev() {
        let src = haystack
            .level(level)
            .ok_or(NeedleFindError::InvalidInput("haystack level missing"))?;
        let plan = bank
            .plan(level)
            .ok_or(NeedleFindError::InvalidInput("needle level missing"))?;
        let step = bank
            .angle_step(level)
            .ok_or(NeedleFindError::InvalidInput("needle level missing"))?;
        let anchor = Point2::new(pt_lt.x * 2.0, pt_lt.y * 2.0);

        let mut best: Option<LevelBest> = None;
        for a in local_angles(angle, step, params.tolerance_deg) {
            let roi = rotated_roi(
                src,
                plan.width(),
                plan.height(),
                anchor,
                a,
                bank.border_color(),
            )?;
            let response = match_template(roi.view(), plan, Method::CcoeffNormed)?;
            let Some(peak) = response.locate(Extremum::Max) else {
                continue;
            };
            let score = f64::from(peak.value);
            if best.map_or(true, |b| score > b.score) {
                best = Some(LevelBest {
                    x: peak.x,
                    y: peak.y,
                    score,
                    angle_deg: a,
                    on_border: response.is_on_border(peak.x, peak.y),
                    neighborhood: response.neighborhood(peak.x, peak.y),
                });
            }
        }

        let Some(best) = best else {
            return Ok(None);
        };
        let threshold = params.layer_scores.get(level).copied().unwrap_or(0.0);
        trace_debug!(
            params.debug,
            "refine_level",
            level = level,
            angle = best.angle_deg,
            window_start = window.0,
            window_end = window.1,
            score = best.score,
            threshold = threshold
        );
        if best.score < threshold {
            return Ok(None);
        }

        let src_center = center_of(src.width(), src.height());
        let (px, py) = rotate_point(
            anchor.x,
            anchor.y,
            src_center.x,
            src_center.y,
            best.angle_deg,
        );
        let pad = ROI_PADDING as f64;
        let mut loc = Point2::new(best.x as f64, best.y as f64);
        if params.subpixel && level == params.stop_layer && !best.on_border {
            if let Some(n) = best.neighborhood {
                let (dx, dy) = subpixel_offset(n);
                loc = Point2::new(loc.x + dx, loc.y + dy);
            }
        }
        let (x, y) = rotate_point(
            loc.x + px - pad,
            loc.y + py - pad,
            src_center.x,
            src_center.y,
            -best.angle_deg,
        );

        window = (best.angle_deg - step / 2.0, best.angle_deg + step / 2.0);
        if level == params.stop_layer {
            let s = level_scale(params.stop_layer);
            return Ok(Some(Candidate {
                pt: Point2::new(x * s, y * s),
                score: best.score,
                angle_deg: best.angle_deg,
                angle_window: window,
            }));
        }
        angle = best.angle_deg;
        pt_lt = Point2::new(x, y);
    }
    Ok(None)
}
