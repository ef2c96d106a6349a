//! Rotation-tolerant search over an image pyramid.
//!
//! The search runs in three stages: a full angle sweep at the coarsest level
//! ([`coarse`](crate::search::coarse)), per-candidate refinement down to the
//! stop layer ([`refine`](crate::search::refine)), and a final pass that turns
//! candidates into rotated boxes and drops overlapping detections.

use crate::bank::PatternBank;
use crate::candidate::{filter_overlapping, ScoredRect};
use crate::geometry::{Point2, Region, RotatedRect, Size2};
use crate::image::pyramid::ImagePyramid;
use crate::image::ImageView;
use crate::kernel::Extremum;
use crate::search::coarse::{coarse_candidates, CoarseParams};
use crate::search::refine::{refine_candidate, Candidate, RefineParams};
use crate::trace::{trace_event, trace_span};
use crate::util::math::{sin_cos_deg, wrap_deg};
use crate::util::{NeedleFindError, NeedleFindResult};

/// Score decay applied per pyramid level to the acceptance threshold.
const LAYER_SCORE_DECAY: f64 = 0.9;

/// One rotated detection in haystack coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RotatedMatch {
    pub top_left: Point2,
    pub top_right: Point2,
    pub bottom_right: Point2,
    pub bottom_left: Point2,
    pub center: Point2,
    /// Rotation of the needle in the haystack, counter-clockwise on screen.
    pub angle_deg: f64,
    pub score: f64,
    pub size: Size2,
}

impl RotatedMatch {
    /// Corners in drawing order, starting at the top-left.
    pub fn corners(&self) -> [Point2; 4] {
        [
            self.top_left,
            self.top_right,
            self.bottom_right,
            self.bottom_left,
        ]
    }

    /// Axis-aligned region anchored at the rotated top-left corner.
    pub fn region(&self) -> Region {
        Region::new(
            self.top_left.x,
            self.top_left.y,
            self.size.width,
            self.size.height,
        )
    }

    pub(crate) fn map_points(&mut self, f: impl Fn(Point2) -> Point2) {
        self.top_left = f(self.top_left);
        self.top_right = f(self.top_right);
        self.bottom_right = f(self.bottom_right);
        self.bottom_left = f(self.bottom_left);
        self.center = f(self.center);
    }
}

/// Resolved settings of one rotation search.
#[derive(Clone, Copy, Debug)]
pub(crate) struct RotationParams {
    pub(crate) tolerance_deg: f64,
    pub(crate) confidence: f64,
    pub(crate) max_overlap: f64,
    pub(crate) min_reduced_area: usize,
    pub(crate) max_results: usize,
    pub(crate) stop_layer: usize,
    pub(crate) subpixel: bool,
    pub(crate) debug: bool,
}

/// Finds rotated occurrences of `needle` in `haystack`, best first.
pub(crate) fn rotation_search(
    haystack: ImageView<'_, u8>,
    needle: ImageView<'_, u8>,
    params: &RotationParams,
) -> NeedleFindResult<Vec<RotatedMatch>> {
    if needle.width() > haystack.width() || needle.height() > haystack.height() {
        return Err(NeedleFindError::OversizedNeedle {
            needle_width: needle.width(),
            needle_height: needle.height(),
            haystack_width: haystack.width(),
            haystack_height: haystack.height(),
            scale: 1.0,
        });
    }
    let _span = trace_span!(
        "rotation_search",
        tolerance = params.tolerance_deg,
        max_results = params.max_results
    )
    .entered();

    let bank = PatternBank::learn(needle, params.min_reduced_area)?;
    let pyramid = ImagePyramid::build_u8(haystack, bank.num_levels())?;
    let top = bank.top_level().min(pyramid.len() - 1);
    let stop_layer = params.stop_layer.min(top);

    let layer_scores: Vec<f64> = (0..=top)
        .map(|level| params.confidence * LAYER_SCORE_DECAY.powi(level as i32))
        .collect();

    let top_view = pyramid
        .level(top)
        .ok_or(NeedleFindError::InvalidInput("haystack level missing"))?;
    let coarse = coarse_candidates(
        top_view,
        &bank,
        top,
        &CoarseParams {
            tolerance_deg: params.tolerance_deg,
            threshold: layer_scores[top],
            max_results: params.max_results,
            max_overlap: params.max_overlap,
            debug: params.debug,
        },
    )?;

    let refine = RefineParams {
        tolerance_deg: params.tolerance_deg,
        stop_layer,
        subpixel: params.subpixel,
        layer_scores: &layer_scores,
        debug: params.debug,
    };
    let mut refined = Vec::with_capacity(coarse.len());
    {
        let _span = trace_span!("refine_candidates", candidates = coarse.len()).entered();
        for candidate in coarse {
            if let Some(c) = refine_candidate(&pyramid, &bank, top, candidate, &refine)? {
                refined.push(c);
            }
        }
    }
    trace_event!("refined_candidates", count = refined.len());

    let (nw, nh) = bank
        .level_size(stop_layer)
        .ok_or(NeedleFindError::InvalidInput("needle level missing"))?;
    let s = if stop_layer == 0 { 1.0 } else { 2.0 };
    let size = Size2::new(nw as f64 * s, nh as f64 * s);
    Ok(finalize(refined, size, params))
}

/// Rotated box of a candidate whose top-left corner is `pt`.
fn candidate_rect(c: &Candidate, size: Size2) -> (RotatedRect, [Point2; 4]) {
    let (sin, cos) = sin_cos_deg(-c.angle_deg);
    let lt = c.pt;
    let rt = Point2::new(lt.x + size.width * cos, lt.y - size.width * sin);
    let lb = Point2::new(lt.x + size.height * sin, lt.y + size.height * cos);
    let rb = Point2::new(rt.x + size.height * sin, rt.y + size.height * cos);
    let angle = (rt.y - lt.y).atan2(rt.x - lt.x).to_degrees();
    (RotatedRect::from_diagonal(lt, rb, size, angle), [lt, rt, rb, lb])
}

fn finalize(mut refined: Vec<Candidate>, size: Size2, params: &RotationParams) -> Vec<RotatedMatch> {
    refined.retain(|c| c.score >= params.confidence);
    refined.sort_by(|a, b| b.score.total_cmp(&a.score));

    let boxes: Vec<(RotatedRect, [Point2; 4])> =
        refined.iter().map(|c| candidate_rect(c, size)).collect();
    let scored: Vec<ScoredRect> = boxes
        .iter()
        .zip(&refined)
        .map(|((rect, _), c)| ScoredRect {
            rect: *rect,
            score: c.score,
        })
        .collect();
    let kept = filter_overlapping(&scored, Extremum::Max, params.max_overlap);

    let mut out: Vec<RotatedMatch> = kept
        .into_iter()
        .map(|i| {
            let [lt, rt, rb, lb] = boxes[i].1;
            let center = Point2::new(
                (lt.x + rt.x + rb.x + lb.x) / 4.0,
                (lt.y + rt.y + rb.y + lb.y) / 4.0,
            );
            RotatedMatch {
                top_left: lt,
                top_right: rt,
                bottom_right: rb,
                bottom_left: lb,
                center,
                angle_deg: wrap_deg(-refined[i].angle_deg),
                score: refined[i].score,
                size,
            }
        })
        .collect();
    out.sort_by(|a, b| b.score.total_cmp(&a.score));
    out.truncate(params.max_results);
    out
}
