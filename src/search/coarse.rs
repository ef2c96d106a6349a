//! Full-range angle search at the coarsest pyramid level.
//!
//! For every sampled angle the coarsest haystack level is rotated into a
//! canvas large enough to hold the whole rotated image, the needle is
//! correlated over the canvas, and the strongest peaks become candidates.

use crate::bank::{coarse_angles, PatternBank};
use crate::candidate::{select_peaks, SelectParams};
use crate::geometry::Point2;
use crate::image::ImageView;
use crate::kernel::{match_template, Extremum, Method};
use crate::search::refine::Candidate;
use crate::template::rotate::{best_rotation_size, warp_affine_u8, Affine2};
use crate::trace::{trace_debug, trace_event, trace_span};
use crate::util::{NeedleFindError, NeedleFindResult};

/// Extra peaks kept per angle on top of the requested result count.
const EXTRA_PEAKS_PER_ANGLE: usize = 5;

#[derive(Clone, Copy, Debug)]
pub(crate) struct CoarseParams {
    pub(crate) tolerance_deg: f64,
    /// Minimum score at the coarsest level.
    pub(crate) threshold: f64,
    pub(crate) max_results: usize,
    pub(crate) max_overlap: f64,
    pub(crate) debug: bool,
}

/// Collects candidates over all sampled angles at level `top`.
///
/// Candidate positions are the needle's top-left corner in the rotated (but
/// untranslated) frame of the haystack level. The list is sorted by
/// descending score; ties keep angle order.
pub(crate) fn coarse_candidates(
    src: ImageView<'_, u8>,
    bank: &PatternBank,
    top: usize,
    params: &CoarseParams,
) -> NeedleFindResult<Vec<Candidate>> {
    let plan = bank
        .plan(top)
        .ok_or(NeedleFindError::InvalidInput("needle level missing"))?;
    let step = bank
        .angle_step(top)
        .ok_or(NeedleFindError::InvalidInput("needle level missing"))?;
    let angles = coarse_angles(params.tolerance_deg, step);
    let _span = trace_span!("coarse_search", level = top, angles = angles.len()).entered();

    let (tw, th) = (plan.width(), plan.height());
    let center = Point2::new(
        (src.width() as f64 - 1.0) / 2.0,
        (src.height() as f64 - 1.0) / 2.0,
    );

    let mut candidates = Vec::new();
    for &angle in &angles {
        let (bw, bh) = best_rotation_size(src.width(), src.height(), tw, th, angle);
        if bw < tw || bh < th {
            continue;
        }
        let tx = (bw as f64 - 1.0) / 2.0 - center.x;
        let ty = (bh as f64 - 1.0) / 2.0 - center.y;
        let m = Affine2::rotation(center, angle).translated(tx, ty);
        let rotated = warp_affine_u8(src, &m, bw, bh, bank.border_color())?;
        let mut response = match_template(rotated.view(), plan, Method::CcoeffNormed)?;

        let peaks = select_peaks(
            &mut response,
            SelectParams {
                extremum: Extremum::Max,
                threshold: params.threshold,
                max_count: params.max_results + EXTRA_PEAKS_PER_ANGLE,
                tpl_width: tw,
                tpl_height: th,
                max_overlap: params.max_overlap,
            },
        );
        trace_debug!(params.debug, "coarse_angle", angle = angle, peaks = peaks.len());
        candidates.extend(peaks.into_iter().map(|peak| Candidate {
            pt: Point2::new(peak.x as f64 - tx, peak.y as f64 - ty),
            score: f64::from(peak.value),
            angle_deg: angle,
            angle_window: (angle - step, angle + step),
        }));
    }

    candidates.sort_by(|a, b| b.score.total_cmp(&a.score));
    trace_event!("coarse_candidates", count = candidates.len());
    Ok(candidates)
}
