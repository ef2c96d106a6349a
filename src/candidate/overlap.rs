//! Pairwise overlap filtering of rotated detections.

use crate::geometry::{polygon_area, IntersectionKind, RotatedRect};
use crate::kernel::Extremum;

/// A rotated detection with its score.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScoredRect {
    pub rect: RotatedRect,
    pub score: f64,
}

/// Returns the indices that survive overlap filtering, in input order.
///
/// For every pair `(i, j)` with `i < j` that is still alive, the pair is
/// resolved when one rectangle contains the other or when the overlap area
/// exceeds `max_overlap` times the area of rectangle `i`. The weaker entry is
/// flagged: the higher score wins for [`Extremum::Max`], the lower for
/// [`Extremum::Min`], and ties keep `i`. A flagged `i` still finishes its row
/// of comparisons, so it can flag later entries too. Flagged entries are
/// removed at the end.
pub fn filter_overlapping(rects: &[ScoredRect], extremum: Extremum, max_overlap: f64) -> Vec<usize> {
    let n = rects.len();
    let mut deleted = vec![false; n];

    for i in 0..n {
        if deleted[i] {
            continue;
        }
        for j in (i + 1)..n {
            if deleted[j] {
                continue;
            }
            let (kind, points) = rects[i].rect.intersection(&rects[j].rect);
            let conflict = match kind {
                IntersectionKind::None => false,
                IntersectionKind::Full => true,
                IntersectionKind::Partial => {
                    let base = rects[i].rect.area();
                    points.len() >= 3 && base > 0.0 && polygon_area(&points) / base > max_overlap
                }
            };
            if !conflict {
                continue;
            }
            let keep_i = match extremum {
                Extremum::Max => rects[i].score >= rects[j].score,
                Extremum::Min => rects[i].score <= rects[j].score,
            };
            if keep_i {
                deleted[j] = true;
            } else {
                deleted[i] = true;
            }
        }
    }

    (0..n).filter(|&i| !deleted[i]).collect()
}
