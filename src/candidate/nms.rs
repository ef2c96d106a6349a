//! Greedy non-maximum suppression for axis-aligned boxes.

use crate::geometry::Region;

/// Default fraction of a box that may be covered before it is suppressed.
pub const DEFAULT_NMS_OVERLAP: f64 = 0.4;

/// Returns the indices of boxes kept by greedy suppression, in input order.
///
/// Boxes are ordered by bottom edge (ties keep input order). The remaining box
/// with the largest bottom coordinate is kept and every remaining box
/// whose intersection covers more than `overlap_thresh` of its own
/// `(w + 1) * (h + 1)` area is dropped. Scores play no part in the choice.
pub fn suppress_boxes(boxes: &[Region], overlap_thresh: f64) -> Vec<usize> {
    let mut order: Vec<usize> = (0..boxes.len()).collect();
    order.sort_by(|&a, &b| boxes[a].bottom().total_cmp(&boxes[b].bottom()));

    let mut picked = Vec::new();
    while let Some(last) = order.pop() {
        let kept = boxes[last];
        picked.push(last);
        order.retain(|&i| {
            let b = boxes[i];
            let w = (b.right().min(kept.right()) - b.left.max(kept.left) + 1.0).max(0.0);
            let h = (b.bottom().min(kept.bottom()) - b.top.max(kept.top) + 1.0).max(0.0);
            let area = (b.height + 1.0) * (b.width + 1.0);
            w * h / area <= overlap_thresh
        });
    }
    picked.sort_unstable();
    picked
}

#[cfg(test)]
mod tests {
    use super::{suppress_boxes, DEFAULT_NMS_OVERLAP};
    use crate::geometry::Region;

    #[test]
    fn empty_input_keeps_nothing() {
        assert!(suppress_boxes(&[], DEFAULT_NMS_OVERLAP).is_empty());
    }

    #[test]
    fn disjoint_boxes_survive() {
        let boxes = [
            Region::new(0.0, 0.0, 10.0, 10.0),
            Region::new(50.0, 50.0, 10.0, 10.0),
        ];
        assert_eq!(suppress_boxes(&boxes, DEFAULT_NMS_OVERLAP), vec![0, 1]);
    }

    #[test]
    fn lowest_box_wins_regardless_of_input_order() {
        let boxes = [
            Region::new(0.0, 2.0, 10.0, 10.0),
            Region::new(1.0, 0.0, 10.0, 10.0),
        ];
        assert_eq!(suppress_boxes(&boxes, DEFAULT_NMS_OVERLAP), vec![0]);
    }
}
