//! Local extrema extraction by repeated find-and-mask.

use crate::kernel::{Extremum, Peak, ResponseMap};

/// Parameters of one extraction pass over a response surface.
#[derive(Clone, Copy, Debug)]
pub struct SelectParams {
    pub extremum: Extremum,
    /// Raw-scale threshold; extraction stops at the first extremum failing it.
    pub threshold: f64,
    /// Maximum number of peaks to return.
    pub max_count: usize,
    pub tpl_width: usize,
    pub tpl_height: usize,
    /// Allowed overlap fraction between neighbouring detections.
    pub max_overlap: f64,
}

impl SelectParams {
    fn passes(&self, value: f32) -> bool {
        let value = f64::from(value);
        match self.extremum {
            Extremum::Max => value >= self.threshold,
            Extremum::Min => value <= self.threshold,
        }
    }
}

/// Extracts up to `max_count` peaks from `response`, best first.
///
/// After each peak, a rectangle of `2 * size * (1 - max_overlap)` centered on
/// it is overwritten with the extremum's sentinel. The rectangle always
/// covers at least the peak itself, so each placement is reported once.
pub fn select_peaks(response: &mut ResponseMap, params: SelectParams) -> Vec<Peak> {
    let mut peaks = Vec::new();
    if params.max_count == 0 {
        return peaks;
    }
    let keep = (1.0 - params.max_overlap).clamp(0.0, 1.0);
    let half_w = params.tpl_width as f64 * keep;
    let half_h = params.tpl_height as f64 * keep;

    while peaks.len() < params.max_count {
        let Some(peak) = response.locate(params.extremum) else {
            break;
        };
        if !params.passes(peak.value) {
            break;
        }
        peaks.push(peak);

        let x0 = (peak.x as f64 - half_w).floor() as i64;
        let y0 = (peak.y as f64 - half_h).floor() as i64;
        let x1 = (x0 + (2.0 * half_w).ceil() as i64).max(peak.x as i64 + 1);
        let y1 = (y0 + (2.0 * half_h).ceil() as i64).max(peak.y as i64 + 1);
        response.fill_rect(x0, y0, x1, y1, params.extremum.sentinel());
    }
    peaks
}

#[cfg(test)]
mod tests {
    use super::{select_peaks, SelectParams};
    use crate::kernel::{Extremum, ResponseMap};

    fn params(max_count: usize, max_overlap: f64) -> SelectParams {
        SelectParams {
            extremum: Extremum::Max,
            threshold: 0.5,
            max_count,
            tpl_width: 2,
            tpl_height: 2,
            max_overlap,
        }
    }

    fn surface() -> ResponseMap {
        let mut data = vec![0.0f32; 10 * 10];
        data[2 * 10 + 2] = 0.9;
        data[2 * 10 + 3] = 0.85;
        data[7 * 10 + 7] = 0.7;
        data[5 * 10 + 5] = 0.4;
        ResponseMap::from_vec(data, 10, 10)
    }

    #[test]
    fn masks_neighbours_and_stops_at_threshold() {
        let mut map = surface();
        let peaks = select_peaks(&mut map, params(10, 0.0));
        let coords: Vec<_> = peaks.iter().map(|p| (p.x, p.y)).collect();
        assert_eq!(coords, vec![(2, 2), (7, 7)]);
    }

    #[test]
    fn full_overlap_still_masks_peak() {
        let mut map = surface();
        let peaks = select_peaks(&mut map, params(10, 1.0));
        let coords: Vec<_> = peaks.iter().map(|p| (p.x, p.y)).collect();
        assert_eq!(coords, vec![(2, 2), (3, 2), (7, 7)]);
    }

    #[test]
    fn respects_max_count() {
        let mut map = surface();
        assert_eq!(select_peaks(&mut map, params(1, 0.0)).len(), 1);
    }
}
