//! Search-region checks and post-processing of raw detections.
//!
//! Raw detections are in physical pixels of the (possibly cropped) haystack.
//! Before they are returned they are shifted by the crop origin, divided by
//! the pixel density, sorted and filtered by confidence.

use crate::geometry::{Point2, Region};
use crate::image::buffer::PixelDensity;
use crate::image::ImageView;
use crate::search::options::DensityCorrection;
use crate::search::{MatchResult, RotatedMatch};
use crate::trace::{trace_event, trace_span};
use crate::util::{NeedleFindError, NeedleFindResult};

/// Smallest accepted search-region side, in logical pixels.
const MIN_ROI_SIDE: f64 = 2.0;

fn invalid(roi: &Region, reason: &'static str) -> NeedleFindError {
    NeedleFindError::InvalidRoi {
        left: roi.left,
        top: roi.top,
        width: roi.width,
        height: roi.height,
        reason,
    }
}

/// Checks a logical search region against a `frame_width x frame_height` frame.
pub fn validate_search_region(
    roi: &Region,
    frame_width: f64,
    frame_height: f64,
) -> NeedleFindResult<()> {
    let values = [roi.left, roi.top, roi.width, roi.height];
    if values.iter().any(|v| v.is_nan()) {
        return Err(invalid(roi, "contains NaN"));
    }
    if values.iter().any(|&v| v < 0.0) {
        return Err(invalid(roi, "contains negative values"));
    }
    if roi.width < MIN_ROI_SIDE || roi.height < MIN_ROI_SIDE {
        return Err(invalid(roi, "must be at least two pixels wide and high"));
    }
    if roi.right() > frame_width || roi.bottom() > frame_height {
        return Err(invalid(roi, "extends beyond the frame"));
    }
    Ok(())
}

/// Shift and scale that map raw detections to caller coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Correction {
    offset_x: f64,
    offset_y: f64,
    scale_x: f64,
    scale_y: f64,
}

impl Correction {
    pub(crate) fn new(origin: (f64, f64), density: PixelDensity, mode: DensityCorrection) -> Self {
        let (scale_x, scale_y) = density_factors(density, mode);
        Self {
            offset_x: origin.0,
            offset_y: origin.1,
            scale_x,
            scale_y,
        }
    }

    fn point(&self, p: Point2) -> Point2 {
        Point2::new(
            (p.x + self.offset_x) / self.scale_x,
            (p.y + self.offset_y) / self.scale_y,
        )
    }

    fn region(&self, r: &Region) -> Region {
        r.translated(self.offset_x, self.offset_y)
            .scaled_down(self.scale_x, self.scale_y)
    }
}

fn density_factors(density: PixelDensity, mode: DensityCorrection) -> (f64, f64) {
    let usable = |s: f64| s.is_finite() && s > 0.0;
    match mode {
        DensityCorrection::UniformOnly => {
            if density.is_uniform() && usable(density.scale_x) {
                (density.scale_x, density.scale_x)
            } else {
                (1.0, 1.0)
            }
        }
        DensityCorrection::PerAxis => (
            if usable(density.scale_x) { density.scale_x } else { 1.0 },
            if usable(density.scale_y) { density.scale_y } else { 1.0 },
        ),
    }
}

/// Converts a logical search region into a physical crop of `image`.
///
/// The region is scaled by the density (per [`DensityCorrection`]) and
/// clamped to the image. Returns the crop rectangle `(x, y, w, h)`.
pub(crate) fn physical_crop(
    roi: &Region,
    image: ImageView<'_, u8>,
    density: PixelDensity,
    mode: DensityCorrection,
) -> NeedleFindResult<(usize, usize, usize, usize)> {
    let (sx, sy) = density_factors(density, mode);
    let (iw, ih) = (image.width() as f64, image.height() as f64);
    let left = roi.left * sx;
    let top = roi.top * sy;
    let x = left.clamp(0.0, iw);
    let y = top.clamp(0.0, ih);
    let w = (roi.width * sx).min(iw - left).min(iw - x);
    let h = (roi.height * sy).min(ih - top).min(ih - y);
    if !(w >= 1.0 && h >= 1.0) {
        return Err(invalid(roi, "is empty after clamping to the image"));
    }
    Ok((x as usize, y as usize, w as usize, h as usize))
}

/// Detection that can be corrected and ranked.
pub(crate) trait Detection {
    fn confidence(&self) -> f64;
    fn error(&self) -> Option<&NeedleFindError> {
        None
    }
    fn correct(&mut self, correction: &Correction);
}

impl Detection for MatchResult {
    fn confidence(&self) -> f64 {
        self.confidence
    }

    fn error(&self) -> Option<&NeedleFindError> {
        self.error.as_ref()
    }

    fn correct(&mut self, correction: &Correction) {
        self.location = correction.region(&self.location);
    }
}

impl Detection for RotatedMatch {
    fn confidence(&self) -> f64 {
        self.score
    }

    fn correct(&mut self, correction: &Correction) {
        self.map_points(|p| correction.point(p));
        self.size.width /= correction.scale_x;
        self.size.height /= correction.scale_y;
    }
}

/// Corrects, sorts and filters detections.
///
/// When nothing reaches `confidence`, an error attached to the best
/// detection is returned as is; otherwise the result is `NoMatchFound`
/// carrying the best confidence among the detections and `best_rejected`.
pub(crate) fn validated_matches<D: Detection>(
    mut found: Vec<D>,
    best_rejected: Option<f64>,
    correction: &Correction,
    confidence: f64,
) -> NeedleFindResult<Vec<D>> {
    let _span = trace_span!("validate", detections = found.len()).entered();
    for d in &mut found {
        d.correct(correction);
    }
    found.sort_by(|a, b| b.confidence().total_cmp(&a.confidence()));

    if !found.iter().any(|d| d.confidence() >= confidence) {
        if let Some(err) = found.first().and_then(|d| d.error()) {
            return Err(err.clone());
        }
        let best = found
            .first()
            .map(|d| d.confidence())
            .into_iter()
            .chain(best_rejected)
            .fold(None, |acc: Option<f64>, c| Some(acc.map_or(c, |a| a.max(c))));
        return Err(NeedleFindError::NoMatchFound {
            threshold: confidence,
            best,
        });
    }
    found.retain(|d| d.confidence() >= confidence);
    trace_event!("validated", count = found.len());
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::{physical_crop, validate_search_region, validated_matches, Correction};
    use crate::geometry::Region;
    use crate::image::buffer::PixelDensity;
    use crate::image::OwnedImage;
    use crate::search::options::DensityCorrection;
    use crate::search::MatchResult;
    use crate::util::NeedleFindError;

    fn result(confidence: f64, left: f64) -> MatchResult {
        MatchResult {
            confidence,
            location: Region::new(left, 10.0, 20.0, 20.0),
            error: None,
        }
    }

    #[test]
    fn region_checks() {
        assert!(validate_search_region(&Region::new(0.0, 0.0, 100.0, 50.0), 100.0, 50.0).is_ok());
        let cases = [
            Region::new(-1.0, 0.0, 10.0, 10.0),
            Region::new(f64::NAN, 0.0, 10.0, 10.0),
            Region::new(0.0, 0.0, 1.0, 10.0),
            Region::new(95.0, 0.0, 10.0, 10.0),
        ];
        for roi in cases {
            assert!(matches!(
                validate_search_region(&roi, 100.0, 50.0),
                Err(NeedleFindError::InvalidRoi { .. })
            ));
        }
    }

    #[test]
    fn crop_scales_by_uniform_density() {
        let img = OwnedImage::filled(200, 100, 0).unwrap();
        let crop = physical_crop(
            &Region::new(10.0, 5.0, 30.0, 20.0),
            img.view(),
            PixelDensity::uniform(2.0),
            DensityCorrection::UniformOnly,
        )
        .unwrap();
        assert_eq!(crop, (20, 10, 60, 40));
    }

    #[test]
    fn results_are_offset_scaled_and_sorted() {
        let correction = Correction::new(
            (20.0, 10.0),
            PixelDensity::uniform(2.0),
            DensityCorrection::UniformOnly,
        );
        let out = validated_matches(
            vec![result(0.85, 0.0), result(0.95, 40.0), result(0.5, 80.0)],
            None,
            &correction,
            0.8,
        )
        .unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].confidence, 0.95);
        assert_eq!(out[0].location, Region::new(30.0, 10.0, 10.0, 10.0));
        assert_eq!(out[1].location.left, 10.0);
    }

    #[test]
    fn non_uniform_density_is_ignored_by_default() {
        let correction = Correction::new(
            (0.0, 0.0),
            PixelDensity {
                scale_x: 2.0,
                scale_y: 1.0,
            },
            DensityCorrection::UniformOnly,
        );
        let out = validated_matches(vec![result(0.9, 40.0)], None, &correction, 0.8).unwrap();
        assert_eq!(out[0].location.left, 40.0);
    }

    #[test]
    fn miss_reports_best_score() {
        let correction = Correction::new((0.0, 0.0), PixelDensity::IDENTITY, DensityCorrection::UniformOnly);
        let err = validated_matches(vec![result(0.4, 0.0)], Some(0.6), &correction, 0.8).unwrap_err();
        assert_eq!(err.best_score(), Some(0.6));

        let err = validated_matches(Vec::<MatchResult>::new(), None, &correction, 0.8).unwrap_err();
        assert_eq!(
            err,
            NeedleFindError::NoMatchFound {
                threshold: 0.8,
                best: None
            }
        );
    }
}
