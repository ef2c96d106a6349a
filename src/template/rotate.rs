//! Affine warps used by the rotation search.
//!
//! Angles are in degrees and positive angles rotate counter-clockwise as seen
//! on screen (y axis pointing down). Warps use bilinear sampling where every
//! tap outside the source reads the constant border value, so rotated content
//! fades into the border along its edges.

use crate::geometry::Point2;
use crate::image::{ImageView, OwnedImage};
use crate::util::math::{rotate_point, sin_cos_deg};
use crate::util::{NeedleFindError, NeedleFindResult};

const ANGLE_EPS: f64 = 1e-7;

/// Row-major 2x3 affine transform `[a b c; d e f]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Affine2 {
    m: [f64; 6],
}

impl Affine2 {
    pub const IDENTITY: Self = Self {
        m: [1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
    };

    pub const fn from_rows(m: [f64; 6]) -> Self {
        Self { m }
    }

    /// Rotation by `angle_deg` about `center`.
    pub fn rotation(center: Point2, angle_deg: f64) -> Self {
        let (beta, alpha) = sin_cos_deg(angle_deg);
        Self {
            m: [
                alpha,
                beta,
                (1.0 - alpha) * center.x - beta * center.y,
                -beta,
                alpha,
                beta * center.x + (1.0 - alpha) * center.y,
            ],
        }
    }

    /// Returns the transform followed by a translation of `(dx, dy)`.
    pub fn translated(mut self, dx: f64, dy: f64) -> Self {
        self.m[2] += dx;
        self.m[5] += dy;
        self
    }

    pub fn apply(&self, p: Point2) -> Point2 {
        let m = &self.m;
        Point2::new(
            m[0] * p.x + m[1] * p.y + m[2],
            m[3] * p.x + m[4] * p.y + m[5],
        )
    }

    /// Returns the inverse transform, or `None` if the matrix is singular.
    pub fn inverse(&self) -> Option<Self> {
        let [a, b, c, d, e, f] = self.m;
        let det = a * e - b * d;
        if det.abs() < f64::EPSILON {
            return None;
        }
        let inv = 1.0 / det;
        let (ia, ib, id, ie) = (e * inv, -b * inv, -d * inv, a * inv);
        Some(Self {
            m: [ia, ib, -(ia * c + ib * f), id, ie, -(id * c + ie * f)],
        })
    }
}

/// Warps `src` into a `dst_width x dst_height` image through the forward map `m`.
pub fn warp_affine_u8(
    src: ImageView<'_, u8>,
    m: &Affine2,
    dst_width: usize,
    dst_height: usize,
    border: u8,
) -> NeedleFindResult<OwnedImage> {
    let inv = m
        .inverse()
        .ok_or(NeedleFindError::InvalidInput("singular affine transform"))?;
    let mut out = OwnedImage::filled(dst_width, dst_height, border)?;
    let width = src.width() as i64;
    let height = src.height() as i64;
    let tap = |x: i64, y: i64| -> f64 {
        if x < 0 || y < 0 || x >= width || y >= height {
            f64::from(border)
        } else {
            src.get(x as usize, y as usize)
                .map_or(f64::from(border), |&v| f64::from(v))
        }
    };

    let data = out.data_mut();
    for y in 0..dst_height {
        for x in 0..dst_width {
            let s = inv.apply(Point2::new(x as f64, y as f64));
            if !s.x.is_finite() || !s.y.is_finite() {
                continue;
            }
            let x0 = s.x.floor();
            let y0 = s.y.floor();
            if x0 < -1.0 || y0 < -1.0 || x0 >= width as f64 || y0 >= height as f64 {
                continue;
            }
            let fx = s.x - x0;
            let fy = s.y - y0;
            let (xi, yi) = (x0 as i64, y0 as i64);
            let value = tap(xi, yi) * (1.0 - fx) * (1.0 - fy)
                + tap(xi + 1, yi) * fx * (1.0 - fy)
                + tap(xi, yi + 1) * (1.0 - fx) * fy
                + tap(xi + 1, yi + 1) * fx * fy;
            data[y * dst_width + x] = value.round().clamp(0.0, 255.0) as u8;
        }
    }
    Ok(out)
}

/// Canvas size that holds a `src_width x src_height` image rotated by `angle_deg`
/// while keeping every placement of a `tpl_width x tpl_height` template.
///
/// Quarter turns swap the axes and half turns keep the size exactly. Other
/// angles trim the rotated bounding box by the template's corner overhang and
/// fall back to the full bounding box when the trimmed size is inconsistent
/// with the template.
pub fn best_rotation_size(
    src_width: usize,
    src_height: usize,
    tpl_width: usize,
    tpl_height: usize,
    angle_deg: f64,
) -> (usize, usize) {
    let cx = (src_width as f64 - 1.0) / 2.0;
    let cy = (src_height as f64 - 1.0) / 2.0;
    let (w1, h1) = (src_width as f64 - 1.0, src_height as f64 - 1.0);
    let rotated = [(0.0, 0.0), (0.0, h1), (w1, h1), (w1, 0.0)]
        .map(|(x, y)| rotate_point(x, y, cx, cy, angle_deg));
    let top = rotated.iter().map(|p| p.1).fold(f64::MIN, f64::max);
    let bottom = rotated.iter().map(|p| p.1).fold(f64::MAX, f64::min);
    let right = rotated.iter().map(|p| p.0).fold(f64::MIN, f64::max);
    let left = rotated.iter().map(|p| p.0).fold(f64::MAX, f64::min);

    let angle = angle_deg.rem_euclid(360.0);
    let near = |target: f64| (angle - target).abs() < ANGLE_EPS;
    if near(90.0) || near(270.0) {
        return (src_height, src_width);
    }
    if near(0.0) || near(180.0) || near(360.0) {
        return (src_width, src_height);
    }

    let reduced = angle % 90.0;
    let (sin, cos) = sin_cos_deg(reduced);
    let overhang_w = tpl_width as f64 * sin * cos;
    let overhang_h = tpl_height as f64 * sin * cos;
    let half_height = (top - cy - overhang_w).ceil() as i64;
    let half_width = (right - cx - overhang_h).ceil() as i64;
    let (w, h) = (half_width * 2, half_height * 2);

    let (tw, th) = (tpl_width as i64, tpl_height as i64);
    let wrong = w <= 0
        || h <= 0
        || (tw < w && th > h)
        || (tw > w && th < h)
        || tw * th > w * h;
    if wrong {
        let w = (right - left).round().max(1.0) as usize;
        let h = (top - bottom).round().max(1.0) as usize;
        return (w, h);
    }
    (w as usize, h as usize)
}

/// Margin added around a rotated crop on every side.
pub const ROI_PADDING: usize = 3;

/// Crops a window around `top_left` from `src` as seen after rotating `src` by
/// `angle_deg` about its center.
///
/// The window has the template size plus [`ROI_PADDING`] on every side, so the
/// response over it is `7 x 7` placements centered on the predicted position.
pub fn rotated_roi(
    src: ImageView<'_, u8>,
    tpl_width: usize,
    tpl_height: usize,
    top_left: Point2,
    angle_deg: f64,
    border: u8,
) -> NeedleFindResult<OwnedImage> {
    let center = Point2::new(
        (src.width() as f64 - 1.0) / 2.0,
        (src.height() as f64 - 1.0) / 2.0,
    );
    let rotation = Affine2::rotation(center, angle_deg);
    let anchor = rotation.apply(top_left);
    let pad = ROI_PADDING as f64;
    let m = rotation.translated(pad - anchor.x, pad - anchor.y);
    warp_affine_u8(
        src,
        &m,
        tpl_width + 2 * ROI_PADDING,
        tpl_height + 2 * ROI_PADDING,
        border,
    )
}
