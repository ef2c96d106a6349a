//! Debug overlays of detections on the haystack.
//!
//! Available with the `visualize` feature. Detections are in logical pixels
//! and are scaled back by the haystack density before drawing.

use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_line_segment_mut};
use imageproc::rect::Rect;

use crate::geometry::Point2;
use crate::image::buffer::PixelBuffer;
use crate::search::{MatchResult, RotatedMatch};
use crate::util::{NeedleFindError, NeedleFindResult};

const MATCH_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
const BEST_COLOR: Rgb<u8> = Rgb([0, 255, 0]);

fn canvas(haystack: &PixelBuffer) -> NeedleFindResult<RgbImage> {
    let gray = haystack.to_gray()?;
    let rgb: Vec<u8> = gray.data().iter().flat_map(|&v| [v, v, v]).collect();
    RgbImage::from_raw(gray.width() as u32, gray.height() as u32, rgb).ok_or(
        NeedleFindError::BufferTooSmall {
            needed: gray.width() * gray.height() * 3,
            got: gray.data().len() * 3,
        },
    )
}

fn to_physical(haystack: &PixelBuffer, p: Point2) -> (f32, f32) {
    let d = haystack.density;
    let sx = if d.scale_x > 0.0 { d.scale_x } else { 1.0 };
    let sy = if d.scale_y > 0.0 { d.scale_y } else { 1.0 };
    ((p.x * sx) as f32, (p.y * sy) as f32)
}

/// Draws a rectangle per match; the first (best) one in green.
pub fn render_matches(haystack: &PixelBuffer, matches: &[MatchResult]) -> NeedleFindResult<RgbImage> {
    let mut img = canvas(haystack)?;
    for (i, m) in matches.iter().enumerate() {
        let loc = m.location;
        let (x0, y0) = to_physical(haystack, Point2::new(loc.left, loc.top));
        let (x1, y1) = to_physical(haystack, Point2::new(loc.right(), loc.bottom()));
        let w = (x1 - x0).round().max(1.0) as u32;
        let h = (y1 - y0).round().max(1.0) as u32;
        let color = if i == 0 { BEST_COLOR } else { MATCH_COLOR };
        draw_hollow_rect_mut(
            &mut img,
            Rect::at(x0.round() as i32, y0.round() as i32).of_size(w, h),
            color,
        );
    }
    Ok(img)
}

/// Half length of the cross drawn at a rotated match's center.
const CROSS_HALF: f32 = 4.0;

/// Draws the rotated outline and center cross of each match; the first
/// (best) one in green.
pub fn render_rotated_matches(
    haystack: &PixelBuffer,
    matches: &[RotatedMatch],
) -> NeedleFindResult<RgbImage> {
    let mut img = canvas(haystack)?;
    for (i, m) in matches.iter().enumerate() {
        let color = if i == 0 { BEST_COLOR } else { MATCH_COLOR };
        let corners = m.corners();
        for k in 0..corners.len() {
            let a = to_physical(haystack, corners[k]);
            let b = to_physical(haystack, corners[(k + 1) % corners.len()]);
            draw_line_segment_mut(&mut img, a, b, color);
        }
        let (cx, cy) = to_physical(haystack, m.center);
        draw_line_segment_mut(&mut img, (cx - CROSS_HALF, cy), (cx + CROSS_HALF, cy), color);
        draw_line_segment_mut(&mut img, (cx, cy - CROSS_HALF), (cx, cy + CROSS_HALF), color);
    }
    Ok(img)
}
