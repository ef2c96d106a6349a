//! Planar geometry used by the match pipeline.
//!
//! Coordinates follow image conventions: x grows to the right, y grows down.
//! Rotated rectangles carry their angle in degrees; the overlap computation
//! works on their corner polygons, which are always convex.

use std::fmt;

use crate::util::math::sin_cos_deg;

const GEOM_EPS: f64 = 1e-9;

/// A point in continuous image coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

impl Point2 {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Width and height in pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Size2 {
    pub width: f64,
    pub height: f64,
}

impl Size2 {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Axis-aligned rectangle given by its top-left corner and size.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Region {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Region {
    pub const fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// Returns the region moved by `(dx, dy)`.
    pub fn translated(&self, dx: f64, dy: f64) -> Self {
        Self::new(self.left + dx, self.top + dy, self.width, self.height)
    }

    /// Returns the region with x/width divided by `sx` and y/height by `sy`.
    pub fn scaled_down(&self, sx: f64, sy: f64) -> Self {
        Self::new(
            self.left / sx,
            self.top / sy,
            self.width / sx,
            self.height / sy,
        )
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "(x: {}, y: {}, w: {}, h: {})",
            self.left, self.top, self.width, self.height
        )
    }
}

/// Rectangle rotated about its center.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RotatedRect {
    pub center: Point2,
    pub size: Size2,
    pub angle_deg: f64,
}

/// How two convex polygons relate to each other.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IntersectionKind {
    None,
    Partial,
    Full,
}

impl RotatedRect {
    pub fn new(center: Point2, size: Size2, angle_deg: f64) -> Self {
        Self {
            center,
            size,
            angle_deg,
        }
    }

    /// Builds the descriptor from two opposite corners of the rotated box.
    pub fn from_diagonal(top_left: Point2, bottom_right: Point2, size: Size2, angle_deg: f64) -> Self {
        let center = Point2::new(
            (top_left.x + bottom_right.x) * 0.5,
            (top_left.y + bottom_right.y) * 0.5,
        );
        Self::new(center, size, angle_deg)
    }

    pub fn area(&self) -> f64 {
        self.size.width * self.size.height
    }

    /// Returns the four corners in drawing order.
    pub fn corners(&self) -> [Point2; 4] {
        let (sin, cos) = sin_cos_deg(self.angle_deg);
        let b = cos * 0.5;
        let a = sin * 0.5;
        let (w, h) = (self.size.width, self.size.height);
        let c = self.center;
        let p0 = Point2::new(c.x - a * h - b * w, c.y + b * h - a * w);
        let p1 = Point2::new(c.x + a * h - b * w, c.y - b * h - a * w);
        let p2 = Point2::new(2.0 * c.x - p0.x, 2.0 * c.y - p0.y);
        let p3 = Point2::new(2.0 * c.x - p1.x, 2.0 * c.y - p1.y);
        [p0, p1, p2, p3]
    }

    /// Intersects two rotated rectangles.
    ///
    /// Returns the relation and the vertices of the overlap polygon, sorted
    /// counter-clockwise around their centroid. For `Full` the vertices are
    /// the corners of the contained rectangle.
    pub fn intersection(&self, other: &RotatedRect) -> (IntersectionKind, Vec<Point2>) {
        let a = self.corners();
        let b = other.corners();

        let a_in_b: Vec<Point2> = a.iter().copied().filter(|p| point_in_convex(&b, *p)).collect();
        if a_in_b.len() == 4 {
            return (IntersectionKind::Full, sort_around_centroid(a_in_b));
        }
        let b_in_a: Vec<Point2> = b.iter().copied().filter(|p| point_in_convex(&a, *p)).collect();
        if b_in_a.len() == 4 {
            return (IntersectionKind::Full, sort_around_centroid(b_in_a));
        }

        let mut points = a_in_b;
        points.extend(b_in_a);
        for i in 0..4 {
            let (p1, p2) = (a[i], a[(i + 1) % 4]);
            for j in 0..4 {
                let (q1, q2) = (b[j], b[(j + 1) % 4]);
                if let Some(p) = segment_intersection(p1, p2, q1, q2) {
                    points.push(p);
                }
            }
        }

        let points = dedup_points(points);
        if points.len() < 3 {
            return (IntersectionKind::None, Vec::new());
        }
        (IntersectionKind::Partial, sort_around_centroid(points))
    }
}

/// Inclusive containment test against a convex polygon.
pub fn point_in_convex(poly: &[Point2], p: Point2) -> bool {
    let n = poly.len();
    if n < 3 {
        return false;
    }
    let mut sign = 0.0f64;
    for i in 0..n {
        let a = poly[i];
        let b = poly[(i + 1) % n];
        let cross = (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x);
        if cross.abs() <= GEOM_EPS {
            continue;
        }
        if sign == 0.0 {
            sign = cross.signum();
        } else if cross.signum() != sign {
            return false;
        }
    }
    true
}

/// Intersection point of segments `p1-p2` and `q1-q2`, if they cross.
pub fn segment_intersection(p1: Point2, p2: Point2, q1: Point2, q2: Point2) -> Option<Point2> {
    let r = Point2::new(p2.x - p1.x, p2.y - p1.y);
    let s = Point2::new(q2.x - q1.x, q2.y - q1.y);
    let denom = r.x * s.y - r.y * s.x;
    if denom.abs() <= GEOM_EPS {
        return None;
    }
    let qp = Point2::new(q1.x - p1.x, q1.y - p1.y);
    let t = (qp.x * s.y - qp.y * s.x) / denom;
    let u = (qp.x * r.y - qp.y * r.x) / denom;
    if (-GEOM_EPS..=1.0 + GEOM_EPS).contains(&t) && (-GEOM_EPS..=1.0 + GEOM_EPS).contains(&u) {
        Some(Point2::new(p1.x + t * r.x, p1.y + t * r.y))
    } else {
        None
    }
}

/// Area of a simple polygon given in order (shoelace formula).
pub fn polygon_area(poly: &[Point2]) -> f64 {
    let n = poly.len();
    if n < 3 {
        return 0.0;
    }
    let mut twice = 0.0;
    for i in 0..n {
        let a = poly[i];
        let b = poly[(i + 1) % n];
        twice += a.x * b.y - b.x * a.y;
    }
    twice.abs() * 0.5
}

fn dedup_points(points: Vec<Point2>) -> Vec<Point2> {
    let mut out: Vec<Point2> = Vec::with_capacity(points.len());
    for p in points {
        let seen = out
            .iter()
            .any(|q| (q.x - p.x).abs() < 1e-6 && (q.y - p.y).abs() < 1e-6);
        if !seen {
            out.push(p);
        }
    }
    out
}

fn sort_around_centroid(mut points: Vec<Point2>) -> Vec<Point2> {
    let n = points.len() as f64;
    let cx = points.iter().map(|p| p.x).sum::<f64>() / n;
    let cy = points.iter().map(|p| p.y).sum::<f64>() / n;
    points.sort_by(|a, b| {
        let ta = (a.y - cy).atan2(a.x - cx);
        let tb = (b.y - cy).atan2(b.x - cx);
        ta.total_cmp(&tb)
    });
    points
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(cx: f64, cy: f64, side: f64, angle: f64) -> RotatedRect {
        RotatedRect::new(Point2::new(cx, cy), Size2::new(side, side), angle)
    }

    #[test]
    fn corners_span_expected_area() {
        let r = square(5.0, 5.0, 4.0, 30.0);
        let corners = r.corners();
        assert!((polygon_area(&corners) - 16.0).abs() < 1e-9);
    }

    #[test]
    fn disjoint_rects_do_not_intersect() {
        let (kind, pts) = square(0.0, 0.0, 2.0, 0.0).intersection(&square(10.0, 0.0, 2.0, 0.0));
        assert_eq!(kind, IntersectionKind::None);
        assert!(pts.is_empty());
    }

    #[test]
    fn contained_rect_is_full() {
        let (kind, pts) = square(0.0, 0.0, 10.0, 0.0).intersection(&square(1.0, 1.0, 2.0, 45.0));
        assert_eq!(kind, IntersectionKind::Full);
        assert!((polygon_area(&pts) - 4.0).abs() < 1e-9);
    }

    #[test]
    fn half_overlap_area() {
        let (kind, pts) = square(0.0, 0.0, 4.0, 0.0).intersection(&square(2.0, 0.0, 4.0, 0.0));
        assert_eq!(kind, IntersectionKind::Partial);
        assert!((polygon_area(&pts) - 8.0).abs() < 1e-9);
    }

    #[test]
    fn from_diagonal_centers_between_corners() {
        let r = RotatedRect::from_diagonal(
            Point2::new(0.0, 0.0),
            Point2::new(4.0, 2.0),
            Size2::new(4.0, 2.0),
            0.0,
        );
        assert_eq!(r.center, Point2::new(2.0, 1.0));
    }
}
