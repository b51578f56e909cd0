// File: crates/cml-core/src/geometry.rs
// Summary: Pixel-space geometry: points, rectangles, regular polygons and arrowheads.

use std::f64::consts::PI;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self { Self { x, y } }
}

/// Axis-aligned rectangle in screen space (y grows downward).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl Rect {
    pub const fn from_ltrb(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self { left, top, right, bottom }
    }
    pub fn from_ltwh(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self { left, top, right: left + width, bottom: top + height }
    }
    /// Normalized box spanned by two arbitrary corners.
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self::from_ltrb(a.x.min(b.x), a.y.min(b.y), a.x.max(b.x), a.y.max(b.y))
    }
    pub fn width(&self) -> f64 { self.right - self.left }
    pub fn height(&self) -> f64 { self.bottom - self.top }
}

/// Vertices of a regular `sides`-gon of circumradius `radius` around `center`.
/// With `rotation == 0` the first vertex points straight up; `PI` points it down.
pub fn regular_polygon(center: Point, radius: f64, sides: usize, rotation: f64) -> Vec<Point> {
    let step = 2.0 * PI / sides.max(1) as f64;
    let start = rotation - PI / 2.0;
    (0..sides)
        .map(|i| {
            let a = start + step * i as f64;
            Point::new(center.x + radius * a.cos(), center.y + radius * a.sin())
        })
        .collect()
}

/// Two barb endpoints of an arrowhead at `tip` for a shaft arriving from
/// `from`. `None` when the shaft has zero length.
pub fn arrowhead(from: Point, tip: Point, size: f64, half_angle: f64) -> Option<[Point; 2]> {
    let (dx, dy) = (tip.x - from.x, tip.y - from.y);
    if dx.hypot(dy) == 0.0 {
        return None;
    }
    let heading = dy.atan2(dx);
    let barb = |a: f64| Point::new(tip.x - size * a.cos(), tip.y - size * a.sin());
    Some([barb(heading - half_angle), barb(heading + half_angle)])
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn corners_normalize() {
        let r = Rect::from_corners(Point::new(10.0, 50.0), Point::new(4.0, 20.0));
        assert_eq!(r, Rect::from_ltrb(4.0, 20.0, 10.0, 50.0));
        assert_eq!(r.width(), 6.0);
        assert_eq!(r.height(), 30.0);
    }

    #[test]
    fn triangle_apex_orientation() {
        let up = regular_polygon(Point::new(0.0, 8.0), 8.0, 3, 0.0);
        assert_abs_diff_eq!(up[0].x, 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(up[0].y, 0.0, epsilon = 1e-9);
        let down = regular_polygon(Point::new(0.0, -8.0), 8.0, 3, PI);
        assert_abs_diff_eq!(down[0].y, 0.0, epsilon = 1e-9);
        assert!(up[1].y > up[0].y && down[1].y < down[0].y);
    }

    #[test]
    fn arrowhead_barbs_trail_the_tip() {
        let [a, b] = arrowhead(Point::new(0.0, 0.0), Point::new(100.0, 0.0), 10.0, PI / 6.0).unwrap();
        assert!(a.x < 100.0 && b.x < 100.0);
        assert_abs_diff_eq!(a.y, -b.y, epsilon = 1e-9);
        assert_abs_diff_eq!(a.x, 100.0 - 10.0 * (PI / 6.0).cos(), epsilon = 1e-9);
        assert!(arrowhead(Point::new(1.0, 1.0), Point::new(1.0, 1.0), 10.0, 0.5).is_none());
    }
}
