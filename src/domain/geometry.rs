//! Geometric types for scene coordinates and raster sizes

use std::num::NonZeroU32;
use std::ops::{Add, AddAssign, Mul, Neg, Sub};

/// A position or offset in scene coordinates
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// Offsets share the point representation
pub type Vector = Point;

impl Point {
    pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean length when treated as a vector
    pub fn length(self) -> f64 {
        self.x.hypot(self.y)
    }

    /// Sum of the absolute components
    pub fn manhattan_length(self) -> f64 {
        self.x.abs() + self.y.abs()
    }

    /// Unit vector in the same direction, or `None` for a zero vector
    pub fn normalized(self) -> Option<Vector> {
        let len = self.length();
        if len <= f64::EPSILON {
            return None;
        }
        Some(Point::new(self.x / len, self.y / len))
    }

    /// The vector rotated a quarter turn clockwise on screen (y-down)
    pub fn perpendicular(self) -> Vector {
        Point::new(-self.y, self.x)
    }

    pub fn dot(self, other: Point) -> f64 {
        self.x * other.x + self.y * other.y
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Point {
    fn add_assign(&mut self, rhs: Point) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Point {
    type Output = Point;

    fn mul(self, rhs: f64) -> Point {
        Point::new(self.x * rhs, self.y * rhs)
    }
}

impl Neg for Point {
    type Output = Point;

    fn neg(self) -> Point {
        Point::new(-self.x, -self.y)
    }
}

/// Length of the segment from `start` to `end`
pub fn line_length(start: Point, end: Point) -> f64 {
    (end - start).length()
}

/// Point offset sideways from `at` by `distance`, perpendicular to `direction`.
///
/// Positive distances go to the right of the direction of travel on screen.
/// Returns `None` when `direction` has no length.
pub fn perpendicular_offset(at: Point, direction: Vector, distance: f64) -> Option<Point> {
    let unit = direction.normalized()?;
    Some(at + unit.perpendicular() * distance)
}

/// Shortest distance from `p` to the segment `start..end`
pub fn distance_to_segment(p: Point, start: Point, end: Point) -> f64 {
    let seg = end - start;
    let len2 = seg.dot(seg);
    if len2 <= f64::EPSILON {
        return (p - start).length();
    }
    let t = ((p - start).dot(seg) / len2).clamp(0.0, 1.0);
    (p - (start + seg * t)).length()
}

/// Axis-aligned rectangle in scene coordinates
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl Rect {
    /// Create a new rectangle from coordinates
    pub fn new(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Normalized rectangle spanning two arbitrary corners
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self {
            left: a.x.min(b.x),
            top: a.y.min(b.y),
            right: a.x.max(b.x),
            bottom: a.y.max(b.y),
        }
    }

    /// Rectangle from a top-left origin and a size
    pub fn from_origin_size(origin: Point, width: f64, height: f64) -> Self {
        Self::from_corners(origin, Point::new(origin.x + width, origin.y + height))
    }

    /// Smallest rectangle containing both
    pub fn union(&self, other: Rect) -> Rect {
        Rect {
            left: self.left.min(other.left),
            top: self.top.min(other.top),
            right: self.right.max(other.right),
            bottom: self.bottom.max(other.bottom),
        }
    }

    /// Grow the rectangle by `margin` on every side
    pub fn expand(&self, margin: f64) -> Rect {
        Rect {
            left: self.left - margin,
            top: self.top - margin,
            right: self.right + margin,
            bottom: self.bottom + margin,
        }
    }

    pub fn origin(&self) -> Point {
        Point::new(self.left, self.top)
    }

    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }

    /// Raster size covering this rectangle, truncated to whole pixels
    pub fn dimensions(self) -> Option<RectDimension> {
        let width = NonZeroU32::new(self.width().max(0.0) as u32)?;
        let height = NonZeroU32::new(self.height().max(0.0) as u32)?;
        Some(RectDimension { width, height })
    }

    /// Check if this rectangle contains a point (edges inclusive)
    pub fn contains_point(&self, p: Point) -> bool {
        p.x >= self.left && p.x <= self.right && p.y >= self.top && p.y <= self.bottom
    }
}

/// Non-zero dimensions of a raster
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RectDimension {
    pub width: NonZeroU32,
    pub height: NonZeroU32,
}

impl RectDimension {
    pub fn width(&self) -> u32 {
        self.width.get()
    }

    pub fn height(&self) -> u32 {
        self.height.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_from_corners_normalizes() {
        let r = Rect::from_corners(Point::new(10.0, 5.0), Point::new(-2.0, 20.0));
        assert_eq!(r, Rect::new(-2.0, 5.0, 10.0, 20.0));
        assert_eq!(r.width(), 12.0);
        assert_eq!(r.height(), 15.0);
    }

    #[test]
    fn test_rect_union_and_expand() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(20.0, -5.0, 30.0, 5.0);
        let u = a.union(b).expand(50.0);
        assert_eq!(u, Rect::new(-50.0, -55.0, 80.0, 60.0));
    }

    #[test]
    fn test_dimensions_rejects_empty() {
        assert!(Rect::new(0.0, 0.0, 0.0, 10.0).dimensions().is_none());
        let dim = Rect::new(0.0, 0.0, 200.0, 200.0).dimensions().unwrap();
        assert_eq!((dim.width(), dim.height()), (200, 200));
    }

    #[test]
    fn test_perpendicular_offset() {
        let p = perpendicular_offset(Point::new(10.0, 0.0), Point::new(5.0, 0.0), 2.0).unwrap();
        assert!((p.x - 10.0).abs() < 1e-9);
        assert!((p.y - 2.0).abs() < 1e-9);
        assert!(perpendicular_offset(Point::ORIGIN, Point::ORIGIN, 1.0).is_none());
    }

    #[test]
    fn test_distance_to_segment() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(10.0, 0.0);
        assert_eq!(distance_to_segment(Point::new(5.0, 3.0), a, b), 3.0);
        assert_eq!(distance_to_segment(Point::new(13.0, 4.0), a, b), 5.0);
        assert_eq!(line_length(a, b), 10.0);
    }
}
