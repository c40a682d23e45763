//! Geometry primitives in schematic space.

use serde::{Deserialize, Serialize};
use std::ops::{Add, Sub};

/// A point (or vector) in schematic coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Euclidean distance to another point
    pub fn distance_to(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn manhattan_distance(&self, other: &Point) -> f64 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }

    pub fn scale(self, factor: f64) -> Point {
        Point::new(self.x * factor, self.y * factor)
    }

    /// Swap the axes. Used to route vertical wires with horizontal logic.
    pub fn transpose(self) -> Point {
        Point::new(self.y, self.x)
    }

    /// Round each coordinate to the nearest multiple of `grid`.
    /// A non-positive grid leaves the point unchanged.
    pub fn snap_to_grid(self, grid: f64) -> Point {
        if grid <= 0.0 || !grid.is_finite() {
            return self;
        }
        Point::new(snap(self.x, grid), snap(self.y, grid))
    }
}

pub(crate) fn snap(value: f64, grid: f64) -> f64 {
    (value / grid).round() * grid
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Axis-aligned rectangle with its origin at the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn from_origin_size(origin: Point, size: Size) -> Self {
        Self::new(origin.x, origin.y, size.width, size.height)
    }

    pub fn left(&self) -> f64 {
        self.x
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn top(&self) -> f64 {
        self.y
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Inclusive on every edge.
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.left()
            && point.x <= self.right()
            && point.y >= self.top()
            && point.y <= self.bottom()
    }

    /// Strict overlap: rectangles that only share an edge do not intersect.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.left() < other.right()
            && self.right() > other.left()
            && self.top() < other.bottom()
            && self.bottom() > other.top()
    }

    /// Grow every side by `margin`.
    pub fn expand(&self, margin: f64) -> Rect {
        Rect::new(
            self.x - margin,
            self.y - margin,
            self.width + 2.0 * margin,
            self.height + 2.0 * margin,
        )
    }

    pub fn transpose(&self) -> Rect {
        Rect::new(self.y, self.x, self.height, self.width)
    }

    /// Distance from the rectangle to a point, zero when the point is inside.
    pub fn distance_to(&self, point: Point) -> f64 {
        let dx = (self.left() - point.x).max(0.0).max(point.x - self.right());
        let dy = (self.top() - point.y).max(0.0).max(point.y - self.bottom());
        (dx * dx + dy * dy).sqrt()
    }

    /// Whether the axis-aligned segment `a`-`b` passes through the interior.
    ///
    /// Segments running along an edge do not count. Diagonal segments are
    /// tested by their bounding box.
    pub fn blocks_segment(&self, a: Point, b: Point) -> bool {
        let seg = Rect::new(
            a.x.min(b.x),
            a.y.min(b.y),
            (a.x - b.x).abs(),
            (a.y - b.y).abs(),
        );
        if a.y == b.y {
            return a.y > self.top()
                && a.y < self.bottom()
                && seg.right() > self.left()
                && seg.left() < self.right();
        }
        if a.x == b.x {
            return a.x > self.left()
                && a.x < self.right()
                && seg.bottom() > self.top()
                && seg.top() < self.bottom();
        }
        self.intersects(&seg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_is_inclusive() {
        let r = Rect::new(10.0, 10.0, 20.0, 10.0);
        assert!(r.contains(Point::new(10.0, 10.0)));
        assert!(r.contains(Point::new(30.0, 20.0)));
        assert!(r.contains(Point::new(15.0, 15.0)));
        assert!(!r.contains(Point::new(30.1, 15.0)));
    }

    #[test]
    fn test_intersects_excludes_touching() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(10.0, 0.0, 10.0, 10.0);
        let c = Rect::new(5.0, 5.0, 10.0, 10.0);
        assert!(!a.intersects(&b));
        assert!(a.intersects(&c));
        assert!(c.intersects(&a));
    }

    #[test]
    fn test_expand() {
        let r = Rect::new(100.0, 100.0, 60.0, 20.0).expand(8.0);
        assert_eq!(r, Rect::new(92.0, 92.0, 76.0, 36.0));
    }

    #[test]
    fn test_distance_to() {
        let r = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert_eq!(r.distance_to(Point::new(5.0, 5.0)), 0.0);
        assert_eq!(r.distance_to(Point::new(13.0, 5.0)), 3.0);
        assert_eq!(r.distance_to(Point::new(13.0, 14.0)), 5.0);
    }

    #[test]
    fn test_blocks_segment() {
        let r = Rect::new(0.0, 0.0, 10.0, 10.0);
        // Through the middle
        assert!(r.blocks_segment(Point::new(-5.0, 5.0), Point::new(15.0, 5.0)));
        // Along the top edge
        assert!(!r.blocks_segment(Point::new(-5.0, 0.0), Point::new(15.0, 0.0)));
        // Ends before the rectangle
        assert!(!r.blocks_segment(Point::new(-5.0, 5.0), Point::new(0.0, 5.0)));
        // Vertical through
        assert!(r.blocks_segment(Point::new(5.0, -5.0), Point::new(5.0, 20.0)));
    }

    #[test]
    fn test_snap_to_grid() {
        let p = Point::new(104.0, 96.0).snap_to_grid(10.0);
        assert_eq!(p, Point::new(100.0, 100.0));
        let unchanged = Point::new(3.3, 4.4).snap_to_grid(0.0);
        assert_eq!(unchanged, Point::new(3.3, 4.4));
    }

    #[test]
    fn test_point_arithmetic() {
        let p = Point::new(1.0, 2.0) + Point::new(3.0, 4.0);
        assert_eq!(p, Point::new(4.0, 6.0));
        assert_eq!(p - Point::new(4.0, 6.0), Point::default());
        assert_eq!(Point::new(1.0, 2.0).transpose(), Point::new(2.0, 1.0));
        assert_eq!(Point::new(0.0, 0.0).manhattan_distance(&Point::new(3.0, -4.0)), 7.0);
    }
}
