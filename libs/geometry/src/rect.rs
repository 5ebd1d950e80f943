//! Axis-aligned rectangles.

use serde::{Deserialize, Serialize};

use crate::bbox::Bbox;
use crate::point::Point;
use crate::polygon::Polygon;
use crate::transform::TranslateMut;

/// An axis-aligned rectangle, specified by lower-left and upper-right corners.
#[derive(Debug, Default, Copy, Clone, Serialize, Deserialize, PartialEq)]
pub struct Rect {
    /// The lower-left corner.
    p0: Point,
    /// The upper-right corner.
    p1: Point,
}

impl Rect {
    /// Creates a rectangle from two opposite corners, sorting the coordinates.
    ///
    /// # Example
    ///
    /// ```
    /// # use geometry::prelude::*;
    /// let rect = Rect::new(Point::new(10., 0.), Point::new(0., 5.));
    /// assert_eq!(rect.left(), 0.);
    /// assert_eq!(rect.top(), 5.);
    /// ```
    pub fn new(a: Point, b: Point) -> Self {
        Self {
            p0: Point::new(a.x.min(b.x), a.y.min(b.y)),
            p1: Point::new(a.x.max(b.x), a.y.max(b.y)),
        }
    }

    /// Creates a rectangle from all 4 sides (left, bottom, right, top).
    ///
    /// # Example
    ///
    /// ```
    /// # use geometry::prelude::*;
    /// let rect = Rect::from_sides(15., 20., 30., 40.);
    /// assert_eq!(rect.left(), 15.);
    /// assert_eq!(rect.bot(), 20.);
    /// assert_eq!(rect.right(), 30.);
    /// assert_eq!(rect.top(), 40.);
    /// ```
    ///
    /// # Panics
    ///
    /// This method panics if `left > right` or if `bot > top`.
    ///
    /// If you want sides to be sorted for you, consider using [`Rect::new`] instead.
    #[inline]
    pub fn from_sides(left: f64, bot: f64, right: f64, top: f64) -> Self {
        assert!(
            left <= right,
            "Rect::from_sides requires that left ({}) <= right ({})",
            left,
            right
        );
        assert!(
            bot <= top,
            "Rect::from_sides requires that bot ({}) <= top ({})",
            bot,
            top
        );
        Self {
            p0: Point::new(left, bot),
            p1: Point::new(right, top),
        }
    }

    /// Creates a rectangle of the given size centered on `center`.
    ///
    /// Negative sizes are treated as their absolute value.
    pub fn from_center_size(center: Point, width: f64, height: f64) -> Self {
        let half = Point::new(width.abs() / 2., height.abs() / 2.);
        Self {
            p0: center - half,
            p1: center + half,
        }
    }

    /// Creates a rectangle with its lower-left corner at the origin.
    pub fn from_size(width: f64, height: f64) -> Self {
        Self::new(Point::zero(), Point::new(width, height))
    }

    /// Returns the center point of the rectangle.
    ///
    /// ```
    /// # use geometry::prelude::*;
    /// let rect = Rect::from_sides(0., 0., 55., 45.);
    /// assert_eq!(rect.center(), Point::new(27.5, 22.5));
    /// ```
    pub fn center(&self) -> Point {
        Point::new((self.p0.x + self.p1.x) / 2., (self.p0.y + self.p1.y) / 2.)
    }

    /// The left edge coordinate.
    #[inline]
    pub fn left(&self) -> f64 {
        self.p0.x
    }

    /// The bottom edge coordinate.
    #[inline]
    pub fn bot(&self) -> f64 {
        self.p0.y
    }

    /// The right edge coordinate.
    #[inline]
    pub fn right(&self) -> f64 {
        self.p1.x
    }

    /// The top edge coordinate.
    #[inline]
    pub fn top(&self) -> f64 {
        self.p1.y
    }

    /// The horizontal extent of the rectangle.
    #[inline]
    pub fn width(&self) -> f64 {
        self.p1.x - self.p0.x
    }

    /// The vertical extent of the rectangle.
    #[inline]
    pub fn height(&self) -> f64 {
        self.p1.y - self.p0.y
    }

    /// The lower-left corner.
    #[inline]
    pub fn lower_left(&self) -> Point {
        self.p0
    }

    /// The upper-right corner.
    #[inline]
    pub fn upper_right(&self) -> Point {
        self.p1
    }

    /// The smallest rectangle containing both `self` and `other`.
    pub fn union(self, other: Self) -> Self {
        Self {
            p0: Point::new(self.p0.x.min(other.p0.x), self.p0.y.min(other.p0.y)),
            p1: Point::new(self.p1.x.max(other.p1.x), self.p1.y.max(other.p1.y)),
        }
    }

    /// Expands the rectangle by `amount` on every side.
    pub fn expand(&self, amount: f64) -> Self {
        let d = Point::new(amount, amount);
        Self::new(self.p0 - d, self.p1 + d)
    }

    /// The corners of the rectangle, counterclockwise from the lower left.
    pub fn corners(&self) -> [Point; 4] {
        [
            self.p0,
            Point::new(self.p1.x, self.p0.y),
            self.p1,
            Point::new(self.p0.x, self.p1.y),
        ]
    }

    /// Converts the rectangle into an equivalent counterclockwise polygon.
    pub fn to_polygon(&self) -> Polygon {
        Polygon::from_verts(self.corners().to_vec())
    }
}

impl Bbox for Rect {
    fn bbox(&self) -> Option<Rect> {
        Some(*self)
    }
}

impl TranslateMut for Rect {
    fn translate_mut(&mut self, p: Point) {
        self.p0 += p;
        self.p1 += p;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn union_covers_both() {
        let a = Rect::from_sides(0., 0., 1., 1.);
        let b = Rect::from_sides(-2., 0.5, 0.5, 3.);
        assert_eq!(a.union(b), Rect::from_sides(-2., 0., 1., 3.));
    }

    #[test]
    fn centered_rect_has_requested_size() {
        let r = Rect::from_center_size(Point::new(1., -1.), 4., 2.);
        assert_eq!(r, Rect::from_sides(-1., -2., 3., 0.));
        assert_eq!(r.width(), 4.);
        assert_eq!(r.height(), 2.);
    }

    #[test]
    fn expand_grows_every_side() {
        let r = Rect::from_sides(0., 0., 2., 1.).expand(0.5);
        assert_eq!(r, Rect::from_sides(-0.5, -0.5, 2.5, 1.5));
        assert_eq!(r.expand(-0.5), Rect::from_sides(0., 0., 2., 1.));
    }
}
