//! Polygons with floating point vertices.

use serde::{Deserialize, Serialize};

use crate::bbox::Bbox;
use crate::intersect::segments_intersect;
use crate::point::Point;
use crate::rect::Rect;
use crate::transform::{TransformMut, Transformation, TranslateMut};

/// A polygon, given by its vertices.
///
/// The polygon is implicitly closed: the last vertex connects back to the first,
/// and the first vertex is not repeated.
#[derive(Debug, Default, Clone, Serialize, Deserialize, PartialEq)]
pub struct Polygon {
    /// Vector of points that make up the polygon.
    points: Vec<Point>,
}

impl Polygon {
    /// Creates a polygon with given vertices.
    pub fn from_verts(vec: Vec<Point>) -> Self {
        Self { points: vec }
    }

    /// Creates a polygon from `(x, y)` coordinate pairs.
    ///
    /// ```
    /// # use geometry::prelude::*;
    /// let tri = Polygon::from_xy([(0., 0.), (1., 0.), (0., 1.)]);
    /// assert_eq!(tri.points().len(), 3);
    /// ```
    pub fn from_xy(coords: impl IntoIterator<Item = (f64, f64)>) -> Self {
        Self {
            points: coords.into_iter().map(Point::from).collect(),
        }
    }

    /// Returns the vertices of the polygon.
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// The number of vertices.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Returns `true` if the polygon has no vertices.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Iterates over the edges `(p[i], p[i+1])`, including the closing edge.
    pub fn edges(&self) -> impl Iterator<Item = (Point, Point)> + '_ {
        let n = self.points.len();
        (0..n).map(move |i| (self.points[i], self.points[(i + 1) % n]))
    }

    /// The signed area of the polygon (shoelace formula).
    ///
    /// Positive for counterclockwise vertex order.
    ///
    /// ```
    /// # use geometry::prelude::*;
    /// let square = Polygon::from_xy([(0., 0.), (2., 0.), (2., 2.), (0., 2.)]);
    /// assert_eq!(square.signed_area(), 4.);
    /// ```
    pub fn signed_area(&self) -> f64 {
        self.edges().map(|(a, b)| a.cross(b)).sum::<f64>() / 2.
    }

    /// The unsigned area of the polygon.
    pub fn area(&self) -> f64 {
        self.signed_area().abs()
    }

    /// Returns the polygon with its vertex order reversed.
    pub fn reversed(mut self) -> Self {
        self.points.reverse();
        self
    }

    /// Returns `true` if no two non-adjacent edges of the polygon intersect.
    ///
    /// Degenerate polygons (fewer than three vertices) are never simple.
    pub fn is_simple(&self) -> bool {
        let n = self.points.len();
        if n < 3 {
            return false;
        }
        let edges: Vec<_> = self.edges().collect();
        for i in 0..n {
            for j in (i + 1)..n {
                let adjacent = j == i + 1 || (i == 0 && j == n - 1);
                if adjacent {
                    continue;
                }
                let (a0, a1) = edges[i];
                let (b0, b1) = edges[j];
                if segments_intersect(a0, a1, b0, b1) {
                    return false;
                }
            }
        }
        true
    }
}

impl Bbox for Polygon {
    fn bbox(&self) -> Option<Rect> {
        let first = *self.points.first()?;
        Some(
            self.points
                .iter()
                .fold(Rect::new(first, first), |r, &p| r.union(Rect::new(p, p))),
        )
    }
}

impl TranslateMut for Polygon {
    fn translate_mut(&mut self, p: Point) {
        self.points.translate_mut(p);
    }
}

impl TransformMut for Polygon {
    fn transform_mut(&mut self, trans: Transformation) {
        self.points.transform_mut(trans);
        // A reflection reverses the winding direction; restore it.
        if trans.reflects_vert() {
            self.points.reverse();
        }
    }
}

impl From<Rect> for Polygon {
    fn from(value: Rect) -> Self {
        value.to_polygon()
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::transform::Transform;

    #[test]
    fn bowtie_is_not_simple() {
        let bowtie = Polygon::from_xy([(0., 0.), (1., 1.), (1., 0.), (0., 1.)]);
        assert!(!bowtie.is_simple());
        let square = Polygon::from_xy([(0., 0.), (1., 0.), (1., 1.), (0., 1.)]);
        assert!(square.is_simple());
    }

    #[test]
    fn reflection_preserves_winding() {
        let tri = Polygon::from_xy([(0., 0.), (2., 0.), (0., 1.)]);
        let area = tri.signed_area();
        let reflected = tri.transform(Transformation::reflect_vert());
        assert_relative_eq!(reflected.signed_area(), area);
    }

    #[test]
    fn bbox_of_polygon() {
        let poly = Polygon::from_xy([(-10., 25.), (0., 16.), (40., -20.)]);
        assert_eq!(poly.bbox(), Some(Rect::from_sides(-10., -20., 40., 25.)));
        assert_eq!(Polygon::default().bbox(), None);
    }
}
