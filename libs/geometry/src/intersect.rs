//! Intersections of geometric objects.

use crate::point::Point;

/// Which side of the directed line `a -> b` the point `c` lies on.
///
/// Positive if `c` is to the left, negative if to the right, zero if collinear.
fn orient(a: Point, b: Point, c: Point) -> f64 {
    (b - a).cross(c - a)
}

/// Returns `true` if `c` lies within the axis-aligned box spanned by `a` and `b`.
fn within_box(a: Point, b: Point, c: Point) -> bool {
    c.x >= a.x.min(b.x) && c.x <= a.x.max(b.x) && c.y >= a.y.min(b.y) && c.y <= a.y.max(b.y)
}

/// Returns `true` if the closed segments `a0-a1` and `b0-b1` share at least one point.
///
/// # Examples
///
/// ```
/// # use geometry::prelude::*;
/// use geometry::intersect::segments_intersect;
///
/// let cross = segments_intersect(
///     Point::new(0., 0.),
///     Point::new(1., 1.),
///     Point::new(0., 1.),
///     Point::new(1., 0.),
/// );
/// assert!(cross);
/// let parallel = segments_intersect(
///     Point::new(0., 0.),
///     Point::new(1., 0.),
///     Point::new(0., 1.),
///     Point::new(1., 1.),
/// );
/// assert!(!parallel);
/// ```
pub fn segments_intersect(a0: Point, a1: Point, b0: Point, b1: Point) -> bool {
    let d1 = orient(b0, b1, a0);
    let d2 = orient(b0, b1, a1);
    let d3 = orient(a0, a1, b0);
    let d4 = orient(a0, a1, b1);

    if ((d1 > 0. && d2 < 0.) || (d1 < 0. && d2 > 0.))
        && ((d3 > 0. && d4 < 0.) || (d3 < 0. && d4 > 0.))
    {
        return true;
    }

    (d1 == 0. && within_box(b0, b1, a0))
        || (d2 == 0. && within_box(b0, b1, a1))
        || (d3 == 0. && within_box(a0, a1, b0))
        || (d4 == 0. && within_box(a0, a1, b1))
}
