//! Axis-aligned rectangular bounding boxes.

use crate::rect::Rect;

/// A geometric shape that has a bounding box.
///
/// # Examples
///
/// ```
/// # use geometry::prelude::*;
/// let rect = Rect::from_sides(0., 0., 100., 200.);
/// assert_eq!(rect.bbox(), Some(Rect::from_sides(0., 0., 100., 200.)));
/// ```
pub trait Bbox {
    /// Computes the axis-aligned rectangular bounding box.
    ///
    /// If empty, this method should return `None`.
    /// Note that points and zero-area rectangles are not empty:
    /// these shapes contain a single point, and their bounding box
    /// implementations will return `Some(_)`.
    fn bbox(&self) -> Option<Rect>;

    /// Computes the axis-aligned rectangular bounding box, panicking
    /// if it is empty.
    fn bbox_rect(&self) -> Rect {
        self.bbox().unwrap()
    }
}

impl<T> Bbox for &T
where
    T: Bbox,
{
    fn bbox(&self) -> Option<Rect> {
        T::bbox(*self)
    }
}

impl<T: Bbox> Bbox for Vec<T> {
    fn bbox(&self) -> Option<Rect> {
        self.as_slice().bbox()
    }
}

impl<T: Bbox> Bbox for [T] {
    fn bbox(&self) -> Option<Rect> {
        union_bbox(self.iter().map(|item| item.bbox()))
    }
}

impl Bbox for Option<Rect> {
    fn bbox(&self) -> Option<Rect> {
        *self
    }
}

/// The bounding union of a sequence of optional bounding boxes.
///
/// Empty (`None`) boxes are ignored.
pub fn union_bbox(boxes: impl IntoIterator<Item = Option<Rect>>) -> Option<Rect> {
    boxes
        .into_iter()
        .flatten()
        .reduce(|acc, rect| acc.union(rect))
}

#[cfg(test)]
mod tests {
    use crate::{bbox::Bbox, polygon::Polygon, rect::Rect};

    #[test]
    fn bbox_works_for_vecs() {
        let v = vec![
            Rect::from_sides(0., 0., 100., 200.),
            Rect::from_sides(-50., 20., 90., 250.),
        ];
        assert_eq!(v.bbox(), Some(Rect::from_sides(-50., 0., 100., 250.)));
    }

    #[test]
    fn empty_items_are_ignored() {
        let v = vec![
            Polygon::default(),
            Polygon::from_xy([(-10., 25.), (0., 16.), (40., -20.)]),
        ];
        assert_eq!(v.bbox(), Some(Rect::from_sides(-10., -20., 40., 25.)));
        assert_eq!(Vec::<Rect>::new().bbox(), None);
    }
}
