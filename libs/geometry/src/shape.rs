//! An enumeration of geometric shapes and their properties.

use serde::{Deserialize, Serialize};

use crate::{
    bbox::Bbox,
    point::Point,
    polygon::Polygon,
    rect::Rect,
    transform::{Transform, TransformMut, Transformation, TranslateMut},
};

/// An enumeration of geometric shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    /// A rectangle.
    Rect(Rect),
    /// A polygon.
    Polygon(Polygon),
}

impl Shape {
    /// If this shape is a rectangle, returns the contained rectangle.
    /// Otherwise, returns [`None`].
    pub fn rect(&self) -> Option<Rect> {
        match self {
            Self::Rect(r) => Some(*r),
            _ => None,
        }
    }

    /// If this shape is a polygon, returns the contained polygon.
    /// Otherwise, returns [`None`].
    pub fn polygon(&self) -> Option<&Polygon> {
        match self {
            Self::Polygon(p) => Some(p),
            _ => None,
        }
    }

    /// Converts this shape to a polygon.
    pub fn to_polygon(&self) -> Polygon {
        match self {
            Self::Rect(r) => r.to_polygon(),
            Self::Polygon(p) => p.clone(),
        }
    }

    /// The area enclosed by the shape.
    pub fn area(&self) -> f64 {
        match self {
            Self::Rect(r) => r.width() * r.height(),
            Self::Polygon(p) => p.area(),
        }
    }
}

impl TranslateMut for Shape {
    fn translate_mut(&mut self, p: Point) {
        match self {
            Shape::Rect(rect) => rect.translate_mut(p),
            Shape::Polygon(polygon) => polygon.translate_mut(p),
        };
    }
}

impl TransformMut for Shape {
    /// Rectangles stay rectangles under Manhattan rotations and become
    /// polygons otherwise.
    fn transform_mut(&mut self, trans: Transformation) {
        match self {
            Shape::Rect(rect) if crate::is_manhattan(trans.angle()) => {
                let [a, _, b, _] = rect.corners();
                *rect = Rect::new(trans.apply_point(a), trans.apply_point(b));
            }
            Shape::Rect(rect) => {
                *self = Shape::Polygon(rect.to_polygon().transform(trans));
            }
            Shape::Polygon(polygon) => polygon.transform_mut(trans),
        }
    }
}

impl Bbox for Shape {
    fn bbox(&self) -> Option<Rect> {
        match self {
            Shape::Rect(rect) => rect.bbox(),
            Shape::Polygon(polygon) => polygon.bbox(),
        }
    }
}

impl From<Rect> for Shape {
    #[inline]
    fn from(value: Rect) -> Self {
        Self::Rect(value)
    }
}

impl From<Polygon> for Shape {
    #[inline]
    fn from(value: Polygon) -> Self {
        Self::Polygon(value)
    }
}
