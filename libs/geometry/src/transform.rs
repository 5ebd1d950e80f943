//! Transformation types and traits.

use approx::{AbsDiffEq, RelativeEq};
use serde::{Deserialize, Serialize};

use crate::point::Point;
use crate::{cos_sin_deg, wrap_angle};

/// A transformation representing a translation, rotation, and/or reflection of geometry.
///
/// A point `p` is mapped to `R(angle) * M * p + offset`, where `M` is a reflection
/// across the x-axis if `reflect_vert` is set and the identity otherwise.
/// That is, the reflection is applied first, then the rotation, then the translation.
///
/// Scaling is not supported.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transformation {
    /// The counterclockwise rotation, in degrees, within `[0, 360)`.
    angle: f64,
    /// Whether to reflect across the x-axis before rotating.
    reflect_vert: bool,
    /// The x-y translation applied after the rotation.
    offset: Point,
}

impl Default for Transformation {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transformation {
    /// Returns the identity transform, leaving any transformed object unmodified.
    pub const fn identity() -> Self {
        Self {
            angle: 0.,
            reflect_vert: false,
            offset: Point::zero(),
        }
    }

    /// Returns a translation by `(x,y)`.
    pub const fn translate(x: f64, y: f64) -> Self {
        Self {
            angle: 0.,
            reflect_vert: false,
            offset: Point::new(x, y),
        }
    }

    /// Returns a counterclockwise rotation by `angle` degrees about the origin.
    pub fn rotate(angle: f64) -> Self {
        Self {
            angle: wrap_angle(angle),
            reflect_vert: false,
            offset: Point::zero(),
        }
    }

    /// Returns a counterclockwise rotation by `angle` degrees about `center`.
    pub fn rotate_about(angle: f64, center: Point) -> Self {
        Self::cascade(
            Self::translate(center.x, center.y),
            Self::cascade(Self::rotate(angle), Self::translate(-center.x, -center.y)),
        )
    }

    /// Returns a reflection about the x-axis.
    pub const fn reflect_vert() -> Self {
        Self {
            angle: 0.,
            reflect_vert: true,
            offset: Point::zero(),
        }
    }

    /// Creates a transformation from its parts.
    pub fn from_opts(offset: Point, reflect_vert: bool, angle: f64) -> Self {
        Self {
            angle: wrap_angle(angle),
            reflect_vert,
            offset,
        }
    }

    /// Create a new [`Transformation`] that is the cascade of `parent` and `child`.
    ///
    /// "Parents" and "children" refer to typical layout-instance hierarchies,
    /// in which each layer of instance has a nested set of transformations relative to its top-level parent.
    ///
    /// Note this operation *is not* commutative.
    /// For example the set of transformations:
    /// * (a) Reflect vertically, then
    /// * (b) Translate by (1,1)
    /// * (c) Place a point at (local coordinate) (1,1)
    ///
    /// Lands said point at (2,-2) in top-level space,
    /// whereas reversing the order of (a) and (b) lands it at (2,0).
    pub fn cascade(parent: Transformation, child: Transformation) -> Transformation {
        // M R(t) = R(-t) M, so a reflected parent flips the sense of the child's rotation.
        let child_angle = if parent.reflect_vert {
            -child.angle
        } else {
            child.angle
        };
        Self {
            angle: wrap_angle(parent.angle + child_angle),
            reflect_vert: parent.reflect_vert ^ child.reflect_vert,
            offset: parent.apply_point(child.offset),
        }
    }

    /// The rotation angle of this transformation, in degrees within `[0, 360)`.
    #[inline]
    pub fn angle(&self) -> f64 {
        self.angle
    }

    /// Whether this transformation reflects across the x-axis.
    #[inline]
    pub fn reflects_vert(&self) -> bool {
        self.reflect_vert
    }

    /// The point representing the translation of this transformation.
    #[inline]
    pub fn offset_point(&self) -> Point {
        self.offset
    }

    /// Applies the linear (rotation and reflection) part of the transformation,
    /// ignoring the translation.
    pub fn apply_vector(&self, p: Point) -> Point {
        let y = if self.reflect_vert { -p.y } else { p.y };
        let (cos, sin) = cos_sin_deg(self.angle);
        Point::new(cos * p.x - sin * y, sin * p.x + cos * y)
    }

    /// Maps a point through this transformation.
    pub fn apply_point(&self, p: Point) -> Point {
        self.apply_vector(p) + self.offset
    }

    /// Maps a direction, given in degrees, through this transformation.
    ///
    /// The result lies within `[0, 360)`.
    pub fn apply_angle(&self, angle: f64) -> f64 {
        let angle = if self.reflect_vert { -angle } else { angle };
        wrap_angle(self.angle + angle)
    }

    /// Returns the inverse [`Transformation`] of `self`.
    ///
    /// # Examples
    ///
    /// ```
    /// use geometry::transform::Transformation;
    /// use approx::assert_relative_eq;
    ///
    /// let trans = Transformation::cascade(
    ///     Transformation::rotate(90.),
    ///     Transformation::translate(5., 10.),
    /// );
    /// let inv = trans.inv();
    ///
    /// assert_relative_eq!(Transformation::cascade(inv, trans), Transformation::identity());
    /// ```
    pub fn inv(&self) -> Transformation {
        let angle = if self.reflect_vert {
            self.angle
        } else {
            -self.angle
        };
        let linear = Self {
            angle: wrap_angle(angle),
            reflect_vert: self.reflect_vert,
            offset: Point::zero(),
        };
        Self {
            offset: -linear.apply_point(self.offset),
            ..linear
        }
    }
}

impl AbsDiffEq for Transformation {
    type Epsilon = f64;

    fn default_epsilon() -> Self::Epsilon {
        f64::default_epsilon()
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: Self::Epsilon) -> bool {
        let dangle = wrap_angle(self.angle - other.angle);
        let dangle = dangle.min(360. - dangle);
        self.reflect_vert == other.reflect_vert
            && dangle <= epsilon
            && self.offset.abs_diff_eq(&other.offset, epsilon)
    }
}

impl RelativeEq for Transformation {
    fn default_max_relative() -> Self::Epsilon {
        f64::default_max_relative()
    }

    fn relative_eq(
        &self,
        other: &Self,
        epsilon: Self::Epsilon,
        max_relative: Self::Epsilon,
    ) -> bool {
        let dangle = wrap_angle(self.angle - other.angle);
        let dangle = dangle.min(360. - dangle);
        self.reflect_vert == other.reflect_vert
            && dangle <= epsilon.max(max_relative * 360.)
            && self.offset.relative_eq(&other.offset, epsilon, max_relative)
    }
}

/// A trait for specifying how an object is changed by a [`Transformation`].
pub trait TransformMut {
    /// Applies matrix-vector [`Transformation`] `trans`.
    fn transform_mut(&mut self, trans: Transformation);
}

impl<T: TransformMut> TransformMut for Vec<T> {
    fn transform_mut(&mut self, trans: Transformation) {
        for item in self {
            item.transform_mut(trans);
        }
    }
}

/// A trait for specifying how an object is changed by a [`Transformation`].
///
/// Takes in an owned copy of the shape and returns the transformed version.
pub trait Transform: TransformMut + Sized {
    /// Applies matrix-vector [`Transformation`] `trans`.
    ///
    /// Creates a new shape at a location equal to the transformation of the original.
    fn transform(mut self, trans: Transformation) -> Self {
        self.transform_mut(trans);
        self
    }
}

impl<T: TransformMut + Sized> Transform for T {}

/// A trait for specifying how a shape is translated by a [`Point`].
pub trait TranslateMut {
    /// Translates the shape by [`Point`], modifying it in place.
    fn translate_mut(&mut self, p: Point);
}

impl<T: TranslateMut> TranslateMut for Vec<T> {
    fn translate_mut(&mut self, p: Point) {
        for item in self {
            item.translate_mut(p);
        }
    }
}

/// A trait for specifying how a shape is translated by a [`Point`].
///
/// Takes in an owned copy of the shape and returns the translated version.
pub trait Translate: TranslateMut + Sized {
    /// Translates the shape by a [`Point`] through creation of a new shape.
    fn translate(mut self, p: Point) -> Self {
        self.translate_mut(p);
        self
    }
}

impl<T: TranslateMut + Sized> Translate for T {}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn reflect_then_rotate() {
        let trans = Transformation::from_opts(Point::zero(), true, 90.);
        // (1, 1) -> reflect -> (1, -1) -> rotate 90 -> (1, 1)
        assert_relative_eq!(
            trans.apply_point(Point::new(1., 1.)),
            Point::new(1., 1.)
        );
        // (1, 0) -> (1, 0) -> (0, 1)
        assert_relative_eq!(trans.apply_point(Point::new(1., 0.)), Point::new(0., 1.));
    }

    #[test]
    fn cascade_matches_sequential_application() {
        let parent = Transformation::from_opts(Point::new(3., -2.), true, 30.);
        let child = Transformation::from_opts(Point::new(-1., 5.), false, 75.);
        let cascaded = Transformation::cascade(parent, child);
        for p in [Point::new(1., 2.), Point::new(-4., 0.5), Point::zero()] {
            let expected = parent.apply_point(child.apply_point(p));
            assert_relative_eq!(cascaded.apply_point(p), expected, epsilon = 1e-12);
        }
        assert_relative_eq!(
            cascaded.apply_angle(10.),
            parent.apply_angle(child.apply_angle(10.)),
            epsilon = 1e-12
        );
    }

    #[test]
    fn inverse_undoes_transformation() {
        for reflect in [false, true] {
            let trans = Transformation::from_opts(Point::new(7., 11.), reflect, 123.);
            let inv = trans.inv();
            let p = Point::new(-2.5, 4.);
            assert_relative_eq!(inv.apply_point(trans.apply_point(p)), p, epsilon = 1e-12);
            assert_relative_eq!(
                Transformation::cascade(trans, inv),
                Transformation::identity(),
                epsilon = 1e-12
            );
        }
    }

    #[test]
    fn rotate_about_fixes_center() {
        let center = Point::new(4., 4.);
        let trans = Transformation::rotate_about(45., center);
        assert_relative_eq!(trans.apply_point(center), center, epsilon = 1e-12);
    }

    #[test]
    fn reflected_angles_flip_sign() {
        let trans = Transformation::reflect_vert();
        assert_eq!(trans.apply_angle(90.), 270.);
        assert_eq!(trans.apply_angle(0.), 0.);
        assert_eq!(trans.apply_angle(180.), 180.);
    }
}
