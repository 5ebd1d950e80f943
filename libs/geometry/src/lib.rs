//! 2-D geometric operations relevant to photonic and superconducting layout.
//!
//! All coordinates are `f64` values in micrometers. Unlike integrated circuit layout,
//! photonic layout routinely needs curved boundaries and non-Manhattan rotations,
//! so transformations support arbitrary angles.
//!
//! # Examples
//!
//! Create a [rectangle](crate::rect::Rect):
//!
//! ```
//! # use geometry::prelude::*;
//! let rect = Rect::from_sides(10., 20., 30., 40.);
//! assert_eq!(rect.width(), 20.);
//! ```
#![warn(missing_docs)]

extern crate self as geometry;

pub mod bbox;
pub mod intersect;
pub mod point;
pub mod polygon;
pub mod prelude;
pub mod rect;
pub mod shape;
pub mod snap;
pub mod transform;

/// Wraps the given angle to the interval `[0, 360)` degrees.
///
/// # Examples
///
/// ```
/// use geometry::wrap_angle;
///
/// assert_eq!(wrap_angle(10.), 10.);
/// assert_eq!(wrap_angle(-10.), 350.);
/// assert_eq!(wrap_angle(-740.), 340.);
/// assert_eq!(wrap_angle(725.), 5.);
/// assert_eq!(wrap_angle(360.), 0.);
/// assert_eq!(wrap_angle(-360.), 0.);
/// ```
pub fn wrap_angle(angle: f64) -> f64 {
    let wrapped = ((angle % 360.) + 360.) % 360.;
    // `-1e-20 % 360 + 360` rounds to exactly 360.
    if wrapped >= 360. {
        0.
    } else {
        wrapped
    }
}

/// Returns `(cos, sin)` of an angle given in degrees.
///
/// Multiples of 90 degrees return exact values, so that Manhattan
/// rotations do not accumulate floating point noise.
///
/// ```
/// use geometry::cos_sin_deg;
///
/// assert_eq!(cos_sin_deg(90.), (0., 1.));
/// assert_eq!(cos_sin_deg(-180.), (-1., 0.));
/// ```
pub fn cos_sin_deg(angle: f64) -> (f64, f64) {
    let angle = wrap_angle(angle);
    if angle == 0. {
        (1., 0.)
    } else if angle == 90. {
        (0., 1.)
    } else if angle == 180. {
        (-1., 0.)
    } else if angle == 270. {
        (0., -1.)
    } else {
        let rad = angle.to_radians();
        (rad.cos(), rad.sin())
    }
}

/// Returns `true` if the given angle (in degrees) is a multiple of 90 degrees.
pub fn is_manhattan(angle: f64) -> bool {
    wrap_angle(angle) % 90. == 0.
}
