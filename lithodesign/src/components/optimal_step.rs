//! Current-crowding-free width transitions.
//!
//! The boundary of the step is the optimal curve of Clem and Berggren,
//! "Geometry-dependent critical currents in superconducting nanocircuits",
//! Phys. Rev. B 84, 174510 (2011). It is obtained by mapping the upper unit
//! semicircle through a Schwarz-Christoffel transformation and inverting the
//! map numerically at evenly spaced `x` positions.

use std::f64::consts::PI;

use arcstr::ArcStr;
use geometry::prelude::{Point, Polygon};
use geometry::snap::round_to;
use itertools::Itertools;
use layir::PortType;
use num::complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::block::Block;
use crate::context::Context;
use crate::error::{ensure_positive, Error, Result};
use crate::layout::{Component, Port};
use crate::numeric::{fminbound, linspace, DEFAULT_MAXITER, DEFAULT_XATOL};
use crate::pdk::cross_section::port_names;

const BLOCK: &str = "optimal_step";

/// An optimally rounded width step.
///
/// Port 1 (`e1`/`o1`) sits at the `start_width` end, facing 180°.
/// Port 2 (`e2`/`o2`) sits at the `end_width` end, facing 0°.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OptimalStep {
    /// Width of the far end of the step.
    pub end_width: f64,
    /// Width of the near end; defaults to the cross section's width.
    pub start_width: Option<f64>,
    /// Cross section supplying the layer and default start width.
    pub cross_section: ArcStr,
    /// Number of samples along the curved edge.
    pub num_pts: usize,
    /// Fractional distance kept from the singular ends of the curve.
    pub width_tol: f64,
    /// Factor by which the transition is stretched along `x`.
    pub anticrowding_factor: f64,
    /// Whether the step is mirrored about its center line.
    pub symmetric: bool,
    /// Naming convention of the ports.
    pub port_type: PortType,
}

impl Default for OptimalStep {
    fn default() -> Self {
        Self {
            end_width: 22.,
            start_width: None,
            cross_section: arcstr::literal!("strip"),
            num_pts: 100,
            width_tol: 1e-3,
            anticrowding_factor: 1.2,
            symmetric: false,
            port_type: PortType::Electrical,
        }
    }
}

/// Shape parameters of an optimal step, independent of any PDK.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepParams {
    pub start_width: f64,
    pub end_width: f64,
    pub num_pts: usize,
    pub width_tol: f64,
    pub anticrowding_factor: f64,
    pub symmetric: bool,
}

impl Default for StepParams {
    fn default() -> Self {
        Self {
            start_width: 1.,
            end_width: 22.,
            num_pts: 100,
            width_tol: 1e-3,
            anticrowding_factor: 1.2,
            symmetric: false,
        }
    }
}

/// The outline of an optimal step and where its ports belong.
#[derive(Debug, Clone, PartialEq)]
pub struct StepGeometry {
    /// The outline of the step.
    pub polygon: Polygon,
    /// Length of the transition in squares.
    pub num_squares: f64,
    /// Center of the `start_width` end.
    pub start: Point,
    /// Center of the `end_width` end.
    pub end: Point,
}

impl StepParams {
    fn validate(&self) -> Result<()> {
        ensure_positive(BLOCK, "start_width", self.start_width)?;
        ensure_positive(BLOCK, "end_width", self.end_width)?;
        if self.num_pts < 2 {
            return Err(Error::invalid(
                BLOCK,
                "num_pts",
                format!("at least 2 points are required (got {})", self.num_pts),
            ));
        }
        if !(0. ..1.).contains(&self.width_tol) {
            return Err(Error::invalid(
                BLOCK,
                "width_tol",
                format!("must lie in [0, 1) (got {})", self.width_tol),
            ));
        }
        if !(self.anticrowding_factor >= 1. && self.anticrowding_factor.is_finite()) {
            return Err(Error::invalid(
                BLOCK,
                "anticrowding_factor",
                format!("must be at least 1 (got {})", self.anticrowding_factor),
            ));
        }
        Ok(())
    }

    /// Computes the outline of the step.
    ///
    /// The narrow end of an asymmetric step spans `y ∈ [0, width]`; a
    /// symmetric step is centered on `y = 0`.
    pub fn geometry(&self) -> Result<StepGeometry> {
        self.validate()?;
        let (start_width, end_width) = (self.start_width, self.end_width);

        if start_width == end_width {
            let w = start_width;
            let (bot, top) = if self.symmetric { (-w / 2., w / 2.) } else { (0., w) };
            let polygon = Polygon::from_xy([(0., bot), (0., top), (w, top), (w, bot)]);
            let mid = (bot + top) / 2.;
            return Ok(StepGeometry {
                polygon,
                num_squares: 1.,
                start: Point::new(0., mid),
                end: Point::new(w, mid),
            });
        }

        let reverse = start_width > end_width;
        let (narrow, wide) = if reverse {
            (end_width, start_width)
        } else {
            (start_width, end_width)
        };
        let (y_lo, y_hi) = (narrow * (1. + self.width_tol), wide * (1. - self.width_tol));
        let too_close = || {
            Error::invalid(
                BLOCK,
                "end_width",
                format!(
                    "{end_width} is too close to the start width {start_width} \
                     for a width tolerance of {}",
                    self.width_tol
                ),
            )
        };
        if y_lo >= y_hi {
            return Err(too_close());
        }
        let map = StepMap::new(narrow, wide);

        let (x_min, _) = map.invert(Target::Y(y_lo));
        let (x_max, _) = map.invert(Target::Y(y_hi));
        if !(x_min < x_max) {
            return Err(too_close());
        }

        let xs = linspace(x_min, x_max, self.num_pts);
        let mut ys: Vec<f64> = xs.iter().map(|&x| map.invert(Target::X(x)).1).collect();
        ys[0] = narrow;
        let last = ys.len() - 1;
        ys[last] = wide;

        let num_squares = round_to(
            xs.iter()
                .tuple_windows()
                .zip(ys.iter().tuple_windows())
                .map(|((x0, x1), (y0, y1))| (x1 - x0) / ((y0 + y1) / 2.))
                .sum(),
            3,
        );

        let mut pts: Vec<(f64, f64)> = xs.iter().copied().zip(ys.iter().copied()).collect();
        if self.symmetric {
            let mirrored: Vec<_> = pts.iter().rev().map(|&(x, y)| (x, -y)).collect();
            pts.extend(mirrored);
            for (_, y) in pts.iter_mut() {
                *y /= 2.;
            }
        } else {
            pts.push((x_max, 0.));
            pts.push((x_min, 0.));
        }

        let sign = if reverse { -1. } else { 1. };
        let polygon = Polygon::from_xy(
            pts.into_iter()
                .map(|(x, y)| (sign * x * self.anticrowding_factor, y)),
        );

        let (left, right) = polygon
            .points()
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
                (lo.min(p.x), hi.max(p.x))
            });
        let (start_y, end_y) = if self.symmetric {
            (0., 0.)
        } else {
            (start_width / 2., end_width / 2.)
        };

        tracing::debug!(
            start_width,
            end_width,
            num_squares,
            length = right - left,
            "computed optimal step"
        );

        Ok(StepGeometry {
            polygon,
            num_squares,
            start: Point::new(left, start_y),
            end: Point::new(right, end_y),
        })
    }
}

/// The conformal map from the upper unit semicircle to the optimal curve
/// joining a strip of width `narrow` to a strip of width `wide`.
struct StepMap {
    narrow: f64,
    wide: f64,
    gamma: f64,
}

#[derive(Debug, Clone, Copy)]
enum Target {
    X(f64),
    Y(f64),
}

impl StepMap {
    fn new(narrow: f64, wide: f64) -> Self {
        let (w2, a2) = (narrow * narrow, wide * wide);
        Self {
            narrow,
            wide,
            gamma: (a2 + w2) / (a2 - w2),
        }
    }

    /// Maps `eta ∈ [0, π]` to a point `(x, y)` on the curve.
    fn point(&self, eta: f64) -> (f64, f64) {
        let w = Complex64::new(0., eta).exp();
        let g = self.gamma;
        let first = ((w - g) / (g + 1.)).sqrt().atan() * self.narrow;
        let second = (Complex64::new(g - 1., 0.) / (w - g)).sqrt().atan() * self.wide;
        let zeta = Complex64::new(0., 4. / PI) * (first + second);
        (zeta.re, zeta.im)
    }

    /// Finds the point on the curve whose `x` (or `y`) coordinate is closest
    /// to the target.
    fn invert(&self, target: Target) -> (f64, f64) {
        let min = fminbound(
            |eta| {
                let (x, y) = self.point(eta);
                match target {
                    Target::X(t) => (x - t).powi(2),
                    Target::Y(t) => (y - t).powi(2),
                }
            },
            0.,
            PI,
            DEFAULT_XATOL,
            DEFAULT_MAXITER,
        );
        self.point(min.x)
    }
}

impl Block for OptimalStep {
    fn id() -> ArcStr {
        arcstr::literal!("optimal_step")
    }

    fn name(&self) -> ArcStr {
        arcstr::format!(
            "optimal_step_{}_{}",
            self.start_width
                .map(|w| w.to_string())
                .unwrap_or_else(|| self.cross_section.to_string()),
            self.end_width
        )
    }

    fn layout(&self, ctx: &Context) -> Result<Component> {
        let xs = ctx.pdk().cross_section(&self.cross_section)?;
        let start_width = self.start_width.unwrap_or(xs.width());
        let geom = StepParams {
            start_width,
            end_width: self.end_width,
            num_pts: self.num_pts,
            width_tol: self.width_tol,
            anticrowding_factor: self.anticrowding_factor,
            symmetric: self.symmetric,
        }
        .geometry()?;

        let layer = xs.layer();
        let mut c = Component::new(Self::id());
        c.add_polygon(layer, geom.polygon);
        let (p1, p2) = port_names(self.port_type);
        c.add_port(
            p1,
            Port::new(geom.start, start_width, 180., self.port_type, layer),
        )?;
        c.add_port(
            p2,
            Port::new(geom.end, self.end_width, 0., self.port_type, layer),
        )?;
        c.set_info("num_squares", geom.num_squares);
        Ok(c)
    }
}
