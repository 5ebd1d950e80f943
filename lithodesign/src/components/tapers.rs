//! Width transitions: linear, sine-profiled, angled and hyperbolic tapers.

use std::f64::consts::{PI, SQRT_2};

use arcstr::ArcStr;
use geometry::prelude::{Point, Polygon, Transformation};
use itertools::Itertools;
use layir::PortType;
use serde::{Deserialize, Serialize};

use crate::block::Block;
use crate::context::Context;
use crate::error::{ensure_positive, Error, Result};
use crate::layout::{Component, Port};
use crate::numeric::linspace;
use crate::pdk::cross_section::port_names;

/// A linear taper along `+x` from width `width1` at the origin to `width2`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Taper {
    pub length: f64,
    /// Width at the origin; defaults to the cross section's width.
    pub width1: Option<f64>,
    /// Width at the far end; defaults to `width1`.
    pub width2: Option<f64>,
    pub cross_section: ArcStr,
}

impl Default for Taper {
    fn default() -> Self {
        Self {
            length: 10.,
            width1: None,
            width2: None,
            cross_section: arcstr::literal!("strip"),
        }
    }
}

fn trapezoid(length: f64, w1: f64, w2: f64) -> Polygon {
    Polygon::from_xy([
        (0., -w1 / 2.),
        (length, -w2 / 2.),
        (length, w2 / 2.),
        (0., w1 / 2.),
    ])
}

impl Block for Taper {
    fn id() -> ArcStr {
        arcstr::literal!("taper")
    }

    fn layout(&self, ctx: &Context) -> Result<Component> {
        let xs = ctx.pdk().cross_section(&self.cross_section)?;
        let w1 = self.width1.unwrap_or(xs.width());
        let w2 = self.width2.unwrap_or(w1);
        ensure_positive("taper", "length", self.length)?;
        ensure_positive("taper", "width1", w1)?;
        ensure_positive("taper", "width2", w2)?;

        let mut c = Component::new(Self::id());
        c.add_polygon(xs.layer(), trapezoid(self.length, w1, w2));
        for clad in xs.cladding() {
            c.add_polygon(
                clad.layer,
                trapezoid(self.length, w1 + 2. * clad.offset, w2 + 2. * clad.offset),
            );
        }
        let (p1, p2) = xs.port_names();
        c.add_port(
            p1,
            Port::new(Point::zero(), w1, 180., xs.port_type(), xs.layer()),
        )?;
        c.add_port(
            p2,
            Port::new(
                Point::new(self.length, 0.),
                w2,
                0.,
                xs.port_type(),
                xs.layer(),
            ),
        )?;
        Ok(c)
    }
}

/// Width at fraction `t` of a transition from `w1` to `w2` whose width
/// changes along half a period of a cosine.
fn sine_width(w1: f64, w2: f64, t: f64) -> f64 {
    w1 + (w2 - w1) * (1. - (PI * t).cos()) / 2.
}

/// The outline of a strip centered on `path`.
///
/// `width` maps the fraction of path length travelled to the local width.
/// The strip's ends are perpendicular to `start_angle` and `end_angle`;
/// interior edges are perpendicular to the local chord direction.
fn extrude(
    path: &[Point],
    start_angle: f64,
    end_angle: f64,
    width: impl Fn(f64) -> f64,
) -> Polygon {
    let n = path.len();
    let mut travelled = Vec::with_capacity(n);
    travelled.push(0.);
    for (p, q) in path.iter().tuple_windows() {
        let last = travelled[travelled.len() - 1];
        travelled.push(last + p.distance(*q));
    }
    let total = travelled[n - 1];

    let edges: Vec<(Point, Point)> = (0..n)
        .map(|i| {
            let heading = if i == 0 {
                start_angle
            } else if i == n - 1 {
                end_angle
            } else {
                let d = path[i + 1] - path[i - 1];
                d.y.atan2(d.x).to_degrees()
            };
            let normal = Point::polar(width(travelled[i] / total) / 2., heading + 90.);
            (path[i] - normal, path[i] + normal)
        })
        .collect();
    let right = edges.iter().map(|&(r, _)| r);
    let left = edges.iter().rev().map(|&(_, l)| l);
    Polygon::from_verts(right.chain(left).collect())
}

/// A taper along `+x` whose width follows half a cosine period, so that it
/// meets both ends with zero slope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SineTaper {
    pub length: f64,
    pub width1: f64,
    /// Width at the far end; defaults to the cross section's width.
    pub width2: Option<f64>,
    pub cross_section: ArcStr,
    /// Number of samples along the taper.
    pub num_pts: usize,
}

impl Default for SineTaper {
    fn default() -> Self {
        Self {
            length: 10.,
            width1: 0.5,
            width2: None,
            cross_section: arcstr::literal!("asic"),
            num_pts: 100,
        }
    }
}

impl Block for SineTaper {
    fn id() -> ArcStr {
        arcstr::literal!("sine_taper")
    }

    fn layout(&self, ctx: &Context) -> Result<Component> {
        let xs = ctx.pdk().cross_section(&self.cross_section)?;
        let (w1, w2) = (self.width1, self.width2.unwrap_or(xs.width()));
        ensure_positive("sine_taper", "length", self.length)?;
        ensure_positive("sine_taper", "width1", w1)?;
        ensure_positive("sine_taper", "width2", w2)?;
        if self.num_pts < 2 {
            return Err(Error::invalid(
                "sine_taper",
                "num_pts",
                format!("at least 2 points are required (got {})", self.num_pts),
            ));
        }

        let path: Vec<Point> = linspace(0., self.length, self.num_pts)
            .into_iter()
            .map(|x| Point::new(x, 0.))
            .collect();
        let mut c = Component::new(Self::id());
        c.add_polygon(
            xs.layer(),
            extrude(&path, 0., 0., |t| sine_width(w1, w2, t)),
        );
        for clad in xs.cladding() {
            let grow = 2. * clad.offset;
            c.add_polygon(
                clad.layer,
                extrude(&path, 0., 0., |t| sine_width(w1, w2, t) + grow),
            );
        }
        let (p1, p2) = xs.port_names();
        c.add_port(
            p1,
            Port::new(Point::zero(), w1, 180., xs.port_type(), xs.layer()),
        )?;
        c.add_port(
            p2,
            Port::new(
                Point::new(self.length, 0.),
                w2,
                0.,
                xs.port_type(),
                xs.layer(),
            ),
        )?;
        Ok(c)
    }
}

/// Points of a clothoid of unit scale from arc length 0 to `s`, whose
/// heading at arc length `u` is `u²/2` radians.
fn clothoid(s: f64, n: usize) -> Vec<Point> {
    const TERMS: i32 = 8;
    linspace(0., s / SQRT_2, n)
        .into_iter()
        .map(|t| {
            let (mut x, mut y) = (0., 0.);
            // (2k)!, advanced two factors per term.
            let mut fact = 1.;
            for k in 0..TERMS {
                let sign = if k % 2 == 0 { 1. } else { -1. };
                let odd_fact = fact * (2 * k + 1) as f64;
                x += sign * t.powi(4 * k + 1) / (fact * (4 * k + 1) as f64);
                y += sign * t.powi(4 * k + 3) / (odd_fact * (4 * k + 3) as f64);
                fact = odd_fact * (2 * k + 2) as f64;
            }
            Point::new(SQRT_2 * x, SQRT_2 * y)
        })
        .collect()
}

/// The centerline of an Euler bend turning left by `angle` degrees.
///
/// The bend starts at the origin heading east. A fraction `p` of it is
/// clothoid, whose curvature ramps up linearly to `1 / radius`; the remainder
/// is a circular arc of radius `radius`. The second half of the bend mirrors
/// the first.
fn euler_bend(radius: f64, angle: f64, p: f64, num_pts: usize) -> Vec<Point> {
    let alpha = angle.to_radians();
    let sp = (p * alpha).sqrt();
    let rp = 1. / sp;
    let s0 = 2. * sp + rp * alpha * (1. - p);
    let n_euler = ((sp / (s0 / 2.) * num_pts as f64).round() as usize).max(2);
    let n_arc = num_pts.saturating_sub(n_euler).max(2);

    let mut half = clothoid(sp, n_euler);
    if p < 1. {
        let end = half[half.len() - 1];
        let phi0 = p * alpha / 2.;
        let dx = end.x - rp * phi0.sin();
        let dy = end.y - rp * (1. - phi0.cos());
        half.extend(linspace(sp, s0 / 2., n_arc).into_iter().skip(1).map(|s| {
            let phi = (s - sp) / rp + phi0;
            Point::new(rp * phi.sin() + dx, rp * (1. - phi.cos()) + dy)
        }));
    }

    let mid = half[half.len() - 1];
    let turn = Transformation::rotate(angle - 180.);
    let mirrored: Vec<Point> = half
        .iter()
        .rev()
        .map(|q| turn.apply_point(Point::new(q.x, -q.y)))
        .collect();
    let shift = mid - mirrored[0];
    let scale = radius / rp;
    half[..half.len() - 1]
        .iter()
        .copied()
        .chain(mirrored.into_iter().map(|q| q + shift))
        .map(|q| q * scale)
        .collect()
}

/// A taper that widens from `constr_width` to `wire_width` while following
/// an Euler bend of `angle` degrees.
///
/// Port 1 is the narrow end at the origin, facing 180°. Port 2 is the wide
/// end, facing `angle`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AngledTaper {
    pub wire_width: f64,
    pub constr_width: f64,
    /// Angle between the ends of the taper, in degrees.
    pub angle: f64,
    /// Minimum radius of curvature of the bend.
    pub radius: f64,
    /// Fraction of the bend that is clothoid rather than circular.
    pub p: f64,
    pub cross_section: ArcStr,
    /// Approximate number of samples along the bend.
    pub num_pts: usize,
}

impl Default for AngledTaper {
    fn default() -> Self {
        Self {
            wire_width: 0.6,
            constr_width: 0.1,
            angle: 60.,
            radius: 3.,
            p: 0.4,
            cross_section: arcstr::literal!("strip"),
            num_pts: 100,
        }
    }
}

impl AngledTaper {
    fn validate(&self) -> Result<()> {
        const BLOCK: &str = "angled_taper";
        ensure_positive(BLOCK, "wire_width", self.wire_width)?;
        ensure_positive(BLOCK, "constr_width", self.constr_width)?;
        ensure_positive(BLOCK, "radius", self.radius)?;
        ensure_positive(BLOCK, "angle", self.angle)?;
        if self.angle > 180. {
            return Err(Error::invalid(
                BLOCK,
                "angle",
                format!("must be at most 180 degrees (got {})", self.angle),
            ));
        }
        if !(self.p > 0. && self.p <= 1.) {
            return Err(Error::invalid(
                BLOCK,
                "p",
                format!("must lie in (0, 1] (got {})", self.p),
            ));
        }
        if self.num_pts < 4 {
            return Err(Error::invalid(
                BLOCK,
                "num_pts",
                format!("at least 4 points are required (got {})", self.num_pts),
            ));
        }
        Ok(())
    }
}

impl Block for AngledTaper {
    fn id() -> ArcStr {
        arcstr::literal!("angled_taper")
    }

    fn layout(&self, ctx: &Context) -> Result<Component> {
        self.validate()?;
        let xs = ctx.pdk().cross_section(&self.cross_section)?;
        let path = euler_bend(self.radius, self.angle, self.p, self.num_pts);
        let end = path[path.len() - 1];
        let (w1, w2) = (self.constr_width, self.wire_width);

        let mut c = Component::new(Self::id());
        c.add_polygon(
            xs.layer(),
            extrude(&path, 0., self.angle, |t| sine_width(w1, w2, t)),
        );
        for clad in xs.cladding() {
            let grow = 2. * clad.offset;
            c.add_polygon(
                clad.layer,
                extrude(&path, 0., self.angle, |t| sine_width(w1, w2, t) + grow),
            );
        }
        let (p1, p2) = xs.port_names();
        c.add_port(
            p1,
            Port::new(Point::zero(), w1, 180., xs.port_type(), xs.layer()),
        )?;
        c.add_port(
            p2,
            Port::new(end, w2, self.angle, xs.port_type(), xs.layer()),
        )?;
        Ok(c)
    }
}

/// Spacing of the samples along a [`HyperTaper`].
const HYPER_TAPER_STEP: f64 = 0.1;
/// Upper bound on the samples along one edge of a [`HyperTaper`].
const HYPER_TAPER_MAX_PTS: usize = 1_000_000;

/// A taper whose half-width follows a hyperbolic cosine.
///
/// The half-width at `x` is `cosh(a·x)·narrow/2` with
/// `a = acosh(wide/narrow)/length`, so the taper is `narrow_section` wide at
/// the origin and `wide_section` wide at `x = length`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HyperTaper {
    pub length: f64,
    pub wide_section: f64,
    pub narrow_section: f64,
    pub layer: ArcStr,
    pub port_type: PortType,
}

impl Default for HyperTaper {
    fn default() -> Self {
        Self {
            length: 10.,
            wide_section: 50.,
            narrow_section: 5.,
            layer: arcstr::literal!("NBTIN"),
            port_type: PortType::Electrical,
        }
    }
}

impl HyperTaper {
    fn outline(&self) -> Result<Polygon> {
        ensure_positive("hyper_taper", "length", self.length)?;
        ensure_positive("hyper_taper", "narrow_section", self.narrow_section)?;
        ensure_positive("hyper_taper", "wide_section", self.wide_section)?;
        if self.wide_section < self.narrow_section {
            return Err(Error::invalid(
                "hyper_taper",
                "wide_section",
                format!(
                    "must be at least narrow_section ({} < {})",
                    self.wide_section, self.narrow_section
                ),
            ));
        }

        let a = (self.wide_section / self.narrow_section).acosh() / self.length;
        let steps = (self.length / HYPER_TAPER_STEP).ceil();
        if steps >= HYPER_TAPER_MAX_PTS as f64 {
            return Err(Error::invalid(
                "hyper_taper",
                "length",
                format!(
                    "{} um needs more than {HYPER_TAPER_MAX_PTS} samples",
                    self.length
                ),
            ));
        }
        let n = steps as usize + 1;
        let xs = linspace(0., self.length, n);
        let half = |x: f64| (a * x).cosh() * self.narrow_section / 2.;
        let top = xs.iter().map(|&x| (x, half(x)));
        let bot = xs.iter().rev().map(|&x| (x, -half(x)));
        Ok(Polygon::from_xy(top.chain(bot)))
    }
}

impl Block for HyperTaper {
    fn id() -> ArcStr {
        arcstr::literal!("hyper_taper")
    }

    fn layout(&self, ctx: &Context) -> Result<Component> {
        let layer = ctx.pdk().layer(&self.layer)?;
        let outline = self.outline()?;
        let mut c = Component::new(Self::id());
        c.add_polygon(layer, outline);
        let (p1, p2) = port_names(self.port_type);
        c.add_port(
            p1,
            Port::new(
                Point::zero(),
                self.narrow_section,
                180.,
                self.port_type,
                layer,
            ),
        )?;
        c.add_port(
            p2,
            Port::new(
                Point::new(self.length, 0.),
                self.wide_section,
                0.,
                self.port_type,
                layer,
            ),
        )?;
        Ok(c)
    }
}
