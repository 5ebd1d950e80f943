//! Ring resonators.

use std::f64::consts::PI;

use arcstr::ArcStr;
use geometry::prelude::{Point, Polygon};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::block::Block;
use crate::components::primitives::Straight;
use crate::context::Context;
use crate::error::{ensure_non_negative, ensure_positive, Error, Result};
use crate::layout::{Component, Instance};
use crate::numeric::linspace;

/// The outline of a closed loop of width `width` around `center`.
///
/// The loop's centerline consists of two half circles of radius `radius`
/// joined by straights of length `straight`. The outline is split along the
/// horizontal line through `center` into a top and a bottom half, each a
/// simple counterclockwise polygon. Each quarter arc is sampled with
/// `num_pts / 2 + 1` points.
fn racetrack(
    center: Point,
    straight: f64,
    radius: f64,
    width: f64,
    num_pts: usize,
) -> [Polygon; 2] {
    let half = straight / 2.;
    let east = center + Point::new(half, 0.);
    let west = center - Point::new(half, 0.);
    let n = num_pts / 2 + 1;
    let arc = |c: Point, r: f64, from: f64, to: f64| {
        linspace(from, to, n)
            .into_iter()
            .map(move |phi| c + Point::polar(r, phi))
    };

    let outer = radius + width / 2.;
    let inner = radius - width / 2.;
    let top = arc(east, outer, 0., 90.)
        .chain(arc(west, outer, 90., 180.))
        .chain(arc(west, inner, 180., 90.))
        .chain(arc(east, inner, 90., 0.));
    let bot = arc(west, outer, 180., 270.)
        .chain(arc(east, outer, 270., 360.))
        .chain(arc(east, inner, 360., 270.))
        .chain(arc(west, inner, 270., 180.));
    // Without straights, the arcs meet at shared points.
    [top, bot].map(|pts| Polygon::from_verts(pts.dedup().collect()))
}

fn validate_loop(block: &str, radius: f64, width: f64, num_pts: usize) -> Result<()> {
    ensure_positive(block, "radius", radius)?;
    ensure_positive(block, "width", width)?;
    if width >= 2. * radius {
        return Err(Error::invalid(
            block,
            "width",
            format!("must be less than the diameter ({width} >= {})", 2. * radius),
        ));
    }
    if num_pts < 3 {
        return Err(Error::invalid(
            block,
            "num_pts",
            format!("at least 3 points are required (got {num_pts})"),
        ));
    }
    Ok(())
}

/// An annulus centered on the origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Ring {
    /// Radius of the ring's centerline.
    pub radius: f64,
    pub width: f64,
    pub layer: ArcStr,
    /// Number of points on each half circle.
    pub num_pts: usize,
}

impl Default for Ring {
    fn default() -> Self {
        Self {
            radius: 10.,
            width: 0.5,
            layer: arcstr::literal!("WAVEGUIDE"),
            num_pts: 128,
        }
    }
}

impl Block for Ring {
    fn id() -> ArcStr {
        arcstr::literal!("ring")
    }

    fn layout(&self, ctx: &Context) -> Result<Component> {
        validate_loop("ring", self.radius, self.width, self.num_pts)?;
        let layer = ctx.pdk().layer(&self.layer)?;
        let mut c = Component::new(Self::id());
        for half in racetrack(Point::zero(), 0., self.radius, self.width, self.num_pts) {
            c.add_polygon(layer, half);
        }
        Ok(c)
    }
}

/// A ring (or racetrack, if `length_x > 0`) coupled to a straight bus.
///
/// The bus runs along the x axis, centered on the origin, and extends one
/// cross-section width past the ring on either side. The ring sits `gap`
/// above the bus. Ports `o1` (west) and `o2` (east) are the ends of the bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RingSingle {
    pub radius: f64,
    /// Edge-to-edge spacing between the bus and the ring.
    pub gap: f64,
    /// Length of the straight sections of the ring.
    pub length_x: f64,
    pub cross_section: ArcStr,
    pub num_pts: usize,
}

impl Default for RingSingle {
    fn default() -> Self {
        Self {
            radius: 10.,
            gap: 0.2,
            length_x: 4.,
            cross_section: arcstr::literal!("strip"),
            num_pts: 128,
        }
    }
}

impl Block for RingSingle {
    fn id() -> ArcStr {
        arcstr::literal!("ring_single")
    }

    fn layout(&self, ctx: &Context) -> Result<Component> {
        let xs = ctx.pdk().cross_section(&self.cross_section)?;
        let w = xs.width();
        validate_loop("ring_single", self.radius, w, self.num_pts)?;
        ensure_non_negative("ring_single", "gap", self.gap)?;
        ensure_non_negative("ring_single", "length_x", self.length_x)?;

        let bus_length = self.length_x + 2. * (self.radius + w);
        let bus = ctx.generate_layout(&Straight {
            length: bus_length,
            cross_section: self.cross_section.clone(),
            width: None,
        })?;
        let mut bus = Instance::new(bus);
        bus.translate(-bus_length / 2., 0.);

        let mut c = Component::new(Self::id());
        let center = Point::new(0., self.radius + w + self.gap);
        for half in racetrack(center, self.length_x, self.radius, w, self.num_pts) {
            c.add_polygon(xs.layer(), half);
        }
        for clad in xs.cladding() {
            let outline = racetrack(
                center,
                self.length_x,
                self.radius,
                w + 2. * clad.offset,
                self.num_pts,
            );
            for half in outline {
                c.add_polygon(clad.layer, half);
            }
        }
        let (o1, o2) = xs.port_names();
        c.add_port_from(o1.clone(), &bus, &o1)?;
        c.add_port_from(o2.clone(), &bus, &o2)?;
        c.add_ref(bus);
        c.set_info("ring_length", 2. * PI * self.radius + 2. * self.length_x);
        Ok(c)
    }
}
