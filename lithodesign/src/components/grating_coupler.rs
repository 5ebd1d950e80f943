//! Focusing grating couplers.

use arcstr::ArcStr;
use geometry::prelude::{Point, Polygon};
use layir::PortType;
use serde::{Deserialize, Serialize};

use crate::block::Block;
use crate::context::Context;
use crate::error::{ensure_positive, Error, Result};
use crate::layout::{Component, Instance, Port};
use crate::numeric::linspace;

const BLOCK: &str = "grating_coupler_traditional";

/// A focusing grating coupler with an apodized section.
///
/// The waveguide fans out from the origin to a circular arc of radius
/// `taper_length`. Beyond it sit `n_ap_gratings` teeth whose fill factor
/// falls linearly from `ap_max_ff` to `grating_ff`, followed by
/// `n_gratings` teeth of fill factor `grating_ff`. Every tooth is an
/// annular sector spanning the full opening angle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GratingCouplerTraditional {
    /// Opening angle of the fan, in degrees.
    pub full_opening_angle: f64,
    pub grating_period: f64,
    /// Fraction of each period filled with material.
    pub grating_ff: f64,
    pub n_gratings: usize,
    pub ap_max_ff: f64,
    pub n_ap_gratings: usize,
    /// Radius of the fan taper.
    pub taper_length: f64,
    pub cross_section: ArcStr,
    /// Number of points on each arc.
    pub num_arc_pts: usize,
}

impl Default for GratingCouplerTraditional {
    fn default() -> Self {
        Self {
            full_opening_angle: 40.,
            grating_period: 1.13,
            grating_ff: 0.7,
            n_gratings: 22,
            ap_max_ff: 0.96,
            n_ap_gratings: 10,
            taper_length: 16.,
            cross_section: arcstr::literal!("strip"),
            num_arc_pts: 100,
        }
    }
}

impl GratingCouplerTraditional {
    fn validate(&self) -> Result<()> {
        ensure_positive(BLOCK, "grating_period", self.grating_period)?;
        ensure_positive(BLOCK, "taper_length", self.taper_length)?;
        for (param, ff) in [("grating_ff", self.grating_ff), ("ap_max_ff", self.ap_max_ff)] {
            if !(ff > 0. && ff <= 1.) {
                return Err(Error::invalid(
                    BLOCK,
                    param,
                    format!("fill factor must lie in (0, 1] (got {ff})"),
                ));
            }
        }
        if !(self.full_opening_angle > 0. && self.full_opening_angle < 180.) {
            return Err(Error::invalid(
                BLOCK,
                "full_opening_angle",
                format!("must lie in (0, 180) degrees (got {})", self.full_opening_angle),
            ));
        }
        if self.num_arc_pts < 2 {
            return Err(Error::invalid(
                BLOCK,
                "num_arc_pts",
                format!("at least 2 points are required (got {})", self.num_arc_pts),
            ));
        }
        Ok(())
    }

    /// The `(gap, material)` widths of every tooth, innermost first.
    pub fn teeth(&self) -> Vec<(f64, f64)> {
        let period = self.grating_period;
        linspace(self.ap_max_ff, self.grating_ff, self.n_ap_gratings)
            .into_iter()
            .chain(std::iter::repeat(self.grating_ff).take(self.n_gratings))
            .map(|ff| (period * (1. - ff), period * ff))
            .collect()
    }

    fn arc(&self, radius: f64) -> impl DoubleEndedIterator<Item = Point> {
        let half = self.full_opening_angle / 2.;
        linspace(-half, half, self.num_arc_pts)
            .into_iter()
            .map(move |phi| Point::polar(radius, phi))
    }
}

impl Block for GratingCouplerTraditional {
    fn id() -> ArcStr {
        arcstr::literal!("grating_coupler_traditional")
    }

    fn layout(&self, ctx: &Context) -> Result<Component> {
        self.validate()?;
        let xs = ctx.pdk().cross_section(&self.cross_section)?;
        let layer = xs.layer();
        let mut c = Component::new(Self::id());

        let mut radius = self.taper_length;
        let teeth = self.teeth();
        for &(gap, material) in &teeth {
            let inner = radius + gap;
            let outer = inner + material;
            let pts = self.arc(inner).chain(self.arc(outer).rev()).collect();
            c.add_polygon(layer, Polygon::from_verts(pts));
            radius = outer;
        }

        let w = xs.width();
        let mut fan = vec![Point::new(0., -w / 2.)];
        fan.extend(self.arc(self.taper_length));
        fan.push(Point::new(0., w / 2.));
        c.add_polygon(layer, Polygon::from_verts(fan));

        c.add_port(
            "o1",
            Port::new(Point::zero(), w, 180., PortType::Optical, layer),
        )?;
        c.set_info("n_teeth", teeth.len() as f64);
        c.set_info("outer_radius", radius);
        tracing::debug!(n_teeth = teeth.len(), outer_radius = radius, "drew grating");
        Ok(c)
    }
}

/// A row of grating couplers for a fiber array.
///
/// Each coupler is rotated by −90° so that its waveguide port faces north.
/// Couplers are spaced `pitch` apart and centered on `x = 0`; their ports
/// are named `o0` through `o{n-1}` from west to east.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GratingCouplerArray {
    pub grating: GratingCouplerTraditional,
    pub pitch: f64,
    pub n: usize,
}

impl Default for GratingCouplerArray {
    fn default() -> Self {
        Self {
            grating: GratingCouplerTraditional::default(),
            pitch: 127.,
            n: 5,
        }
    }
}

impl Block for GratingCouplerArray {
    fn id() -> ArcStr {
        arcstr::literal!("grating_coupler_array")
    }

    fn layout(&self, ctx: &Context) -> Result<Component> {
        ensure_positive(&Self::id(), "pitch", self.pitch)?;
        if self.n == 0 {
            return Err(Error::invalid(
                Self::id(),
                "n",
                "at least one coupler is required",
            ));
        }
        let grating = ctx.generate_layout(&self.grating)?;
        let mut c = Component::new(Self::id());
        let x0 = -((self.n - 1) as f64) * self.pitch / 2.;
        for i in 0..self.n {
            let mut inst = Instance::new(grating.clone());
            inst.rotate_about(-90., Point::zero())
                .translate(x0 + i as f64 * self.pitch, 0.);
            let id = c.add_ref(inst);
            let inst = c.instance(id).clone();
            c.add_port_from(arcstr::format!("o{i}"), &inst, "o1")?;
        }
        Ok(c)
    }
}

/// Eight grating couplers on a two-column grid, for a pair of fiber arrays
/// that face each other.
///
/// The couplers sit in four rows `row_offset` apart, with the west column
/// `column_offset` west of the east column. Going down the rows, the east
/// column's waveguide ports face west, east, west, east, and the west
/// column's face the other way. Coupler `i` (numbered across each row east to
/// west, then down the rows) exposes its waveguide port as `o{i}`, with `i`
/// running from 1 to 8. The first coupler is centered on the origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GratingCouplerCluster {
    pub grating: GratingCouplerTraditional,
    pub row_offset: f64,
    pub column_offset: f64,
}

impl Default for GratingCouplerCluster {
    fn default() -> Self {
        Self {
            grating: GratingCouplerTraditional::default(),
            row_offset: 150.,
            column_offset: 600.,
        }
    }
}

impl GratingCouplerCluster {
    /// Center and rotation of each coupler, in port order.
    fn placements(&self) -> [(Point, f64); 8] {
        let (dx, dy) = (self.column_offset, self.row_offset);
        let east = |row: f64, rot: f64| (Point::new(0., -row * dy), rot);
        let west = |row: f64, rot: f64| (Point::new(-dx, -row * dy), rot);
        [
            east(0., 0.),
            west(0., 180.),
            east(1., 180.),
            west(1., 0.),
            east(2., 0.),
            west(2., 180.),
            east(3., 180.),
            west(3., 0.),
        ]
    }
}

impl Block for GratingCouplerCluster {
    fn id() -> ArcStr {
        arcstr::literal!("grating_coupler_cluster")
    }

    fn layout(&self, ctx: &Context) -> Result<Component> {
        ensure_positive(&Self::id(), "row_offset", self.row_offset)?;
        ensure_positive(&Self::id(), "column_offset", self.column_offset)?;
        let grating = ctx.generate_layout(&self.grating)?;
        let mut c = Component::new(Self::id());
        for (i, (center, rotation)) in self.placements().into_iter().enumerate() {
            let mut inst = Instance::new(grating.clone());
            inst.rotate_about(rotation, Point::zero())
                .move_center_to(center);
            c.add_port_from(arcstr::format!("o{}", i + 1), &inst, "o1")?;
            c.add_ref(inst);
        }
        Ok(c)
    }
}
