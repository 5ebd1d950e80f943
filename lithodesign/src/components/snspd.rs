//! Waveguide-integrated superconducting nanowire single-photon detectors.

use arcstr::ArcStr;
use geometry::prelude::{Bbox, Point, Rect};
use serde::{Deserialize, Serialize};

use crate::block::Block;
use crate::components::constrictions::{ProbeConfig, VariableLengthConstriction};
use crate::components::primitives::Straight;
use crate::context::Context;
use crate::error::{ensure_non_negative, ensure_positive, Error, Result};
use crate::layout::{Component, Instance};

/// Length of the waveguide crossing the nanowire, before extension.
const WAVEGUIDE_LENGTH: f64 = 10.;

/// A straight nanowire crossed at its center by a waveguide.
///
/// The nanowire is a [`VariableLengthConstriction`] on the fine cross section
/// whose ends widen to the width of the coarse cross section. The waveguide
/// runs north through the center of the wire. The whole detector is centered
/// on the origin.
///
/// Ports `o1` (south) and `o2` (north) are the waveguide ends; `e1` (west)
/// and `e2` (east) are the nanowire ends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StraightSnspd {
    pub channel_width: f64,
    pub channel_length: f64,
    /// Covers the channel with a rectangle on the waveguide layer.
    pub add_channel_protection: bool,
    pub fine_cross_section: ArcStr,
    pub coarse_cross_section: ArcStr,
    pub waveguide_cross_section: ArcStr,
    /// Extra waveguide length on each side of the nanowire.
    pub waveguide_extension: f64,
}

impl Default for StraightSnspd {
    fn default() -> Self {
        Self {
            channel_width: 0.5,
            channel_length: 10.,
            add_channel_protection: true,
            fine_cross_section: arcstr::literal!("nbtin"),
            coarse_cross_section: arcstr::literal!("coarse_nbtin"),
            waveguide_cross_section: arcstr::literal!("strip"),
            waveguide_extension: 0.,
        }
    }
}

impl Block for StraightSnspd {
    fn id() -> ArcStr {
        arcstr::literal!("straight_snspd")
    }

    fn layout(&self, ctx: &Context) -> Result<Component> {
        ensure_positive("straight_snspd", "channel_width", self.channel_width)?;
        ensure_non_negative("straight_snspd", "channel_length", self.channel_length)?;
        ensure_non_negative(
            "straight_snspd",
            "waveguide_extension",
            self.waveguide_extension,
        )?;
        let coarse = ctx.pdk().cross_section(&self.coarse_cross_section)?;
        let waveguide_xs = ctx.pdk().cross_section(&self.waveguide_cross_section)?;

        let nanowire = ctx.generate_layout(&VariableLengthConstriction {
            channel_w: self.channel_width,
            source_w: coarse.width(),
            channel_l: self.channel_length,
            cross_section: self.fine_cross_section.clone(),
            probes: ProbeConfig::None,
            ..Default::default()
        })?;
        let nanowire = Instance::new(nanowire);
        let wire_box = nanowire.bbox().ok_or_else(|| {
            Error::invalid(Self::id(), "channel_width", "the nanowire is empty")
        })?;

        let waveguide = ctx.generate_layout(&Straight {
            length: WAVEGUIDE_LENGTH + 2. * self.waveguide_extension,
            cross_section: self.waveguide_cross_section.clone(),
            width: None,
        })?;
        let mut waveguide = Instance::new(waveguide);
        waveguide
            .rotate_about(90., Point::zero())
            .move_center_to(wire_box.center());

        let mut c = Component::new(Self::id());
        if self.add_channel_protection {
            c.add_rect(
                waveguide_xs.layer(),
                Rect::from_center_size(
                    wire_box.center(),
                    wire_box.width() * 0.3,
                    3. * self.channel_width + 3.,
                ),
            );
        }
        let (o1, o2) = waveguide_xs.port_names();
        c.add_port_from(o1.clone(), &waveguide, &o1)?;
        c.add_port_from(o2.clone(), &waveguide, &o2)?;
        c.add_port_from("e1", &nanowire, "e1")?;
        c.add_port_from("e2", &nanowire, "e2")?;
        c.add_ref(nanowire);
        c.add_ref(waveguide);
        c.center_at_origin();
        Ok(c)
    }
}
