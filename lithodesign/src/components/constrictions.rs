//! Nanowire constrictions built from pairs of optimal steps.

use std::sync::Arc;

use arcstr::ArcStr;
use geometry::prelude::{Point, Rect};
use layir::PortType;
use serde::{Deserialize, Serialize};

use crate::block::Block;
use crate::components::optimal_step::OptimalStep;
use crate::context::Context;
use crate::error::{ensure_non_negative, ensure_positive, Result};
use crate::layout::{Component, Instance, Port};

/// Voltage probes attached to a constriction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeConfig {
    /// No probes.
    #[default]
    None,
    /// One probe at each probed point, turned by 90°. Ports `e3` and `e4`.
    TwoPoint,
    /// Two probes at each probed point, turned by ±45°.
    /// Ports `e3`, `e4` at the first point and `e5`, `e6` at the second.
    FourPoint,
}

impl ProbeConfig {
    /// The rotations of the probes at each probed point.
    fn rotations(&self) -> &'static [f64] {
        match self {
            ProbeConfig::None => &[],
            ProbeConfig::TwoPoint => &[90.],
            ProbeConfig::FourPoint => &[45., -45.],
        }
    }
}

/// A nanowire made of two symmetric optimal steps joined at their
/// `channel_w` ends.
///
/// Port `e1` is the west `source_w` end, port `e2` the east one. The narrowest
/// point of the wire sits at the origin. Probes attach at `e1` and `e2`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SpotConstriction {
    /// Width at the hot spot.
    pub channel_w: f64,
    /// Width at either end.
    pub source_w: f64,
    pub anticrowding_factor: f64,
    pub num_pts: usize,
    pub cross_section: ArcStr,
    pub probes: ProbeConfig,
    /// End width of each probe; defaults to `source_w`.
    pub probe_width: Option<f64>,
}

impl Default for SpotConstriction {
    fn default() -> Self {
        Self {
            channel_w: 0.1,
            source_w: 0.3,
            anticrowding_factor: 1.2,
            num_pts: 100,
            cross_section: arcstr::literal!("neg_nbtin"),
            probes: ProbeConfig::None,
            probe_width: None,
        }
    }
}

/// A [`SpotConstriction`] with a straight channel of length `channel_l` at
/// its center.
///
/// The channel is centered on the origin. Probes attach at the two ends of
/// the channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VariableLengthConstriction {
    pub channel_w: f64,
    pub source_w: f64,
    /// Length of the straight channel.
    pub channel_l: f64,
    pub anticrowding_factor: f64,
    pub num_pts: usize,
    pub cross_section: ArcStr,
    pub probes: ProbeConfig,
    pub probe_width: Option<f64>,
}

impl Default for VariableLengthConstriction {
    fn default() -> Self {
        Self {
            channel_w: 0.1,
            source_w: 0.3,
            channel_l: 1.,
            anticrowding_factor: 1.2,
            num_pts: 100,
            cross_section: arcstr::literal!("neg_nbtin"),
            probes: ProbeConfig::None,
            probe_width: None,
        }
    }
}

/// Parameters shared by both constrictions.
struct Wire<'a> {
    block: &'a str,
    channel_w: f64,
    source_w: f64,
    anticrowding_factor: f64,
    num_pts: usize,
    cross_section: &'a ArcStr,
    probes: ProbeConfig,
    probe_width: Option<f64>,
}

impl Wire<'_> {
    fn step(&self, start_width: f64, end_width: f64) -> OptimalStep {
        OptimalStep {
            start_width: Some(start_width),
            end_width,
            num_pts: self.num_pts,
            anticrowding_factor: self.anticrowding_factor,
            symmetric: true,
            cross_section: self.cross_section.clone(),
            port_type: PortType::Electrical,
            ..Default::default()
        }
    }

    /// Draws the wire with a channel of length `channel_l` (possibly zero).
    ///
    /// Probes attach at the channel ends if `probe_channel` is set, and at
    /// the outer ends of the wire otherwise.
    fn layout(&self, ctx: &Context, channel_l: f64, probe_channel: bool) -> Result<Component> {
        ensure_positive(self.block, "channel_w", self.channel_w)?;
        ensure_positive(self.block, "source_w", self.source_w)?;
        ensure_non_negative(self.block, "channel_l", channel_l)?;
        let xs = ctx.pdk().cross_section(self.cross_section)?;
        let layer = xs.layer();

        let mut c = Component::new(self.block);
        let half = channel_l / 2.;
        let west = Port::new(
            Point::new(-half, 0.),
            self.channel_w,
            180.,
            PortType::Electrical,
            layer,
        );
        let east = Port::new(
            Point::new(half, 0.),
            self.channel_w,
            0.,
            PortType::Electrical,
            layer,
        );
        if channel_l > 0. {
            c.add_rect(
                layer,
                Rect::from_center_size(Point::zero(), channel_l, self.channel_w),
            );
        }

        let step = ctx.generate_layout(&self.step(self.channel_w, self.source_w))?;
        let mut source = Instance::new(step.clone());
        source.connect("e1", &west)?;
        let mut gnd = Instance::new(step);
        gnd.connect("e1", &east)?;
        let e1 = source.port("e2")?;
        let e2 = gnd.port("e2")?;
        c.add_ref(source);
        c.add_ref(gnd);
        c.add_port("e1", e1.clone())?;
        c.add_port("e2", e2.clone())?;

        let (first, second) = if probe_channel { (west, east) } else { (e1, e2) };
        let mut next = 3;
        for at in [first, second] {
            for &rotation in self.probes.rotations() {
                let probe = self.probe(ctx, &at, rotation)?;
                c.add_port(arcstr::format!("e{next}"), probe.port("e2")?)?;
                c.add_ref(probe);
                next += 1;
            }
        }

        Ok(c)
    }

    /// A probe leaving `at`, turned by `rotation` degrees about its center.
    fn probe(&self, ctx: &Context, at: &Port, rotation: f64) -> Result<Instance> {
        let width = self.probe_width.unwrap_or(self.source_w);
        ensure_positive(self.block, "probe_width", width)?;
        let step: Arc<Component> = ctx.generate_layout(&self.step(at.width(), width))?;
        // The probe must extend away from the wire, so it attaches to a port
        // facing back into the wire.
        let inward = Port::new(
            at.center(),
            at.width(),
            at.orientation() + 180.,
            at.port_type(),
            *at.layer(),
        );
        let mut inst = Instance::new(step);
        inst.connect("e1", &inward)?;
        inst.rotate_about(rotation, at.center());
        Ok(inst)
    }
}

impl Block for SpotConstriction {
    fn id() -> ArcStr {
        arcstr::literal!("spot_constriction")
    }

    fn layout(&self, ctx: &Context) -> Result<Component> {
        Wire {
            block: "spot_constriction",
            channel_w: self.channel_w,
            source_w: self.source_w,
            anticrowding_factor: self.anticrowding_factor,
            num_pts: self.num_pts,
            cross_section: &self.cross_section,
            probes: self.probes,
            probe_width: self.probe_width,
        }
        .layout(ctx, 0., false)
    }
}

impl Block for VariableLengthConstriction {
    fn id() -> ArcStr {
        arcstr::literal!("variable_length_constriction")
    }

    fn layout(&self, ctx: &Context) -> Result<Component> {
        Wire {
            block: "variable_length_constriction",
            channel_w: self.channel_w,
            source_w: self.source_w,
            anticrowding_factor: self.anticrowding_factor,
            num_pts: self.num_pts,
            cross_section: &self.cross_section,
            probes: self.probes,
            probe_width: self.probe_width,
        }
        .layout(ctx, self.channel_l, true)
    }
}
