//! Rectangles, straight waveguides, and crosses.

use arcstr::ArcStr;
use geometry::prelude::{Point, Rect};
use layir::PortType;
use serde::{Deserialize, Serialize};

use crate::block::Block;
use crate::context::Context;
use crate::error::{ensure_positive, Result};
use crate::layout::{Component, Port};

/// A rectangle with a port on each edge.
///
/// Ports are numbered counterclockwise from the west edge, as on a compass:
/// port 1 faces west, 2 north, 3 east, 4 south.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Rectangle {
    /// Width and height.
    pub size: (f64, f64),
    /// Name of the layer to draw on.
    pub layer: ArcStr,
    /// Whether the rectangle is centered on the origin; otherwise its
    /// lower left corner is.
    pub centered: bool,
    /// Type of the edge ports.
    pub port_type: PortType,
}

impl Default for Rectangle {
    fn default() -> Self {
        Self {
            size: (4., 2.),
            layer: arcstr::literal!("WAVEGUIDE"),
            centered: false,
            port_type: PortType::Electrical,
        }
    }
}

impl Block for Rectangle {
    fn id() -> ArcStr {
        arcstr::literal!("rectangle")
    }

    fn name(&self) -> ArcStr {
        arcstr::format!("rectangle_{}x{}", self.size.0, self.size.1)
    }

    fn layout(&self, ctx: &Context) -> Result<Component> {
        let (w, h) = self.size;
        ensure_positive("rectangle", "size", w)?;
        ensure_positive("rectangle", "size", h)?;
        let layer = ctx.pdk().layer(&self.layer)?;
        let rect = if self.centered {
            Rect::from_center_size(Point::zero(), w, h)
        } else {
            Rect::from_size(w, h)
        };

        let mut c = Component::new(Self::id());
        c.add_rect(layer, rect);
        let center = rect.center();
        let prefix = self.port_type.prefix();
        let edges = [
            (Point::new(rect.left(), center.y), h, 180.),
            (Point::new(center.x, rect.top()), w, 90.),
            (Point::new(rect.right(), center.y), h, 0.),
            (Point::new(center.x, rect.bot()), w, 270.),
        ];
        for (i, (at, width, orientation)) in edges.into_iter().enumerate() {
            c.add_port(
                arcstr::format!("{prefix}{}", i + 1),
                Port::new(at, width, orientation, self.port_type, layer),
            )?;
        }
        Ok(c)
    }
}

/// A straight section of a cross section, running along `+x` from the origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Straight {
    pub length: f64,
    pub cross_section: ArcStr,
    /// Overrides the width of the cross section.
    pub width: Option<f64>,
}

impl Default for Straight {
    fn default() -> Self {
        Self {
            length: 10.,
            cross_section: arcstr::literal!("strip"),
            width: None,
        }
    }
}

impl Block for Straight {
    fn id() -> ArcStr {
        arcstr::literal!("straight")
    }

    fn name(&self) -> ArcStr {
        arcstr::format!("straight_{}_{}", self.cross_section, self.length)
    }

    fn layout(&self, ctx: &Context) -> Result<Component> {
        let xs = ctx.pdk().cross_section(&self.cross_section)?;
        let width = self.width.unwrap_or(xs.width());
        ensure_positive("straight", "length", self.length)?;
        ensure_positive("straight", "width", width)?;

        let mut c = Component::new(Self::id());
        c.add_rect(
            xs.layer(),
            Rect::from_sides(0., -width / 2., self.length, width / 2.),
        );
        for clad in xs.cladding() {
            let half = width / 2. + clad.offset;
            c.add_rect(clad.layer, Rect::from_sides(0., -half, self.length, half));
        }

        let (p1, p2) = xs.port_names();
        c.add_port(
            p1,
            Port::new(Point::zero(), width, 180., xs.port_type(), xs.layer()),
        )?;
        c.add_port(
            p2,
            Port::new(
                Point::new(self.length, 0.),
                width,
                0.,
                xs.port_type(),
                xs.layer(),
            ),
        )?;
        c.set_info("length", self.length);
        Ok(c)
    }
}

/// Two rectangles crossing at the origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Cross {
    /// Length of each arm, tip to tip.
    pub length: f64,
    /// Width of each arm.
    pub width: f64,
    pub layer: ArcStr,
}

impl Default for Cross {
    fn default() -> Self {
        Self {
            length: 10.,
            width: 3.,
            layer: arcstr::literal!("WAVEGUIDE"),
        }
    }
}

impl Block for Cross {
    fn id() -> ArcStr {
        arcstr::literal!("cross")
    }

    fn layout(&self, ctx: &Context) -> Result<Component> {
        ensure_positive("cross", "length", self.length)?;
        ensure_positive("cross", "width", self.width)?;
        let layer = ctx.pdk().layer(&self.layer)?;
        let mut c = Component::new(Self::id());
        c.add_rect(
            layer,
            Rect::from_center_size(Point::zero(), self.length, self.width),
        );
        c.add_rect(
            layer,
            Rect::from_center_size(Point::zero(), self.width, self.length),
        );
        Ok(c)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use geometry::prelude::Bbox;
    use test_log::test;

    use super::*;
    use crate::error::Error;
    use crate::pdk::layers::demo::{ASIC, SIO2_TOP};

    #[test]
    fn rectangle_has_compass_ports() {
        let c = Context::demo()
            .generate_layout(&Rectangle {
                size: (4., 2.),
                centered: true,
                ..Default::default()
            })
            .unwrap();
        let names: Vec<_> = c.ports().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, ["e1", "e2", "e3", "e4"]);
        let west = c.port("e1").unwrap();
        assert_eq!(west.center(), Point::new(-2., 0.));
        assert_eq!(west.width(), 2.);
        assert_eq!(west.orientation(), 180.);
        let south = c.port("e4").unwrap();
        assert_eq!(south.center(), Point::new(0., -1.));
        assert_eq!(south.width(), 4.);
        assert_eq!(south.orientation(), 270.);
    }

    #[test]
    fn rectangle_rejects_unknown_layer() {
        let err = Context::demo()
            .generate_layout(&Rectangle {
                layer: "M7".into(),
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(err, Error::UnknownLayer(_)));
    }

    #[test]
    fn straight_draws_cladding() {
        let c = Context::demo()
            .generate_layout(&Straight {
                length: 20.,
                cross_section: "rib".into(),
                width: None,
            })
            .unwrap();
        let core = c.shapes_on(ASIC).next().unwrap().bbox().unwrap();
        let clad = c.shapes_on(SIO2_TOP).next().unwrap().bbox().unwrap();
        assert_relative_eq!(core.height(), 0.5);
        assert_relative_eq!(clad.height(), 6.5);
        assert_relative_eq!(clad.width(), 20.);
        assert_eq!(c.port("o2").unwrap().center(), Point::new(20., 0.));
        assert_eq!(c.port("o1").unwrap().orientation(), 180.);
    }

    #[test]
    fn straight_width_override() {
        let c = Context::demo()
            .generate_layout(&Straight {
                length: 5.,
                cross_section: "nbtin".into(),
                width: Some(2.),
            })
            .unwrap();
        assert_eq!(c.port("e1").unwrap().width(), 2.);
        assert_eq!(c.bbox().unwrap(), Rect::from_sides(0., -1., 5., 1.));
    }

    #[test]
    fn cross_is_centered() {
        let c = Context::demo()
            .generate_layout(&Cross::default())
            .unwrap();
        assert_eq!(c.shapes().count(), 2);
        assert_eq!(
            c.bbox().unwrap(),
            Rect::from_center_size(Point::zero(), 10., 10.)
        );
    }
}
