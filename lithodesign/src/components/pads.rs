//! Bond pads.

use arcstr::ArcStr;
use geometry::prelude::{Point, Rect};
use layir::PortType;
use serde::{Deserialize, Serialize};

use crate::block::Block;
use crate::context::Context;
use crate::error::{ensure_positive, Error, Result};
use crate::layout::{Component, Instance, Port};

/// A rectangular bond pad centered on the origin.
///
/// Port `e1` sits at the pad center, facing north, with the width of the pad.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Pad {
    pub size: (f64, f64),
    pub layer: ArcStr,
}

impl Default for Pad {
    fn default() -> Self {
        Self {
            size: (100., 100.),
            layer: arcstr::literal!("AU"),
        }
    }
}

impl Block for Pad {
    fn id() -> ArcStr {
        arcstr::literal!("pad")
    }

    fn name(&self) -> ArcStr {
        arcstr::format!("pad_{}x{}", self.size.0, self.size.1)
    }

    fn layout(&self, ctx: &Context) -> Result<Component> {
        let (w, h) = self.size;
        ensure_positive("pad", "size", w)?;
        ensure_positive("pad", "size", h)?;
        let layer = ctx.pdk().layer(&self.layer)?;
        let mut c = Component::new(Self::id());
        c.add_rect(layer, Rect::from_center_size(Point::zero(), w, h));
        c.add_port(
            "e1",
            Port::new(Point::zero(), w, 90., PortType::Electrical, layer),
        )?;
        Ok(c)
    }
}

/// A grid of identical pads.
///
/// The pad in row `r` and column `c` (both counted from 1) is centered at
/// `((c-1)·spacing.0, -(r-1)·spacing.1)` and exposes its port as `e<r><c>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PadArray {
    pub pad: Pad,
    pub columns: usize,
    pub rows: usize,
    /// Center-to-center distance between columns and between rows.
    pub spacing: (f64, f64),
}

impl Default for PadArray {
    fn default() -> Self {
        Self {
            pad: Pad::default(),
            columns: 6,
            rows: 1,
            spacing: (150., 150.),
        }
    }
}

impl Block for PadArray {
    fn id() -> ArcStr {
        arcstr::literal!("pad_array")
    }

    fn name(&self) -> ArcStr {
        arcstr::format!("pad_array_{}x{}", self.rows, self.columns)
    }

    fn layout(&self, ctx: &Context) -> Result<Component> {
        if self.rows == 0 || self.columns == 0 {
            return Err(Error::invalid(
                Self::id(),
                "rows",
                "the array needs at least one row and one column",
            ));
        }
        let pad = ctx.generate_layout(&self.pad)?;
        let mut c = Component::new(Self::id());
        for row in 0..self.rows {
            for col in 0..self.columns {
                let mut inst = Instance::new(pad.clone());
                inst.translate(
                    col as f64 * self.spacing.0,
                    -(row as f64) * self.spacing.1,
                );
                let id = c.add_ref(inst);
                let inst = c.instance(id).clone();
                c.add_port_from(arcstr::format!("e{}{}", row + 1, col + 1), &inst, "e1")?;
            }
        }
        Ok(c)
    }
}

#[cfg(test)]
mod tests {
    use geometry::prelude::Bbox;
    use test_log::test;

    use super::*;
    use crate::pdk::layers::demo::AU;

    #[test]
    fn pad_defaults_to_gold() {
        let c = Context::demo().generate_layout(&Pad::default()).unwrap();
        assert_eq!(c.shapes().next().unwrap().layer(), &AU);
        let e1 = c.port("e1").unwrap();
        assert_eq!(e1.orientation(), 90.);
        assert_eq!(e1.center(), Point::zero());
    }

    #[test]
    fn pad_array_shares_one_pad_cell() {
        let ctx = Context::demo();
        let c = ctx
            .generate_layout(&PadArray {
                rows: 2,
                columns: 3,
                ..Default::default()
            })
            .unwrap();
        assert_eq!(c.ports().count(), 6);
        assert_eq!(c.port("e23").unwrap().center(), Point::new(300., -150.));
        assert_eq!(
            c.bbox().unwrap(),
            Rect::from_sides(-50., -200., 350., 50.)
        );
        let lib = ctx
            .export_library(&PadArray {
                rows: 2,
                columns: 3,
                ..Default::default()
            })
            .unwrap();
        assert_eq!(lib.num_cells(), 2);
    }

    #[test]
    fn empty_pad_array_is_rejected() {
        let err = Context::demo()
            .generate_layout(&PadArray {
                rows: 0,
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(err, Error::InvalidParameter { .. }));
    }
}
