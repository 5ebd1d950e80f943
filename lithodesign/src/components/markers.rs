//! Electron-beam lithography alignment markers.

use arcstr::ArcStr;
use geometry::prelude::{Point, Rect};
use serde::{Deserialize, Serialize};

use crate::block::Block;
use crate::components::primitives::Cross;
use crate::context::Context;
use crate::error::{ensure_non_negative, ensure_positive, Result};
use crate::layout::{Component, Instance};

/// Four square boxes at the corners of a square centered on the origin.
///
/// ```text
///  [ ]       [ ]
///
///
///  [ ]       [ ]
/// ```
///
/// Box centers sit at `(±(width_box + gap)/2, ±(width_box + gap)/2)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EblMarkerCorners {
    /// Side length of each box.
    pub width_box: f64,
    /// Spacing between facing box edges.
    pub gap: f64,
    pub layer: ArcStr,
    /// An optional label placed at `text_coordinates`.
    pub text: Option<ArcStr>,
    pub text_coordinates: (f64, f64),
}

impl Default for EblMarkerCorners {
    fn default() -> Self {
        Self {
            width_box: 20.,
            gap: 250.,
            layer: arcstr::literal!("WAVEGUIDE"),
            text: None,
            text_coordinates: (0., 0.),
        }
    }
}

impl Block for EblMarkerCorners {
    fn id() -> ArcStr {
        arcstr::literal!("ebl_marker_corners")
    }

    fn layout(&self, ctx: &Context) -> Result<Component> {
        ensure_positive("ebl_marker_corners", "width_box", self.width_box)?;
        ensure_non_negative("ebl_marker_corners", "gap", self.gap)?;
        let layer = ctx.pdk().layer(&self.layer)?;

        let mut c = Component::new(Self::id());
        let d = (self.width_box + self.gap) / 2.;
        for (sx, sy) in [(-1., 1.), (1., 1.), (-1., -1.), (1., -1.)] {
            c.add_rect(
                layer,
                Rect::from_center_size(
                    Point::new(sx * d, sy * d),
                    self.width_box,
                    self.width_box,
                ),
            );
        }
        if let Some(text) = &self.text {
            c.add_text(layer, text.clone(), self.text_coordinates.into());
        }
        Ok(c)
    }
}

/// [`EblMarkerCorners`] with a cross in the middle.
///
/// The cross arms are `gap/2` long and `2·width_box` wide.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EblMarker {
    pub corners: EblMarkerCorners,
}

impl Block for EblMarker {
    fn id() -> ArcStr {
        arcstr::literal!("ebl_marker")
    }

    fn layout(&self, ctx: &Context) -> Result<Component> {
        let corners = ctx.generate_layout(&self.corners)?;
        let cross = ctx.generate_layout(&Cross {
            length: self.corners.gap / 2.,
            width: 2. * self.corners.width_box,
            layer: self.corners.layer.clone(),
        })?;

        let mut c = Component::new(Self::id());
        c.add_ref(Instance::new(corners));
        let mut cross = Instance::new(cross);
        cross.move_center_to(Point::zero());
        c.add_ref(cross);
        Ok(c)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use geometry::prelude::Bbox;
    use layir::Element;
    use test_log::test;

    use super::*;
    use crate::pdk::layers::demo::ASIC;

    #[test]
    fn corner_boxes_are_symmetric() {
        let c = Context::demo()
            .generate_layout(&EblMarkerCorners {
                text: Some("A1".into()),
                ..Default::default()
            })
            .unwrap();
        let boxes: Vec<_> = c.shapes_on(ASIC).map(|s| s.bbox().unwrap()).collect();
        assert_eq!(boxes.len(), 4);
        assert_eq!(boxes[0].center(), Point::new(-135., 135.));
        assert_eq!(boxes[3].center(), Point::new(135., -135.));
        assert_relative_eq!(boxes[0].width(), 20.);
        let bbox = c.bbox().unwrap();
        assert_eq!(bbox, Rect::from_sides(-145., -145., 145., 145.));
        let labels = c
            .elements()
            .filter(|e| matches!(e, Element::Text(t) if t.text() == "A1"))
            .count();
        assert_eq!(labels, 1);
    }

    #[test]
    fn marker_adds_central_cross() {
        let ctx = Context::demo();
        let c = ctx.generate_layout(&EblMarker::default()).unwrap();
        assert_eq!(c.instances().count(), 2);
        let flat = c.flatten();
        assert_eq!(flat.shapes().count(), 6);
        let cross = c.instances().nth(1).unwrap().bbox().unwrap();
        assert_eq!(cross, Rect::from_center_size(Point::zero(), 125., 125.));
    }
}
