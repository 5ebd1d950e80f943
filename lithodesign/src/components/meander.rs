//! Resistor meanders with a target number of squares.

use arcstr::ArcStr;
use geometry::prelude::{Point, Rect};
use layir::PortType;
use serde::{Deserialize, Serialize};

use crate::block::Block;
use crate::context::Context;
use crate::error::{ensure_positive, Error, Result};
use crate::layout::{Component, Port};

const BLOCK: &str = "resistor_meander";

/// Squares contributed by the two corners of one hairpin turn.
const TURN_CORNER_SQUARES: f64 = 1.09;
/// Squares contributed by the corners joining the meander to its contacts.
const CONTACT_CORNER_SQUARES: f64 = 3.09;

/// A resistor of `squares` squares that fits within `max_length`.
///
/// If a straight wire of `width·squares` is shorter than `max_length`, the
/// resistor is a vertical wire centered on the origin. Otherwise the wire
/// folds into a meander of horizontal rows `pitch` apart, starting at
/// `y = 0` and running south. A stub at the center of the first and last rows
/// brings the wire out to ports `e1` (north) and `e2` (south).
///
/// ```text
///        e1
///        |
///        +-------+
///  +-------------+
///  +-------------+
///        +-------+
///        |
///        e2
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResistorMeander {
    pub width: f64,
    /// Center-to-center spacing of adjacent rows.
    pub pitch: f64,
    pub squares: f64,
    pub max_length: f64,
    pub layer: ArcStr,
}

impl Default for ResistorMeander {
    fn default() -> Self {
        Self {
            width: 2.,
            pitch: 4.,
            squares: 100.,
            max_length: 20.,
            layer: arcstr::literal!("TI"),
        }
    }
}

/// The folding of a meander.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeanderPlan {
    /// Number of hairpin turns.
    pub n_turn: usize,
    /// Length of one hairpin, including its connector.
    pub hairpin_length: f64,
}

impl ResistorMeander {
    /// Whether the resistor fits as a straight wire.
    pub fn is_straight(&self) -> bool {
        self.width * self.squares < self.max_length
    }

    /// Computes the number of turns and the hairpin length.
    ///
    /// Each turn adds `2·hairpin_length/width + 1.09 + (pitch − width)/width`
    /// squares, and the contacts add another `3.09`.
    pub fn plan(&self) -> Result<MeanderPlan> {
        ensure_positive(BLOCK, "width", self.width)?;
        ensure_positive(BLOCK, "squares", self.squares)?;
        ensure_positive(BLOCK, "max_length", self.max_length)?;
        if !(self.pitch > self.width) {
            return Err(Error::invalid(
                BLOCK,
                "pitch",
                format!(
                    "must exceed the wire width ({} <= {})",
                    self.pitch, self.width
                ),
            ));
        }
        let turns = ((self.max_length - 3. * self.width) / self.pitch).ceil();
        if !(turns >= 1.) {
            return Err(Error::invalid(
                BLOCK,
                "max_length",
                format!(
                    "too short to fit a single turn of a {} wide wire",
                    self.width
                ),
            ));
        }
        let n_turn = turns as usize;
        let w = self.width;
        let hairpin_length = ((self.squares - CONTACT_CORNER_SQUARES) / turns
            - TURN_CORNER_SQUARES
            - (self.pitch - w) / w)
            * w
            / 2.
            + w;
        if !(hairpin_length > w) {
            return Err(Error::invalid(
                BLOCK,
                "squares",
                format!(
                    "{} squares are too few for {n_turn} turns at pitch {}",
                    self.squares, self.pitch
                ),
            ));
        }
        Ok(MeanderPlan {
            n_turn,
            hairpin_length,
        })
    }

    fn straight(&self, c: &mut Component, layer: gdsconv::GdsLayer) -> Result<()> {
        ensure_positive(BLOCK, "width", self.width)?;
        ensure_positive(BLOCK, "squares", self.squares)?;
        let w = self.width;
        let half = w * self.squares / 2.;
        c.add_rect(layer, Rect::from_sides(-w / 2., -half, w / 2., half));
        c.add_port(
            "e1",
            Port::new(Point::new(0., half), w, 90., PortType::Electrical, layer),
        )?;
        c.add_port(
            "e2",
            Port::new(Point::new(0., -half), w, 270., PortType::Electrical, layer),
        )?;
        Ok(())
    }

    fn meander(&self, c: &mut Component, layer: gdsconv::GdsLayer) -> Result<MeanderPlan> {
        let plan = self.plan()?;
        let n = plan.n_turn;
        let w = self.width;
        let arm = plan.hairpin_length - w;
        let row_y = |r: usize| -(r as f64) * self.pitch;
        // Turn `i` joins rows `i` and `i + 1`; even turns sit on the east.
        let east = |i: usize| i % 2 == 0;

        for r in 0..=n {
            let (left, right) = if r == 0 {
                (0., arm)
            } else if r == n {
                if east(n - 1) {
                    (0., arm)
                } else {
                    (-arm, 0.)
                }
            } else {
                (-arm, arm)
            };
            let y = row_y(r);
            c.add_rect(layer, Rect::from_sides(left, y - w / 2., right, y + w / 2.));
        }
        for i in 0..n {
            let (left, right) = if east(i) { (arm, arm + w) } else { (-arm - w, -arm) };
            c.add_rect(
                layer,
                Rect::from_sides(left, row_y(i + 1) - w / 2., right, row_y(i) + w / 2.),
            );
        }

        let top = row_y(0) + 3. * w / 2.;
        let bot = row_y(n) - 3. * w / 2.;
        c.add_rect(layer, Rect::from_sides(-w / 2., row_y(0) - w / 2., w / 2., top));
        c.add_rect(layer, Rect::from_sides(-w / 2., bot, w / 2., row_y(n) + w / 2.));
        c.add_port(
            "e1",
            Port::new(Point::new(0., top), w, 90., PortType::Electrical, layer),
        )?;
        c.add_port(
            "e2",
            Port::new(Point::new(0., bot), w, 270., PortType::Electrical, layer),
        )?;
        Ok(plan)
    }
}

impl Block for ResistorMeander {
    fn id() -> ArcStr {
        arcstr::literal!("resistor_meander")
    }

    fn name(&self) -> ArcStr {
        arcstr::format!("resistor_meander_{}sq", self.squares)
    }

    fn layout(&self, ctx: &Context) -> Result<Component> {
        let layer = ctx.pdk().layer(&self.layer)?;
        let mut c = Component::new(Self::id());
        if self.is_straight() {
            self.straight(&mut c, layer)?;
        } else {
            let plan = self.meander(&mut c, layer)?;
            tracing::debug!(
                n_turn = plan.n_turn,
                hairpin_length = plan.hairpin_length,
                "folded resistor"
            );
            c.set_info("n_turn", plan.n_turn as f64);
            c.set_info("hairpin_length", plan.hairpin_length);
        }
        c.set_info("num_squares", self.squares);
        Ok(c)
    }
}
