//! Placed references to other components.

use std::sync::Arc;

use arcstr::ArcStr;
use geometry::prelude::{Bbox, Point, Rect, Transformation};

use crate::error::{Error, Result};
use crate::layout::{Component, Port};

/// A placement of a shared [`Component`] within another component.
///
/// Placement methods return `&mut Self` so they can be chained:
///
/// ```
/// # use std::sync::Arc;
/// # use lithodesign::layout::{Component, Instance};
/// let child = Arc::new(Component::new("child"));
/// let mut inst = Instance::new(child);
/// inst.rotate_about(90., (0., 0.).into()).translate(10., 0.);
/// assert_eq!(inst.transformation().angle(), 90.);
/// ```
#[derive(Debug, Clone)]
pub struct Instance {
    cell: Arc<Component>,
    name: Option<ArcStr>,
    trans: Transformation,
}

impl Instance {
    /// Places `cell` at the origin with no rotation.
    pub fn new(cell: Arc<Component>) -> Self {
        Self {
            cell,
            name: None,
            trans: Transformation::identity(),
        }
    }

    /// Sets the instance name used when the layout is exported.
    pub fn with_name(mut self, name: impl Into<ArcStr>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the placement of the instance.
    pub fn with_transformation(mut self, trans: Transformation) -> Self {
        self.trans = trans;
        self
    }

    /// The instantiated component.
    #[inline]
    pub fn cell(&self) -> &Arc<Component> {
        &self.cell
    }

    /// The instance name, if one was set.
    #[inline]
    pub fn name(&self) -> Option<&ArcStr> {
        self.name.as_ref()
    }

    #[inline]
    pub fn transformation(&self) -> Transformation {
        self.trans
    }

    /// Gets a port of the child, mapped into the parent's coordinates.
    pub fn port(&self, name: &str) -> Result<Port> {
        Ok(self.cell.port(name)?.transform(self.trans))
    }

    /// Iterates over all ports of the child in the parent's coordinates.
    pub fn ports(&self) -> impl Iterator<Item = (&ArcStr, Port)> {
        self.cell
            .ports()
            .map(move |(name, port)| (name, port.transform(self.trans)))
    }

    /// Moves the instance so that its port `port` sits on `dest`, facing it.
    ///
    /// After connecting, the port's center equals `dest.center()` and its
    /// orientation is opposite to `dest.orientation()`. Any reflection
    /// already applied to the instance is kept.
    pub fn connect(&mut self, port: &str, dest: &Port) -> Result<&mut Self> {
        let local = self.cell.port(port)?;
        let reflect = self.trans.reflects_vert();
        let local_angle = if reflect {
            -local.orientation()
        } else {
            local.orientation()
        };
        let angle = dest.orientation() + 180. - local_angle;
        let linear = Transformation::from_opts(Point::zero(), reflect, angle);
        let offset = dest.center() - linear.apply_point(local.center());
        self.trans = Transformation::from_opts(offset, reflect, angle);
        tracing::trace!(
            cell = %self.cell.name(),
            port,
            angle = self.trans.angle(),
            "connected instance"
        );
        Ok(self)
    }

    /// Translates the instance by `(dx, dy)`.
    pub fn translate(&mut self, dx: f64, dy: f64) -> &mut Self {
        self.trans = Transformation::cascade(Transformation::translate(dx, dy), self.trans);
        self
    }

    /// Rotates the instance counterclockwise by `angle` degrees about `center`.
    pub fn rotate_about(&mut self, angle: f64, center: Point) -> &mut Self {
        self.trans = Transformation::cascade(Transformation::rotate_about(angle, center), self.trans);
        self
    }

    /// Reflects the instance across the horizontal line through its origin.
    pub fn mirror(&mut self) -> &mut Self {
        let y = self.trans.offset_point().y;
        let flip = Transformation::from_opts(Point::new(0., 2. * y), true, 0.);
        self.trans = Transformation::cascade(flip, self.trans);
        self
    }

    /// Translates the instance so that the center of its bounding box is `center`.
    ///
    /// Instances of empty components are left in place.
    pub fn move_center_to(&mut self, center: Point) -> &mut Self {
        if let Some(bbox) = self.bbox() {
            let delta = center - bbox.center();
            self.translate(delta.x, delta.y);
        }
        self
    }

    /// Applies `trans` after the current placement.
    pub fn transform(&mut self, trans: Transformation) -> &mut Self {
        self.trans = Transformation::cascade(trans, self.trans);
        self
    }
}

impl Bbox for Instance {
    fn bbox(&self) -> Option<Rect> {
        self.cell.transformed_bbox(self.trans)
    }
}

/// Looks up the port `name` on `inst`, reporting the child's name on failure.
pub(crate) fn instance_port(inst: &Instance, name: &str) -> Result<Port> {
    inst.port(name).map_err(|_| Error::UnknownPort {
        component: inst.cell().name().clone(),
        port: name.into(),
    })
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use gdsconv::GdsLayer;
    use layir::PortType;
    use test_log::test;

    use super::*;

    fn two_port() -> Arc<Component> {
        let mut c = Component::new("two_port");
        c.add_rect(GdsLayer(1, 0), Rect::from_sides(0., -0.5, 4., 0.5));
        c.add_port(
            "o1",
            Port::new(Point::new(0., 0.), 1., 180., PortType::Optical, GdsLayer(1, 0)),
        )
        .unwrap();
        c.add_port(
            "o2",
            Port::new(Point::new(4., 0.), 1., 0., PortType::Optical, GdsLayer(1, 0)),
        )
        .unwrap();
        Arc::new(c)
    }

    #[test]
    fn connect_aligns_ports_face_to_face() {
        let cell = two_port();
        let dest = Port::new(
            Point::new(10., 5.),
            1.,
            90.,
            PortType::Optical,
            GdsLayer(1, 0),
        );
        let mut inst = Instance::new(cell);
        inst.connect("o1", &dest).unwrap();
        let p = inst.port("o1").unwrap();
        assert_relative_eq!(p.center(), dest.center(), epsilon = 1e-12);
        assert_eq!(p.orientation(), 270.);
        let far = inst.port("o2").unwrap();
        assert_relative_eq!(far.center(), Point::new(10., 9.), epsilon = 1e-12);
        assert_eq!(far.orientation(), 90.);
    }

    #[test]
    fn connect_keeps_reflection() {
        let cell = two_port();
        let dest = Port::new(Point::new(-3., 2.), 1., 45., PortType::Optical, GdsLayer(1, 0));
        let mut inst = Instance::new(cell);
        inst.mirror();
        inst.connect("o2", &dest).unwrap();
        assert!(inst.transformation().reflects_vert());
        let p = inst.port("o2").unwrap();
        assert_relative_eq!(p.center(), dest.center(), epsilon = 1e-12);
        assert_relative_eq!(p.orientation(), 225., epsilon = 1e-12);
    }

    #[test]
    fn mirror_flips_about_instance_origin() {
        let cell = two_port();
        let mut inst = Instance::new(cell);
        inst.translate(0., 3.).mirror();
        let bbox = inst.bbox().unwrap();
        assert_relative_eq!(bbox.bot(), 2.5);
        assert_relative_eq!(bbox.top(), 3.5);
        assert!(inst.transformation().reflects_vert());
    }

    #[test]
    fn move_center_to_uses_bbox() {
        let mut inst = Instance::new(two_port());
        inst.rotate_about(90., Point::zero())
            .move_center_to(Point::new(1., 1.));
        let bbox = inst.bbox().unwrap();
        assert_relative_eq!(bbox.center(), Point::new(1., 1.), epsilon = 1e-12);
        assert_relative_eq!(bbox.height(), 4., epsilon = 1e-12);
    }
}
