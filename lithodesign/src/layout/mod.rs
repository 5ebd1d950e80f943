//! Components: the layout cells produced by generators.

pub mod conv;
pub mod instance;

use arcstr::ArcStr;
use gdsconv::GdsLayer;
use geometry::bbox::union_bbox;
use geometry::prelude::{Bbox, Point, Polygon, Rect, Shape, Transform, Transformation};
use indexmap::IndexMap;
use layir::Element;

use crate::error::{Error, Result};
pub use instance::Instance;

/// A port of a [`Component`].
pub type Port = layir::Port<GdsLayer>;

/// Identifies an instance within the component that owns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(usize);

/// A layout cell: shapes, text labels, references to other components,
/// named ports, and derived metrics.
#[derive(Debug, Clone, Default)]
pub struct Component {
    name: ArcStr,
    elements: Vec<Element<GdsLayer>>,
    instances: Vec<Instance>,
    ports: IndexMap<ArcStr, Port>,
    info: IndexMap<ArcStr, f64>,
}

impl Component {
    /// Creates an empty component.
    pub fn new(name: impl Into<ArcStr>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    #[inline]
    pub fn name(&self) -> &ArcStr {
        &self.name
    }

    /// Renames the component.
    pub fn set_name(&mut self, name: impl Into<ArcStr>) {
        self.name = name.into();
    }

    /// Adds a polygon on `layer`.
    pub fn add_polygon(&mut self, layer: GdsLayer, polygon: Polygon) {
        self.add_shape(layer, polygon);
    }

    /// Adds a rectangle on `layer`.
    pub fn add_rect(&mut self, layer: GdsLayer, rect: Rect) {
        self.add_shape(layer, rect);
    }

    /// Adds a shape on `layer`.
    pub fn add_shape(&mut self, layer: GdsLayer, shape: impl Into<Shape>) {
        self.elements
            .push(layir::Shape::new(layer, shape.into()).into());
    }

    /// Adds a text label on `layer`, anchored at `at`.
    pub fn add_text(&mut self, layer: GdsLayer, text: impl Into<ArcStr>, at: Point) {
        self.elements.push(
            layir::Text::with_transformation(layer, text, Transformation::translate(at.x, at.y))
                .into(),
        );
    }

    /// The shapes and text labels drawn directly in this component.
    pub fn elements(&self) -> impl Iterator<Item = &Element<GdsLayer>> {
        self.elements.iter()
    }

    /// The shapes drawn directly in this component.
    pub fn shapes(&self) -> impl Iterator<Item = &layir::Shape<GdsLayer>> {
        self.elements.iter().filter_map(|elt| match elt {
            Element::Shape(shape) => Some(shape),
            Element::Text(_) => None,
        })
    }

    /// The shapes drawn directly in this component on `layer`.
    pub fn shapes_on(&self, layer: GdsLayer) -> impl Iterator<Item = &Shape> {
        self.shapes()
            .filter(move |s| *s.layer() == layer)
            .map(|s| s.shape())
    }

    /// Adds a reference to another component.
    pub fn add_ref(&mut self, instance: Instance) -> InstanceId {
        self.instances.push(instance);
        InstanceId(self.instances.len() - 1)
    }

    /// Gets the instance with the given ID.
    ///
    /// # Panics
    ///
    /// Panics if the ID was issued by a different component.
    pub fn instance(&self, id: InstanceId) -> &Instance {
        &self.instances[id.0]
    }

    /// Gets a mutable reference to the instance with the given ID.
    ///
    /// # Panics
    ///
    /// Panics if the ID was issued by a different component.
    pub fn instance_mut(&mut self, id: InstanceId) -> &mut Instance {
        &mut self.instances[id.0]
    }

    /// The references held by this component.
    pub fn instances(&self) -> impl Iterator<Item = &Instance> {
        self.instances.iter()
    }

    /// Adds a port, failing if a port with the same name exists.
    pub fn add_port(&mut self, name: impl Into<ArcStr>, port: Port) -> Result<()> {
        let name = name.into();
        if self.ports.contains_key(&name) {
            return Err(Error::DuplicatePort {
                component: self.name.clone(),
                port: name,
            });
        }
        self.ports.insert(name, port);
        Ok(())
    }

    /// Exposes port `port` of `inst` as a port of this component named `name`.
    pub fn add_port_from(
        &mut self,
        name: impl Into<ArcStr>,
        inst: &Instance,
        port: &str,
    ) -> Result<()> {
        let port = instance::instance_port(inst, port)?;
        self.add_port(name, port)
    }

    /// Gets a port by name.
    pub fn port(&self, name: &str) -> Result<Port> {
        self.try_port(name)
            .cloned()
            .ok_or_else(|| Error::UnknownPort {
                component: self.name.clone(),
                port: name.into(),
            })
    }

    /// Gets a port by name, returning [`None`] if it does not exist.
    pub fn try_port(&self, name: &str) -> Option<&Port> {
        self.ports.get(name)
    }

    /// Iterates over the ports in the order they were added.
    pub fn ports(&self) -> impl Iterator<Item = (&ArcStr, &Port)> {
        self.ports.iter()
    }

    /// Records a derived metric such as `num_squares`.
    pub fn set_info(&mut self, key: impl Into<ArcStr>, value: f64) {
        self.info.insert(key.into(), value);
    }

    /// Gets a derived metric by name.
    pub fn info(&self, key: &str) -> Option<f64> {
        self.info.get(key).copied()
    }

    /// All derived metrics, in the order they were recorded.
    pub fn info_map(&self) -> &IndexMap<ArcStr, f64> {
        &self.info
    }

    /// The bounding box of this component's geometry after applying `trans`.
    ///
    /// Shapes are transformed before being bounded, so the result is tight
    /// even for non-Manhattan rotations.
    pub fn transformed_bbox(&self, trans: Transformation) -> Option<Rect> {
        let shapes = self
            .shapes()
            .map(|s| s.shape().clone().transform(trans).bbox());
        let children = self.instances.iter().map(|inst| {
            inst.cell()
                .transformed_bbox(Transformation::cascade(trans, inst.transformation()))
        });
        union_bbox(shapes.chain(children))
    }

    /// Returns a copy of this component with every reference replaced by
    /// the shapes and labels it contains.
    pub fn flatten(&self) -> Component {
        let mut flat = Component {
            name: self.name.clone(),
            elements: Vec::new(),
            instances: Vec::new(),
            ports: self.ports.clone(),
            info: self.info.clone(),
        };
        self.flatten_into(Transformation::identity(), &mut flat.elements);
        flat
    }

    fn flatten_into(&self, trans: Transformation, out: &mut Vec<Element<GdsLayer>>) {
        out.extend(self.elements.iter().map(|elt| transform_element(elt, trans)));
        for inst in &self.instances {
            inst.cell()
                .flatten_into(Transformation::cascade(trans, inst.transformation()), out);
        }
    }

    /// Applies `trans` to everything in this component, including its ports.
    pub fn transform(&mut self, trans: Transformation) {
        for elt in self.elements.iter_mut() {
            *elt = transform_element(elt, trans);
        }
        for inst in self.instances.iter_mut() {
            inst.transform(trans);
        }
        for port in self.ports.values_mut() {
            *port = port.transform(trans);
        }
    }

    /// Translates everything in this component by `(dx, dy)`.
    pub fn translate(&mut self, dx: f64, dy: f64) {
        self.transform(Transformation::translate(dx, dy));
    }

    /// Translates the component so that its bounding box is centered on the origin.
    pub fn center_at_origin(&mut self) {
        if let Some(bbox) = self.bbox() {
            let c = bbox.center();
            self.translate(-c.x, -c.y);
        }
    }
}

impl Bbox for Component {
    fn bbox(&self) -> Option<Rect> {
        self.transformed_bbox(Transformation::identity())
    }
}

fn transform_element(elt: &Element<GdsLayer>, trans: Transformation) -> Element<GdsLayer> {
    match elt {
        Element::Shape(shape) => {
            layir::Shape::new(*shape.layer(), shape.shape().clone().transform(trans)).into()
        }
        Element::Text(text) => layir::Text::with_transformation(
            *text.layer(),
            text.text().clone(),
            Transformation::cascade(trans, text.transformation()),
        )
        .into(),
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use std::sync::Arc;

    use layir::PortType;
    use test_log::test;

    use super::*;

    const L1: GdsLayer = GdsLayer(1, 0);

    fn unit_square() -> Arc<Component> {
        let mut c = Component::new("square");
        c.add_rect(L1, Rect::from_sides(0., 0., 1., 1.));
        c.add_port(
            "e1",
            Port::new(Point::new(0.5, 1.), 1., 90., PortType::Electrical, L1),
        )
        .unwrap();
        Arc::new(c)
    }

    #[test]
    fn duplicate_and_missing_ports() {
        let mut c = Component::new("c");
        let port = Port::new(Point::zero(), 1., 0., PortType::Optical, L1);
        c.add_port("o1", port.clone()).unwrap();
        assert!(matches!(
            c.add_port("o1", port),
            Err(Error::DuplicatePort { .. })
        ));
        assert!(matches!(c.port("o2"), Err(Error::UnknownPort { port, .. }) if port == "o2"));
    }

    #[test]
    fn add_port_from_maps_through_instance() {
        let mut top = Component::new("top");
        let mut inst = Instance::new(unit_square());
        inst.rotate_about(90., Point::zero()).translate(5., 0.);
        let id = top.add_ref(inst);
        let inst = top.instance(id).clone();
        top.add_port_from("e1", &inst, "e1").unwrap();
        let p = top.port("e1").unwrap();
        assert_relative_eq!(p.center(), Point::new(4., 0.5), epsilon = 1e-12);
        assert_eq!(p.orientation(), 180.);
        assert!(top.add_port_from("e9", &inst, "nope").is_err());
    }

    #[test]
    fn bbox_includes_rotated_references() {
        let mut top = Component::new("top");
        let mut inst = Instance::new(unit_square());
        inst.rotate_about(45., Point::zero());
        top.add_ref(inst);
        let bbox = top.bbox().unwrap();
        let h = std::f64::consts::FRAC_1_SQRT_2;
        assert_relative_eq!(bbox.left(), -h, epsilon = 1e-12);
        assert_relative_eq!(bbox.right(), h, epsilon = 1e-12);
        assert_relative_eq!(bbox.top(), 2. * h, epsilon = 1e-12);
    }

    #[test]
    fn flatten_resolves_nested_references() {
        let square = unit_square();
        let mut mid = Component::new("mid");
        let mut a = Instance::new(square.clone());
        a.translate(2., 0.);
        mid.add_ref(a);
        let mid = Arc::new(mid);
        let mut top = Component::new("top");
        top.add_rect(L1, Rect::from_sides(-1., -1., 0., 0.));
        let mut b = Instance::new(mid);
        b.translate(0., 3.);
        top.add_ref(b);

        let flat = top.flatten();
        assert_eq!(flat.instances().count(), 0);
        assert_eq!(flat.shapes().count(), 2);
        assert_eq!(flat.bbox(), top.bbox());
        let moved = flat.shapes().nth(1).unwrap().shape().bbox().unwrap();
        assert_relative_eq!(moved.lower_left(), Point::new(2., 3.));
    }

    #[test]
    fn transform_moves_ports_and_info_survives() {
        let mut c = (*unit_square()).clone();
        c.set_info("num_squares", 1.);
        c.translate(1., 1.);
        c.transform(Transformation::rotate(180.));
        let p = c.port("e1").unwrap();
        assert_relative_eq!(p.center(), Point::new(-1.5, -2.), epsilon = 1e-12);
        assert_eq!(p.orientation(), 270.);
        assert_eq!(c.info("num_squares"), Some(1.));
        let bbox = c.bbox().unwrap();
        assert_relative_eq!(bbox.upper_right(), Point::new(-1., -1.), epsilon = 1e-12);
    }
}
