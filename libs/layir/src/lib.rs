//! A layout intermediate representation.
//!
//! A [`Library`] is a set of [`Cell`]s. Each cell holds primitive [`Element`]s,
//! [`Instance`]s of other cells, and named [`Port`]s. Cells are generic over
//! the layer type `L`, so the same IR can carry symbolic or GDS layers.

pub mod id;

use std::{
    collections::{HashMap, HashSet},
    ops::Deref,
};

use crate::id::Id;
use arcstr::ArcStr;
use geometry::prelude::{Bbox, Point, Rect, Transformation};
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use uniquify::Names;

pub struct Cells;

// The reason this uses [`Cells`] instead of [`Cell`]
// is because `Cell` has a generic type parameter.
pub type CellId = Id<Cells>;
pub type InstanceId = Id<Instance>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LibraryBuilder<L> {
    cell_id: CellId,
    cells: IndexMap<CellId, Cell<L>>,
    name_map: HashMap<ArcStr, CellId>,
    names: Names<CellId>,
}

/// A validated library: every instance refers to a cell in the library
/// and the instance hierarchy is acyclic.
#[derive(Debug, Clone)]
pub struct Library<L>(LibraryBuilder<L>);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell<L> {
    name: ArcStr,
    instance_id: InstanceId,
    instances: IndexMap<InstanceId, Instance>,
    instance_name_map: HashMap<ArcStr, InstanceId>,
    elements: Vec<Element<L>>,
    ports: IndexMap<ArcStr, Port<L>>,
}

/// The kind of signal a port carries.
#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PortType {
    /// A waveguide port.
    #[default]
    Optical,
    /// A wire port.
    Electrical,
}

impl PortType {
    /// The conventional prefix of port names of this type (`o` or `e`).
    pub fn prefix(&self) -> &'static str {
        match self {
            PortType::Optical => "o",
            PortType::Electrical => "e",
        }
    }
}

impl std::fmt::Display for PortType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PortType::Optical => write!(f, "optical"),
            PortType::Electrical => write!(f, "electrical"),
        }
    }
}

/// A location at which this cell should be connected.
///
/// The orientation is the direction, in degrees, in which the port faces
/// outward from the cell: 0 is +x, 90 is +y.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Port<L> {
    center: Point,
    width: f64,
    orientation: f64,
    port_type: PortType,
    layer: L,
}

/// A primitive layout element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Element<L> {
    /// A primitive layout shape.
    Shape(Shape<L>),
    /// A primitive text annotation.
    Text(Text<L>),
}

/// A primitive layout shape consisting of a layer and a geometric shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shape<L> {
    layer: L,
    shape: geometry::shape::Shape,
}

/// A primitive text annotation consisting of a layer, string, and location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Text<L> {
    layer: L,
    text: ArcStr,
    trans: Transformation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instance {
    child: CellId,
    name: ArcStr,
    trans: Transformation,
}

/// An error encountered while validating a [`LibraryBuilder`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// An instance refers to a cell that is not in the library.
    #[error("instance `{instance}` of cell `{cell}` refers to a missing cell")]
    MissingChild {
        /// The parent cell.
        cell: ArcStr,
        /// The offending instance.
        instance: ArcStr,
    },
    /// The instance hierarchy contains a cycle through the given cell.
    #[error("cell `{0}` instantiates itself")]
    Cycle(ArcStr),
}

impl<L> Default for LibraryBuilder<L> {
    fn default() -> Self {
        Self {
            cell_id: Id::new(),
            names: Default::default(),
            name_map: Default::default(),
            cells: Default::default(),
        }
    }
}

impl<L> LibraryBuilder<L> {
    pub fn new() -> Self {
        Default::default()
    }

    /// Adds a cell to the library, renaming it if its name is taken.
    pub fn add_cell(&mut self, mut cell: Cell<L>) -> CellId {
        let id = self.cell_id.alloc();
        cell.name = self.names.assign_name(id, &cell.name);
        self.name_map.insert(cell.name.clone(), id);
        self.cells.insert(id, cell);
        id
    }

    /// Gets the cell with the given ID.
    ///
    /// # Panics
    ///
    /// Panics if no cell has the given ID.
    pub fn cell(&self, id: CellId) -> &Cell<L> {
        self.cells.get(&id).unwrap()
    }

    pub fn try_cell(&self, id: CellId) -> Option<&Cell<L>> {
        self.cells.get(&id)
    }

    /// Gets the cell with the given name.
    ///
    /// # Panics
    ///
    /// Panics if no cell has the given name.
    pub fn cell_named(&self, name: &str) -> &Cell<L> {
        self.cell(self.cell_id_named(name))
    }

    pub fn try_cell_named(&self, name: &str) -> Option<&Cell<L>> {
        self.try_cell(*self.name_map.get(name)?)
    }

    /// Gets the cell ID corresponding to the given name.
    ///
    /// # Panics
    ///
    /// Panics if no cell has the given name.
    /// For a non-panicking alternative, see [`try_cell_id_named`](LibraryBuilder::try_cell_id_named).
    pub fn cell_id_named(&self, name: &str) -> CellId {
        match self.name_map.get(name) {
            Some(&cell) => cell,
            None => {
                tracing::error!("no cell named `{}`", name);
                panic!("no cell named `{}`", name);
            }
        }
    }

    /// Gets the cell ID corresponding to the given name.
    pub fn try_cell_id_named(&self, name: &str) -> Option<CellId> {
        self.name_map.get(name).copied()
    }

    /// Iterates over the `(id, cell)` pairs in this library.
    pub fn cells(&self) -> impl Iterator<Item = (CellId, &Cell<L>)> {
        self.cells.iter().map(|(id, cell)| (*id, cell))
    }

    /// The number of cells in the library.
    pub fn num_cells(&self) -> usize {
        self.cells.len()
    }

    /// Returns cell IDs in topological order.
    ///
    /// Every cell appears after all of the cells it instantiates.
    pub fn topological_order(&self) -> Vec<CellId> {
        let mut state = IndexSet::new();
        for (cell, _) in self.cells() {
            self.dfs_postorder(cell, &mut state);
        }
        state.into_iter().collect()
    }

    fn dfs_postorder(&self, id: CellId, state: &mut IndexSet<CellId>) {
        if state.contains(&id) {
            return;
        }

        let cell = self.cell(id);
        for (_, inst) in cell.instances() {
            self.dfs_postorder(inst.child(), state);
        }
        state.insert(id);
    }

    /// Cells that are not instantiated by any other cell.
    pub fn top_cells(&self) -> Vec<CellId> {
        let children: HashSet<CellId> = self
            .cells
            .values()
            .flat_map(|cell| cell.instances.values().map(|inst| inst.child))
            .collect();
        self.cells
            .keys()
            .copied()
            .filter(|id| !children.contains(id))
            .collect()
    }

    /// Checks that all instances resolve and that the hierarchy is acyclic.
    pub fn build(self) -> Result<Library<L>, BuildError> {
        for cell in self.cells.values() {
            for inst in cell.instances.values() {
                if !self.cells.contains_key(&inst.child) {
                    return Err(BuildError::MissingChild {
                        cell: cell.name.clone(),
                        instance: inst.name.clone(),
                    });
                }
            }
        }

        // 0 = unvisited, 1 = on the current path, 2 = done.
        let mut marks: HashMap<CellId, u8> = HashMap::new();
        for &root in self.cells.keys() {
            if marks.get(&root).copied().unwrap_or(0) != 0 {
                continue;
            }
            let mut stack = vec![(root, false)];
            while let Some((id, expanded)) = stack.pop() {
                if expanded {
                    marks.insert(id, 2);
                    continue;
                }
                match marks.get(&id).copied().unwrap_or(0) {
                    2 => continue,
                    1 => return Err(BuildError::Cycle(self.cell(id).name.clone())),
                    _ => {}
                }
                marks.insert(id, 1);
                stack.push((id, true));
                for inst in self.cell(id).instances.values() {
                    match marks.get(&inst.child).copied().unwrap_or(0) {
                        1 => return Err(BuildError::Cycle(self.cell(inst.child).name.clone())),
                        0 => stack.push((inst.child, false)),
                        _ => {}
                    }
                }
            }
        }

        Ok(Library(self))
    }
}

impl<L> Deref for Library<L> {
    type Target = LibraryBuilder<L>;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<L> Cell<L> {
    pub fn new(name: impl Into<ArcStr>) -> Self {
        Self {
            name: name.into(),
            instance_id: Id::new(),
            instances: Default::default(),
            instance_name_map: Default::default(),
            elements: Default::default(),
            ports: Default::default(),
        }
    }

    /// The name of the cell.
    #[inline]
    pub fn name(&self) -> &ArcStr {
        &self.name
    }

    /// Iterate over the ports of this cell.
    #[inline]
    pub fn ports(&self) -> impl Iterator<Item = (&ArcStr, &Port<L>)> {
        self.ports.iter()
    }

    pub fn add_port(&mut self, name: impl Into<ArcStr>, port: Port<L>) {
        self.ports.insert(name.into(), port);
    }

    /// Get a port of this cell by name.
    ///
    /// # Panics
    ///
    /// Panics if the provided port does not exist.
    #[inline]
    pub fn port(&self, name: &str) -> &Port<L> {
        self.try_port(name).unwrap()
    }

    /// Get a port of this cell by name.
    #[inline]
    pub fn try_port(&self, name: &str) -> Option<&Port<L>> {
        self.ports.get(name)
    }

    /// Get the instance associated with the given ID.
    ///
    /// # Panics
    ///
    /// Panics if no instance with the given ID exists.
    #[inline]
    pub fn instance(&self, id: InstanceId) -> &Instance {
        self.instances.get(&id).unwrap()
    }

    /// Get the instance associated with the given ID.
    #[inline]
    pub fn try_instance(&self, id: InstanceId) -> Option<&Instance> {
        self.instances.get(&id)
    }

    /// Gets the instance with the given name.
    pub fn try_instance_named(&self, name: &str) -> Option<&Instance> {
        self.try_instance(*self.instance_name_map.get(name)?)
    }

    /// Add the given instance to the cell.
    #[inline]
    pub fn add_instance(&mut self, instance: Instance) -> InstanceId {
        let id = self.instance_id.alloc();
        self.instance_name_map.insert(instance.name.clone(), id);
        self.instances.insert(id, instance);
        id
    }

    /// Iterate over the instances of this cell.
    #[inline]
    pub fn instances(&self) -> impl Iterator<Item = (InstanceId, &Instance)> {
        self.instances.iter().map(|x| (*x.0, x.1))
    }

    pub fn add_element(&mut self, element: impl Into<Element<L>>) {
        self.elements.push(element.into())
    }

    pub fn elements(&self) -> impl Iterator<Item = &Element<L>> {
        self.elements.iter()
    }

    /// Iterates over the shapes (not texts) directly contained in this cell.
    pub fn shapes(&self) -> impl Iterator<Item = &Shape<L>> {
        self.elements.iter().filter_map(|elt| match elt {
            Element::Shape(shape) => Some(shape),
            Element::Text(_) => None,
        })
    }
}

impl<L> Port<L> {
    pub fn new(
        center: Point,
        width: f64,
        orientation: f64,
        port_type: PortType,
        layer: L,
    ) -> Self {
        Self {
            center,
            width,
            orientation: geometry::wrap_angle(orientation),
            port_type,
            layer,
        }
    }

    #[inline]
    pub fn center(&self) -> Point {
        self.center
    }

    #[inline]
    pub fn width(&self) -> f64 {
        self.width
    }

    /// The outward-facing direction of the port, in degrees within `[0, 360)`.
    #[inline]
    pub fn orientation(&self) -> f64 {
        self.orientation
    }

    #[inline]
    pub fn port_type(&self) -> PortType {
        self.port_type
    }

    #[inline]
    pub fn layer(&self) -> &L {
        &self.layer
    }

    /// Maps the port's center and orientation through `trans`.
    pub fn transform(&self, trans: Transformation) -> Self
    where
        L: Clone,
    {
        Self {
            center: trans.apply_point(self.center),
            width: self.width,
            orientation: trans.apply_angle(self.orientation),
            port_type: self.port_type,
            layer: self.layer.clone(),
        }
    }

    /// The two end points of the port's edge, listed counterclockwise
    /// when viewed from outside the cell.
    pub fn edge(&self) -> (Point, Point) {
        let half = Point::polar(self.width / 2., self.orientation + 90.);
        (self.center - half, self.center + half)
    }
}

impl<L> Bbox for Port<L> {
    fn bbox(&self) -> Option<Rect> {
        let (a, b) = self.edge();
        Some(Rect::new(a, b))
    }
}

impl<L> From<Shape<L>> for Element<L> {
    fn from(value: Shape<L>) -> Self {
        Self::Shape(value)
    }
}

impl<L> From<Text<L>> for Element<L> {
    fn from(value: Text<L>) -> Self {
        Self::Text(value)
    }
}

impl<L> Shape<L> {
    #[inline]
    pub fn new(layer: L, shape: impl Into<geometry::shape::Shape>) -> Self {
        Self {
            layer,
            shape: shape.into(),
        }
    }

    #[inline]
    pub fn layer(&self) -> &L {
        &self.layer
    }

    #[inline]
    pub fn shape(&self) -> &geometry::shape::Shape {
        &self.shape
    }
}

impl<L> Text<L> {
    #[inline]
    pub fn new(layer: L, text: impl Into<ArcStr>) -> Self {
        Self {
            layer,
            text: text.into(),
            trans: Default::default(),
        }
    }

    #[inline]
    pub fn with_transformation(
        layer: L,
        text: impl Into<ArcStr>,
        trans: impl Into<Transformation>,
    ) -> Self {
        Self {
            layer,
            text: text.into(),
            trans: trans.into(),
        }
    }

    #[inline]
    pub fn layer(&self) -> &L {
        &self.layer
    }

    #[inline]
    pub fn text(&self) -> &ArcStr {
        &self.text
    }

    #[inline]
    pub fn transformation(&self) -> Transformation {
        self.trans
    }
}

impl Instance {
    pub fn new(child: CellId, name: impl Into<ArcStr>) -> Self {
        Self {
            child,
            name: name.into(),
            trans: Default::default(),
        }
    }

    pub fn with_transformation(
        child: CellId,
        name: impl Into<ArcStr>,
        transformation: impl Into<Transformation>,
    ) -> Self {
        Self {
            child,
            name: name.into(),
            trans: transformation.into(),
        }
    }

    #[inline]
    pub fn child(&self) -> CellId {
        self.child
    }

    #[inline]
    pub fn name(&self) -> &ArcStr {
        &self.name
    }

    #[inline]
    pub fn transformation(&self) -> Transformation {
        self.trans
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use geometry::prelude::Polygon;
    use test_log::test;

    use super::*;

    fn hierarchy() -> LibraryBuilder<u8> {
        let mut lib = LibraryBuilder::new();
        let mut leaf = Cell::new("leaf");
        leaf.add_element(Shape::new(1, Rect::from_sides(0., 0., 1., 1.)));
        let leaf = lib.add_cell(leaf);
        let mut mid = Cell::new("mid");
        mid.add_instance(Instance::new(leaf, "xleaf"));
        mid.add_element(Shape::new(
            2,
            Polygon::from_xy([(0., 0.), (2., 0.), (1., 1.)]),
        ));
        let mid = lib.add_cell(mid);
        let mut top = Cell::new("top");
        top.add_instance(Instance::with_transformation(
            mid,
            "xmid",
            Transformation::translate(5., 0.),
        ));
        top.add_instance(Instance::new(leaf, "xleaf"));
        lib.add_cell(top);
        lib
    }

    #[test]
    fn topological_order_puts_children_first() {
        let lib = hierarchy().build().unwrap();
        let order: Vec<_> = lib
            .topological_order()
            .into_iter()
            .map(|id| lib.cell(id).name().clone())
            .collect();
        assert_eq!(order, vec!["leaf", "mid", "top"]);
        assert_eq!(lib.top_cells(), vec![lib.cell_id_named("top")]);
    }

    #[test]
    fn duplicate_names_are_uniquified() {
        let mut lib = LibraryBuilder::<u8>::new();
        lib.add_cell(Cell::new("taper"));
        let second = lib.add_cell(Cell::new("taper"));
        assert_eq!(lib.cell(second).name(), "taper_1");
    }

    #[test]
    fn missing_child_is_rejected() {
        let mut other = LibraryBuilder::<u8>::new();
        other.add_cell(Cell::new("a"));
        let foreign = other.add_cell(Cell::new("b"));
        let mut lib = LibraryBuilder::<u8>::new();
        let mut top = Cell::new("top");
        top.add_instance(Instance::new(foreign, "xmissing"));
        lib.add_cell(top);
        assert!(matches!(
            lib.build(),
            Err(BuildError::MissingChild { .. })
        ));
    }

    #[test]
    fn port_transform_rotates_orientation() {
        let port = Port::new(Point::new(1., 0.), 0.5, 0., PortType::Optical, 1u8);
        let moved = port.transform(Transformation::rotate(90.));
        assert_relative_eq!(moved.center(), Point::new(0., 1.));
        assert_eq!(moved.orientation(), 90.);
        let (a, b) = moved.edge();
        assert_relative_eq!(a, Point::new(0.25, 1.), epsilon = 1e-12);
        assert_relative_eq!(b, Point::new(-0.25, 1.), epsilon = 1e-12);
    }
}
