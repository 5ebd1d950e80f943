//! Lowering components to the layout IR.

use std::collections::HashMap;
use std::sync::Arc;

use gdsconv::GdsLayer;
use layir::{Cell, CellId, Library, LibraryBuilder};

use crate::error::Result;
use crate::layout::Component;

/// Lowers `top` and everything it references into a [`Library`].
///
/// Each distinct `Arc<Component>` becomes one cell, so components shared
/// through the generation cache are emitted once. Cell names are made
/// unique by the library builder.
pub fn to_library(top: &Arc<Component>) -> Result<Library<GdsLayer>> {
    let mut lowering = Lowering::default();
    lowering.lower(top);
    tracing::debug!(
        top = %top.name(),
        cells = lowering.lib.num_cells(),
        "lowered component hierarchy"
    );
    Ok(lowering.lib.build()?)
}

#[derive(Default)]
struct Lowering {
    lib: LibraryBuilder<GdsLayer>,
    cells: HashMap<*const Component, CellId>,
}

impl Lowering {
    fn lower(&mut self, component: &Arc<Component>) -> CellId {
        let key = Arc::as_ptr(component);
        if let Some(&id) = self.cells.get(&key) {
            return id;
        }

        let mut cell = Cell::new(component.name().clone());
        for elt in component.elements() {
            cell.add_element(elt.clone());
        }
        for (name, port) in component.ports() {
            cell.add_port(name.clone(), port.clone());
        }
        for (idx, inst) in component.instances().enumerate() {
            let child = self.lower(inst.cell());
            let name = match inst.name() {
                Some(name) => name.clone(),
                None => arcstr::format!("{}_{}", inst.cell().name(), idx),
            };
            cell.add_instance(layir::Instance::with_transformation(
                child,
                name,
                inst.transformation(),
            ));
        }

        let id = self.lib.add_cell(cell);
        self.cells.insert(key, id);
        id
    }
}
