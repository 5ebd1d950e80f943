//! Helpers shared by the integration tests.

use gds21::GdsLibrary;
use gdsconv::import::{import_gds, GdsImportOpts};
use gdsconv::GdsLayer;
use layir::{Cell, Element, Library};
use lithodesign::block::Block;
use lithodesign::context::Context;

use crate::paths::get_path;

/// Writes `block` to `build/<test_name>/layout.gds`, then reads the file back.
pub fn write_and_reimport<B: Block>(ctx: &Context, block: &B, test_name: &str) -> Library<GdsLayer> {
    let path = get_path(test_name, "layout.gds");
    ctx.write_gds(block, &path).expect("failed to write GDS");
    let gds = GdsLibrary::load(&path).expect("failed to parse GDS");
    import_gds(&gds, GdsImportOpts::default()).expect("failed to import GDS")
}

/// The single top cell of `lib`.
pub fn top_cell(lib: &Library<GdsLayer>) -> &Cell<GdsLayer> {
    let tops = lib.top_cells();
    assert_eq!(tops.len(), 1, "expected exactly one top cell");
    lib.cell(tops[0])
}

/// The text labels drawn directly in `cell`.
pub fn labels(cell: &Cell<GdsLayer>) -> Vec<String> {
    cell.elements()
        .filter_map(|elt| match elt {
            Element::Text(text) => Some(text.text().to_string()),
            Element::Shape(_) => None,
        })
        .collect()
}
