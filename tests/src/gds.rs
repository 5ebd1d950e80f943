use approx::assert_relative_eq;
use gdsconv::import::{GdsImportError, GdsImportOpts, GdsImporter};
use geometry::prelude::Bbox;
use layir::Element;
use lithodesign::components::*;
use lithodesign::context::Context;
use lithodesign::pdk::layers::demo::{ASIC, FINE_NBTIN};
use test_log::test;

use crate::paths::get_path;
use crate::shared::{labels, top_cell, write_and_reimport};

#[test]
fn optimal_step_round_trips_through_gds() {
    let ctx = Context::demo();
    let step = OptimalStep {
        start_width: Some(1.),
        end_width: 10.,
        cross_section: "nbtin".into(),
        ..Default::default()
    };
    let lib = write_and_reimport(&ctx, &step, "optimal_step_round_trips_through_gds");
    assert_eq!(lib.num_cells(), 1);
    let cell = top_cell(&lib);

    let shapes: Vec<_> = cell.shapes().collect();
    assert_eq!(shapes.len(), 1);
    assert_eq!(*shapes[0].layer(), FINE_NBTIN);

    let generated = ctx.generate_layout(&step).unwrap();
    let expected = generated.bbox().unwrap();
    let found = shapes[0].shape().bbox().unwrap();
    // Coordinates are snapped to the 1 nm database grid.
    assert_relative_eq!(found.left(), expected.left(), epsilon = 1e-3);
    assert_relative_eq!(found.right(), expected.right(), epsilon = 1e-3);
    assert_relative_eq!(found.top(), expected.top(), epsilon = 1e-3);

    let mut labels = labels(cell);
    labels.sort();
    assert_eq!(labels, ["e1", "e2"]);
}

#[test]
fn probed_constriction_shares_step_cells() {
    let ctx = Context::demo();
    let constriction = SpotConstriction {
        probes: ProbeConfig::FourPoint,
        ..Default::default()
    };
    let lib = write_and_reimport(&ctx, &constriction, "probed_constriction_shares_step_cells");
    // The constriction, its wire step, and one probe step.
    assert_eq!(lib.num_cells(), 3);
    let top = top_cell(&lib);
    assert_eq!(top.instances().count(), 6);
    assert_eq!(labels(top).len(), 6);
}

#[test]
fn import_single_cell_with_dependencies() {
    let ctx = Context::demo();
    let path = get_path("import_single_cell_with_dependencies", "layout.gds");
    ctx.write_gds(&EblMarker::default(), &path).unwrap();
    let gds = gds21::GdsLibrary::load(&path).unwrap();
    assert_eq!(gds.structs.len(), 3);

    let lib = GdsImporter::new(&gds, GdsImportOpts::default())
        .import_cell("cross")
        .unwrap();
    assert_eq!(lib.num_cells(), 1);
    assert_eq!(top_cell(&lib).shapes().count(), 2);

    let err = GdsImporter::new(&gds, GdsImportOpts::default())
        .import_cell("no_such_cell")
        .unwrap_err();
    assert!(matches!(err, GdsImportError::MissingCell(_)));
}

#[test]
fn grating_array_instances_are_rotated() {
    let ctx = Context::demo();
    let array = GratingCouplerArray {
        n: 4,
        ..Default::default()
    };
    let lib = write_and_reimport(&ctx, &array, "grating_array_instances_are_rotated");
    assert_eq!(lib.num_cells(), 2);
    let top = top_cell(&lib);
    let mut xs = Vec::new();
    for (_, inst) in top.instances() {
        let trans = inst.transformation();
        assert_relative_eq!(trans.angle(), 270., epsilon = 1e-9);
        xs.push(trans.offset_point().x);
    }
    xs.sort_by(f64::total_cmp);
    assert_relative_eq!(xs[0], -1.5 * 127., epsilon = 1e-3);
    assert_relative_eq!(xs[3], 1.5 * 127., epsilon = 1e-3);
}

#[test]
fn snspd_hierarchy() {
    let ctx = Context::demo();
    let lib = write_and_reimport(&ctx, &StraightSnspd::default(), "snspd_hierarchy");
    // Detector, nanowire, wire step, and waveguide.
    assert_eq!(lib.num_cells(), 4);
    let top = top_cell(&lib);
    let protection = top
        .elements()
        .filter(|elt| matches!(elt, Element::Shape(s) if *s.layer() == ASIC))
        .count();
    assert_eq!(protection, 1);
    let mut labels = labels(top);
    labels.sort();
    assert_eq!(labels, ["e1", "e2", "o1", "o2"]);
}

#[test]
fn every_component_exports_with_defaults() {
    let ctx = Context::demo();
    fn check<B: lithodesign::block::Block + Default>(ctx: &Context) {
        let name = B::id();
        let lib = write_and_reimport(ctx, &B::default(), &format!("defaults/{name}"));
        let top = top_cell(&lib);
        assert!(
            top.shapes().next().is_some() || top.instances().next().is_some(),
            "{name} exported an empty cell"
        );
    }
    check::<OptimalStep>(&ctx);
    check::<Rectangle>(&ctx);
    check::<Straight>(&ctx);
    check::<Cross>(&ctx);
    check::<Taper>(&ctx);
    check::<HyperTaper>(&ctx);
    check::<SineTaper>(&ctx);
    check::<AngledTaper>(&ctx);
    check::<GratingCouplerTraditional>(&ctx);
    check::<GratingCouplerArray>(&ctx);
    check::<GratingCouplerCluster>(&ctx);
    check::<EblMarkerCorners>(&ctx);
    check::<EblMarker>(&ctx);
    check::<Pad>(&ctx);
    check::<PadArray>(&ctx);
    check::<SpotConstriction>(&ctx);
    check::<VariableLengthConstriction>(&ctx);
    check::<StraightSnspd>(&ctx);
    check::<ResistorMeander>(&ctx);
    check::<Ring>(&ctx);
    check::<RingSingle>(&ctx);
}
