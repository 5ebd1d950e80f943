use std::path::PathBuf;

use approx::assert_relative_eq;
use gds21::{GdsElement, GdsLibrary, GdsStruct, GdsStructRef};
use geometry::{point::Point, prelude::Transformation, rect::Rect, shape::Shape as GShape};
use layir::{Cell, Instance, Library, LibraryBuilder, Port, PortType, Shape};
use test_log::test;

use crate::{
    export::{export_gds, GdsExportError, GdsExportOpts},
    import::{import_gds, GdsImportError, GdsImportOpts},
    GdsLayer,
};

const BUILD_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/build");

#[inline]
fn get_path(test_name: &str, file_name: &str) -> PathBuf {
    PathBuf::from(BUILD_DIR).join(test_name).join(file_name)
}

fn gdslib() -> Library<GdsLayer> {
    let mut lib = LibraryBuilder::new();
    let mut bot = Cell::new("bot");
    bot.add_element(Shape::new(
        GdsLayer(1, 0),
        GShape::Rect(Rect::from_sides(0., 0., 0.1, 0.1)),
    ));
    bot.add_port(
        "o1",
        Port::new(Point::new(0., 0.05), 0.1, 180., PortType::Optical, GdsLayer(1, 0)),
    );
    let bot = lib.add_cell(bot);
    let mut mid = Cell::new("mid");
    mid.add_element(Shape::new(
        GdsLayer(2, 0),
        geometry::polygon::Polygon::from_xy([(0., 0.), (0.2, 0.), (0.1, 0.15)]),
    ));
    mid.add_instance(Instance::with_transformation(
        bot,
        "xbot",
        Transformation::from_opts(Point::new(1., 2.), true, 90.),
    ));
    let mid = lib.add_cell(mid);
    let mut top = Cell::new("top");
    top.add_element(Shape::new(
        GdsLayer(4, 0),
        GShape::Rect(Rect::from_sides(0., 0., 0.2, 0.2)),
    ));
    top.add_instance(Instance::with_transformation(
        mid,
        "xmid",
        Transformation::translate(0., 0.1),
    ));
    top.add_instance(Instance::new(bot, "xbot"));
    lib.add_cell(top);
    lib.build().unwrap()
}

#[test]
fn test_export_layir_to_gds() {
    let lib = gdslib();
    let gds = export_gds(&lib, GdsExportOpts::default()).unwrap();

    let path = get_path("test_export_layir_to_gds", "layout.gds");
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    gds.save(&path).expect("failed to write gds");

    assert_eq!(gds.structs.len(), 3);
    assert_eq!(gds.structs[0].name.as_str(), "bot");
    assert_eq!(gds.structs[2].name.as_str(), "top");
    // One boundary plus one port label.
    assert_eq!(gds.structs[0].elems.len(), 2);
    assert_eq!(gds.structs[1].elems.len(), 2);
    assert_eq!(gds.structs[2].elems.len(), 3);

    match &gds.structs[0].elems[0] {
        GdsElement::GdsBoundary(b) => {
            assert_eq!(b.xy.len(), 5);
            assert_eq!(b.xy[0], b.xy[4]);
            assert_eq!(b.xy[2].x, 100);
        }
        other => panic!("expected a boundary, got {other:?}"),
    }
    match &gds.structs[1].elems[1] {
        GdsElement::GdsStructRef(sref) => {
            let strans = sref.strans.as_ref().unwrap();
            assert!(strans.reflected);
            assert_eq!(strans.angle, Some(90.));
            assert_eq!((sref.xy.x, sref.xy.y), (1000, 2000));
        }
        other => panic!("expected a struct reference, got {other:?}"),
    }
}

#[test]
fn test_gds_reexport() {
    let lib = gdslib();
    let path = get_path("test_gds_reexport", "layout.gds");
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    export_gds(
        &lib,
        GdsExportOpts {
            port_labels: false,
            ..Default::default()
        },
    )
    .unwrap()
    .save(&path)
    .expect("failed to save GDS");

    let rawlib = GdsLibrary::load(&path).expect("failed to parse GDS");
    let lib2 = import_gds(&rawlib, GdsImportOpts::default()).expect("failed to import");
    assert_eq!(lib2.num_cells(), 3);

    let bot = lib2.cell_named("bot");
    let shapes: Vec<_> = bot.shapes().collect();
    assert_eq!(shapes.len(), 1);
    assert_eq!(shapes[0].layer(), &GdsLayer(1, 0));
    let rect = shapes[0].shape().rect().expect("expected a rectangle");
    assert_relative_eq!(rect.lower_left(), Point::new(0., 0.));
    assert_relative_eq!(rect.upper_right(), Point::new(0.1, 0.1), epsilon = 1e-9);

    let mid = lib2.cell_named("mid");
    let (_, inst) = mid.instances().next().unwrap();
    assert_eq!(inst.child(), lib2.cell_id_named("bot"));
    let trans = inst.transformation();
    assert!(trans.reflects_vert());
    assert_relative_eq!(trans.angle(), 90.);
    assert_relative_eq!(trans.offset_point(), Point::new(1., 2.), epsilon = 1e-9);
}

#[test]
fn out_of_range_coordinates_are_rejected() {
    let mut lib = LibraryBuilder::new();
    let mut cell = Cell::new("huge");
    cell.add_element(Shape::new(
        GdsLayer(1, 0),
        Rect::from_sides(0., 0., 1e7, 1.),
    ));
    lib.add_cell(cell);
    let err = export_gds(&lib.build().unwrap(), GdsExportOpts::default()).unwrap_err();
    assert!(matches!(err, GdsExportError::CoordinateOutOfRange { .. }));
}

#[test]
fn missing_reference_is_rejected() {
    let mut gds = GdsLibrary::new("broken");
    let mut top = GdsStruct::new("top");
    top.elems.push(GdsElement::GdsStructRef(GdsStructRef {
        name: "nowhere".into(),
        ..Default::default()
    }));
    gds.structs.push(top);
    let err = import_gds(&gds, GdsImportOpts::default()).unwrap_err();
    assert_eq!(err, GdsImportError::MissingCell("nowhere".into()));
}

#[test]
fn unit_mismatch_is_rejected() {
    let lib = export_gds(&gdslib(), GdsExportOpts::default()).unwrap();
    let err = import_gds(
        &lib,
        GdsImportOpts {
            units: Some(gds21::GdsUnits::new(1e-3, 1e-6)),
        },
    )
    .unwrap_err();
    assert!(matches!(err, GdsImportError::UnitMismatch { .. }));
}

#[test]
fn conversion_errors_are_send_and_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<GdsExportError>();
    assert_send_sync::<GdsImportError>();

    let err = GdsExportError::from(gds21::GdsError::Str("bad record".into()));
    assert!(matches!(err, GdsExportError::Gds(_)));
    assert!(err.to_string().contains("bad record"));
}
