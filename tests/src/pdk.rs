use approx::assert_relative_eq;
use geometry::prelude::Bbox;
use gdsconv::GdsLayer;
use lithodesign::components::*;
use lithodesign::context::Context;
use lithodesign::error::Error;
use lithodesign::pdk::Pdk;
use test_log::test;

use crate::paths::test_data;
use crate::shared::{top_cell, write_and_reimport};

fn bilayer() -> Context {
    Context::new(Pdk::from_toml_file(test_data("bilayer.toml")).unwrap())
}

#[test]
fn components_use_file_pdk_layers() {
    let ctx = bilayer();
    let c = ctx
        .generate_layout(&SpotConstriction {
            channel_w: 0.2,
            source_w: 4.,
            cross_section: "wire".into(),
            ..Default::default()
        })
        .unwrap();
    let flat = c.flatten();
    assert!(flat.shapes().all(|s| *s.layer() == GdsLayer(20, 0)));
    assert_eq!(c.port("e1").unwrap().layer(), &GdsLayer(20, 0));
}

#[test]
fn cladding_from_file_pdk() {
    let ctx = bilayer();
    let lib = write_and_reimport(
        &ctx,
        &Straight {
            length: 25.,
            cross_section: "rib".into(),
            width: None,
        },
        "cladding_from_file_pdk",
    );
    let cell = top_cell(&lib);
    let oxide: Vec<_> = cell
        .shapes()
        .filter(|s| *s.layer() == GdsLayer(31, 0))
        .map(|s| s.shape().bbox().unwrap())
        .collect();
    assert_eq!(oxide.len(), 1);
    assert_relative_eq!(oxide[0].height(), 0.8 + 5., epsilon = 1e-3);
    assert_relative_eq!(oxide[0].width(), 25., epsilon = 1e-3);
}

#[test]
fn demo_names_are_missing_from_file_pdk() {
    let ctx = bilayer();
    let err = ctx.generate_layout(&Pad::default()).unwrap_err();
    assert!(matches!(err, Error::UnknownLayer(ref name) if name == "AU"));
    let err = ctx.generate_layout(&OptimalStep::default()).unwrap_err();
    assert!(matches!(err, Error::UnknownCrossSection(ref name) if name == "strip"));
}

#[test]
fn snspd_with_file_cross_sections() {
    let ctx = bilayer();
    let c = ctx
        .generate_layout(&StraightSnspd {
            channel_width: 0.2,
            channel_length: 5.,
            fine_cross_section: "wire".into(),
            coarse_cross_section: "lead".into(),
            waveguide_cross_section: "rib".into(),
            ..Default::default()
        })
        .unwrap();
    assert_relative_eq!(c.port("e1").unwrap().width(), 4.);
    assert_relative_eq!(c.port("o1").unwrap().width(), 0.8);
    let protection: Vec<_> = c.shapes_on(GdsLayer(30, 0)).collect();
    assert_eq!(protection.len(), 1);
    assert_relative_eq!(protection[0].bbox().unwrap().height(), 3.6, epsilon = 1e-9);
}
