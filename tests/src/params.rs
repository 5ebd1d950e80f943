//! Parameter tables as accepted by the `lithogen` command line tool.

use approx::assert_relative_eq;
use lithodesign::components::*;
use lithodesign::context::Context;
use test_log::test;

#[test]
fn partial_tables_keep_defaults() {
    let step: OptimalStep = toml::from_str(
        r#"
        end_width = 8.0
        start_width = 2.0
        symmetric = true
        "#,
    )
    .unwrap();
    assert_eq!(step.num_pts, 100);
    assert_eq!(step.anticrowding_factor, 1.2);
    assert_eq!(step.cross_section, "strip");
    assert!(step.symmetric);

    let c = Context::demo().generate_layout(&step).unwrap();
    assert_relative_eq!(c.port("e1").unwrap().center().y, 0.);
    assert_relative_eq!(c.port("e2").unwrap().width(), 8.);
}

#[test]
fn nested_tables_and_enums() {
    let constriction: SpotConstriction = toml::from_str(
        r#"
        channel_w = 0.05
        probes = "two_point"
        "#,
    )
    .unwrap();
    assert_eq!(constriction.probes, ProbeConfig::TwoPoint);
    assert_eq!(constriction.source_w, 0.3);

    let array: PadArray = toml::from_str(
        r#"
        rows = 2
        columns = 2

        [pad]
        size = [80.0, 60.0]
        "#,
    )
    .unwrap();
    assert_eq!(array.pad.size, (80., 60.));
    assert_eq!(array.pad.layer, "AU");
    let c = Context::demo().generate_layout(&array).unwrap();
    assert_eq!(c.ports().count(), 4);
    assert_relative_eq!(c.port("e22").unwrap().width(), 80.);
}

#[test]
fn misspelled_parameters_are_rejected() {
    let ring: Result<Ring, _> = toml::from_str("radius = 5.0\nwidht = 0.4");
    let err = ring.unwrap_err().to_string();
    assert!(err.contains("widht"), "unexpected error: {err}");
}
