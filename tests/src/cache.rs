use std::sync::Arc;

use lithodesign::components::*;
use lithodesign::context::Context;
use test_log::test;

#[test]
fn concurrent_generation_shares_one_component() {
    let ctx = Context::demo();
    let step = OptimalStep {
        start_width: Some(0.2),
        end_width: 3.,
        cross_section: "nbtin".into(),
        ..Default::default()
    };
    let generated: Vec<_> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let ctx = ctx.clone();
                let step = step.clone();
                s.spawn(move || ctx.generate_layout(&step).unwrap())
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    for c in &generated[1..] {
        assert!(Arc::ptr_eq(&generated[0], c));
    }
}

#[test]
fn nested_blocks_reuse_cached_children() {
    let ctx = Context::demo();
    let pad = ctx.generate_layout(&Pad::default()).unwrap();
    let array = ctx.generate_layout(&PadArray::default()).unwrap();
    for inst in array.instances() {
        assert!(Arc::ptr_eq(inst.cell(), &pad));
    }
    // Changing a nested parameter yields a different child.
    let big = ctx
        .generate_layout(&PadArray {
            pad: Pad {
                size: (200., 200.),
                ..Default::default()
            },
            ..Default::default()
        })
        .unwrap();
    let child = big.instances().next().unwrap().cell();
    assert!(!Arc::ptr_eq(child, &pad));
}

#[test]
fn contexts_do_not_share_caches() {
    let a = Context::demo();
    let b = Context::demo();
    let ring_a = a.generate_layout(&Ring::default()).unwrap();
    let ring_b = b.generate_layout(&Ring::default()).unwrap();
    assert!(!Arc::ptr_eq(&ring_a, &ring_b));
    assert!(Arc::ptr_eq(
        &ring_a,
        &a.clone().generate_layout(&Ring::default()).unwrap()
    ));
}

#[test]
fn nan_start_width_is_not_confused_with_default() {
    let ctx = Context::demo();
    let nan = OptimalStep {
        start_width: Some(f64::NAN),
        ..Default::default()
    };
    assert!(ctx.generate_layout(&nan).is_err());
    let step = ctx.generate_layout(&OptimalStep::default()).unwrap();
    assert!(step.info("num_squares").unwrap() > 0.);
    assert!(ctx.generate_layout(&nan).is_err());
}
