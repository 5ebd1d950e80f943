//! Parametric component generators for photonic and superconducting chip layout.
//!
//! Components are described by parameter structs implementing [`Block`](block::Block).
//! A [`Context`](context::Context) carries the process design kit and caches
//! generated layouts, so identical parametrizations share a single cell.
//!
//! ```
//! use lithodesign::components::optimal_step::OptimalStep;
//! use lithodesign::context::Context;
//!
//! let ctx = Context::demo();
//! let step = ctx
//!     .generate_layout(&OptimalStep {
//!         end_width: 5.,
//!         cross_section: "nbtin".into(),
//!         start_width: Some(1.),
//!         ..Default::default()
//!     })
//!     .unwrap();
//! assert_eq!(step.ports().count(), 2);
//! assert!(step.info("num_squares").is_some());
//! ```

pub mod block;
pub mod components;
pub mod context;
pub mod error;
pub mod layout;
pub mod numeric;
pub mod pdk;

#[doc(inline)]
pub use geometry;
pub use layir::PortType;
