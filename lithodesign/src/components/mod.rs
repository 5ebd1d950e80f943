//! The component library.
//!
//! Every generator is a parameter struct implementing [`Block`](crate::block::Block).
//! All parameter structs deserialize with defaults for missing fields, so any
//! subset of parameters can be given in a TOML table.

pub mod constrictions;
pub mod grating_coupler;
pub mod markers;
pub mod meander;
pub mod optimal_step;
pub mod pads;
pub mod primitives;
pub mod rings;
pub mod snspd;
pub mod tapers;

pub use constrictions::{ProbeConfig, SpotConstriction, VariableLengthConstriction};
pub use grating_coupler::{
    GratingCouplerArray, GratingCouplerCluster, GratingCouplerTraditional,
};
pub use markers::{EblMarker, EblMarkerCorners};
pub use meander::ResistorMeander;
pub use optimal_step::OptimalStep;
pub use pads::{Pad, PadArray};
pub use primitives::{Cross, Rectangle, Straight};
pub use rings::{Ring, RingSingle};
pub use snspd::StraightSnspd;
pub use tapers::{AngledTaper, HyperTaper, SineTaper, Taper};
