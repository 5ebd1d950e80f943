//! A parametrized component generator.

use std::any::Any;

use arcstr::ArcStr;
use serde::Serialize;

use crate::context::Context;
use crate::error::Result;
use crate::layout::Component;

/// A parametrized component generator.
///
/// The serialized form of a block identifies its parametrization:
/// [`Context::generate_layout`] runs [`Block::layout`] at most once for each
/// distinct `(type, parameters)` pair and hands out the shared result.
pub trait Block: Serialize + Send + Sync + Any {
    /// A crate-wide unique identifier for this block.
    fn id() -> ArcStr;

    /// A name for a specific parametrization of this block.
    ///
    /// Generated components are initially given this name, although it
    /// may be changed on export to avoid duplicates.
    fn name(&self) -> ArcStr {
        Self::id()
    }

    /// Draws the component.
    fn layout(&self, ctx: &Context) -> Result<Component>;
}
