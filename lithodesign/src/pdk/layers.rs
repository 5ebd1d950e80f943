//! Named GDS layers.

use arcstr::ArcStr;
use gdsconv::GdsLayer;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A map from layer names to GDS layer/datatype pairs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerMap {
    layers: IndexMap<ArcStr, GdsLayer>,
}

impl LayerMap {
    /// Creates an empty layer map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a named layer.
    pub fn insert(&mut self, name: impl Into<ArcStr>, layer: GdsLayer) -> &mut Self {
        self.layers.insert(name.into(), layer);
        self
    }

    /// Looks up a layer by name.
    pub fn get(&self, name: &str) -> Result<GdsLayer> {
        self.try_get(name)
            .ok_or_else(|| Error::UnknownLayer(name.into()))
    }

    /// Looks up a layer by name, returning [`None`] if it does not exist.
    pub fn try_get(&self, name: &str) -> Option<GdsLayer> {
        self.layers.get(name).copied()
    }

    /// Finds the first name assigned to `layer`.
    pub fn name_of(&self, layer: GdsLayer) -> Option<&ArcStr> {
        self.layers
            .iter()
            .find_map(|(name, l)| (*l == layer).then_some(name))
    }

    /// Iterates over `(name, layer)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&ArcStr, GdsLayer)> {
        self.layers.iter().map(|(name, layer)| (name, *layer))
    }

    /// The number of named layers.
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Returns `true` if no layers are defined.
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

/// Layers of the demo process.
pub mod demo {
    use gdsconv::GdsLayer;

    pub const WAFER: GdsLayer = GdsLayer(0, 0);
    /// Silicon dioxide bottom cladding.
    pub const SIO2_BOT: GdsLayer = GdsLayer(1, 0);
    /// NbTiN for fine superconducting lines.
    pub const FINE_NBTIN: GdsLayer = GdsLayer(3, 0);
    pub const COARSE_NBTIN: GdsLayer = GdsLayer(4, 0);
    pub const TI: GdsLayer = GdsLayer(5, 0);
    /// Amorphous silicon carbide waveguides.
    pub const ASIC: GdsLayer = GdsLayer(7, 0);
    pub const SIO2_TOP: GdsLayer = GdsLayer(9, 0);
    pub const NEG_SIO2_TOP: GdsLayer = GdsLayer(10, 0);
    /// Gold markers and pads.
    pub const AU: GdsLayer = GdsLayer(11, 0);
    /// Negative-tone NbTiN.
    pub const NEG_NBTIN: GdsLayer = GdsLayer(13, 0);

    /// Every demo layer name, including the functional aliases
    /// (`WAVEGUIDE`, `CLADDING`, `NBTIN`) used by the cross sections.
    pub const ALL: &[(&str, GdsLayer)] = &[
        ("WAFER", WAFER),
        ("SIO2_BOT", SIO2_BOT),
        ("FINE_NBTIN", FINE_NBTIN),
        ("COARSE_NBTIN", COARSE_NBTIN),
        ("TI", TI),
        ("ASIC", ASIC),
        ("SIO2_TOP", SIO2_TOP),
        ("NEG_SIO2_TOP", NEG_SIO2_TOP),
        ("AU", AU),
        ("NEG_NBTIN", NEG_NBTIN),
        ("WAVEGUIDE", ASIC),
        ("CLADDING", SIO2_TOP),
        ("NBTIN", FINE_NBTIN),
    ];
}
