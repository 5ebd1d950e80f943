//! Conversion between [`layir`] libraries and GDSII libraries.
use serde::{Deserialize, Serialize};

pub mod export;
pub mod import;

#[cfg(test)]
mod tests;

/// A GDS layer specification.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct GdsLayer(pub u16, pub u16);

impl std::fmt::Display for GdsLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.0, self.1)
    }
}

/// Micrometers per meter; `layir` coordinates are in micrometers.
pub(crate) const METERS_PER_MICRON: f64 = 1e-6;

/// The default units: 1 nm database unit, 1 µm user unit.
pub fn default_units() -> gds21::GdsUnits {
    gds21::GdsUnits::new(1e-3, 1e-9)
}
