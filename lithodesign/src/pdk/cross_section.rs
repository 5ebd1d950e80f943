//! Cross sections: the width, layer, and cladding of an extruded path.

use arcstr::ArcStr;
use gdsconv::GdsLayer;
use layir::PortType;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::pdk::layers::LayerMap;

/// A cladding layer drawn alongside the main section.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cladding {
    /// The cladding layer.
    pub layer: GdsLayer,
    /// How far the cladding extends beyond each edge of the main section.
    pub offset: f64,
}

/// A resolved cross section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossSection {
    name: ArcStr,
    width: f64,
    layer: GdsLayer,
    radius: Option<f64>,
    radius_min: Option<f64>,
    port_type: PortType,
    cladding: Vec<Cladding>,
}

impl CrossSection {
    /// Creates a cross section with no cladding and no bend radius.
    pub fn new(name: impl Into<ArcStr>, width: f64, layer: GdsLayer, port_type: PortType) -> Self {
        Self {
            name: name.into(),
            width,
            layer,
            radius: None,
            radius_min: None,
            port_type,
            cladding: Vec::new(),
        }
    }

    /// Sets the routing bend radius and minimum bend radius.
    pub fn with_radius(mut self, radius: f64, radius_min: f64) -> Self {
        self.radius = Some(radius);
        self.radius_min = Some(radius_min);
        self
    }

    /// Adds a cladding layer.
    pub fn with_cladding(mut self, layer: GdsLayer, offset: f64) -> Self {
        self.cladding.push(Cladding { layer, offset });
        self
    }

    /// Returns a copy of this cross section with a different main width.
    pub fn with_width(&self, width: f64) -> Self {
        Self {
            width,
            ..self.clone()
        }
    }

    #[inline]
    pub fn name(&self) -> &ArcStr {
        &self.name
    }

    #[inline]
    pub fn width(&self) -> f64 {
        self.width
    }

    #[inline]
    pub fn layer(&self) -> GdsLayer {
        self.layer
    }

    #[inline]
    pub fn radius(&self) -> Option<f64> {
        self.radius
    }

    #[inline]
    pub fn radius_min(&self) -> Option<f64> {
        self.radius_min
    }

    #[inline]
    pub fn port_type(&self) -> PortType {
        self.port_type
    }

    #[inline]
    pub fn cladding(&self) -> &[Cladding] {
        &self.cladding
    }

    /// The input and output port names (`o1`/`o2` or `e1`/`e2`).
    pub fn port_names(&self) -> (ArcStr, ArcStr) {
        port_names(self.port_type)
    }
}

/// The conventional names of the two ports of a two-port component.
pub fn port_names(port_type: PortType) -> (ArcStr, ArcStr) {
    let prefix = port_type.prefix();
    (
        arcstr::format!("{prefix}1"),
        arcstr::format!("{prefix}2"),
    )
}

/// A cross section as written in a PDK file, with layers referenced by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CrossSectionSpec {
    pub width: f64,
    pub layer: ArcStr,
    #[serde(default)]
    pub radius: Option<f64>,
    #[serde(default)]
    pub radius_min: Option<f64>,
    #[serde(default)]
    pub port_type: PortType,
    #[serde(default)]
    pub cladding: Vec<CladdingSpec>,
}

/// A cladding layer as written in a PDK file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CladdingSpec {
    pub layer: ArcStr,
    pub offset: f64,
}

impl CrossSectionSpec {
    /// Resolves layer names against `layers`.
    pub fn resolve(&self, name: impl Into<ArcStr>, layers: &LayerMap) -> Result<CrossSection> {
        let name = name.into();
        if !(self.width.is_finite() && self.width > 0.) {
            return Err(Error::invalid(
                name,
                "width",
                format!("must be positive (got {})", self.width),
            ));
        }
        let cladding = self
            .cladding
            .iter()
            .map(|c| {
                Ok(Cladding {
                    layer: layers.get(&c.layer)?,
                    offset: c.offset,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(CrossSection {
            name,
            width: self.width,
            layer: layers.get(&self.layer)?,
            radius: self.radius,
            radius_min: self.radius_min,
            port_type: self.port_type,
            cladding,
        })
    }
}
