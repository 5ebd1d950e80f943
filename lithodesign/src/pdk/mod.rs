//! Process design kits: named layers and cross sections.
//!
//! A PDK can be built in code, taken from [`Pdk::demo`], or loaded from TOML:
//!
//! ```
//! use lithodesign::pdk::Pdk;
//!
//! let pdk = Pdk::from_toml_str(r#"
//!     name = "tiny"
//!
//!     [layers]
//!     WG = [1, 0]
//!     CLAD = [2, 0]
//!
//!     [cross_sections.strip]
//!     width = 0.45
//!     layer = "WG"
//!     cladding = [{ layer = "CLAD", offset = 2.0 }]
//! "#).unwrap();
//! let strip = pdk.cross_section("strip").unwrap();
//! assert_eq!(strip.width(), 0.45);
//! assert_eq!(strip.cladding().len(), 1);
//! ```

pub mod cross_section;
pub mod layers;

use std::path::Path;

use arcstr::ArcStr;
use gdsconv::GdsLayer;
use indexmap::IndexMap;
use layir::PortType;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use cross_section::{CrossSection, CrossSectionSpec};
use layers::LayerMap;

/// A process design kit.
#[derive(Debug, Clone, PartialEq)]
pub struct Pdk {
    name: ArcStr,
    layers: LayerMap,
    cross_sections: IndexMap<ArcStr, CrossSection>,
}

/// The on-disk representation of a [`Pdk`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PdkSpec {
    #[serde(default)]
    pub name: ArcStr,
    #[serde(default)]
    pub layers: LayerMap,
    #[serde(default)]
    pub cross_sections: IndexMap<ArcStr, CrossSectionSpec>,
}

impl Pdk {
    /// Creates a PDK with the given layers and no cross sections.
    pub fn new(name: impl Into<ArcStr>, layers: LayerMap) -> Self {
        Self {
            name: name.into(),
            layers,
            cross_sections: IndexMap::new(),
        }
    }

    /// The demo PDK.
    ///
    /// Optical cross sections (`strip`, `waveguide`, `rib`, `asic`) are drawn on
    /// the amorphous silicon carbide layer; superconducting ones on NbTiN.
    pub fn demo() -> Self {
        let mut layers = LayerMap::new();
        for (name, layer) in layers::demo::ALL {
            layers.insert(*name, *layer);
        }
        let mut pdk = Self::new("demo", layers);

        use layers::demo::*;
        let optical = |name: &str, width: f64| {
            CrossSection::new(name, width, ASIC, PortType::Optical).with_radius(100., 100.)
        };
        let electrical = |name: &str, width: f64, layer: GdsLayer| {
            CrossSection::new(name, width, layer, PortType::Electrical)
        };
        pdk.add_cross_section(optical("strip", 0.5));
        pdk.add_cross_section(optical("waveguide", 0.5));
        pdk.add_cross_section(optical("rib", 0.5).with_cladding(SIO2_TOP, 3.));
        pdk.add_cross_section(optical("asic", 1.));
        pdk.add_cross_section(electrical("nbtin", 10., FINE_NBTIN));
        pdk.add_cross_section(electrical("neg_nbtin", 10., NEG_NBTIN));
        pdk.add_cross_section(electrical("coarse_nbtin", 10., COARSE_NBTIN));
        pdk.add_cross_section(electrical("metal1", 10., NEG_NBTIN));
        pdk.add_cross_section(electrical("metal_routing", 10., NEG_NBTIN));
        pdk
    }

    /// Parses a PDK from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let spec: PdkSpec = toml::from_str(s)?;
        Self::from_spec(spec)
    }

    /// Reads a PDK from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        tracing::debug!(path = %path.display(), "loading PDK");
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Resolves a [`PdkSpec`], checking that every referenced layer exists.
    pub fn from_spec(spec: PdkSpec) -> Result<Self> {
        let mut pdk = Self::new(spec.name, spec.layers);
        for (name, xs) in spec.cross_sections {
            let xs = xs.resolve(name, &pdk.layers)?;
            pdk.add_cross_section(xs);
        }
        Ok(pdk)
    }

    /// Adds or replaces a cross section, keyed by its name.
    pub fn add_cross_section(&mut self, xs: CrossSection) -> &mut Self {
        self.cross_sections.insert(xs.name().clone(), xs);
        self
    }

    #[inline]
    pub fn name(&self) -> &ArcStr {
        &self.name
    }

    #[inline]
    pub fn layers(&self) -> &LayerMap {
        &self.layers
    }

    /// Looks up a layer by name.
    pub fn layer(&self, name: &str) -> Result<GdsLayer> {
        self.layers.get(name)
    }

    /// Looks up a cross section by name.
    pub fn cross_section(&self, name: &str) -> Result<&CrossSection> {
        self.cross_sections
            .get(name)
            .ok_or_else(|| Error::UnknownCrossSection(name.into()))
    }

    /// Iterates over the cross sections in definition order.
    pub fn cross_sections(&self) -> impl Iterator<Item = &CrossSection> {
        self.cross_sections.values()
    }
}

impl Default for Pdk {
    fn default() -> Self {
        Self::demo()
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    #[test]
    fn demo_pdk_has_every_cross_section() {
        let pdk = Pdk::demo();
        for name in [
            "strip",
            "waveguide",
            "rib",
            "nbtin",
            "neg_nbtin",
            "coarse_nbtin",
            "metal1",
            "metal_routing",
            "asic",
        ] {
            assert!(pdk.cross_section(name).is_ok(), "missing {name}");
        }
        let rib = pdk.cross_section("rib").unwrap();
        assert_eq!(rib.cladding()[0].layer, layers::demo::SIO2_TOP);
        assert_eq!(rib.port_names(), ("o1".into(), "o2".into()));
        assert_eq!(
            pdk.cross_section("nbtin").unwrap().port_type(),
            PortType::Electrical
        );
        assert_eq!(pdk.layer("AU").unwrap(), GdsLayer(11, 0));
    }

    #[test]
    fn unknown_layer_in_cross_section_is_rejected() {
        let err = Pdk::from_toml_str(
            r#"
            [layers]
            WG = [1, 0]

            [cross_sections.strip]
            width = 0.5
            layer = "M1"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::UnknownLayer(name) if name == "M1"));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let err = Pdk::from_toml_str("layers = 3").unwrap_err();
        assert!(matches!(err, Error::Toml(_)));
    }

    #[test]
    fn unknown_cross_section() {
        let err = Pdk::demo().cross_section("slot").unwrap_err();
        assert!(matches!(err, Error::UnknownCrossSection(name) if name == "slot"));
    }

    #[test]
    fn pdk_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pdk.toml");
        std::fs::write(
            &path,
            "name = \"file\"\n[layers]\nM = [4, 2]\n[cross_sections.wire]\nwidth = 2.0\nlayer = \"M\"\nport_type = \"electrical\"\n",
        )
        .unwrap();
        let pdk = Pdk::from_toml_file(&path).unwrap();
        assert_eq!(pdk.name(), "file");
        let wire = pdk.cross_section("wire").unwrap();
        assert_eq!(wire.layer(), GdsLayer(4, 2));
        assert_eq!(wire.port_names(), ("e1".into(), "e2".into()));
    }
}
