//! Error types and error handling utilities.

use std::sync::Arc;

use arcstr::ArcStr;
use gdsconv::export::GdsExportError;

/// A result type returning lithodesign errors.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// The error type for lithodesign functions.
#[derive(thiserror::Error, Debug, Clone)]
pub enum Error {
    /// A generator was given a parameter outside its valid range.
    #[error("invalid parameter `{param}` for {block}: {reason}")]
    InvalidParameter {
        /// The block being generated.
        block: ArcStr,
        /// The offending parameter.
        param: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
    /// No layer with the given name exists in the PDK.
    #[error("unknown layer `{0}`")]
    UnknownLayer(ArcStr),
    /// No cross section with the given name exists in the PDK.
    #[error("unknown cross section `{0}`")]
    UnknownCrossSection(ArcStr),
    /// A component has no port with the given name.
    #[error("component `{component}` has no port named `{port}`")]
    UnknownPort {
        /// The component that was queried.
        component: ArcStr,
        /// The missing port.
        port: ArcStr,
    },
    /// A port name was used twice in one component.
    #[error("component `{component}` already has a port named `{port}`")]
    DuplicatePort {
        /// The component being built.
        component: ArcStr,
        /// The repeated port name.
        port: ArcStr,
    },
    /// An I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] Arc<std::io::Error>),
    /// A PDK file could not be parsed.
    #[error("error parsing PDK: {0}")]
    Toml(#[from] Arc<toml::de::Error>),
    /// Block parameters could not be serialized into a cache key.
    #[error("error serializing block parameters: {0}")]
    Serialize(#[from] Arc<flexbuffers::SerializationError>),
    /// The generated hierarchy could not be assembled into a library.
    #[error("error building layout library: {0}")]
    Build(#[from] layir::BuildError),
    /// An error converting a layout to GDS.
    #[error("error during gds export: {0}")]
    GdsExport(#[from] GdsExportError),
    /// An error writing a GDS file.
    ///
    /// Stored as its debug rendering, since [`gds21::GdsError`] is not `Send`.
    #[error("error writing GDS file: {0}")]
    Gds(ArcStr),
}

impl Error {
    /// Creates an [`Error::InvalidParameter`].
    pub fn invalid(
        block: impl Into<ArcStr>,
        param: &'static str,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidParameter {
            block: block.into(),
            param,
            reason: reason.into(),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Self::Io(Arc::new(value))
    }
}

impl From<toml::de::Error> for Error {
    fn from(value: toml::de::Error) -> Self {
        Self::Toml(Arc::new(value))
    }
}

impl From<flexbuffers::SerializationError> for Error {
    fn from(value: flexbuffers::SerializationError) -> Self {
        Self::Serialize(Arc::new(value))
    }
}

impl From<gds21::GdsError> for Error {
    fn from(value: gds21::GdsError) -> Self {
        Self::Gds(arcstr::format!("{value:?}"))
    }
}

/// Checks that `value` is finite and strictly positive.
pub(crate) fn ensure_positive(block: &str, param: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0. {
        Ok(())
    } else {
        Err(Error::invalid(
            block,
            param,
            format!("must be a positive, finite number (got {value})"),
        ))
    }
}

/// Checks that `value` is finite and not negative.
pub(crate) fn ensure_non_negative(block: &str, param: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0. {
        Ok(())
    } else {
        Err(Error::invalid(
            block,
            param,
            format!("must be a non-negative, finite number (got {value})"),
        ))
    }
}
