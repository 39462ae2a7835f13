// crates/pmc-rs-smdx/src/error.rs

use std::path::PathBuf;

use quick_xml::errors::serialize::{DeError, SeError};
use thiserror::Error;

/// Errors that can occur during SMDX parsing or serialization.
#[derive(Debug, Error)]
pub enum SmdxError {
    /// An error from the underlying `quick-xml` deserializer.
    #[error("XML parsing error: {0}")]
    XmlParsing(#[from] DeError),

    /// An error from the underlying `quick-xml` serializer.
    #[error("XML serializing error: {0}")]
    XmlSerializing(#[from] SeError),

    #[error("Formatting error: {0}")]
    FmtError(#[from] std::fmt::Error),

    /// No file for the model was found on the search path.
    #[error("No SMDX file for model {id} in {searched:?}")]
    ModelNotFound { id: i64, searched: Vec<PathBuf> },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A point declares a type outside the SunSpec type set.
    #[error("Point {point} has unknown type {type_name:?}")]
    UnknownPointType { point: String, type_name: String },

    /// A `string` point without a `len` attribute.
    #[error("Point {point} of type string has no length")]
    MissingLength { point: String },

    /// A point's `sf` names no point of the model and is not a constant.
    #[error("Point {point} refers to unknown scale factor {scale_factor:?}")]
    UnknownScaleFactor { point: String, scale_factor: String },

    /// A symbol value isn't an integer.
    #[error("Symbol {symbol} of point {point} has non-integer value {value:?}")]
    InvalidSymbolValue {
        point: String,
        symbol: String,
        value: String,
    },

    /// A generic validation error.
    #[error("Validation error: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::SmdxError;
    use crate::model::SunSpecModels;

    #[test]
    fn test_from_de_error() {
        let xml_err = quick_xml::de::from_str::<SunSpecModels>("<sunSpecModels").unwrap_err();
        let err: SmdxError = xml_err.into();
        assert!(matches!(err, SmdxError::XmlParsing(_)));
    }

    #[test]
    fn test_from_se_error() {
        let xml_err = quick_xml::errors::serialize::SeError::Custom("test error".to_string());
        let err: SmdxError = xml_err.into();
        assert!(matches!(err, SmdxError::XmlSerializing(_)));
    }

    #[test]
    fn test_display_names_point() {
        let err = SmdxError::UnknownPointType {
            point: "W".into(),
            type_name: "int128".into(),
        };
        assert_eq!(err.to_string(), "Point W has unknown type \"int128\"");
    }
}
