//! Error types for unfold library.

use std::io;
use thiserror::Error;

/// Result type alias for unfold operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while loading or writing documents.
///
/// The normalization pipeline itself never fails on malformed graphs;
/// those anomalies are reported as [`Diagnostic`](crate::Diagnostic)s.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The input is not valid JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The input is not recognized as a document model.
    #[error("Unknown format: not a document model")]
    UnknownFormat,

    /// Error persisting an externalized asset.
    #[error("Asset error: {0}")]
    Asset(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::UnknownFormat;
        assert_eq!(err.to_string(), "Unknown format: not a document model");

        let err = Error::Asset("cannot write out/a.png: denied".to_string());
        assert_eq!(err.to_string(), "Asset error: cannot write out/a.png: denied");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{oops").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Json(_)));
    }
}
