//! Error types for wpadjust library.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type alias for wpadjust operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while inspecting or modifying documents.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The extension or media type is not one of the supported formats.
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// The document could not be parsed by its format adapter.
    #[error("Invalid document {}: {source}", path.display())]
    InvalidDocument {
        path: PathBuf,
        #[source]
        source: Box<Error>,
    },

    /// Applying settings to the document or saving it failed.
    #[error("Failed to {operation} for {}: {source}", path.display())]
    ModificationFailed {
        path: PathBuf,
        operation: &'static str,
        #[source]
        source: Box<Error>,
    },

    /// A modification setting is outside its allowed range.
    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    /// The zip container of a structured package is malformed.
    #[error("Package error: {0}")]
    Package(String),

    /// XML inside a structured package is malformed.
    #[error("XML error: {0}")]
    Xml(String),

    /// Control-word text is malformed or not text at all.
    #[error("Control-word error: {0}")]
    ControlWord(String),
}

impl Error {
    /// Wrap an adapter failure raised while parsing `path`.
    ///
    /// Errors that already carry document context pass through unchanged.
    pub fn invalid_document(path: &Path, err: Error) -> Self {
        match err {
            Error::InvalidDocument { .. } | Error::UnsupportedFormat(_) => err,
            other => Error::InvalidDocument {
                path: path.to_path_buf(),
                source: Box::new(other),
            },
        }
    }

    /// Wrap an adapter failure raised while running `operation` on `path`.
    ///
    /// Errors that already carry document context pass through unchanged.
    pub fn modification_failed(path: &Path, operation: &'static str, err: Error) -> Self {
        match err {
            Error::ModificationFailed { .. }
            | Error::UnsupportedFormat(_)
            | Error::InvalidSettings(_) => err,
            other => Error::ModificationFailed {
                path: path.to_path_buf(),
                operation,
                source: Box::new(other),
            },
        }
    }

    /// Whether this error is an `UnsupportedFormat` rejection.
    pub fn is_unsupported_format(&self) -> bool {
        matches!(self, Error::UnsupportedFormat(_))
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        match err {
            zip::result::ZipError::Io(e) => Error::Io(e),
            _ => Error::Package(err.to_string()),
        }
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::Xml(err.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for Error {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        Error::Xml(err.to_string())
    }
}

impl From<quick_xml::escape::EscapeError> for Error {
    fn from(err: quick_xml::escape::EscapeError) -> Self {
        Error::Xml(err.to_string())
    }
}
