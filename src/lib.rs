//! # wpadjust
//!
//! Inspect and adjust word-processing documents.
//!
//! The library reads a normalized set of properties (page geometry, margins,
//! fonts, structural counts) from `.docx` and `.rtf` documents and writes a
//! modified copy with a subset of them changed, leaving the rest of the
//! document as it was.
//!
//! ## Quick Start
//!
//! ```no_run
//! use wpadjust::{apply, inspect, MarginSide, ModificationSettings};
//!
//! fn main() -> wpadjust::Result<()> {
//!     // Read the document
//!     let metadata = inspect("report.docx")?;
//!     println!("Fonts: {:?}", metadata.properties.fonts_by_usage());
//!
//!     // Narrow the top margin and switch to one-and-a-half spacing
//!     let settings = ModificationSettings::new()
//!         .with_margin(MarginSide::Top, 0.75)
//!         .with_line_spacing(1.5);
//!     let output = apply(metadata, &settings)?;
//!     println!("Saved to {}", output.display());
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Formats
//!
//! - **DOCX**: all properties are read from the package; page size, margins,
//!   font and line spacing can be changed
//! - **RTF**: properties are derived from the text; only margins that the
//!   document does not already declare can be added

pub mod adapter;
pub mod detect;
pub mod dispatch;
pub mod docx;
pub mod error;
pub mod model;
pub mod rtf;
pub mod units;

#[cfg(feature = "async")]
pub mod nonblocking;

// Re-export commonly used types
pub use adapter::{output_path, AdapterRegistry, FormatAdapter};
pub use detect::{is_supported, validate_file, DocumentFormat};
pub use dispatch::{apply, inspect, supported_extensions};
pub use error::{Error, Result};
pub use model::{
    DocumentHandle, DocumentMetadata, DocumentProperties, FontSettings, HeadingCounts,
    LineSpacingPreset, MarginSettings, MarginSide, Margins, ModificationSettings,
    PageDimensions, PagePreset, PageSize,
};

use std::path::Path;

/// Validate a user-supplied file and inspect it.
///
/// Runs [`validate_file`] first, so a file whose content does not match its
/// extension is rejected with `UnsupportedFormat` before any parsing.
///
/// # Example
///
/// ```no_run
/// let metadata = wpadjust::inspect_validated("letter.rtf").unwrap();
/// println!("{} words", metadata.properties.word_count);
/// ```
pub fn inspect_validated<P: AsRef<Path>>(path: P) -> Result<DocumentMetadata> {
    let path = path.as_ref();
    validate_file(path)?;
    inspect(path)
}
