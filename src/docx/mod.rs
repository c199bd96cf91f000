//! Structured-package (`.docx`) reading and writing.

mod body;
mod package;
pub mod xml;

pub use package::{CoreProperties, DocxPackage, StyleSheet};

pub(crate) use body::{set_line_spacing, set_margin, set_page_size, set_run_font};
