//! Format detection and file validation.
//!
//! The dispatcher routes purely on extension. Callers that accept files from
//! users run [`validate_file`] first, which additionally checks that the
//! media type sniffed from the leading bytes agrees with the extension.

use crate::error::{Error, Result};
use serde::Serialize;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Media type of the structured-package format.
pub const DOCX_MEDIA_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
/// Preferred media type of the control-word format.
pub const RTF_MEDIA_TYPE: &str = "application/rtf";
/// Alternate media type of the control-word format.
pub const RTF_TEXT_MEDIA_TYPE: &str = "text/rtf";

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const RTF_MAGIC: &[u8] = b"{\\rtf";
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";
const SNIFF_LEN: usize = 64;

/// Magic prefixes of common formats that are never accepted.
const FOREIGN_MAGIC: &[(&[u8], &str)] = &[
    (b"%PDF-", "application/pdf"),
    (b"\xD0\xCF\x11\xE0\xA1\xB1\x1A\xE1", "application/x-ole-storage"),
    (b"\x89PNG\r\n\x1a\n", "image/png"),
    (b"\xFF\xD8\xFF", "image/jpeg"),
    (b"GIF8", "image/gif"),
];

/// The two document formats the engine understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DocumentFormat {
    /// Zip package of XML parts (`.docx`)
    StructuredPackage,
    /// Flat control-word text (`.rtf`)
    ControlWord,
}

impl DocumentFormat {
    /// Every supported format, in routing order.
    pub const ALL: [DocumentFormat; 2] =
        [DocumentFormat::StructuredPackage, DocumentFormat::ControlWord];

    /// Lowercase extension without the leading dot.
    pub fn extension(self) -> &'static str {
        match self {
            DocumentFormat::StructuredPackage => "docx",
            DocumentFormat::ControlWord => "rtf",
        }
    }

    /// Media types accepted for this format.
    pub fn media_types(self) -> &'static [&'static str] {
        match self {
            DocumentFormat::StructuredPackage => &[DOCX_MEDIA_TYPE],
            DocumentFormat::ControlWord => &[RTF_MEDIA_TYPE, RTF_TEXT_MEDIA_TYPE],
        }
    }

    /// Look up a format by extension, case-insensitively, with or without dot.
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.strip_prefix('.').unwrap_or(ext);
        Self::ALL
            .into_iter()
            .find(|format| format.extension().eq_ignore_ascii_case(ext))
    }

    /// Look up a format from a path's extension.
    ///
    /// # Errors
    /// `UnsupportedFormat` when the path has no extension or an unknown one.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| {
                Error::UnsupportedFormat(format!("{} has no file extension", path.display()))
            })?;
        Self::from_extension(ext).ok_or_else(|| {
            Error::UnsupportedFormat(format!(
                ".{ext} (supported: {})",
                supported_extensions().join(", ")
            ))
        })
    }
}

impl std::fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocumentFormat::StructuredPackage => write!(f, "DOCX"),
            DocumentFormat::ControlWord => write!(f, "RTF"),
        }
    }
}

/// Supported extensions, lowercase with the leading dot.
pub fn supported_extensions() -> Vec<&'static str> {
    DocumentFormat::ALL
        .iter()
        .map(|format| match format {
            DocumentFormat::StructuredPackage => ".docx",
            DocumentFormat::ControlWord => ".rtf",
        })
        .collect()
}

/// Every accepted media type.
pub fn supported_media_types() -> Vec<&'static str> {
    DocumentFormat::ALL
        .iter()
        .flat_map(|format| format.media_types().iter().copied())
        .collect()
}

/// Media type implied by a file extension, if supported.
pub fn media_type_for_extension(ext: &str) -> Option<&'static str> {
    DocumentFormat::from_extension(ext).map(|format| format.media_types()[0])
}

/// Guess a media type from the leading bytes of a file.
///
/// Returns `None` when the bytes match no known signature.
pub fn sniff_media_type(data: &[u8]) -> Option<&'static str> {
    let data = data.strip_prefix(UTF8_BOM).unwrap_or(data);
    let start = data
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(data.len());
    let data = &data[start..];

    if data.starts_with(ZIP_MAGIC) {
        return Some(DOCX_MEDIA_TYPE);
    }
    if data.starts_with(RTF_MAGIC) {
        return Some(RTF_MEDIA_TYPE);
    }
    FOREIGN_MAGIC
        .iter()
        .find(|(magic, _)| data.starts_with(magic))
        .map(|(_, media_type)| *media_type)
}

/// Check that `path` is an existing file of a supported format.
///
/// # Errors
/// * `Io` when the path does not exist or cannot be read
/// * `UnsupportedFormat` when the extension is unsupported, or the sniffed
///   media type is foreign or disagrees with the extension
pub fn validate_file<P: AsRef<Path>>(path: P) -> Result<DocumentFormat> {
    let path = path.as_ref();
    let format = DocumentFormat::from_path(path)?;

    let metadata = std::fs::metadata(path)?;
    if !metadata.is_file() {
        return Err(Error::UnsupportedFormat(format!(
            "{} is not a regular file",
            path.display()
        )));
    }

    let file = File::open(path)?;
    let mut header = Vec::with_capacity(SNIFF_LEN);
    BufReader::new(file)
        .take(SNIFF_LEN as u64)
        .read_to_end(&mut header)?;

    if let Some(media_type) = sniff_media_type(&header) {
        if !format.media_types().contains(&media_type) {
            return Err(Error::UnsupportedFormat(format!(
                "{} has extension .{} but content of type {media_type}",
                path.display(),
                format.extension()
            )));
        }
    }

    Ok(format)
}

/// Check whether a path is a valid supported document.
pub fn is_supported<P: AsRef<Path>>(path: P) -> bool {
    validate_file(path).is_ok()
}
