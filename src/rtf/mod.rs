//! Control-word (`.rtf`) documents.
//!
//! The document is kept as the raw bytes read from disk. Statistics come
//! from a plain-text rendering plus a few targeted scans; writes are limited
//! to splicing margin words into the header (see [`patch`]).

pub mod encoding;
pub mod patch;
pub mod scan;
pub mod text;

use crate::error::{Error, Result};
use crate::model::{
    DocumentProperties, HeadingCounts, Margins, PageDimensions, FALLBACK_AUTHOR, FALLBACK_TITLE,
};
use std::borrow::Cow;
use std::fmt;
use std::path::Path;

pub use patch::MarginPatch;

/// Raw control-word document.
#[derive(Clone)]
pub struct RtfSource {
    raw: Vec<u8>,
}

impl RtfSource {
    /// Read a document from disk.
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = std::fs::read(path)?;
        Self::from_bytes(raw)
    }

    /// Wrap raw bytes, checking for the `{\rtf` header.
    pub fn from_bytes(raw: Vec<u8>) -> Result<Self> {
        if patch::header_end(&raw).is_none() {
            return Err(Error::ControlWord(
                "content does not start with {\\rtf".to_string(),
            ));
        }
        Ok(Self { raw })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.raw
    }

    /// Source as text. Invalid UTF-8 sequences are replaced.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.raw)
    }

    pub fn plain_text(&self) -> String {
        text::to_plain_text(&self.text())
    }

    /// Derive display properties.
    ///
    /// Page size and margins are not parsed; the Letter defaults are
    /// reported. Heading counts are always zero.
    pub fn properties(&self) -> DocumentProperties {
        let source = self.text();
        let plain = text::to_plain_text(&source);

        DocumentProperties {
            title: scan::title(&source).unwrap_or_else(|| FALLBACK_TITLE.to_string()),
            author: scan::author(&source).unwrap_or_else(|| FALLBACK_AUTHOR.to_string()),
            page_dimensions: PageDimensions::letter(),
            margins: Margins::default(),
            fonts_used: scan::font_usage(&source),
            heading_counts: HeadingCounts::default(),
            table_count: scan::table_count(&source),
            paragraph_count: plain.lines().filter(|line| !line.trim().is_empty()).count(),
            word_count: plain.split_whitespace().count(),
            page_count: 1,
        }
    }
}

impl fmt::Debug for RtfSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RtfSource")
            .field("len", &self.raw.len())
            .finish()
    }
}
