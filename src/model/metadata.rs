//! Document-level types produced by `inspect`.

use super::settings::PagePreset;
use crate::detect::DocumentFormat;
use crate::docx::DocxPackage;
use crate::rtf::RtfSource;
use crate::units::{DEFAULT_MARGIN_IN, LETTER_HEIGHT_IN, LETTER_WIDTH_IN};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Heading style names recognised in paragraph classification.
pub const HEADING_STYLES: [&str; 6] = [
    "Heading 1",
    "Heading 2",
    "Heading 3",
    "Heading 4",
    "Heading 5",
    "Heading 6",
];

/// Title reported when the document declares none.
pub const FALLBACK_TITLE: &str = "Untitled";
/// Author reported when the document declares none.
pub const FALLBACK_AUTHOR: &str = "Unknown";

/// Parsed document owned by exactly one [`DocumentMetadata`].
///
/// Each adapter stores the variant it reads and expects the same variant
/// back in `apply`.
pub enum DocumentHandle {
    /// In-memory structured package, mutated in place by `apply`.
    Package(Box<DocxPackage>),
    /// Raw control-word text as read from disk.
    Text(RtfSource),
}

impl DocumentHandle {
    fn kind(&self) -> &'static str {
        match self {
            DocumentHandle::Package(_) => "package",
            DocumentHandle::Text(_) => "text",
        }
    }
}

/// A freshly inspected document.
///
/// Holds the parsed document alongside the display properties derived from
/// it. The value is consumed by [`crate::apply`], so a document can only be
/// applied once per inspection.
pub struct DocumentMetadata {
    source_path: PathBuf,
    format: DocumentFormat,
    handle: DocumentHandle,

    /// Display-only projection of the document. Never written back.
    pub properties: DocumentProperties,
}

impl DocumentMetadata {
    /// Bundle a parsed document with its derived properties.
    ///
    /// `source_path` should be absolute; it is where `apply` writes next to.
    pub fn new(
        source_path: PathBuf,
        format: DocumentFormat,
        handle: DocumentHandle,
        properties: DocumentProperties,
    ) -> Self {
        Self {
            source_path,
            format,
            handle,
            properties,
        }
    }

    /// Absolute location of the original file.
    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    /// Format of the original file.
    pub fn format(&self) -> DocumentFormat {
        self.format
    }

    /// Split into source path, format and handle, dropping the properties.
    pub fn into_parts(self) -> (PathBuf, DocumentFormat, DocumentHandle) {
        (self.source_path, self.format, self.handle)
    }
}

impl fmt::Debug for DocumentMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentMetadata")
            .field("source_path", &self.source_path)
            .field("format", &self.format)
            .field("handle", &self.handle.kind())
            .field("properties", &self.properties)
            .finish()
    }
}

/// Normalised, human-readable document properties.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentProperties {
    /// Document title
    pub title: String,

    /// Document author
    pub author: String,

    /// Page size of the first section, in inches
    pub page_dimensions: PageDimensions,

    /// Margins of the first section, in inches
    pub margins: Margins,

    /// Number of runs declaring each font family
    pub fonts_used: HashMap<String, usize>,

    /// Paragraph count per heading level
    pub heading_counts: HeadingCounts,

    pub table_count: usize,
    pub paragraph_count: usize,
    pub word_count: usize,
    pub page_count: usize,
}

impl DocumentProperties {
    /// Fonts sorted by descending usage, ties broken by name.
    pub fn fonts_by_usage(&self) -> Vec<(&str, usize)> {
        let mut fonts: Vec<(&str, usize)> = self
            .fonts_used
            .iter()
            .map(|(name, count)| (name.as_str(), *count))
            .collect();
        fonts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        fonts
    }

    /// Total number of heading paragraphs across all levels.
    pub fn heading_total(&self) -> usize {
        self.heading_counts.total()
    }
}

impl Default for DocumentProperties {
    fn default() -> Self {
        Self {
            title: FALLBACK_TITLE.to_string(),
            author: FALLBACK_AUTHOR.to_string(),
            page_dimensions: PageDimensions::default(),
            margins: Margins::default(),
            fonts_used: HashMap::new(),
            heading_counts: HeadingCounts::default(),
            table_count: 0,
            paragraph_count: 0,
            word_count: 0,
            page_count: 0,
        }
    }
}

/// Page width and height in inches.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PageDimensions {
    pub width: f64,
    pub height: f64,
}

impl PageDimensions {
    /// US Letter, 8.5 x 11 inches.
    pub const fn letter() -> Self {
        Self {
            width: LETTER_WIDTH_IN,
            height: LETTER_HEIGHT_IN,
        }
    }
}

impl PageDimensions {
    /// Named paper size these dimensions match, if any.
    pub fn preset(&self) -> Option<PagePreset> {
        PagePreset::detect(self.width, self.height)
    }
}

impl Default for PageDimensions {
    fn default() -> Self {
        Self::letter()
    }
}

/// Page margins in inches.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Margins {
    pub top: f64,
    pub bottom: f64,
    pub left: f64,
    pub right: f64,
}

impl Margins {
    /// The same margin on every side.
    pub const fn uniform(inches: f64) -> Self {
        Self {
            top: inches,
            bottom: inches,
            left: inches,
            right: inches,
        }
    }
}

impl Default for Margins {
    fn default() -> Self {
        Self::uniform(DEFAULT_MARGIN_IN)
    }
}

/// Paragraph counts for the six heading levels.
///
/// All six levels are always present; formats without heading styles
/// report zeros.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeadingCounts([usize; 6]);

impl HeadingCounts {
    /// Count for a heading level (1-6). Out-of-range levels report zero.
    pub fn level(&self, level: usize) -> usize {
        match level {
            1..=6 => self.0[level - 1],
            _ => 0,
        }
    }

    /// Count for a heading style name such as `"Heading 2"`.
    pub fn get(&self, style_name: &str) -> Option<usize> {
        heading_level(style_name).map(|level| self.level(level))
    }

    /// Record one paragraph at `level` (1-6). Other levels are ignored.
    pub fn increment(&mut self, level: usize) {
        if (1..=6).contains(&level) {
            self.0[level - 1] += 1;
        }
    }

    /// Iterate `(style name, count)` pairs from level 1 to 6.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, usize)> + '_ {
        HEADING_STYLES.iter().copied().zip(self.0.iter().copied())
    }

    pub fn total(&self) -> usize {
        self.0.iter().sum()
    }
}

impl Serialize for HeadingCounts {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(HEADING_STYLES.len()))?;
        for (name, count) in self.iter() {
            map.serialize_entry(name, &count)?;
        }
        map.end()
    }
}

/// Heading level for one of the six fixed style names.
pub fn heading_level(style_name: &str) -> Option<usize> {
    HEADING_STYLES
        .iter()
        .position(|name| *name == style_name)
        .map(|idx| idx + 1)
}
