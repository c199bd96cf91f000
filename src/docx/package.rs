//! In-memory structured package.
//!
//! The zip container is read once. The main document part, core properties
//! and style names are parsed up front; every other entry stays in the
//! original compressed form and is raw-copied on save.

use super::body;
use super::xml::{XmlDocument, XmlElement};
use crate::error::{Error, Result};
use crate::model::{DocumentProperties, FALLBACK_AUTHOR, FALLBACK_TITLE};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Cursor, Read, Seek, Write};
use std::path::Path;
use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

const PACKAGE_RELS: &str = "_rels/.rels";
const DEFAULT_MAIN_PART: &str = "word/document.xml";
const DEFAULT_CORE_PART: &str = "docProps/core.xml";

const REL_OFFICE_DOCUMENT: &str = "/officeDocument";
const REL_CORE_PROPERTIES: &str = "/core-properties";
const REL_STYLES: &str = "/styles";

/// A structured-package document held in memory.
#[derive(Debug, Clone)]
pub struct DocxPackage {
    /// Original container bytes
    data: Vec<u8>,
    /// Zip entry name of the main document part
    main_part: String,
    document: XmlDocument,
    core: CoreProperties,
    styles: StyleSheet,
}

/// Title and author from the core properties part.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoreProperties {
    pub title: Option<String>,
    pub creator: Option<String>,
}

/// Paragraph style names keyed by style id.
#[derive(Debug, Clone, Default)]
pub struct StyleSheet {
    names: HashMap<String, String>,
    default_paragraph: Option<String>,
}

impl DocxPackage {
    /// Open a package from disk.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = std::fs::read(path)?;
        Self::from_bytes(data)
    }

    /// Parse a package from its container bytes.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let mut archive = ZipArchive::new(Cursor::new(data.as_slice()))?;

        let package_rels = read_part(&mut archive, PACKAGE_RELS)?
            .map(|bytes| XmlDocument::parse(&bytes))
            .transpose()?;

        let main_part = package_rels
            .as_ref()
            .and_then(|rels| relationship_target(&rels.root, REL_OFFICE_DOCUMENT, ""))
            .unwrap_or_else(|| DEFAULT_MAIN_PART.to_string());

        let document_bytes = read_part(&mut archive, &main_part)?.ok_or_else(|| {
            Error::Package(format!("main document part {main_part} is missing"))
        })?;
        let document = XmlDocument::parse(&document_bytes)?;
        if !document.root.is("document") || document.root.child("body").is_none() {
            return Err(Error::Xml(format!(
                "{main_part} is not a word-processing document body"
            )));
        }

        let core_part = package_rels
            .as_ref()
            .and_then(|rels| relationship_target(&rels.root, REL_CORE_PROPERTIES, ""))
            .unwrap_or_else(|| DEFAULT_CORE_PART.to_string());
        let core = match read_part(&mut archive, &core_part)? {
            Some(bytes) => CoreProperties::parse(&bytes)?,
            None => CoreProperties::default(),
        };

        let styles = match styles_part(&mut archive, &main_part)? {
            Some(bytes) => StyleSheet::parse(&bytes)?,
            None => StyleSheet::default(),
        };

        drop(archive);
        Ok(Self {
            data,
            main_part,
            document,
            core,
            styles,
        })
    }

    /// Root `w:document` element of the main part.
    pub fn document(&self) -> &XmlElement {
        &self.document.root
    }

    pub fn document_mut(&mut self) -> &mut XmlElement {
        &mut self.document.root
    }

    /// Derive the display properties of this package.
    pub fn properties(&self) -> Result<DocumentProperties> {
        let stats = body::inspect(self.document(), &self.styles)?;
        Ok(DocumentProperties {
            title: self
                .core
                .title
                .clone()
                .unwrap_or_else(|| FALLBACK_TITLE.to_string()),
            author: self
                .core
                .creator
                .clone()
                .unwrap_or_else(|| FALLBACK_AUTHOR.to_string()),
            page_dimensions: stats.page_dimensions,
            margins: stats.margins,
            fonts_used: stats.fonts_used,
            heading_counts: stats.heading_counts,
            table_count: stats.table_count,
            paragraph_count: stats.paragraph_count,
            word_count: stats.word_count,
            page_count: stats.section_count,
        })
    }

    /// Write the package to `path`, replacing any existing file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        self.write_to(&mut writer)?;
        writer.flush()?;
        Ok(())
    }

    /// Write the package: the main part is re-serialized, every other entry
    /// is copied without recompression.
    pub fn write_to<W: Write + Seek>(&self, writer: W) -> Result<()> {
        let document_xml = self.document.to_bytes()?;
        let mut archive = ZipArchive::new(Cursor::new(self.data.as_slice()))?;
        let mut zip = ZipWriter::new(writer);

        for index in 0..archive.len() {
            let entry = archive.by_index_raw(index)?;
            if entry.name() == self.main_part {
                let options = SimpleFileOptions::default()
                    .compression_method(CompressionMethod::Deflated);
                zip.start_file(self.main_part.clone(), options)?;
                zip.write_all(&document_xml)?;
            } else {
                zip.raw_copy_file(entry)?;
            }
        }

        zip.finish()?;
        Ok(())
    }
}

impl CoreProperties {
    fn parse(data: &[u8]) -> Result<Self> {
        let doc = XmlDocument::parse(data)?;
        let field = |local: &str| {
            doc.root
                .child(local)
                .map(|e| e.text().trim().to_string())
                .filter(|s| !s.is_empty())
        };
        Ok(Self {
            title: field("title"),
            creator: field("creator"),
        })
    }
}

impl StyleSheet {
    fn parse(data: &[u8]) -> Result<Self> {
        let doc = XmlDocument::parse(data)?;
        let mut sheet = StyleSheet::default();

        for style in doc.root.elements().filter(|e| e.is("style")) {
            if style.attr("type") != Some("paragraph") {
                continue;
            }
            let Some(id) = style.attr("styleId") else {
                continue;
            };
            if let Some(name) = style.child("name").and_then(|n| n.attr("val")) {
                sheet.names.insert(id.to_string(), ui_style_name(name));
            }
            if matches!(style.attr("default"), Some("1") | Some("true") | Some("on")) {
                sheet.default_paragraph = Some(id.to_string());
            }
        }
        Ok(sheet)
    }

    /// Display name of the paragraph style a paragraph with `style_id` uses.
    ///
    /// Paragraphs without a style id use the default paragraph style.
    pub fn paragraph_style_name(&self, style_id: Option<&str>) -> Option<&str> {
        let id = style_id.or(self.default_paragraph.as_deref())?;
        self.names.get(id).map(|s| s.as_str())
    }
}

/// Built-in styles are stored lowercase (`heading 1`) but shown title-cased.
fn ui_style_name(name: &str) -> String {
    match name.strip_prefix("heading ") {
        Some(level) => format!("Heading {level}"),
        None if name == "normal" => "Normal".to_string(),
        None if name == "title" => "Title".to_string(),
        None => name.to_string(),
    }
}

fn read_part<R: Read + Seek>(archive: &mut ZipArchive<R>, name: &str) -> Result<Option<Vec<u8>>> {
    match archive.by_name(name) {
        Ok(mut file) => {
            let mut data = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut data)?;
            Ok(Some(data))
        }
        Err(ZipError::FileNotFound) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Locate the styles part through the main part's relationships.
fn styles_part<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    main_part: &str,
) -> Result<Option<Vec<u8>>> {
    let (dir, file_name) = main_part.rsplit_once('/').unwrap_or(("", main_part));
    let rels_name = if dir.is_empty() {
        format!("_rels/{file_name}.rels")
    } else {
        format!("{dir}/_rels/{file_name}.rels")
    };

    let target = match read_part(archive, &rels_name)? {
        Some(bytes) => {
            let rels = XmlDocument::parse(&bytes)?;
            relationship_target(&rels.root, REL_STYLES, dir)
        }
        None => None,
    };
    let target = target.unwrap_or_else(|| resolve_target(dir, "styles.xml"));
    read_part(archive, &target)
}

/// Target of the first relationship whose type ends with `type_suffix`,
/// resolved against `base_dir`.
fn relationship_target(rels: &XmlElement, type_suffix: &str, base_dir: &str) -> Option<String> {
    rels.elements()
        .filter(|e| e.is("Relationship"))
        .filter(|e| e.attr("TargetMode") != Some("External"))
        .find(|e| e.attr("Type").is_some_and(|t| t.ends_with(type_suffix)))
        .and_then(|e| e.attr("Target"))
        .map(|target| resolve_target(base_dir, target))
}

/// Resolve a relationship target to a zip entry name.
fn resolve_target(base_dir: &str, target: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    let joined;
    let path = match target.strip_prefix('/') {
        Some(absolute) => absolute,
        None if base_dir.is_empty() => target,
        None => {
            joined = format!("{base_dir}/{target}");
            joined.as_str()
        }
    };
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            other => parts.push(other),
        }
    }
    parts.join("/")
}
