//! Structured-package adapter.

use super::{output_path, FormatAdapter};
use crate::detect::DocumentFormat;
use crate::docx::{self, DocxPackage};
use crate::error::{Error, Result};
use crate::docx::xml::XmlElement;
use crate::model::{DocumentHandle, DocumentMetadata, ModificationSettings};
use std::path::{Path, PathBuf};

/// Reads and rewrites `.docx` packages.
///
/// Changes are made to the package parsed by `inspect`; the source file is
/// not read again.
#[derive(Debug, Clone, Default)]
pub struct DocxAdapter {
    _private: (),
}

impl DocxAdapter {
    pub fn new() -> Self {
        Self { _private: () }
    }
}

impl FormatAdapter for DocxAdapter {
    fn format(&self) -> DocumentFormat {
        DocumentFormat::StructuredPackage
    }

    fn name(&self) -> &str {
        "docx"
    }

    fn supported_extensions(&self) -> &[&str] {
        &["docx"]
    }

    fn inspect(&self, path: &Path) -> Result<DocumentMetadata> {
        let package = DocxPackage::open(path)?;
        let properties = package.properties()?;
        log::debug!(
            "{}: {} paragraphs, {} tables, {} sections",
            path.display(),
            properties.paragraph_count,
            properties.table_count,
            properties.page_count
        );

        Ok(DocumentMetadata::new(
            path.to_path_buf(),
            self.format(),
            DocumentHandle::Package(Box::new(package)),
            properties,
        ))
    }

    fn apply(
        &self,
        metadata: DocumentMetadata,
        settings: &ModificationSettings,
    ) -> Result<PathBuf> {
        let (source, _, handle) = metadata.into_parts();
        let DocumentHandle::Package(mut package) = handle else {
            return Err(Error::Package(
                "inspected document does not hold a package".to_string(),
            ));
        };
        let document = package.document_mut();

        if settings.touches_layout() {
            apply_layout(document, settings)
                .map_err(|e| Error::modification_failed(&source, "set page layout", e))?;
        }

        if !settings.font.is_empty() {
            let runs = docx::set_run_font(
                document,
                settings.font.family.as_deref(),
                settings.font.size,
            )
            .map_err(|e| Error::modification_failed(&source, "set font", e))?;
            log::debug!("font changed on {runs} run(s)");
        }

        if let Some(multiplier) = settings.line_spacing {
            let paragraphs = docx::set_line_spacing(document, multiplier)
                .map_err(|e| Error::modification_failed(&source, "set line spacing", e))?;
            log::debug!("line spacing set on {paragraphs} paragraph(s)");
        }

        let output = output_path(&source);
        package
            .save(&output)
            .map_err(|e| Error::modification_failed(&source, "save document", e))?;
        log::info!("Modified document saved to {}", output.display());

        Ok(output)
    }
}

/// Page size and margins, on every section.
fn apply_layout(document: &mut XmlElement, settings: &ModificationSettings) -> Result<()> {
    if let Some(size) = settings.page_size {
        let sections = docx::set_page_size(document, size.width, size.height)?;
        log::debug!("page size set on {sections} section(s)");
    }
    for (side, inches) in settings.margins.iter() {
        let sections = docx::set_margin(document, side, inches)?;
        log::debug!("{} set on {sections} section(s)", side.name());
    }
    Ok(())
}
