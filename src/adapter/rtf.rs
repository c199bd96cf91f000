//! Control-word adapter.
//!
//! Only margins are written, and only as header words the document does not
//! already contain. Page size, font and line spacing are accepted but left
//! unchanged; this is logged at `warn` and never an error.

use super::{output_path, FormatAdapter};
use crate::detect::DocumentFormat;
use crate::error::{Error, Result};
use crate::model::{DocumentHandle, DocumentMetadata, ModificationSettings};
use crate::rtf::{patch, RtfSource};
use std::path::{Path, PathBuf};

/// Reads and patches `.rtf` documents.
#[derive(Debug, Clone, Default)]
pub struct RtfAdapter {
    _private: (),
}

impl RtfAdapter {
    pub fn new() -> Self {
        Self { _private: () }
    }
}

/// Names of the requested settings this format leaves unchanged.
pub fn ignored_settings(settings: &ModificationSettings) -> Vec<&'static str> {
    let mut ignored = Vec::new();
    if settings.page_size.is_some() {
        ignored.push("page size");
    }
    if settings.font.family.is_some() {
        ignored.push("font family");
    }
    if settings.font.size.is_some() {
        ignored.push("font size");
    }
    if settings.line_spacing.is_some() {
        ignored.push("line spacing");
    }
    ignored
}

impl FormatAdapter for RtfAdapter {
    fn format(&self) -> DocumentFormat {
        DocumentFormat::ControlWord
    }

    fn name(&self) -> &str {
        "rtf"
    }

    fn supported_extensions(&self) -> &[&str] {
        &["rtf"]
    }

    fn inspect(&self, path: &Path) -> Result<DocumentMetadata> {
        let source = RtfSource::read(path)?;
        let properties = source.properties();

        Ok(DocumentMetadata::new(
            path.to_path_buf(),
            self.format(),
            DocumentHandle::Text(source),
            properties,
        ))
    }

    fn apply(
        &self,
        metadata: DocumentMetadata,
        settings: &ModificationSettings,
    ) -> Result<PathBuf> {
        let (path, _, handle) = metadata.into_parts();
        let DocumentHandle::Text(source) = handle else {
            return Err(Error::ControlWord(
                "inspected document does not hold control-word text".to_string(),
            ));
        };

        let ignored = ignored_settings(settings);
        if !ignored.is_empty() {
            log::warn!(
                "{}: {} not supported for RTF documents, left unchanged",
                path.display(),
                ignored.join(", ")
            );
        }

        let patched = patch::patch_margins(source.as_bytes(), &settings.margins)
            .map_err(|e| Error::modification_failed(&path, "set margins", e))?;
        if !patched.inserted.is_empty() {
            log::debug!("inserted {} margin word(s)", patched.inserted.len());
        }
        for side in &patched.skipped {
            log::warn!(
                "{}: {} already set in the document, left unchanged",
                path.display(),
                side.name()
            );
        }

        let output = output_path(&path);
        std::fs::write(&output, &patched.bytes)
            .map_err(|e| Error::modification_failed(&path, "write document", e.into()))?;
        log::info!("Modified document saved to {}", output.display());

        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MarginSide;

    #[test]
    fn test_ignored_settings() {
        let settings = ModificationSettings::new()
            .with_font_family("Arial")
            .with_line_spacing(2.0)
            .with_margin(MarginSide::Top, 1.0);
        assert_eq!(ignored_settings(&settings), vec!["font family", "line spacing"]);
        assert!(ignored_settings(&ModificationSettings::new()).is_empty());
    }
}
