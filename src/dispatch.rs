//! The two engine operations.
//!
//! Routing is by file extension only. Every adapter failure is wrapped with
//! the document path and the operation that failed.

use crate::adapter::AdapterRegistry;
use crate::error::{Error, Result};
use crate::model::{DocumentMetadata, ModificationSettings};
use std::path::{Path, PathBuf};

/// Inspect the document at `path`.
///
/// # Errors
/// * `UnsupportedFormat` when the extension is not supported; the file is
///   not opened in that case
/// * `InvalidDocument` when the document cannot be read or parsed
///
/// # Example
///
/// ```no_run
/// let metadata = wpadjust::inspect("report.docx")?;
/// println!("{} by {}", metadata.properties.title, metadata.properties.author);
/// # Ok::<(), wpadjust::Error>(())
/// ```
pub fn inspect<P: AsRef<Path>>(path: P) -> Result<DocumentMetadata> {
    let path = path.as_ref();
    let adapter = AdapterRegistry::with_defaults().for_path(path)?;
    let path = absolute(path).map_err(|e| Error::invalid_document(path, e))?;

    log::info!("Inspecting {} as {}", path.display(), adapter.format());
    adapter
        .inspect(&path)
        .map_err(|e| Error::invalid_document(&path, e))
}

/// Apply `settings` to an inspected document.
///
/// Consumes `metadata`; inspect again to make further changes. The result
/// is written to `{stem}_modified.{ext}` next to the source and its path
/// returned.
///
/// # Errors
/// * `UnsupportedFormat` when the source extension is not supported
/// * `InvalidSettings` when a value is out of range; nothing is written
/// * `ModificationFailed` when changing or saving the document fails
pub fn apply(metadata: DocumentMetadata, settings: &ModificationSettings) -> Result<PathBuf> {
    let source = metadata.source_path().to_path_buf();
    let adapter = AdapterRegistry::with_defaults().for_path(&source)?;
    settings.validate()?;

    log::info!("Applying changes to {}", source.display());
    adapter
        .apply(metadata, settings)
        .map_err(|e| Error::modification_failed(&source, "apply changes", e))
}

/// Extensions routed by [`inspect`] and [`apply`], lowercase with the dot.
pub fn supported_extensions() -> Vec<String> {
    AdapterRegistry::with_defaults()
        .supported_extensions()
        .into_iter()
        .map(|ext| format!(".{ext}"))
        .collect()
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}
