//! Format adapters behind the dispatcher.
//!
//! Each supported format has one free-standing adapter implementing
//! [`FormatAdapter`]. The [`AdapterRegistry`] maps file extensions to
//! adapters and is the only place routing decisions are made.
//!
//! # Example
//!
//! ```no_run
//! use wpadjust::adapter::AdapterRegistry;
//! use wpadjust::ModificationSettings;
//! use std::path::Path;
//!
//! fn main() -> wpadjust::Result<()> {
//!     let registry = AdapterRegistry::with_defaults();
//!     let adapter = registry.for_path(Path::new("report.docx"))?;
//!
//!     let metadata = adapter.inspect(Path::new("/tmp/report.docx"))?;
//!     let settings = ModificationSettings::new().with_line_spacing(1.5);
//!     let output = adapter.apply(metadata, &settings)?;
//!     println!("{}", output.display());
//!     Ok(())
//! }
//! ```

mod docx;
mod rtf;

pub use docx::DocxAdapter;
pub use rtf::{ignored_settings, RtfAdapter};

use crate::detect::DocumentFormat;
use crate::error::{Error, Result};
use crate::model::{DocumentMetadata, ModificationSettings};
use std::collections::HashMap;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Suffix appended to the file stem of every modified document.
pub const OUTPUT_SUFFIX: &str = "_modified";

/// Capability shared by the format adapters.
pub trait FormatAdapter: Send + Sync {
    /// Format this adapter owns.
    fn format(&self) -> DocumentFormat;

    /// Get the name of this adapter.
    fn name(&self) -> &str;

    /// Lowercase extensions without the leading dot (e.g., `["docx"]`).
    fn supported_extensions(&self) -> &[&str];

    /// Parse the document at `path`, which must be absolute.
    fn inspect(&self, path: &Path) -> Result<DocumentMetadata>;

    /// Apply `settings` to an inspected document and write the result next
    /// to the original. Returns the output path.
    fn apply(&self, metadata: DocumentMetadata, settings: &ModificationSettings)
        -> Result<PathBuf>;

    /// Check if this adapter handles the given extension.
    fn supports_extension(&self, ext: &str) -> bool {
        let ext_lower = ext.to_lowercase();
        self.supported_extensions().iter().any(|e| *e == ext_lower)
    }
}

/// Extension-keyed adapter lookup.
pub struct AdapterRegistry {
    adapters: HashMap<String, Arc<dyn FormatAdapter>>,
}

impl AdapterRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            adapters: HashMap::new(),
        }
    }

    /// Create a registry with both built-in adapters.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(DocxAdapter::new()));
        registry.register(Arc::new(RtfAdapter::new()));
        registry
    }

    /// Register an adapter for all its supported extensions.
    pub fn register(&mut self, adapter: Arc<dyn FormatAdapter>) {
        for ext in adapter.supported_extensions() {
            self.adapters.insert(ext.to_lowercase(), adapter.clone());
        }
    }

    /// Get an adapter by file extension, case-insensitively.
    pub fn get_by_extension(&self, ext: &str) -> Option<Arc<dyn FormatAdapter>> {
        let ext = ext.strip_prefix('.').unwrap_or(ext);
        self.adapters.get(&ext.to_lowercase()).cloned()
    }

    /// Check if an extension is supported.
    pub fn supports(&self, ext: &str) -> bool {
        self.get_by_extension(ext).is_some()
    }

    /// Registered extensions, sorted, without the leading dot.
    pub fn supported_extensions(&self) -> Vec<&str> {
        let mut extensions: Vec<&str> = self.adapters.keys().map(|s| s.as_str()).collect();
        extensions.sort_unstable();
        extensions
    }

    /// Adapter for a path, chosen by its extension alone.
    ///
    /// # Errors
    /// `UnsupportedFormat` when the extension is missing or not registered.
    /// The file itself is never touched.
    pub fn for_path(&self, path: &Path) -> Result<Arc<dyn FormatAdapter>> {
        let ext = path.extension().and_then(OsStr::to_str).ok_or_else(|| {
            Error::UnsupportedFormat(format!("{} has no file extension", path.display()))
        })?;

        self.get_by_extension(ext).ok_or_else(|| {
            Error::UnsupportedFormat(format!(
                ".{ext} (supported: .{})",
                self.supported_extensions().join(", .")
            ))
        })
    }
}

impl Default for AdapterRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Where the modified copy of `source` is written: `{stem}_modified.{ext}`
/// in the same directory.
pub fn output_path(source: &Path) -> PathBuf {
    let mut name = source.file_stem().unwrap_or_default().to_os_string();
    name.push(OUTPUT_SUFFIX);
    if let Some(ext) = source.extension() {
        name.push(".");
        name.push(ext);
    }
    source.with_file_name(name)
}
