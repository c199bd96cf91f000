//! Tests for the adapter registry and the dispatcher.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use wpadjust::adapter::{output_path, DocxAdapter, RtfAdapter};
use wpadjust::rtf::RtfSource;
use wpadjust::{
    inspect, supported_extensions, validate_file, AdapterRegistry, DocumentFormat,
    DocumentHandle, DocumentMetadata, Error, FormatAdapter, ModificationSettings, Result,
};

/// Adapter that reads control-word text under other extensions and copies
/// it unchanged on apply.
struct MockAdapter {
    extensions: Vec<&'static str>,
    name: &'static str,
}

impl MockAdapter {
    fn new(extensions: Vec<&'static str>, name: &'static str) -> Self {
        Self { extensions, name }
    }
}

impl FormatAdapter for MockAdapter {
    fn format(&self) -> DocumentFormat {
        DocumentFormat::ControlWord
    }

    fn name(&self) -> &str {
        self.name
    }

    fn supported_extensions(&self) -> &[&str] {
        &self.extensions
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

    fn apply(&self, metadata: DocumentMetadata, _settings: &ModificationSettings) -> Result<PathBuf> {
        let (path, _, handle) = metadata.into_parts();
        let DocumentHandle::Text(source) = handle else {
            return Err(Error::UnsupportedFormat(self.name.to_string()));
        };
        let output = output_path(&path);
        std::fs::write(&output, source.as_bytes())?;
        Ok(output)
    }
}

#[test]
fn test_registry_new_is_empty() {
    let registry = AdapterRegistry::new();

    assert!(!registry.supports("docx"));
    assert!(!registry.supports("rtf"));
    assert!(registry.supported_extensions().is_empty());
}

#[test]
fn test_registry_with_defaults() {
    let registry = AdapterRegistry::with_defaults();

    assert!(registry.supports("docx"));
    assert!(registry.supports("DOCX"));
    assert!(registry.supports(".rtf"));
    assert!(!registry.supports("doc"));
    assert!(!registry.supports("pdf"));
}

#[test]
fn test_registry_register() {
    let mut registry = AdapterRegistry::new();
    registry.register(Arc::new(MockAdapter::new(vec!["txt", "text"], "text")));

    assert!(registry.supports("txt"));
    assert!(registry.supports("TEXT"));
    assert_eq!(registry.supported_extensions(), vec!["text", "txt"]);

    let adapter = registry.get_by_extension("txt").unwrap();
    assert_eq!(adapter.name(), "text");
    assert!(adapter.supports_extension("Text"));
    assert!(adapter.inspect(Path::new("/tmp/a.txt")).is_err());
}

#[test]
fn test_registry_later_registration_wins() {
    let mut registry = AdapterRegistry::with_defaults();
    registry.register(Arc::new(MockAdapter::new(vec!["rtf"], "override")));

    assert_eq!(registry.get_by_extension("rtf").unwrap().name(), "override");
    assert_eq!(registry.get_by_extension("docx").unwrap().name(), "docx");
}

#[test]
fn test_builtin_adapter_extensions() {
    let docx = DocxAdapter::new();
    assert_eq!(docx.supported_extensions(), &["docx"]);
    assert_eq!(docx.format(), DocumentFormat::StructuredPackage);
    assert!(docx.supports_extension("DOCX"));
    assert!(!docx.supports_extension("rtf"));

    let rtf = RtfAdapter::new();
    assert_eq!(rtf.supported_extensions(), &["rtf"]);
    assert_eq!(rtf.format(), DocumentFormat::ControlWord);
    assert_eq!(rtf.name(), "rtf");
}

#[test]
fn test_dispatch_rejects_unknown_extension_without_reading() {
    // The file does not exist; routing must fail before any I/O.
    let err = inspect("/nonexistent/folder/table.csv").unwrap_err();
    assert!(err.is_unsupported_format());

    let err = inspect("/nonexistent/folder/NOTES").unwrap_err();
    assert!(matches!(err, Error::UnsupportedFormat(_)));
}

#[test]
fn test_dispatch_missing_file_is_invalid_document() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("gone.docx");

    match inspect(&missing).unwrap_err() {
        Error::InvalidDocument { path, source } => {
            assert_eq!(path, missing);
            assert!(matches!(*source, Error::Io(_)));
        }
        other => panic!("expected InvalidDocument, got {other:?}"),
    }
}

#[test]
fn test_supported_extensions() {
    assert_eq!(supported_extensions(), vec![".docx", ".rtf"]);
    for ext in supported_extensions() {
        assert!(AdapterRegistry::with_defaults().supports(&ext));
    }
}

#[test]
fn test_validate_file_rejects_mismatched_content() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("letter.docx");
    std::fs::write(&path, b"{\\rtf1\\ansi Hello\\par}").unwrap();

    assert!(validate_file(&path).unwrap_err().is_unsupported_format());
    assert!(wpadjust::inspect_validated(&path)
        .unwrap_err()
        .is_unsupported_format());
}

#[test]
fn test_registered_adapter_handles_documents() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("note.memo");
    std::fs::write(&path, r"{\rtf1\ansi{\fonttbl{\f0 Courier;}}\f0 one two\par}").unwrap();

    let mut registry = AdapterRegistry::new();
    registry.register(Arc::new(MockAdapter::new(vec!["memo"], "memo")));
    let adapter = registry.for_path(&path).unwrap();

    let metadata = adapter.inspect(&path).unwrap();
    assert_eq!(metadata.source_path(), path);
    assert_eq!(metadata.properties.word_count, 2);
    assert_eq!(metadata.properties.fonts_used.get("Courier"), Some(&1));

    let output = adapter.apply(metadata, &ModificationSettings::new()).unwrap();
    assert_eq!(output, dir.path().join("note_modified.memo"));
    assert_eq!(
        std::fs::read(&output).unwrap(),
        std::fs::read(&path).unwrap()
    );
}
