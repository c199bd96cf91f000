//! Engine data model.
//!
//! [`DocumentMetadata`] is what `inspect` produces and `apply` consumes;
//! [`ModificationSettings`] is the partial set of changes `apply` writes.

mod metadata;
mod settings;

pub use metadata::{
    heading_level, DocumentHandle, DocumentMetadata, DocumentProperties, HeadingCounts, Margins,
    PageDimensions, FALLBACK_AUTHOR, FALLBACK_TITLE, HEADING_STYLES,
};
pub use settings::{
    FontSettings, LineSpacingPreset, MarginSettings, MarginSide, ModificationSettings, PagePreset,
    PageSize, MAX_FONT_SIZE, MAX_LINE_SPACING, MIN_FONT_SIZE, MIN_LINE_SPACING,
};
