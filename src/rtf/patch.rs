//! Header-only margin patch.
//!
//! Margins are the only settings written to control-word documents. Each
//! side is a rule: skip it when its control word already occurs anywhere in
//! the text, otherwise splice it in right after the `{\rtf` header word.

use crate::error::{Error, Result};
use crate::model::{MarginSettings, MarginSide};
use crate::units::inches_to_twips;

/// Margin rules in insertion order: side and its document-level control word.
const MARGIN_RULES: [(MarginSide, &str); 4] = [
    (MarginSide::Left, "\\margl"),
    (MarginSide::Right, "\\margr"),
    (MarginSide::Top, "\\margt"),
    (MarginSide::Bottom, "\\margb"),
];

const HEADER: &[u8] = b"{\\rtf";
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Result of patching a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarginPatch {
    /// Document bytes with any inserted words
    pub bytes: Vec<u8>,
    /// Sides whose control word was inserted
    pub inserted: Vec<MarginSide>,
    /// Requested sides left alone because the document already sets them
    pub skipped: Vec<MarginSide>,
}

/// Offset just past the `{\rtfN` header word.
pub fn header_end(raw: &[u8]) -> Option<usize> {
    let mut start = if raw.starts_with(UTF8_BOM) {
        UTF8_BOM.len()
    } else {
        0
    };
    while raw.get(start).is_some_and(|b| b.is_ascii_whitespace()) {
        start += 1;
    }
    if !raw[start..].starts_with(HEADER) {
        return None;
    }

    let mut end = start + HEADER.len();
    while raw.get(end).is_some_and(|b| b.is_ascii_digit()) {
        end += 1;
    }
    Some(end)
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|window| window == needle)
}

/// Insert the requested margins that the document does not set yet.
///
/// Every other byte of `raw` is kept as is.
pub fn patch_margins(raw: &[u8], margins: &MarginSettings) -> Result<MarginPatch> {
    let at = header_end(raw)
        .ok_or_else(|| Error::ControlWord("missing {\\rtf header".to_string()))?;

    let mut words = String::new();
    let mut inserted = Vec::new();
    let mut skipped = Vec::new();

    for (side, word) in MARGIN_RULES {
        let Some(inches) = margins.get(side) else {
            continue;
        };
        if contains(raw, word.as_bytes()) {
            log::debug!("{word} already present, leaving {} unchanged", side.name());
            skipped.push(side);
            continue;
        }
        words.push_str(word);
        words.push_str(&inches_to_twips(inches).to_string());
        inserted.push(side);
    }

    let mut bytes = Vec::with_capacity(raw.len() + words.len());
    bytes.extend_from_slice(&raw[..at]);
    bytes.extend_from_slice(words.as_bytes());
    bytes.extend_from_slice(&raw[at..]);

    Ok(MarginPatch {
        bytes,
        inserted,
        skipped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn margins(sides: &[(MarginSide, f64)]) -> MarginSettings {
        let mut settings = MarginSettings::default();
        for (side, value) in sides {
            settings.set(*side, *value);
        }
        settings
    }

    #[test]
    fn test_header_end() {
        assert_eq!(header_end(b"{\\rtf1\\ansi"), Some(6));
        assert_eq!(header_end(b"\xEF\xBB\xBF\r\n{\\rtf1 x}"), Some(11));
        assert_eq!(header_end(b"{\\rtf x}"), Some(5));
        assert_eq!(header_end(b"hello"), None);
        assert_eq!(header_end(b""), None);
    }

    #[test]
    fn test_inserts_after_header() {
        let raw = b"{\\rtf1\\ansi Hello\\par}";
        let patch = patch_margins(raw, &margins(&[(MarginSide::Top, 0.5), (MarginSide::Left, 1.25)]))
            .unwrap();
        assert_eq!(
            patch.bytes,
            b"{\\rtf1\\margl1800\\margt720\\ansi Hello\\par}".to_vec()
        );
        assert_eq!(patch.inserted, vec![MarginSide::Left, MarginSide::Top]);
        assert!(patch.skipped.is_empty());
    }

    #[test]
    fn test_existing_word_is_not_duplicated() {
        let raw = b"{\\rtf1\\ansi\\margl1440\\margr1440 Body}";
        let patch = patch_margins(raw, &margins(&[(MarginSide::Left, 2.0)])).unwrap();
        assert_eq!(patch.bytes, raw.to_vec());
        assert_eq!(patch.skipped, vec![MarginSide::Left]);
        assert!(patch.inserted.is_empty());
    }

    #[test]
    fn test_space_delimiter_keeps_body() {
        let raw = b"{\\rtf1 Hello}";
        let patch = patch_margins(raw, &margins(&[(MarginSide::Bottom, 1.0)])).unwrap();
        assert_eq!(patch.bytes, b"{\\rtf1\\margb1440 Hello}".to_vec());
    }

    #[test]
    fn test_no_margins_is_identity() {
        let raw = b"{\\rtf1 Hello}";
        let patch = patch_margins(raw, &MarginSettings::default()).unwrap();
        assert_eq!(patch.bytes, raw.to_vec());
    }

    #[test]
    fn test_rejects_non_rtf() {
        assert!(patch_margins(b"plain", &margins(&[(MarginSide::Top, 1.0)])).is_err());
    }
}
