//! Code pages for `\'hh` escapes.
//!
//! The document's `\ansicpgN` word selects the encoding; Windows-1252 is
//! used when it is missing or unknown. Escaped bytes are collected and
//! decoded as a run, so double-byte code pages decode whole characters.

use encoding_rs::Encoding;
use regex::Regex;
use std::sync::OnceLock;

fn ansicpg_regex() -> &'static Regex {
    static ANSICPG: OnceLock<Regex> = OnceLock::new();
    ANSICPG.get_or_init(|| Regex::new(r"\\ansicpg(\d{1,5})").expect("code page pattern is valid"))
}

/// Encoding for a Windows code page number.
pub fn codepage_encoding(codepage: u32) -> Option<&'static Encoding> {
    match codepage {
        874 => Some(encoding_rs::WINDOWS_874),
        932 | 10001 => Some(encoding_rs::SHIFT_JIS),
        936 | 20936 => Some(encoding_rs::GBK),
        949 => Some(encoding_rs::EUC_KR),
        950 => Some(encoding_rs::BIG5),
        20932 => Some(encoding_rs::EUC_JP),
        54936 => Some(encoding_rs::GB18030),
        10000 => Some(encoding_rs::MACINTOSH),
        20866 => Some(encoding_rs::KOI8_R),
        21866 => Some(encoding_rs::KOI8_U),
        28591 => Some(encoding_rs::WINDOWS_1252),
        65001 => Some(encoding_rs::UTF_8),
        28592..=28605 => Encoding::for_label(format!("iso-8859-{}", codepage - 28590).as_bytes()),
        // windows-125x and cp866 are known by their "cpN" labels
        _ => Encoding::for_label(format!("cp{codepage}").as_bytes()),
    }
}

/// Encoding declared by the document header.
pub fn document_encoding(rtf: &str) -> &'static Encoding {
    let declared = ansicpg_regex()
        .captures(rtf)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<u32>().ok());

    match declared {
        Some(codepage) => codepage_encoding(codepage).unwrap_or_else(|| {
            log::debug!("unknown code page {codepage}, decoding as windows-1252");
            encoding_rs::WINDOWS_1252
        }),
        None => encoding_rs::WINDOWS_1252,
    }
}

/// Whether `byte` starts a two-byte character in `encoding`.
fn is_lead_byte(encoding: &'static Encoding, byte: u8) -> bool {
    if encoding == encoding_rs::SHIFT_JIS {
        matches!(byte, 0x81..=0x9F | 0xE0..=0xFC)
    } else if encoding == encoding_rs::GBK
        || encoding == encoding_rs::GB18030
        || encoding == encoding_rs::BIG5
        || encoding == encoding_rs::EUC_KR
    {
        matches!(byte, 0x81..=0xFE)
    } else {
        false
    }
}

/// Accumulates decoded text from literal characters, escaped bytes and
/// `\uN` code units.
pub struct TextDecoder {
    encoding: &'static Encoding,
    pending: Vec<u8>,
    high_surrogate: Option<u16>,
    out: String,
}

impl TextDecoder {
    pub fn new(encoding: &'static Encoding) -> Self {
        Self {
            encoding,
            pending: Vec::new(),
            high_surrogate: None,
            out: String::new(),
        }
    }

    pub fn with_capacity(encoding: &'static Encoding, capacity: usize) -> Self {
        let mut decoder = Self::new(encoding);
        decoder.out.reserve(capacity);
        decoder
    }

    /// An escaped `\'hh` byte.
    pub fn push_byte(&mut self, byte: u8) {
        self.flush_surrogate();
        self.pending.push(byte);
    }

    /// A literal character.
    ///
    /// Double-byte code pages may write the trail byte of a character as
    /// a plain ASCII character right after an escaped lead byte.
    pub fn push_char(&mut self, ch: char) {
        if ch.is_ascii() && self.awaits_trail_byte() {
            self.pending.push(ch as u8);
            return;
        }
        self.flush();
        self.out.push(ch);
    }

    pub fn push_str(&mut self, text: &str) {
        self.flush();
        self.out.push_str(text);
    }

    /// A `\uN` UTF-16 code unit. Surrogate halves are joined.
    pub fn push_unit(&mut self, unit: u16) {
        self.flush_bytes();
        match unit {
            0xD800..=0xDBFF => {
                self.flush_surrogate();
                self.high_surrogate = Some(unit);
            }
            0xDC00..=0xDFFF => {
                let ch = self.high_surrogate.take().and_then(|high| {
                    let code = 0x10000
                        + ((u32::from(high) - 0xD800) << 10)
                        + (u32::from(unit) - 0xDC00);
                    char::from_u32(code)
                });
                self.out.push(ch.unwrap_or(char::REPLACEMENT_CHARACTER));
            }
            _ => {
                self.flush_surrogate();
                self.out.push(char::from_u32(u32::from(unit)).unwrap_or(char::REPLACEMENT_CHARACTER));
            }
        }
    }

    pub fn finish(mut self) -> String {
        self.flush();
        self.out
    }

    fn awaits_trail_byte(&self) -> bool {
        let mut i = 0;
        while i < self.pending.len() {
            if is_lead_byte(self.encoding, self.pending[i]) {
                if i + 1 == self.pending.len() {
                    return true;
                }
                i += 2;
            } else {
                i += 1;
            }
        }
        false
    }

    fn flush(&mut self) {
        self.flush_bytes();
        self.flush_surrogate();
    }

    fn flush_bytes(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let (text, _) = self.encoding.decode_without_bom_handling(&self.pending);
        self.out.push_str(&text);
        self.pending.clear();
    }

    fn flush_surrogate(&mut self) {
        if self.high_surrogate.take().is_some() {
            self.out.push(char::REPLACEMENT_CHARACTER);
        }
    }
}
