//! Best-effort scans over raw control-word text.
//!
//! None of these build a full group tree. They look for a handful of control
//! words and read what follows them.

use super::encoding::{document_encoding, TextDecoder};
use encoding_rs::Encoding;
use regex::Regex;
use std::collections::HashMap;
use std::iter::Peekable;
use std::str::Chars;
use std::sync::OnceLock;

const FONT_TABLE: &str = "\\fonttbl";
const TABLE_ROW: &str = "\\trowd";

fn title_regex() -> &'static Regex {
    static TITLE: OnceLock<Regex> = OnceLock::new();
    TITLE.get_or_init(|| Regex::new(r"(?i)\\title\b\s*([^\\}]+)").expect("title pattern is valid"))
}

fn author_regex() -> &'static Regex {
    static AUTHOR: OnceLock<Regex> = OnceLock::new();
    AUTHOR
        .get_or_init(|| Regex::new(r"(?i)\\author\b\s*([^\\}]+)").expect("author pattern is valid"))
}

fn font_ref_regex() -> &'static Regex {
    static FONT_REF: OnceLock<Regex> = OnceLock::new();
    FONT_REF.get_or_init(|| Regex::new(r"\\f(\d+)").expect("font reference pattern is valid"))
}

/// First `\title` value, trimmed. Empty values count as absent.
pub fn title(rtf: &str) -> Option<String> {
    first_capture(title_regex(), rtf)
}

/// First `\author` value, trimmed. Empty values count as absent.
pub fn author(rtf: &str) -> Option<String> {
    first_capture(author_regex(), rtf)
}

fn first_capture(re: &Regex, rtf: &str) -> Option<String> {
    re.captures(rtf)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Number of table rows started in the stream.
pub fn table_count(rtf: &str) -> usize {
    rtf.matches(TABLE_ROW).count()
}

/// A font declared in the font table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontEntry {
    pub id: u32,
    pub name: String,
}

/// Byte range of the font table group: its opening and closing braces.
fn font_table_span(rtf: &str) -> Option<(usize, usize)> {
    let keyword = rtf.find(FONT_TABLE)?;
    let open = rtf[..keyword].rfind('{')?;
    let close = group_end(rtf, open)?;
    Some((open, close))
}

/// Index of the brace closing the group opened at `open`.
fn group_end(text: &str, open: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut i = open;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 1,
            b'{' => depth += 1,
            b'}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

/// Fonts declared in the font table, in declaration order.
///
/// Escaped bytes in names are decoded in the document's code page.
pub fn font_table(rtf: &str) -> Vec<FontEntry> {
    let Some((open, close)) = font_table_span(rtf) else {
        return Vec::new();
    };
    let Some(keyword) = rtf[open..close].find(FONT_TABLE) else {
        return Vec::new();
    };
    let inner = &rtf[open + keyword + FONT_TABLE.len()..close];

    // Either one subgroup per font, or a flat list separated by ';'.
    let mut entries = Vec::new();
    let mut flat = String::new();
    let mut i = 0;
    while i < inner.len() {
        let rest = &inner[i..];
        if rest.starts_with('{') {
            match group_end(inner, i) {
                Some(end) => {
                    entries.push(&inner[i + 1..end]);
                    i = end + 1;
                }
                None => break,
            }
        } else {
            let ch = rest.chars().next().unwrap_or_default();
            flat.push(ch);
            i += ch.len_utf8().max(1);
        }
    }

    let encoding = document_encoding(rtf);
    let mut fonts: Vec<FontEntry> = entries
        .into_iter()
        .filter_map(|entry| parse_font_entry(entry, encoding))
        .collect();
    fonts.extend(
        flat.split_inclusive(';')
            .filter(|chunk| chunk.contains("\\f"))
            .filter_map(|entry| parse_font_entry(entry, encoding)),
    );
    fonts
}

/// Read `\fN` and the name up to `;` from one font table entry.
///
/// Nested groups (`\*\panose`, `\*\falt`, ...) and other control words are
/// skipped.
fn parse_font_entry(entry: &str, encoding: &'static Encoding) -> Option<FontEntry> {
    let mut chars = entry.chars().peekable();
    let mut depth = 0usize;
    let mut id = None;
    let mut name = TextDecoder::new(encoding);

    while let Some(ch) = chars.next() {
        match ch {
            '{' => depth += 1,
            '}' => depth = depth.saturating_sub(1),
            ';' if depth == 0 => break,
            '\\' => {
                let Some(token) = read_control(&mut chars) else {
                    break;
                };
                if depth > 0 {
                    continue;
                }
                match token {
                    Control::Word(word, param) => {
                        if word == "f" && id.is_none() {
                            id = param.and_then(|p| u32::try_from(p).ok());
                        }
                    }
                    Control::Hex(byte) => name.push_byte(byte),
                    Control::Symbol(sym @ ('\\' | '{' | '}')) => name.push_char(sym),
                    Control::Symbol(_) => {}
                }
            }
            '\r' | '\n' => {}
            other if depth == 0 => name.push_char(other),
            _ => {}
        }
    }

    let name = name.finish();
    let name = name.trim();
    match id {
        Some(id) if !name.is_empty() => Some(FontEntry {
            id,
            name: name.to_string(),
        }),
        _ => None,
    }
}

enum Control {
    Word(String, Option<i64>),
    Hex(u8),
    Symbol(char),
}

/// Read the control word after a backslash, including its delimiter space.
fn read_control(chars: &mut Peekable<Chars<'_>>) -> Option<Control> {
    let first = chars.next()?;
    if first == '\'' {
        let hex: String = chars.by_ref().take(2).collect();
        return u8::from_str_radix(&hex, 16).ok().map(Control::Hex);
    }
    if !first.is_ascii_alphabetic() {
        return Some(Control::Symbol(first));
    }

    let mut word = String::from(first);
    while let Some(&c) = chars.peek() {
        if !c.is_ascii_alphabetic() {
            break;
        }
        word.push(c);
        chars.next();
    }

    let mut digits = String::new();
    if chars.peek() == Some(&'-') {
        digits.push('-');
        chars.next();
    }
    while let Some(&c) = chars.peek() {
        if !c.is_ascii_digit() {
            break;
        }
        digits.push(c);
        chars.next();
    }
    if chars.peek() == Some(&' ') {
        chars.next();
    }

    Some(Control::Word(word, digits.parse().ok()))
}

/// Font usage: each declared font with the number of `\fN` references to it
/// after the font table. Fonts sharing a name are summed.
pub fn font_usage(rtf: &str) -> HashMap<String, usize> {
    let fonts = font_table(rtf);
    let mut usage: HashMap<String, usize> = HashMap::new();
    if fonts.is_empty() {
        return usage;
    }

    let by_id: HashMap<u32, &str> = fonts.iter().map(|f| (f.id, f.name.as_str())).collect();
    for font in &fonts {
        usage.entry(font.name.clone()).or_insert(0);
    }

    let body_start = font_table_span(rtf).map_or(0, |(_, close)| close + 1);
    for caps in font_ref_regex().captures_iter(&rtf[body_start..]) {
        let Some(id) = caps.get(1).and_then(|m| m.as_str().parse::<u32>().ok()) else {
            continue;
        };
        match by_id.get(&id) {
            Some(name) => *usage.entry((*name).to_string()).or_insert(0) += 1,
            None => log::debug!("reference to undeclared font \\f{id}"),
        }
    }
    usage
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r"{\rtf1\ansi\deff0{\fonttbl{\f0\froman\fcharset0 Times New Roman;}{\f1\fswiss{\*\panose 020b0604020202020204}Arial;}{\f2\fswiss Helvetica{\*\falt Arial};}}
{\info{\title  Quarterly Report }{\author Jane Doe}}
\f1\fs24 Intro\par
\f0 Body text\par
{\f1 More}\f1\par
\trowd\cellx1000 a\cell\row
\trowd\cellx1000 b\cell\row
}";

    #[test]
    fn test_info_properties() {
        assert_eq!(title(SAMPLE).as_deref(), Some("Quarterly Report"));
        assert_eq!(author(SAMPLE).as_deref(), Some("Jane Doe"));
        assert_eq!(title(r"{\rtf1{\info{\title}}}"), None);
        assert_eq!(author(r"{\rtf1 no info}"), None);
    }

    #[test]
    fn test_title_not_confused_with_titlepg() {
        assert_eq!(title(r"{\rtf1\titlepg body}"), None);
    }

    #[test]
    fn test_font_table_entries() {
        let fonts = font_table(SAMPLE);
        assert_eq!(
            fonts,
            vec![
                FontEntry { id: 0, name: "Times New Roman".into() },
                FontEntry { id: 1, name: "Arial".into() },
                FontEntry { id: 2, name: "Helvetica".into() },
            ]
        );
    }

    #[test]
    fn test_flat_font_table() {
        let rtf = r"{\rtf1{\fonttbl\f0\fnil Courier;\f1\fnil Symbol;}\f1 x}";
        let fonts = font_table(rtf);
        assert_eq!(fonts.len(), 2);
        assert_eq!(fonts[0].name, "Courier");
        assert_eq!(fonts[1].id, 1);
    }

    #[test]
    fn test_font_usage_counts_body_references() {
        let usage = font_usage(SAMPLE);
        assert_eq!(usage.get("Arial"), Some(&3));
        assert_eq!(usage.get("Times New Roman"), Some(&1));
        assert_eq!(usage.get("Helvetica"), Some(&0));
    }

    #[test]
    fn test_font_names_use_declared_code_page() {
        let cyrillic = r"{\rtf1\ansi\ansicpg1251{\fonttbl{\f0 \'c0\'f0\'e8\'e0\'eb;}}\f0 x\par}";
        let usage = font_usage(cyrillic);
        assert_eq!(usage.len(), 1);
        assert_eq!(usage.get("Ариал"), Some(&1));

        let japanese = r"{\rtf1\ansi\ansicpg932{\fonttbl{\f0\fnil\fcharset128 \'82l\'82r \'96\'be\'92\'a9;}}\f0 x\par}";
        let usage = font_usage(japanese);
        assert_eq!(usage.len(), 1);
        assert_eq!(usage.get("ＭＳ 明朝"), Some(&1));
    }

    #[test]
    fn test_font_names_default_to_windows_1252() {
        let rtf = r"{\rtf1\ansi{\fonttbl{\f0 Caf\'e9 Sans;}}\f0 x}";
        assert_eq!(font_table(rtf)[0].name, "Café Sans");
    }

    #[test]
    fn test_no_font_table() {
        assert!(font_usage(r"{\rtf1\f0 plain}").is_empty());
    }

    #[test]
    fn test_table_count() {
        assert_eq!(table_count(SAMPLE), 2);
        assert_eq!(table_count(r"{\rtf1 none}"), 0);
    }
}
