//! Plain-text rendering of control-word documents.
//!
//! A single token regex walks the stream. Group state (`\ucN` skip count and
//! whether the group is an ignorable destination) is kept on a stack.
//! Escaped bytes are decoded in the code page the header declares.

use super::encoding::{document_encoding, TextDecoder};
use regex::Regex;
use std::sync::OnceLock;

/// Destination words whose group carries no body text.
const DESTINATIONS: &[&str] = &[
    "aftncn", "aftnsep", "aftnsepc", "annotation", "atnauthor", "atndate", "atnicn", "atnid",
    "atnparent", "atnref", "atntime", "atrfend", "atrfstart", "author", "background", "bkmkend",
    "bkmkstart", "blipuid", "buptim", "category", "colorschememapping", "colortbl", "comment",
    "company", "creatim", "datafield", "datastore", "defchp", "defpap", "do", "doccomm",
    "docvar", "dptxbxtext", "ebcend", "ebcstart", "factoidname", "falt", "fchars", "ffdeftext",
    "ffentrymcr", "ffexitmcr", "ffformat", "ffhelptext", "ffl", "ffname", "ffstattext", "file",
    "filetbl", "fldinst", "fldtype", "fname", "fontemb", "fontfile", "fonttbl", "footer",
    "footerf", "footerl", "footerr", "footnote", "formfield", "ftncn", "ftnsep", "ftnsepc", "g",
    "generator", "gridtbl", "header", "headerf", "headerl", "headerr", "hl", "hlfr", "hlinkbase",
    "hlloc", "hlsrc", "hsv", "htmltag", "info", "keycode", "keywords", "latentstyles", "lchars",
    "levelnumbers", "leveltext", "lfolevel", "linkval", "list", "listlevel", "listname",
    "listoverride", "listoverridetable", "listpicture", "liststylename", "listtable", "listtext",
    "lsdlockedexcept", "macc", "maccPr", "mailmerge", "maln", "malnScr", "manager", "margPr",
    "mbar", "mbarPr", "mbaseJc", "mbegChr", "mborderBox", "mborderBoxPr", "mbox", "mboxPr",
    "mchr", "mcount", "mctrlPr", "md", "mdeg", "mdegHide", "mden", "mdiff", "mdPr", "me",
    "mendChr", "meqArr", "meqArrPr", "mf", "mfName", "mfPr", "mfunc", "mfuncPr", "mgroupChr",
    "mgroupChrPr", "mgrow", "mhideBot", "mhideLeft", "mhideRight", "mhideTop", "mhtmltag",
    "mlim", "mlimloc", "mlimlow", "mlimlowPr", "mlimupp", "mlimuppPr", "mm", "mmaddfieldname",
    "mmath", "mmathPict", "mmathPr", "mmaxdist", "mmc", "mmcJc", "mmconnectstr",
    "mmconnectstrdata", "mmcPr", "mmcs", "mmdatasource", "mmheadersource", "mmmailsubject",
    "mmodso", "mmodsofilter", "mmodsofldmpdata", "mmodsomappedname", "mmodsoname",
    "mmodsorecipdata", "mmodsosort", "mmodsosrc", "mmodsotable", "mmodsoudl",
    "mmodsoudldata", "mmodsouniquetag", "mmPr", "mmquery", "mmr", "mnary", "mnaryPr",
    "mnoBreak", "mnum", "mobjDist", "moMath", "moMathPara", "moMathParaPr", "mopEmu",
    "mphant", "mphantPr", "mplcHide", "mpos", "mr", "mrad", "mradPr", "mrPr", "msepChr",
    "mshow", "mshp", "msPre", "msPrePr", "msSub", "msSubPr", "msSubSup", "msSubSupPr", "msSup",
    "msSupPr", "mstrikeBLTR", "mstrikeH", "mstrikeTLBR", "mstrikeV", "msub", "msubHide",
    "msup", "msupHide", "mtransp", "mtype", "mvertJc", "mvfmf", "mvfml", "mvtof", "mvtol",
    "mzeroAsc", "mzeroDesc", "mzeroWid", "nesttableprops", "nextfile", "nonesttables",
    "objalias", "objclass", "objdata", "object", "objname", "objsect", "objtime", "oldcprops",
    "oldpprops", "oldsprops", "oldtprops", "oleclsid", "operator", "panose", "password",
    "passwordhash", "pgp", "pgptbl", "picprop", "pict", "pn", "pnseclvl", "pntext", "pntxta",
    "pntxtb", "printim", "private", "propname", "protend", "protstart", "protusertbl", "pxe",
    "revtbl", "revtim", "rsidtbl", "rxe", "shp", "shpgrp", "shpinst", "shppict", "shprslt",
    "shptxt", "sn", "sp", "staticval", "stylesheet", "subject", "sv", "svb", "tc", "template",
    "themedata", "title", "txe", "ud", "upr", "userprops", "wgrffmtfilter", "windowcaption",
    "writereservation", "writereservhash", "xe", "xform", "xmlattrname", "xmlattrvalue",
    "xmlclose", "xmlname", "xmlnstbl", "xmlopen",
];

fn token_regex() -> &'static Regex {
    static TOKEN: OnceLock<Regex> = OnceLock::new();
    TOKEN.get_or_init(|| {
        Regex::new(
            r"(?i)\\([a-z]{1,32})(-?\d{1,10})?[ ]?|\\'([0-9a-f]{2})|\\([^a-z])|([{}])|[\r\n]+|(.)",
        )
        .expect("token pattern is valid")
    })
}

/// Text produced by a symbol control word.
fn special_word(word: &str) -> Option<&'static str> {
    Some(match word {
        "par" | "line" | "row" => "\n",
        "sect" | "page" => "\n\n",
        "tab" => "\t",
        "cell" | "nestcell" => "|",
        "emdash" => "\u{2014}",
        "endash" => "\u{2013}",
        "emspace" => "\u{2003}",
        "enspace" => "\u{2002}",
        "qmspace" => "\u{2005}",
        "bullet" => "\u{2022}",
        "lquote" => "\u{2018}",
        "rquote" => "\u{2019}",
        "ldblquote" => "\u{201C}",
        "rdblquote" => "\u{201D}",
        _ => return None,
    })
}

/// Render control-word text as plain text.
pub fn to_plain_text(rtf: &str) -> String {
    let mut out = TextDecoder::with_capacity(document_encoding(rtf), rtf.len() / 2);
    let mut stack: Vec<(usize, bool)> = Vec::new();
    let mut ignorable = false;
    let mut uc_skip = 1usize;
    let mut cur_skip = 0usize;

    for caps in token_regex().captures_iter(rtf) {
        if let Some(brace) = caps.get(5) {
            cur_skip = 0;
            if brace.as_str() == "{" {
                stack.push((uc_skip, ignorable));
            } else if let Some((skip, ign)) = stack.pop() {
                uc_skip = skip;
                ignorable = ign;
            }
        } else if let Some(symbol) = caps.get(4) {
            cur_skip = 0;
            match symbol.as_str() {
                "~" if !ignorable => out.push_char('\u{A0}'),
                "_" if !ignorable => out.push_char('\u{2011}'),
                "{" | "}" | "\\" if !ignorable => out.push_str(symbol.as_str()),
                "\n" | "\r" if !ignorable => out.push_char('\n'),
                "*" => ignorable = true,
                _ => {}
            }
        } else if let Some(word) = caps.get(1) {
            cur_skip = 0;
            let word = word.as_str();
            let arg = caps.get(2).and_then(|a| a.as_str().parse::<i64>().ok());

            if DESTINATIONS.contains(&word) {
                ignorable = true;
            } else if ignorable {
                continue;
            } else if let Some(text) = special_word(word) {
                out.push_str(text);
            } else if word == "uc" {
                if let Some(n) = arg {
                    uc_skip = n.max(0) as usize;
                }
            } else if word == "u" {
                if let Some(mut code) = arg {
                    if code < 0 {
                        code += 0x10000;
                    }
                    match u16::try_from(code) {
                        Ok(unit) => out.push_unit(unit),
                        Err(_) => out.push_char(char::REPLACEMENT_CHARACTER),
                    }
                    cur_skip = uc_skip;
                }
            }
        } else if let Some(hex) = caps.get(3) {
            if cur_skip > 0 {
                cur_skip -= 1;
            } else if !ignorable {
                if let Ok(byte) = u8::from_str_radix(hex.as_str(), 16) {
                    out.push_byte(byte);
                }
            }
        } else if let Some(ch) = caps.get(6) {
            if cur_skip > 0 {
                cur_skip -= 1;
            } else if !ignorable {
                for c in ch.as_str().chars() {
                    out.push_char(c);
                }
            }
        }
    }

    out.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paragraphs_and_groups() {
        let rtf = r"{\rtf1\ansi\deff0{\fonttbl{\f0\fswiss Arial;}}{\colortbl;\red0\green0\blue0;}
\f0\fs24 Hello {\b bold} world.\par
Second line\tab tabbed\par}";
        assert_eq!(to_plain_text(rtf), "Hello bold world.\nSecond line\ttabbed\n");
    }

    #[test]
    fn test_info_group_is_skipped() {
        let rtf = r"{\rtf1{\info{\title Report}{\author Ann}}Body text}";
        assert_eq!(to_plain_text(rtf), "Body text");
    }

    #[test]
    fn test_ignorable_destination() {
        let rtf = r"{\rtf1{\*\generator Writer 1.0;}{\*\unknownword hidden}shown}";
        assert_eq!(to_plain_text(rtf), "shown");
    }

    #[test]
    fn test_escapes_and_hex() {
        let rtf = r"{\rtf1 a\{b\}c\\d caf\'e9 \'93quoted\'94}";
        assert_eq!(to_plain_text(rtf), "a{b}c\\d café \u{201C}quoted\u{201D}");
    }

    #[test]
    fn test_unicode_skips_fallback() {
        let rtf = r"{\rtf1 \u8364?\uc2\u8212\'97\'97 end}";
        assert_eq!(to_plain_text(rtf), "\u{20AC}\u{2014} end");

        let negative = r"{\rtf1 \u-3913?}";
        assert_eq!(to_plain_text(negative), "\u{F0B7}");
    }

    #[test]
    fn test_non_breaking_hyphen_and_space() {
        let rtf = r"{\rtf1 well\_known\~fact}";
        assert_eq!(to_plain_text(rtf), "well\u{2011}known\u{A0}fact");
    }

    #[test]
    fn test_surrogate_pair() {
        let rtf = r"{\rtf1 smile \u-10179?\u-8704? done}";
        assert_eq!(to_plain_text(rtf), "smile \u{1F600} done");
    }

    #[test]
    fn test_declared_code_page() {
        let cyrillic = r"{\rtf1\ansi\ansicpg1251 \'cf\'f0\'e8\'e2\'e5\'f2\par}";
        assert_eq!(to_plain_text(cyrillic), "Привет\n");

        let japanese = r"{\rtf1\ansi\ansicpg932 \'93\'fa\'96\'7b\'8c\'ea}";
        assert_eq!(to_plain_text(japanese), "日本語");
    }
}
