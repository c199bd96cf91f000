//! Body-level queries and edits on the main document part.
//!
//! Paragraphs and tables are the direct children of `w:body`; runs are the
//! direct `w:r` children of those paragraphs. Sections are the
//! paragraph-level `w:pPr/w:sectPr` breaks followed by the final body-level
//! `w:sectPr`, in document order.

use super::package::StyleSheet;
use super::xml::XmlElement;
use crate::error::{Error, Result};
use crate::model::{heading_level, HeadingCounts, MarginSide, Margins, PageDimensions};
use crate::units::{
    inches_to_twips, multiplier_to_line_units, parse_twips, points_to_half_points,
    twips_to_inches, DEFAULT_MARGIN_IN, LETTER_HEIGHT_IN, LETTER_WIDTH_IN,
};
use std::collections::HashMap;

/// Schema order of `w:sectPr` children.
const SECT_PR_ORDER: &[&str] = &[
    "headerReference",
    "footerReference",
    "footnotePr",
    "endnotePr",
    "type",
    "pgSz",
    "pgMar",
    "paperSrc",
    "pgBorders",
    "lnNumType",
    "pgNumType",
    "cols",
    "formProt",
    "vAlign",
    "noEndnote",
    "titlePg",
    "textDirection",
    "bidi",
    "rtlGutter",
    "docGrid",
    "printerSettings",
    "sectPrChange",
];

/// Schema order of `w:pPr` children.
const P_PR_ORDER: &[&str] = &[
    "pStyle",
    "keepNext",
    "keepLines",
    "pageBreakBefore",
    "framePr",
    "widowControl",
    "numPr",
    "suppressLineNumbers",
    "pBdr",
    "shd",
    "tabs",
    "suppressAutoHyphens",
    "kinsoku",
    "wordWrap",
    "overflowPunct",
    "topLinePunct",
    "autoSpaceDE",
    "autoSpaceDN",
    "bidi",
    "adjustRightInd",
    "snapToGrid",
    "spacing",
    "ind",
    "contextualSpacing",
    "mirrorIndents",
    "suppressOverlap",
    "jc",
    "textDirection",
    "textAlignment",
    "textboxTightWrap",
    "outlineLvl",
    "divId",
    "cnfStyle",
    "rPr",
    "sectPr",
    "pPrChange",
];

/// Schema order of `w:rPr` children.
const R_PR_ORDER: &[&str] = &[
    "rStyle",
    "rFonts",
    "b",
    "bCs",
    "i",
    "iCs",
    "caps",
    "smallCaps",
    "strike",
    "dstrike",
    "outline",
    "shadow",
    "emboss",
    "imprint",
    "noProof",
    "snapToGrid",
    "vanish",
    "webHidden",
    "color",
    "spacing",
    "w",
    "kern",
    "position",
    "sz",
    "szCs",
    "highlight",
    "u",
    "effect",
    "bdr",
    "shd",
    "fitText",
    "vertAlign",
    "rtl",
    "cs",
    "em",
    "lang",
    "eastAsianLayout",
    "specVanish",
    "oMath",
];

/// Property elements that must be the first child of their parent.
const FIRST_CHILD: &[&str] = &["pPr", "rPr"];

/// Paragraph content that can hold runs contributing to the text.
const RUN_CONTAINERS: &[&str] = &[
    "hyperlink",
    "ins",
    "smartTag",
    "fldSimple",
    "customXml",
    "sdt",
    "sdtContent",
];

const LETTER_WIDTH_TWIPS: i64 = 12240;
const LETTER_HEIGHT_TWIPS: i64 = 15840;
const DEFAULT_MARGIN_TWIPS: i64 = 1440;
const DEFAULT_HEADER_TWIPS: i64 = 720;

/// Statistics gathered from a document body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BodyStats {
    pub page_dimensions: PageDimensions,
    pub margins: Margins,
    pub fonts_used: HashMap<String, usize>,
    pub heading_counts: HeadingCounts,
    pub table_count: usize,
    pub paragraph_count: usize,
    pub word_count: usize,
    pub section_count: usize,
}

fn body(document: &XmlElement) -> Result<&XmlElement> {
    document
        .child("body")
        .ok_or_else(|| Error::Xml("document has no w:body element".to_string()))
}

fn body_mut(document: &mut XmlElement) -> Result<&mut XmlElement> {
    document
        .child_mut("body")
        .ok_or_else(|| Error::Xml("document has no w:body element".to_string()))
}

/// Gather layout, font and structure statistics from `w:document`.
pub fn inspect(document: &XmlElement, styles: &StyleSheet) -> Result<BodyStats> {
    let body = body(document)?;
    let mut stats = BodyStats::default();

    let sections = sections(body);
    stats.section_count = sections.len();
    match sections.first() {
        Some(first) => {
            stats.page_dimensions = page_dimensions(first);
            stats.margins = margins(first);
        }
        None => log::warn!("document declares no sections, using Letter defaults"),
    }

    for element in body.elements() {
        if element.is("tbl") {
            stats.table_count += 1;
        }
        if !element.is("p") {
            continue;
        }

        stats.paragraph_count += 1;
        stats.word_count += paragraph_text(element).split_whitespace().count();

        for run in element.elements().filter(|e| e.is("r")) {
            if let Some(font) = run_font(run) {
                *stats.fonts_used.entry(font.to_string()).or_insert(0) += 1;
            }
        }

        if let Some(level) = paragraph_heading_level(element, styles) {
            stats.heading_counts.increment(level);
        }
    }

    Ok(stats)
}

/// Section properties in document order.
pub fn sections(body: &XmlElement) -> Vec<&XmlElement> {
    let mut found = Vec::new();
    for element in body.elements() {
        if element.is("p") {
            if let Some(sect) = element.child("pPr").and_then(|p| p.child("sectPr")) {
                found.push(sect);
            }
        } else if element.is("sectPr") {
            found.push(element);
        }
    }
    found
}

fn for_each_section_mut<F>(body: &mut XmlElement, mut f: F) -> usize
where
    F: FnMut(&mut XmlElement),
{
    let mut touched = 0;
    for element in body.elements_mut() {
        if element.is("p") {
            if let Some(sect) = element
                .child_mut("pPr")
                .and_then(|p| p.child_mut("sectPr"))
            {
                f(sect);
                touched += 1;
            }
        } else if element.is("sectPr") {
            f(element);
            touched += 1;
        }
    }
    touched
}

fn twips_attr(element: Option<&XmlElement>, local: &str) -> Option<i64> {
    element.and_then(|e| e.attr(local)).and_then(parse_twips)
}

fn page_dimensions(sect: &XmlElement) -> PageDimensions {
    let pg_sz = sect.child("pgSz");
    PageDimensions {
        width: twips_attr(pg_sz, "w").map_or(LETTER_WIDTH_IN, twips_to_inches),
        height: twips_attr(pg_sz, "h").map_or(LETTER_HEIGHT_IN, twips_to_inches),
    }
}

fn margins(sect: &XmlElement) -> Margins {
    let pg_mar = sect.child("pgMar");
    // Negative top/bottom margins pin the body; the distance is what matters.
    let side = |local: &str| {
        twips_attr(pg_mar, local).map_or(DEFAULT_MARGIN_IN, |t| twips_to_inches(t.abs()))
    };
    Margins {
        top: side("top"),
        bottom: side("bottom"),
        left: side("left"),
        right: side("right"),
    }
}

/// Font family declared directly on a run, if any.
pub fn run_font(run: &XmlElement) -> Option<&str> {
    run.child("rPr")
        .and_then(|rpr| rpr.child("rFonts"))
        .and_then(|fonts| fonts.attr("ascii"))
        .map(str::trim)
        .filter(|name| !name.is_empty())
}

/// Plain text of a paragraph: text, tabs and breaks of its runs.
pub fn paragraph_text(paragraph: &XmlElement) -> String {
    let mut out = String::new();
    collect_text(paragraph, &mut out);
    out
}

fn collect_text(container: &XmlElement, out: &mut String) {
    for element in container.elements() {
        if element.is("r") {
            for piece in element.elements() {
                match piece.local_name() {
                    "t" => out.push_str(&piece.text()),
                    "tab" => out.push('\t'),
                    "br" | "cr" => out.push('\n'),
                    _ => {}
                }
            }
        } else if RUN_CONTAINERS.contains(&element.local_name()) {
            collect_text(element, out);
        }
    }
}

fn paragraph_heading_level(paragraph: &XmlElement, styles: &StyleSheet) -> Option<usize> {
    let style_id = paragraph
        .child("pPr")
        .and_then(|p| p.child("pStyle"))
        .and_then(|s| s.attr("val"));

    if let Some(name) = styles.paragraph_style_name(style_id) {
        return heading_level(name);
    }

    // Without a style definition, fall back to the built-in id form.
    let level = style_id?.strip_prefix("Heading")?.parse::<usize>().ok()?;
    (1..=6).contains(&level).then_some(level)
}

/// Set page width and height on every section.
///
/// Returns the number of sections changed.
pub fn set_page_size(document: &mut XmlElement, width_in: f64, height_in: f64) -> Result<usize> {
    let body = ensure_section(document)?;
    let (w, h) = (inches_to_twips(width_in), inches_to_twips(height_in));
    Ok(for_each_section_mut(body, |sect| {
        let pg_sz = sect.ensure_child("w:pgSz", SECT_PR_ORDER);
        pg_sz.set_attr("w:w", w.to_string());
        pg_sz.set_attr("w:h", h.to_string());
    }))
}

/// Set one margin on every section, leaving the other sides as they are.
pub fn set_margin(document: &mut XmlElement, side: MarginSide, inches: f64) -> Result<usize> {
    let body = ensure_section(document)?;
    let twips = inches_to_twips(inches).to_string();
    let attr = match side {
        MarginSide::Top => "w:top",
        MarginSide::Bottom => "w:bottom",
        MarginSide::Left => "w:left",
        MarginSide::Right => "w:right",
    };
    Ok(for_each_section_mut(body, |sect| {
        ensure_page_margins(sect).set_attr(attr, twips.clone());
    }))
}

/// `w:pgMar` of a section, created with default values when missing.
fn ensure_page_margins(sect: &mut XmlElement) -> &mut XmlElement {
    if sect.child("pgMar").is_none() {
        let margin = DEFAULT_MARGIN_TWIPS.to_string();
        let header = DEFAULT_HEADER_TWIPS.to_string();
        let pg_mar = sect.ensure_child("w:pgMar", SECT_PR_ORDER);
        for attr in ["w:top", "w:right", "w:bottom", "w:left"] {
            pg_mar.set_attr(attr, margin.clone());
        }
        pg_mar.set_attr("w:header", header.clone());
        pg_mar.set_attr("w:footer", header);
        pg_mar.set_attr("w:gutter", "0");
    }
    sect.ensure_child("w:pgMar", SECT_PR_ORDER)
}

/// Make sure the body has at least one section to edit.
///
/// A body without any `w:sectPr` gets a trailing Letter section with
/// one-inch margins.
fn ensure_section(document: &mut XmlElement) -> Result<&mut XmlElement> {
    let body = body_mut(document)?;
    if sections(body).is_empty() {
        log::warn!("document declares no sections, adding a default section");
        let mut sect = XmlElement::new("w:sectPr");
        sect.push(
            XmlElement::new("w:pgSz")
                .with_attr("w:w", LETTER_WIDTH_TWIPS.to_string())
                .with_attr("w:h", LETTER_HEIGHT_TWIPS.to_string()),
        );
        ensure_page_margins(&mut sect);
        body.push(sect);
    }
    Ok(body)
}

/// Overwrite font family and/or size on every run of every body paragraph.
///
/// Returns the number of runs changed.
pub fn set_run_font(
    document: &mut XmlElement,
    family: Option<&str>,
    size_pt: Option<f64>,
) -> Result<usize> {
    let body = body_mut(document)?;
    let half_points = size_pt.map(|pt| points_to_half_points(pt).to_string());
    let mut touched = 0;

    for paragraph in body.elements_mut().filter(|e| e.is("p")) {
        for run in paragraph.elements_mut().filter(|e| e.is("r")) {
            let rpr = run.ensure_child("w:rPr", FIRST_CHILD);
            if let Some(family) = family {
                let fonts = rpr.ensure_child("w:rFonts", R_PR_ORDER);
                // Theme fonts take precedence over explicit names.
                fonts.remove_attr("asciiTheme");
                fonts.remove_attr("hAnsiTheme");
                fonts.set_attr("w:ascii", family);
                fonts.set_attr("w:hAnsi", family);
            }
            if let Some(val) = &half_points {
                rpr.ensure_child("w:sz", R_PR_ORDER)
                    .set_attr("w:val", val.as_str());
            }
            touched += 1;
        }
    }
    Ok(touched)
}

/// Set "multiple" line spacing on every body paragraph.
///
/// Returns the number of paragraphs changed.
pub fn set_line_spacing(document: &mut XmlElement, multiplier: f64) -> Result<usize> {
    let body = body_mut(document)?;
    let line = multiplier_to_line_units(multiplier).to_string();
    let mut touched = 0;

    for paragraph in body.elements_mut().filter(|e| e.is("p")) {
        let ppr = paragraph.ensure_child("w:pPr", FIRST_CHILD);
        let spacing = ppr.ensure_child("w:spacing", P_PR_ORDER);
        spacing.set_attr("w:line", line.as_str());
        spacing.set_attr("w:lineRule", "auto");
        touched += 1;
    }
    Ok(touched)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docx::xml::XmlDocument;

    fn parse(body: &str) -> XmlElement {
        let xml = format!(
            r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body}</w:body></w:document>"#
        );
        XmlDocument::parse(xml.as_bytes()).unwrap().root
    }

    const TWO_SECTIONS: &str = r#"<w:p><w:pPr><w:sectPr><w:pgSz w:w="12240" w:h="15840"/><w:pgMar w:top="1440" w:right="1800" w:bottom="1440" w:left="1800" w:header="720" w:footer="720" w:gutter="0"/></w:sectPr></w:pPr></w:p><w:p><w:r><w:t>Second section</w:t></w:r></w:p><w:sectPr><w:pgSz w:w="15840" w:h="12240" w:orient="landscape"/><w:pgMar w:top="720" w:right="720" w:bottom="720" w:left="720" w:header="720" w:footer="720" w:gutter="0"/></w:sectPr>"#;

    #[test]
    fn test_inspect_counts() {
        let doc = parse(
            r#"<w:p><w:pPr><w:pStyle w:val="Heading1"/></w:pPr><w:r><w:rPr><w:rFonts w:ascii="Arial"/></w:rPr><w:t>Intro</w:t></w:r></w:p>
<w:p><w:r><w:rPr><w:rFonts w:ascii="Arial"/></w:rPr><w:t xml:space="preserve">Some body </w:t></w:r><w:r><w:t>text here</w:t></w:r></w:p>
<w:tbl><w:tr><w:tc><w:p><w:r><w:t>cell</w:t></w:r></w:p></w:tc></w:tr></w:tbl>"#,
        );
        let stats = inspect(&doc, &StyleSheet::default()).unwrap();

        assert_eq!(stats.paragraph_count, 2);
        assert_eq!(stats.word_count, 5);
        assert_eq!(stats.table_count, 1);
        assert_eq!(stats.fonts_used.get("Arial"), Some(&2));
        assert_eq!(stats.fonts_used.len(), 1);
        assert_eq!(stats.heading_counts.level(1), 1);
        assert_eq!(stats.section_count, 0);
        assert_eq!(stats.page_dimensions, PageDimensions::letter());
        assert_eq!(stats.margins, Margins::uniform(1.0));
    }

    #[test]
    fn test_paragraph_text_includes_hyperlinks_and_tabs() {
        let doc = parse(
            r#"<w:p><w:r><w:t>See</w:t><w:tab/></w:r><w:hyperlink><w:r><w:t>the docs</w:t></w:r></w:hyperlink><w:r><w:br/><w:t>now</w:t></w:r></w:p>"#,
        );
        let p = doc.child("body").unwrap().child("p").unwrap();
        assert_eq!(paragraph_text(p), "See\tthe docs\nnow");
    }

    #[test]
    fn test_sections_read_first() {
        let doc = parse(TWO_SECTIONS);
        let stats = inspect(&doc, &StyleSheet::default()).unwrap();
        assert_eq!(stats.section_count, 2);
        assert!((stats.page_dimensions.width - 8.5).abs() < 1e-9);
        assert!((stats.margins.left - 1.25).abs() < 1e-9);
        assert!((stats.margins.top - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_set_margin_touches_only_one_side() {
        let mut doc = parse(TWO_SECTIONS);
        let touched = set_margin(&mut doc, MarginSide::Top, 0.5).unwrap();
        assert_eq!(touched, 2);

        let body = doc.child("body").unwrap();
        for sect in sections(body) {
            let pg_mar = sect.child("pgMar").unwrap();
            assert_eq!(pg_mar.attr("top"), Some("720"));
        }
        let first = sections(body)[0].child("pgMar").unwrap();
        assert_eq!(first.attr("left"), Some("1800"));
        assert_eq!(first.attr("bottom"), Some("1440"));
    }

    #[test]
    fn test_set_page_size_uniform() {
        let mut doc = parse(TWO_SECTIONS);
        set_page_size(&mut doc, 8.27, 11.69).unwrap();
        let body = doc.child("body").unwrap();
        for sect in sections(body) {
            let pg_sz = sect.child("pgSz").unwrap();
            assert_eq!(pg_sz.attr("w"), Some("11909"));
            assert_eq!(pg_sz.attr("h"), Some("16834"));
        }
    }

    #[test]
    fn test_zero_sections_get_default_section() {
        let mut doc = parse(r#"<w:p><w:r><w:t>Loose</w:t></w:r></w:p>"#);
        set_margin(&mut doc, MarginSide::Right, 2.0).unwrap();

        let body = doc.child("body").unwrap();
        let found = sections(body);
        assert_eq!(found.len(), 1);
        let stats_margins = margins(found[0]);
        assert_eq!(stats_margins.right, 2.0);
        assert_eq!(stats_margins.left, 1.0);
        assert_eq!(page_dimensions(found[0]), PageDimensions::letter());
        assert!(body.elements().last().unwrap().is("sectPr"));
    }

    #[test]
    fn test_new_pg_mar_placed_after_pg_sz() {
        let mut doc = parse(r#"<w:sectPr><w:pgSz w:w="12240" w:h="15840"/><w:cols w:space="720"/></w:sectPr>"#);
        set_margin(&mut doc, MarginSide::Left, 1.5).unwrap();
        let sect = doc.child("body").unwrap().child("sectPr").unwrap();
        let names: Vec<_> = sect.elements().map(|e| e.local_name()).collect();
        assert_eq!(names, vec!["pgSz", "pgMar", "cols"]);
        assert_eq!(sect.child("pgMar").unwrap().attr("left"), Some("2160"));
        assert_eq!(sect.child("pgMar").unwrap().attr("top"), Some("1440"));
    }

    #[test]
    fn test_set_run_font() {
        let mut doc = parse(
            r#"<w:p><w:r><w:rPr><w:b/><w:rFonts w:asciiTheme="minorHAnsi"/></w:rPr><w:t>a</w:t></w:r><w:r><w:t>b</w:t></w:r></w:p>"#,
        );
        let touched = set_run_font(&mut doc, Some("Georgia"), Some(11.5)).unwrap();
        assert_eq!(touched, 2);

        let stats = inspect(&doc, &StyleSheet::default()).unwrap();
        assert_eq!(stats.fonts_used.get("Georgia"), Some(&2));

        let p = doc.child("body").unwrap().child("p").unwrap();
        for run in p.elements().filter(|e| e.is("r")) {
            assert!(run.elements().next().unwrap().is("rPr"));
            let rpr = run.child("rPr").unwrap();
            assert_eq!(rpr.child("sz").unwrap().attr("val"), Some("23"));
            let fonts = rpr.child("rFonts").unwrap();
            assert_eq!(fonts.attr("asciiTheme"), None);
            assert_eq!(fonts.attr("hAnsi"), Some("Georgia"));
        }
    }

    #[test]
    fn test_set_line_spacing() {
        let mut doc = parse(
            r#"<w:p><w:pPr><w:pStyle w:val="Title"/><w:jc w:val="center"/></w:pPr></w:p><w:p/>"#,
        );
        assert_eq!(set_line_spacing(&mut doc, 1.5).unwrap(), 2);

        let body = doc.child("body").unwrap();
        for p in body.elements().filter(|e| e.is("p")) {
            let spacing = p.child("pPr").unwrap().child("spacing").unwrap();
            assert_eq!(spacing.attr("line"), Some("360"));
            assert_eq!(spacing.attr("lineRule"), Some("auto"));
        }
        let first_ppr = body.child("p").unwrap().child("pPr").unwrap();
        let names: Vec<_> = first_ppr.elements().map(|e| e.local_name()).collect();
        assert_eq!(names, vec!["pStyle", "spacing", "jc"]);
    }

    #[test]
    fn test_missing_body_is_error() {
        let root = XmlDocument::parse(b"<w:document xmlns:w=\"x\"/>").unwrap().root;
        assert!(inspect(&root, &StyleSheet::default()).is_err());
    }
}
