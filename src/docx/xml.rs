//! Minimal mutable XML element tree over quick-xml.
//!
//! Parts are parsed into [`XmlElement`]s, edited in place, and written back.
//! Text is kept in its escaped source form and comments, CDATA and
//! processing instructions are carried as raw events, so untouched content
//! round-trips unchanged.

use crate::error::{Error, Result};
use quick_xml::escape::unescape;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

/// A parsed XML part.
#[derive(Debug, Clone)]
pub struct XmlDocument {
    /// Declaration, comments and whitespace before the root element
    prolog: Vec<Event<'static>>,
    pub root: XmlElement,
}

/// A node inside an element.
#[derive(Debug, Clone, PartialEq)]
pub enum XmlNode {
    Element(XmlElement),
    /// Character data, still escaped
    Text(String),
    /// Comment, CDATA, processing instruction or doctype
    Other(Event<'static>),
}

/// An element with its attributes and children.
#[derive(Debug, Clone, PartialEq)]
pub struct XmlElement {
    /// Qualified name, e.g. `w:p`
    pub name: String,
    /// Qualified attribute names with unescaped values
    attributes: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
}

/// Local part of a qualified name (`w:pgMar` -> `pgMar`).
pub fn local_part(name: &str) -> &str {
    name.rsplit_once(':').map_or(name, |(_, local)| local)
}

impl XmlDocument {
    /// Parse a complete XML part.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut reader = Reader::from_reader(data);
        reader.config_mut().trim_text(false);

        let mut buf = Vec::new();
        let mut prolog = Vec::new();
        let mut stack: Vec<XmlElement> = Vec::new();
        let mut root: Option<XmlElement> = None;

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(e) => stack.push(XmlElement::from_start(&e)?),
                Event::Empty(e) => {
                    let element = XmlElement::from_start(&e)?;
                    attach(&mut stack, &mut root, element)?;
                }
                Event::End(_) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| Error::Xml("unexpected closing tag".to_string()))?;
                    attach(&mut stack, &mut root, element)?;
                }
                Event::Text(t) => {
                    let raw = String::from_utf8(t.to_vec())
                        .map_err(|e| Error::Xml(format!("text is not UTF-8: {e}")))?;
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(XmlNode::Text(raw)),
                        None if root.is_none() => prolog.push(Event::Text(t.into_owned())),
                        None => {}
                    }
                }
                Event::Eof => break,
                other => match stack.last_mut() {
                    Some(parent) => parent.children.push(XmlNode::Other(other.into_owned())),
                    None if root.is_none() => prolog.push(other.into_owned()),
                    None => {}
                },
            }
            buf.clear();
        }

        if !stack.is_empty() {
            return Err(Error::Xml(format!(
                "unclosed element <{}>",
                stack[stack.len() - 1].name
            )));
        }
        let root = root.ok_or_else(|| Error::Xml("document has no root element".to_string()))?;
        Ok(Self { prolog, root })
    }

    /// Serialize the part back to bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut writer = Writer::new(Vec::new());
        for event in &self.prolog {
            writer.write_event(event.borrow())?;
        }
        write_element(&mut writer, &self.root)?;
        Ok(writer.into_inner())
    }
}

fn attach(
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
    element: XmlElement,
) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => {
            parent.children.push(XmlNode::Element(element));
            Ok(())
        }
        None if root.is_none() => {
            *root = Some(element);
            Ok(())
        }
        None => Err(Error::Xml(format!(
            "second root element <{}>",
            element.name
        ))),
    }
}

fn write_element(writer: &mut Writer<Vec<u8>>, element: &XmlElement) -> Result<()> {
    let mut start = BytesStart::new(element.name.as_str());
    for (key, value) in &element.attributes {
        start.push_attribute((key.as_str(), value.as_str()));
    }

    if element.children.is_empty() {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }

    writer.write_event(Event::Start(start))?;
    for child in &element.children {
        match child {
            XmlNode::Element(e) => write_element(writer, e)?,
            XmlNode::Text(raw) => {
                writer.write_event(Event::Text(BytesText::from_escaped(raw.as_str())))?
            }
            XmlNode::Other(event) => writer.write_event(event.borrow())?,
        }
    }
    writer.write_event(Event::End(BytesEnd::new(element.name.as_str())))?;
    Ok(())
}

impl XmlElement {
    /// Create an empty element.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Builder form of [`XmlElement::set_attr`].
    pub fn with_attr(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    fn from_start(start: &BytesStart<'_>) -> Result<Self> {
        let name = String::from_utf8(start.name().as_ref().to_vec())
            .map_err(|e| Error::Xml(format!("element name is not UTF-8: {e}")))?;
        let mut attributes = Vec::new();
        for attr in start.attributes() {
            let attr = attr?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr.unescape_value()?.into_owned();
            attributes.push((key, value));
        }
        Ok(Self {
            name,
            attributes,
            children: Vec::new(),
        })
    }

    pub fn local_name(&self) -> &str {
        local_part(&self.name)
    }

    /// Whether the element's local name is `local`.
    pub fn is(&self, local: &str) -> bool {
        self.local_name() == local
    }

    /// Attribute value by local name. Namespace declarations are skipped.
    pub fn attr(&self, local: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| !key.starts_with("xmlns") && local_part(key) == local)
            .map(|(_, value)| value.as_str())
    }

    /// Set an attribute, replacing one with the same local name.
    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let local = local_part(name);
        let value = value.into();
        match self
            .attributes
            .iter_mut()
            .find(|(key, _)| !key.starts_with("xmlns") && local_part(key) == local)
        {
            Some((_, existing)) => *existing = value,
            None => self.attributes.push((name.to_string(), value)),
        }
    }

    /// Remove an attribute by local name.
    pub fn remove_attr(&mut self, local: &str) {
        self.attributes
            .retain(|(key, _)| key.starts_with("xmlns") || local_part(key) != local);
    }

    /// Child elements in order.
    pub fn elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|node| match node {
            XmlNode::Element(e) => Some(e),
            _ => None,
        })
    }

    /// Mutable child elements in order.
    pub fn elements_mut(&mut self) -> impl Iterator<Item = &mut XmlElement> {
        self.children.iter_mut().filter_map(|node| match node {
            XmlNode::Element(e) => Some(e),
            _ => None,
        })
    }

    /// First child element with local name `local`.
    pub fn child(&self, local: &str) -> Option<&XmlElement> {
        self.elements().find(|e| e.is(local))
    }

    pub fn child_mut(&mut self, local: &str) -> Option<&mut XmlElement> {
        self.elements_mut().find(|e| e.is(local))
    }

    /// Return the child `name`, creating it if missing.
    ///
    /// A new child is placed according to `order`, a schema sequence of
    /// local names: before the first existing sibling that the sequence puts
    /// after it. Siblings missing from `order` count as coming last.
    pub fn ensure_child(&mut self, name: &str, order: &[&str]) -> &mut XmlElement {
        let local = local_part(name);
        let position = self
            .children
            .iter()
            .position(|node| matches!(node, XmlNode::Element(e) if e.is(local)));

        let index = match position {
            Some(index) => index,
            None => {
                let rank = |l: &str| order.iter().position(|o| *o == l).unwrap_or(order.len());
                let new_rank = rank(local);
                let insert_at = self
                    .children
                    .iter()
                    .position(|node| {
                        matches!(node, XmlNode::Element(e) if rank(e.local_name()) > new_rank)
                    })
                    .unwrap_or(self.children.len());
                self.children
                    .insert(insert_at, XmlNode::Element(XmlElement::new(name)));
                insert_at
            }
        };

        match &mut self.children[index] {
            XmlNode::Element(e) => e,
            _ => unreachable!("index points at an element node"),
        }
    }

    /// Append a child element.
    pub fn push(&mut self, element: XmlElement) {
        self.children.push(XmlNode::Element(element));
    }

    /// Unescaped character data directly inside this element.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for node in &self.children {
            if let XmlNode::Text(raw) = node {
                match unescape(raw) {
                    Ok(text) => out.push_str(&text),
                    Err(_) => out.push_str(raw),
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body><!-- note --><w:p><w:r><w:t xml:space="preserve">Fish &amp; chips </w:t></w:r></w:p><w:sectPr><w:pgSz w:w="12240" w:h="15840"/></w:sectPr></w:body></w:document>"#;

    #[test]
    fn test_parse_and_query() {
        let doc = XmlDocument::parse(SAMPLE.as_bytes()).unwrap();
        assert!(doc.root.is("document"));

        let body = doc.root.child("body").unwrap();
        let text = body
            .child("p")
            .and_then(|p| p.child("r"))
            .and_then(|r| r.child("t"))
            .unwrap();
        assert_eq!(text.text(), "Fish & chips ");
        assert_eq!(text.attr("space"), Some("preserve"));

        let pg_sz = body.child("sectPr").and_then(|s| s.child("pgSz")).unwrap();
        assert_eq!(pg_sz.attr("w"), Some("12240"));
        assert_eq!(pg_sz.attr("h"), Some("15840"));
    }

    #[test]
    fn test_round_trip_preserves_content() {
        let doc = XmlDocument::parse(SAMPLE.as_bytes()).unwrap();
        let bytes = doc.to_bytes().unwrap();
        let written = String::from_utf8(bytes.clone()).unwrap();

        assert!(written.starts_with("<?xml version=\"1.0\""));
        assert!(written.contains("<!-- note -->"));
        assert!(written.contains("Fish &amp; chips "));

        let reparsed = XmlDocument::parse(&bytes).unwrap();
        assert_eq!(reparsed.root, doc.root);
    }

    #[test]
    fn test_set_attr_keeps_prefix_and_escapes() {
        let mut el = XmlElement::new("w:rFonts").with_attr("w:ascii", "Calibri");
        el.set_attr("w:ascii", "Tom & Jerry");
        el.set_attr("w:hAnsi", "Tom & Jerry");
        assert_eq!(el.attr("ascii"), Some("Tom & Jerry"));

        let doc = XmlDocument {
            prolog: Vec::new(),
            root: el,
        };
        let written = String::from_utf8(doc.to_bytes().unwrap()).unwrap();
        assert_eq!(
            written,
            r#"<w:rFonts w:ascii="Tom &amp; Jerry" w:hAnsi="Tom &amp; Jerry"/>"#
        );
    }

    #[test]
    fn test_ensure_child_respects_order() {
        let order = ["pStyle", "keepNext", "spacing", "ind", "jc", "rPr"];
        let mut ppr = XmlElement::new("w:pPr");
        ppr.push(XmlElement::new("w:pStyle"));
        ppr.push(XmlElement::new("w:jc"));
        ppr.push(XmlElement::new("w:rPr"));

        ppr.ensure_child("w:spacing", &order).set_attr("w:line", "360");
        let names: Vec<_> = ppr.elements().map(|e| e.local_name()).collect();
        assert_eq!(names, vec!["pStyle", "spacing", "jc", "rPr"]);

        // Existing children are reused rather than duplicated
        ppr.ensure_child("w:spacing", &order).set_attr("w:line", "480");
        assert_eq!(ppr.elements().filter(|e| e.is("spacing")).count(), 1);
        assert_eq!(ppr.child("spacing").unwrap().attr("line"), Some("480"));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(XmlDocument::parse(b"<a><b></a>").is_err());
        assert!(XmlDocument::parse(b"<a>").is_err());
        assert!(XmlDocument::parse(b"").is_err());
    }
}
