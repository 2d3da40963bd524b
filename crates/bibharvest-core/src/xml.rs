//! Namespace-agnostic XML helpers.
//!
//! Full-text archive documents qualify tags and attributes with prefixes
//! that differ between sources (`xlink:href`, `{http://...}href`, plain
//! `href`). Every lookup here compares only the local name, so the same
//! query works whatever namespaces a document declares.
//!
//! Two layers:
//! - [`local_name`] / [`is_local`]: the matching predicate, also used by
//!   streaming parsers.
//! - [`Element`]: a small owned tree for documents that need random
//!   access (first `<fig>` anywhere, first `<license>` anywhere).

use std::borrow::Cow;

use anyhow::{Context, Result, bail};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, BytesText, Event};

/// Part of a qualified name after the last namespace separator.
///
/// Handles both prefix form (`xlink:href`) and Clark notation
/// (`{http://www.w3.org/1999/xlink}href`).
pub fn local_name(name: &str) -> &str {
    name.rsplit([':', '}']).next().unwrap_or(name)
}

/// Whether `name` has local name `wanted`, ignoring any namespace.
pub fn is_local(name: &str, wanted: &str) -> bool {
    local_name(name) == wanted
}

/// [`local_name`] on raw bytes, for quick-xml names.
pub fn local_name_bytes(name: &[u8]) -> &[u8] {
    let start = name
        .iter()
        .rposition(|&b| b == b':' || b == b'}')
        .map_or(0, |pos| pos + 1);
    &name[start..]
}

/// [`is_local`] on raw bytes.
pub fn is_local_bytes(name: &[u8], wanted: &[u8]) -> bool {
    local_name_bytes(name) == wanted
}

/// Trim and drop empty strings.
pub fn clean_text(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Unescape a text event, keeping the raw text if an entity is unknown
/// (archive documents reference DTD entities quick-xml cannot resolve).
pub fn decode_text(text: &BytesText) -> String {
    match text.unescape() {
        Ok(s) => s.into_owned(),
        Err(_) => String::from_utf8_lossy(text).into_owned(),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
}

/// Owned XML element with qualified names as they appear in the source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    /// Parse a whole document and return its root element.
    pub fn parse(xml: &[u8]) -> Result<Element> {
        let mut reader = Reader::from_reader(xml);
        let mut buf = Vec::new();
        let mut stack: Vec<Element> = Vec::new();
        let mut root = None;

        loop {
            let event = reader
                .read_event_into(&mut buf)
                .with_context(|| format!("XML parse error at byte {}", reader.buffer_position()))?;
            match event {
                Event::Start(e) => stack.push(Element::from_start(&e)?),
                Event::Empty(e) => {
                    let element = Element::from_start(&e)?;
                    attach(&mut stack, &mut root, element);
                }
                Event::End(_) => {
                    if let Some(element) = stack.pop() {
                        attach(&mut stack, &mut root, element);
                    }
                }
                Event::Text(e) => {
                    if let Some(parent) = stack.last_mut() {
                        parent.children.push(Node::Text(decode_text(&e)));
                    }
                }
                Event::CData(e) => {
                    if let Some(parent) = stack.last_mut() {
                        let text = String::from_utf8_lossy(&e.into_inner()).into_owned();
                        parent.children.push(Node::Text(text));
                    }
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        if !stack.is_empty() {
            bail!("XML document ended inside <{}>", stack[stack.len() - 1].name);
        }
        root.context("XML document has no root element")
    }

    fn from_start(e: &BytesStart) -> Result<Element> {
        let mut attributes = Vec::new();
        for attr in e.attributes() {
            let attr = attr.context("malformed XML attribute")?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = match attr.unescape_value() {
                Ok(v) => v.into_owned(),
                Err(_) => String::from_utf8_lossy(&attr.value).into_owned(),
            };
            attributes.push((key, value));
        }
        Ok(Element {
            name: String::from_utf8_lossy(e.name().as_ref()).into_owned(),
            attributes,
            children: Vec::new(),
        })
    }

    pub fn local_name(&self) -> &str {
        local_name(&self.name)
    }

    /// Value of the first attribute with local name `local`.
    pub fn attr(&self, local: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| is_local(key, local))
            .map(|(_, value)| value.as_str())
    }

    /// This element and everything below it, in document order.
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants { stack: vec![self] }
    }

    /// First element (self included) with local name `local`.
    pub fn find(&self, local: &str) -> Option<&Element> {
        self.descendants().find(|el| el.local_name() == local)
    }

    /// Direct child elements.
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(el) => Some(el),
            Node::Text(_) => None,
        })
    }

    /// First direct child with local name `local`.
    pub fn child(&self, local: &str) -> Option<&Element> {
        self.elements().find(|el| el.local_name() == local)
    }

    /// All descendant text concatenated, without trimming.
    pub fn raw_text(&self) -> Cow<'_, str> {
        match self.children.as_slice() {
            [] => Cow::Borrowed(""),
            [Node::Text(text)] => Cow::Borrowed(text.as_str()),
            _ => {
                let mut out = String::new();
                collect_text(self, &mut out);
                Cow::Owned(out)
            }
        }
    }

    /// Flattened text, trimmed; `None` when nothing is left.
    pub fn text(&self) -> Option<String> {
        clean_text(&self.raw_text())
    }
}

fn collect_text(element: &Element, out: &mut String) {
    for node in &element.children {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) => collect_text(el, out),
        }
    }
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(Node::Element(element)),
        None => {
            if root.is_none() {
                *root = Some(element);
            }
        }
    }
}

/// Pre-order walk, see [`Element::descendants`]
pub struct Descendants<'a> {
    stack: Vec<&'a Element>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Element;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.stack.pop()?;
        let children: Vec<&Element> = current.elements().collect();
        self.stack.extend(children.into_iter().rev());
        Some(current)
    }
}

/// Parse a document held in a string.
pub fn parse_str(xml: &str) -> Result<Element> {
    Element::parse(xml.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_name_strips_prefix() {
        assert_eq!(local_name("xlink:href"), "href");
        assert_eq!(local_name("{http://www.w3.org/1999/xlink}href"), "href");
        assert_eq!(local_name("href"), "href");
        assert_eq!(local_name("a:b:c"), "c");
    }

    #[test]
    fn is_local_ignores_namespace() {
        assert!(is_local("ali:license", "license"));
        assert!(is_local("license", "license"));
        assert!(!is_local("license-p", "license"));
        assert!(is_local_bytes(b"xlink:href", b"href"));
        assert!(is_local_bytes(b"href", b"href"));
        assert!(!is_local_bytes(b"hrefs", b"href"));
        assert_eq!(local_name_bytes(b"mml:math"), b"math");
    }

    #[test]
    fn clean_text_trims() {
        assert_eq!(clean_text("  a b \n"), Some("a b".to_string()));
        assert_eq!(clean_text(" \n\t"), None);
        assert_eq!(clean_text(""), None);
    }

    #[test]
    fn text_flattens_nested_markup() {
        let root = parse_str("<p> Hello <i>brave</i> <b>new</b> world </p>").unwrap();
        assert_eq!(root.text(), Some("Hello brave new world".to_string()));
    }

    #[test]
    fn text_none_for_empty_element() {
        let root = parse_str("<r><empty/><blank>   </blank></r>").unwrap();
        assert_eq!(root.child("empty").unwrap().text(), None);
        assert_eq!(root.child("blank").unwrap().text(), None);
    }

    #[test]
    fn attr_matches_local_name() {
        let xml = r#"<r xmlns:xlink="http://www.w3.org/1999/xlink"><graphic xlink:href="f1.jpg" href="other"/></r>"#;
        let root = parse_str(xml).unwrap();
        let graphic = root.find("graphic").unwrap();
        assert_eq!(graphic.attr("href"), Some("f1.jpg"));
        assert_eq!(graphic.attr("missing"), None);
    }

    #[test]
    fn find_is_document_order() {
        let xml = "<a><b><fig id=\"1\"/></b><fig id=\"2\"/></a>";
        let root = parse_str(xml).unwrap();
        assert_eq!(root.find("fig").unwrap().attr("id"), Some("1"));
        let ids: Vec<_> = root
            .descendants()
            .filter(|el| el.local_name() == "fig")
            .filter_map(|el| el.attr("id"))
            .collect();
        assert_eq!(ids, vec!["1", "2"]);
    }

    #[test]
    fn find_includes_self() {
        let root = parse_str("<fig><caption>c</caption></fig>").unwrap();
        assert_eq!(root.find("fig").unwrap().name, "fig");
    }

    #[test]
    fn prefixed_elements_found() {
        let xml = r#"<article xmlns:ali="http://www.niso.org/schemas/ali/1.0/"><ali:license_ref>x</ali:license_ref><ali:license>y</ali:license></article>"#;
        let root = parse_str(xml).unwrap();
        assert_eq!(root.find("license").unwrap().text(), Some("y".to_string()));
    }

    #[test]
    fn entities_and_cdata() {
        let root = parse_str("<t>a &amp; b<![CDATA[ <c> ]]></t>").unwrap();
        assert_eq!(root.text(), Some("a & b <c>".to_string()));
    }

    #[test]
    fn unknown_entity_kept_raw() {
        let root = parse_str("<t>a&nbsp;b</t>").unwrap();
        assert_eq!(root.text(), Some("a&nbsp;b".to_string()));
    }

    #[test]
    fn doctype_is_ignored() {
        let xml = r#"<?xml version="1.0"?>
<!DOCTYPE pmc-articleset PUBLIC "-//NLM//DTD ARTICLE SET 2.0//EN" "https://dtd.nlm.nih.gov/ncbi/pmc/articleset/nlm-articleset-2.0.dtd">
<pmc-articleset><article/></pmc-articleset>"#;
        let root = parse_str(xml).unwrap();
        assert_eq!(root.name, "pmc-articleset");
        assert!(root.child("article").is_some());
    }

    #[test]
    fn malformed_is_error() {
        assert!(parse_str("<a><b></a>").is_err());
        assert!(parse_str("").is_err());
        assert!(parse_str("<a>").is_err());
    }
}
