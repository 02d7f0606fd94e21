//! Minimal XHTML/XML element tree and serializer.
//!
//! Documents are assembled as [`Element`] trees and written in one pass
//! through [`quick_xml::Writer`]. All text and attribute values go through
//! [`escape`].

use std::borrow::Cow;
use std::io::Write;

use quick_xml::Writer;
use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::name::QName;

use crate::error::Result;

const RESERVED: [char; 7] = ['&', '<', '>', '"', '\'', '{', '}'];

/// Entity for a reserved character.
///
/// `'` maps to `&#123;`, the same entity as `{`. Generated books have always
/// carried this mapping and the output is kept byte-compatible.
pub fn entity(c: char) -> Option<&'static str> {
    match c {
        '&' => Some("&amp;"),
        '<' => Some("&lt;"),
        '>' => Some("&gt;"),
        '"' => Some("&quot;"),
        '\'' | '{' => Some("&#123;"),
        '}' => Some("&#125;"),
        _ => None,
    }
}

/// Escape `s` for element content or attribute values.
pub fn escape(s: &str) -> Cow<'_, str> {
    if !s.contains(RESERVED) {
        return Cow::Borrowed(s);
    }
    let mut out = String::with_capacity(s.len() + 16);
    for c in s.chars() {
        match entity(c) {
            Some(e) => out.push_str(e),
            None => out.push(c),
        }
    }
    Cow::Owned(out)
}

/// A node of an element tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    /// Unescaped text. Empty text writes nothing.
    Text(String),
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Node::Element(element)
    }
}

impl From<String> for Node {
    fn from(text: String) -> Self {
        Node::Text(text)
    }
}

impl From<&str> for Node {
    fn from(text: &str) -> Self {
        Node::Text(text.to_string())
    }
}

/// An element with ordered attributes and children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    name: &'static str,
    attrs: Vec<(&'static str, String)>,
    children: Vec<Node>,
}

impl Element {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn attr(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.attrs.push((key, value.into()));
        self
    }

    pub fn child(mut self, node: impl Into<Node>) -> Self {
        self.children.push(node.into());
        self
    }

    pub fn children<I>(mut self, nodes: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Node>,
    {
        self.children.extend(nodes.into_iter().map(Into::into));
        self
    }

    pub fn push(&mut self, node: impl Into<Node>) {
        self.children.push(node.into());
    }

    /// Serialize without any declaration.
    pub fn to_fragment(&self) -> Result<String> {
        let mut writer = Writer::new(Vec::new());
        write_element(&mut writer, self)?;
        Ok(String::from_utf8(writer.into_inner())?)
    }
}

/// Serialize a complete document: XML declaration, optional doctype, root.
pub fn write_document(root: &Element, doctype: Option<&str>) -> Result<Vec<u8>> {
    let mut writer = Writer::new(Vec::new());
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    writer.get_mut().write_all(b"\n")?;
    if let Some(doctype) = doctype {
        writer.get_mut().write_all(format!("<!DOCTYPE {doctype}>\n").as_bytes())?;
    }
    write_element(&mut writer, root)?;
    Ok(writer.into_inner())
}

fn write_element<W: Write>(writer: &mut Writer<W>, element: &Element) -> Result<()> {
    let mut start = BytesStart::new(element.name);
    for (key, value) in &element.attrs {
        start.push_attribute(Attribute {
            key: QName(key.as_bytes()),
            value: Cow::Owned(escape(value).into_owned().into_bytes()),
        });
    }

    if element.children.is_empty() {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }

    writer.write_event(Event::Start(start))?;
    for child in &element.children {
        match child {
            Node::Element(inner) => write_element(writer, inner)?,
            Node::Text(text) if text.is_empty() => {}
            Node::Text(text) => {
                writer.write_event(Event::Text(BytesText::from_escaped(escape(text))))?
            }
        }
    }
    writer.write_event(Event::End(BytesEnd::new(element.name)))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_escape_table() {
        assert_eq!(escape("a & b"), "a &amp; b");
        assert_eq!(escape("<tag>"), "&lt;tag&gt;");
        assert_eq!(escape("\"q\""), "&quot;q&quot;");
        assert_eq!(escape("{x}"), "&#123;x&#125;");
    }

    struct FailingSink;

    impl Write for FailingSink {
        fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::other("disk full"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_write_failure_is_io_error() {
        let mut writer = Writer::new(FailingSink);
        let err = write_element(&mut writer, &Element::new("br")).unwrap_err();
        assert!(matches!(err, crate::error::Error::Io(_)));
    }

    #[test]
    fn test_apostrophe_shares_brace_entity() {
        assert_eq!(escape("it's"), "it&#123;s");
        assert_eq!(entity('\''), entity('{'));
    }

    #[test]
    fn test_safe_text_is_borrowed() {
        assert!(matches!(escape("漢字《かんじ》"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_element_serialization() {
        let el = Element::new("p")
            .attr("class", "x\"y")
            .child("a<b")
            .child(Element::new("br"))
            .child("")
            .child(Element::new("span").child("c"));
        assert_eq!(
            el.to_fragment().unwrap(),
            r#"<p class="x&quot;y">a&lt;b<br/><span>c</span></p>"#
        );
    }

    #[test]
    fn test_empty_text_child_collapses_element() {
        let el = Element::new("td").child("");
        assert_eq!(el.to_fragment().unwrap(), "<td></td>");
        assert_eq!(Element::new("td").to_fragment().unwrap(), "<td/>");
    }

    #[test]
    fn test_document_prologue() {
        let doc = write_document(&Element::new("html"), Some("html")).unwrap();
        assert_eq!(
            String::from_utf8(doc).unwrap(),
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<!DOCTYPE html>\n<html/>"
        );
    }

    proptest! {
        #[test]
        fn prop_escape_is_identity_on_safe_text(s in "[^&<>\"'{}]*") {
            prop_assert_eq!(escape(&s), s.as_str());
        }

        #[test]
        fn prop_escape_leaves_no_reserved_chars(s in ".*") {
            let escaped = escape(&s);
            // Only the `&` that open entities remain.
            let stripped = escaped
                .replace("&amp;", "")
                .replace("&lt;", "")
                .replace("&gt;", "")
                .replace("&quot;", "")
                .replace("&#123;", "")
                .replace("&#125;", "");
            prop_assert!(!stripped.contains(RESERVED));
        }
    }
}
