//! Document tree
//!
//! A small element tree covering the XML subset presentation objects are
//! saved in: elements, attributes, text, CDATA, comments and the XML
//! declaration. Lookup by child name returns the first match; documents that
//! repeat a child name are read through [`Node::children_named`].

use regex::{Captures, Regex};
use std::fmt;
use std::str::FromStr;

/// Errors raised while reading a document
#[derive(Debug, thiserror::Error)]
pub enum NodeError {
    #[error("Document contains no root element")]
    EmptyDocument,

    #[error("Closing tag </{0}> has no matching opening tag")]
    UnexpectedClosingTag(String),

    #[error("Expected closing tag </{expected}>, found </{found}>")]
    MismatchedClosingTag { expected: String, found: String },

    #[error("Element <{0}> is never closed")]
    UnclosedElement(String),

    #[error("Document has more than one root element (second root: <{0}>)")]
    MultipleRoots(String),

    #[error("Text outside the root element: {0:?}")]
    ContentOutsideRoot(String),

    #[error("Malformed markup near: {0:?}")]
    Malformed(String),

    #[error("Unknown or invalid entity reference: &{0};")]
    InvalidEntity(String),

    #[error("Failed to compile document pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Piece of element content, kept in document order
#[derive(Debug, Clone, PartialEq)]
pub enum Content {
    Text(String),
    Element(Node),
}

/// Element in a document tree
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    name: String,
    attributes: Vec<(String, String)>,
    content: Vec<Content>,
}

impl Node {
    /// Create an empty element
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            content: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attribute(name, value);
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.push_text(text);
        self
    }

    pub fn with_child(mut self, child: Node) -> Self {
        self.push_child(child);
        self
    }

    /// Set an attribute, replacing any previous value under the same name
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| *k == name) {
            Some((_, existing)) => *existing = value,
            None => self.attributes.push((name, value)),
        }
    }

    pub fn push_text(&mut self, text: impl Into<String>) {
        let text = text.into();
        if !text.is_empty() {
            self.content.push(Content::Text(text));
        }
    }

    pub fn push_child(&mut self, child: Node) {
        self.content.push(Content::Element(child));
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Attributes in document order
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn content(&self) -> &[Content] {
        &self.content
    }

    /// Direct child elements
    pub fn children(&self) -> impl Iterator<Item = &Node> {
        self.content.iter().filter_map(|c| match c {
            Content::Element(node) => Some(node),
            Content::Text(_) => None,
        })
    }

    /// First direct child element with the given name
    pub fn child(&self, name: &str) -> Option<&Node> {
        self.children().find(|n| n.name == name)
    }

    /// All direct child elements with the given name
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Node> + 'a {
        self.children().filter(move |n| n.name == name)
    }

    /// Concatenated text of this element and all of its descendants
    pub fn value(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for content in &self.content {
            match content {
                Content::Text(text) => out.push_str(text),
                Content::Element(node) => node.collect_text(out),
            }
        }
    }

    /// Parse a document and return its root element
    pub fn parse(input: &str) -> Result<Node, NodeError> {
        DocumentReader::new()?.read(input)
    }

    /// Serialize the element without insignificant whitespace
    pub fn to_xml_string(&self) -> String {
        let mut out = String::new();
        self.write_xml(&mut out);
        out
    }

    fn write_xml(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.name);
        for (name, value) in &self.attributes {
            out.push_str(&format!(r#" {}="{}""#, name, escape_attribute(value)));
        }

        if self.content.is_empty() {
            out.push_str(" />");
            return;
        }

        out.push('>');
        for content in &self.content {
            match content {
                Content::Text(text) => out.push_str(&escape_text(text)),
                Content::Element(node) => node.write_xml(out),
            }
        }
        out.push_str("</");
        out.push_str(&self.name);
        out.push('>');
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_xml_string())
    }
}

impl FromStr for Node {
    type Err = NodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Node::parse(s)
    }
}

/// Stack-based reader driven by a markup tokenizer regex
struct DocumentReader {
    markup: Regex,
    attribute: Regex,
    entity: Regex,
}

impl DocumentReader {
    fn new() -> Result<Self, NodeError> {
        // Comments, declarations and doctypes are skipped; CDATA becomes text.
        // Quoted attribute values may contain '>' and '/'.
        let markup = Regex::new(
            r#"(?s)<!--.*?-->|<\?.*?\?>|<!DOCTYPE[^>]*>|<!\[CDATA\[(?P<cdata>.*?)\]\]>|<(?P<close>/)?(?P<name>[\p{L}_][\w.:\-]*)(?P<attrs>(?:\s+(?:"[^"]*"|'[^']*'|[^<>"'])*?)?)\s*(?P<empty>/)?>"#,
        )?;
        let attribute =
            Regex::new(r#"([\p{L}_][\w.:\-]*)\s*=\s*(?:"([^"]*)"|'([^']*)')"#)?;
        let entity = Regex::new(r"&([^;&\s]*);")?;

        Ok(Self {
            markup,
            attribute,
            entity,
        })
    }

    fn read(&self, input: &str) -> Result<Node, NodeError> {
        let mut stack: Vec<Node> = Vec::new();
        let mut root: Option<Node> = None;
        let mut cursor = 0;

        for cap in self.markup.captures_iter(input) {
            let Some(full) = cap.get(0) else { continue };
            self.read_text(&input[cursor..full.start()], &mut stack)?;
            cursor = full.end();

            if let Some(cdata) = cap.name("cdata") {
                match stack.last_mut() {
                    Some(parent) => parent.push_text(cdata.as_str()),
                    None if cdata.as_str().trim().is_empty() => {}
                    None => return Err(NodeError::ContentOutsideRoot(cdata.as_str().to_string())),
                }
                continue;
            }

            let Some(name) = cap.name("name") else {
                // Comment, declaration or doctype
                continue;
            };
            let name = name.as_str();

            if cap.name("close").is_some() {
                let node = stack
                    .pop()
                    .ok_or_else(|| NodeError::UnexpectedClosingTag(name.to_string()))?;
                if node.name != name {
                    return Err(NodeError::MismatchedClosingTag {
                        expected: node.name,
                        found: name.to_string(),
                    });
                }
                attach(node, &mut stack, &mut root)?;
                continue;
            }

            if stack.is_empty() && root.is_some() {
                return Err(NodeError::MultipleRoots(name.to_string()));
            }

            let mut node = Node::new(name);
            if let Some(attrs) = cap.name("attrs") {
                self.read_attributes(attrs.as_str(), &mut node)?;
            }

            if cap.name("empty").is_some() {
                attach(node, &mut stack, &mut root)?;
            } else {
                stack.push(node);
            }
        }

        self.read_text(&input[cursor..], &mut stack)?;

        if let Some(open) = stack.pop() {
            return Err(NodeError::UnclosedElement(open.name));
        }

        root.ok_or(NodeError::EmptyDocument)
    }

    fn read_text(&self, raw: &str, stack: &mut [Node]) -> Result<(), NodeError> {
        if raw.is_empty() {
            return Ok(());
        }
        if let Some(pos) = raw.find('<') {
            let snippet: String = raw[pos..].chars().take(20).collect();
            return Err(NodeError::Malformed(snippet));
        }

        match stack.last_mut() {
            Some(parent) => {
                parent.push_text(self.decode(raw)?);
                Ok(())
            }
            None if raw.trim().is_empty() => Ok(()),
            None => Err(NodeError::ContentOutsideRoot(raw.trim().to_string())),
        }
    }

    fn read_attributes(&self, raw: &str, node: &mut Node) -> Result<(), NodeError> {
        for cap in self.attribute.captures_iter(raw) {
            let name = cap.get(1).map(|m| m.as_str()).unwrap_or_default();
            let value = cap
                .get(2)
                .or_else(|| cap.get(3))
                .map(|m| m.as_str())
                .unwrap_or_default();
            node.set_attribute(name, self.decode(value)?);
        }
        Ok(())
    }

    fn decode(&self, raw: &str) -> Result<String, NodeError> {
        if !raw.contains('&') {
            return Ok(raw.to_string());
        }

        let mut out = String::with_capacity(raw.len());
        let mut last = 0;
        for cap in self.entity.captures_iter(raw) {
            let Some(full) = cap.get(0) else { continue };
            out.push_str(&raw[last..full.start()]);
            out.push(decode_entity(&cap)?);
            last = full.end();
        }
        out.push_str(&raw[last..]);
        Ok(out)
    }
}

fn attach(node: Node, stack: &mut [Node], root: &mut Option<Node>) -> Result<(), NodeError> {
    match stack.last_mut() {
        Some(parent) => parent.push_child(node),
        None if root.is_some() => return Err(NodeError::MultipleRoots(node.name)),
        None => *root = Some(node),
    }
    Ok(())
}

fn decode_entity(cap: &Captures<'_>) -> Result<char, NodeError> {
    let body = cap.get(1).map(|m| m.as_str()).unwrap_or_default();
    let invalid = || NodeError::InvalidEntity(body.to_string());

    match body {
        "lt" => Ok('<'),
        "gt" => Ok('>'),
        "amp" => Ok('&'),
        "quot" => Ok('"'),
        "apos" => Ok('\''),
        _ => {
            let code = if let Some(hex) = body.strip_prefix("#x").or_else(|| body.strip_prefix("#X")) {
                u32::from_str_radix(hex, 16).map_err(|_| invalid())?
            } else if let Some(dec) = body.strip_prefix('#') {
                dec.parse::<u32>().map_err(|_| invalid())?
            } else {
                return Err(invalid());
            };
            char::from_u32(code).ok_or_else(invalid)
        }
    }
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn escape_attribute(value: &str) -> String {
    escape_text(value).replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_chapter() {
        let node = Node::parse(r#"<Chapter Id="abc"><Name>Intro</Name><Length>12</Length></Chapter>"#)
            .unwrap();
        assert_eq!(node.name(), "Chapter");
        assert_eq!(node.attribute("Id"), Some("abc"));
        assert_eq!(node.child("Name").unwrap().value(), "Intro");
        assert_eq!(node.child("Length").unwrap().value(), "12");
        assert!(node.child("Missing").is_none());
    }

    #[test]
    fn test_parse_declaration_comments_and_whitespace() {
        let content = r#"<?xml version="1.0" encoding="utf-8"?>
<!-- saved by the editor -->
<Book>
    <Chapter Id='1' />
    <!-- <Chapter Id="ignored"/> -->
    <Chapter Id="2"></Chapter>
</Book>
"#;
        let node = Node::parse(content).unwrap();
        let ids: Vec<_> = node
            .children_named("Chapter")
            .filter_map(|c| c.attribute("Id"))
            .collect();
        assert_eq!(ids, vec!["1", "2"]);
    }

    #[test]
    fn test_child_returns_first_match() {
        let node = Node::parse("<A><B>first</B><B>second</B></A>").unwrap();
        assert_eq!(node.child("B").unwrap().value(), "first");
        assert_eq!(node.children_named("B").count(), 2);
    }

    #[test]
    fn test_value_concatenates_descendants() {
        let node = Node::parse("<P>one <b>two</b> three<![CDATA[ <four> ]]></P>").unwrap();
        assert_eq!(node.value(), "one two three <four> ");
    }

    #[test]
    fn test_entities() {
        let node = Node::parse(r#"<A title="x &quot;y&quot;">a &lt; b &amp;&amp; c &#62; &#x41;</A>"#).unwrap();
        assert_eq!(node.attribute("title"), Some(r#"x "y""#));
        assert_eq!(node.value(), "a < b && c > A");
    }

    #[test]
    fn test_invalid_entity() {
        let err = Node::parse("<A>&bogus;</A>").unwrap_err();
        assert!(matches!(err, NodeError::InvalidEntity(ref e) if e == "bogus"));
    }

    #[test]
    fn test_structural_errors() {
        assert!(matches!(Node::parse("   "), Err(NodeError::EmptyDocument)));
        assert!(matches!(Node::parse("<A>"), Err(NodeError::UnclosedElement(_))));
        assert!(matches!(Node::parse("</A>"), Err(NodeError::UnexpectedClosingTag(_))));
        assert!(matches!(
            Node::parse("<A><B></A></B>"),
            Err(NodeError::MismatchedClosingTag { .. })
        ));
        assert!(matches!(Node::parse("<A/><B/>"), Err(NodeError::MultipleRoots(_))));
        assert!(matches!(Node::parse("<A/>tail"), Err(NodeError::ContentOutsideRoot(_))));
        assert!(matches!(Node::parse("<A>1 < 2</A>"), Err(NodeError::Malformed(_))));
    }

    #[test]
    fn test_builder_and_serialize() {
        let node = Node::new("Word")
            .with_attribute("Id", "42")
            .with_child(Node::new("Name").with_text("fish & chips"))
            .with_child(Node::new("Empty"));
        assert_eq!(
            node.to_xml_string(),
            r#"<Word Id="42"><Name>fish &amp; chips</Name><Empty /></Word>"#
        );

        let reparsed: Node = node.to_string().parse().unwrap();
        assert_eq!(reparsed, node);
    }

    #[test]
    fn test_quoted_gt_in_attribute() {
        let node = Node::parse(
            r#"<Chapter Note="a>b" Id="67e55044-10b1-426f-9247-bb680e5fe0c8" Path='x/y'><Name>Intro</Name></Chapter>"#,
        )
        .unwrap();
        assert_eq!(node.attribute("Note"), Some("a>b"));
        assert_eq!(node.attribute("Id"), Some("67e55044-10b1-426f-9247-bb680e5fe0c8"));
        assert_eq!(node.attribute("Path"), Some("x/y"));
        assert_eq!(node.value(), "Intro");
    }

    #[test]
    fn test_non_ascii_names() {
        let node = Node::parse(r#"<Kapitel Größe="3"><Überschrift>x</Überschrift></Kapitel>"#).unwrap();
        assert_eq!(node.child("Überschrift").unwrap().value(), "x");
        assert_eq!(node.attribute("Größe"), Some("3"));
    }

    #[test]
    fn test_content_keeps_document_order() {
        let node = Node::parse("<P>one <b>two</b> three</P>").unwrap();
        let kinds: Vec<_> = node
            .content()
            .iter()
            .map(|c| match c {
                Content::Text(text) => text.clone(),
                Content::Element(child) => format!("<{}>", child.name()),
            })
            .collect();
        assert_eq!(kinds, vec!["one ", "<b>", " three"]);
    }

    #[test]
    fn test_set_attribute_replaces() {
        let mut node = Node::new("A").with_attribute("Id", "1");
        node.set_attribute("Id", "2");
        assert_eq!(node.attributes().collect::<Vec<_>>(), vec![("Id", "2")]);
    }
}
