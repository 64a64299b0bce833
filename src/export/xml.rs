//! A small owned XML element tree.
//!
//! Existing project files are parsed into [`Element`]s with `quick-xml`,
//! generator-owned subtrees are replaced in place, and the tree is written
//! back with tab indentation. Attribute order is preserved, so the output
//! only depends on the input tree.

use std::fmt::Write as _;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use thiserror::Error;

/// Errors parsing an XML document.
#[derive(Debug, Error)]
pub enum XmlError {
    #[error("malformed XML at byte {position}: {message}")]
    Syntax { position: u64, message: String },

    #[error("unexpected closing tag `{0}`")]
    UnbalancedClose(String),

    #[error("document ends inside element `{0}`")]
    Unclosed(String),

    #[error("document has no root element")]
    NoRoot,

    #[error("document has more than one root element")]
    MultipleRoots,
}

/// A child of an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
    Comment(String),
}

/// An XML element with ordered attributes and children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Element {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Builder-style attribute setter.
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(key, value);
        self
    }

    /// Builder-style child.
    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(Node::Element(child));
        self
    }

    /// Builder-style text content.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(Node::Text(text.into()));
        self
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Set an attribute, keeping its position if it already exists.
    pub fn set_attr(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((key, value)),
        }
    }

    /// Append a child element and return a handle to it.
    pub fn push(&mut self, child: Element) -> &mut Element {
        self.children.push(Node::Element(child));
        match self.children.last_mut() {
            Some(Node::Element(el)) => el,
            _ => unreachable!("just pushed an element"),
        }
    }

    /// Child elements in document order.
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|n| match n {
            Node::Element(el) => Some(el),
            _ => None,
        })
    }

    pub fn elements_mut(&mut self) -> impl Iterator<Item = &mut Element> {
        self.children.iter_mut().filter_map(|n| match n {
            Node::Element(el) => Some(el),
            _ => None,
        })
    }

    /// Direct children with the given tag.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.elements().filter(move |el| el.name == name)
    }

    /// First direct child with the given tag.
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.elements().find(|el| el.name == name)
    }

    pub fn child_mut(&mut self, name: &str) -> Option<&mut Element> {
        self.elements_mut().find(|el| el.name == name)
    }

    /// First direct child with the given tag, created at the end if absent.
    pub fn child_or_insert(&mut self, name: &str) -> &mut Element {
        let position = self
            .children
            .iter()
            .position(|n| matches!(n, Node::Element(el) if el.name == name));
        match position {
            Some(i) => match &mut self.children[i] {
                Node::Element(el) => el,
                _ => unreachable!("position matched an element"),
            },
            None => self.push(Element::new(name)),
        }
    }

    /// Remove child elements for which `pred` returns true. Returns how many went.
    pub fn remove_elements(&mut self, mut pred: impl FnMut(&Element) -> bool) -> usize {
        let before = self.children.len();
        self.children.retain(|n| match n {
            Node::Element(el) => !pred(el),
            _ => true,
        });
        before - self.children.len()
    }

    /// Concatenated text of direct text children.
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|n| match n {
                Node::Text(t) => Some(t.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Replace all children with a single text node.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.children = vec![Node::Text(text.into())];
    }

    /// Depth-first search for the first element with the given tag.
    pub fn find(&self, name: &str) -> Option<&Element> {
        for el in self.elements() {
            if el.name == name {
                return Some(el);
            }
            if let Some(found) = el.find(name) {
                return Some(found);
            }
        }
        None
    }
}

/// Parse a document and return its root element.
///
/// Declarations, processing instructions and the doctype are dropped;
/// whitespace-only text is dropped; comments are kept.
pub fn parse(text: &str) -> Result<Element, XmlError> {
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let event = reader.read_event().map_err(|e| XmlError::Syntax {
            position: reader.buffer_position() as u64,
            message: e.to_string(),
        })?;
        match event {
            Event::Start(start) => stack.push(element_from(&start, &reader)?),
            Event::Empty(start) => {
                let el = element_from(&start, &reader)?;
                attach(&mut stack, &mut root, el)?;
            }
            Event::End(end) => {
                let el = stack.pop().ok_or_else(|| {
                    XmlError::UnbalancedClose(String::from_utf8_lossy(end.name().as_ref()).into_owned())
                })?;
                attach(&mut stack, &mut root, el)?;
            }
            Event::Text(t) => {
                let value = t.unescape().map_err(|e| XmlError::Syntax {
                    position: reader.buffer_position() as u64,
                    message: e.to_string(),
                })?;
                if let Some(top) = stack.last_mut() {
                    top.children.push(Node::Text(value.into_owned()));
                }
            }
            Event::CData(c) => {
                if let Some(top) = stack.last_mut() {
                    top.children
                        .push(Node::Text(String::from_utf8_lossy(&c).into_owned()));
                }
            }
            Event::Comment(c) => {
                if let Some(top) = stack.last_mut() {
                    top.children
                        .push(Node::Comment(String::from_utf8_lossy(&c).into_owned()));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.pop() {
        return Err(XmlError::Unclosed(open.name));
    }
    root.ok_or(XmlError::NoRoot)
}

fn element_from(start: &BytesStart<'_>, reader: &Reader<&[u8]>) -> Result<Element, XmlError> {
    let mut el = Element::new(String::from_utf8_lossy(start.name().as_ref()).into_owned());
    for attr in start.attributes() {
        let attr = attr.map_err(|e| XmlError::Syntax {
            position: reader.buffer_position() as u64,
            message: e.to_string(),
        })?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value().map_err(|e| XmlError::Syntax {
            position: reader.buffer_position() as u64,
            message: e.to_string(),
        })?;
        el.attributes.push((key, value.into_owned()));
    }
    Ok(el)
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, el: Element) -> Result<(), XmlError> {
    match stack.last_mut() {
        Some(parent) => {
            parent.children.push(Node::Element(el));
            Ok(())
        }
        None if root.is_none() => {
            *root = Some(el);
            Ok(())
        }
        None => Err(XmlError::MultipleRoots),
    }
}

/// Serialize `root` after the given header lines, tab-indented, newline-terminated.
pub fn to_string(headers: &[&str], root: &Element) -> String {
    let mut out = String::new();
    for header in headers {
        out.push_str(header);
        out.push('\n');
    }
    write_element(&mut out, root, 0);
    out
}

fn write_element(out: &mut String, el: &Element, depth: usize) {
    indent(out, depth);
    out.push('<');
    out.push_str(&el.name);
    for (key, value) in &el.attributes {
        let _ = write!(out, " {}=\"{}\"", key, escape_attr(value));
    }

    if el.children.is_empty() {
        out.push_str("/>\n");
        return;
    }

    let text_only = el.children.iter().all(|n| matches!(n, Node::Text(_)));
    if text_only {
        out.push('>');
        out.push_str(&escape_text(&el.text()));
        let _ = writeln!(out, "</{}>", el.name);
        return;
    }

    out.push_str(">\n");
    for child in &el.children {
        match child {
            Node::Element(c) => write_element(out, c, depth + 1),
            Node::Text(t) => {
                indent(out, depth + 1);
                out.push_str(&escape_text(t));
                out.push('\n');
            }
            Node::Comment(c) => {
                indent(out, depth + 1);
                let _ = writeln!(out, "<!--{}-->", c);
            }
        }
    }
    indent(out, depth);
    let _ = writeln!(out, "</{}>", el.name);
}

fn indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push('\t');
    }
}

/// Escape character data.
pub fn escape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            c => out.push(c),
        }
    }
    out
}

/// Escape an attribute value; newlines and tabs survive a round trip.
pub fn escape_attr(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\n' => out.push_str("&#10;"),
            '\r' => out.push_str("&#13;"),
            '\t' => out.push_str("&#9;"),
            c => out.push(c),
        }
    }
    out
}
