//! Minimal markup tree for rendered content.
//!
//! Rendered MDX arrives as an (X)HTML fragment. [`parse_fragment`] reads it
//! with quick-xml into a small element/text tree that transforms such as
//! the technology auto-linker can rewrite, and [`render`] writes it back.
//! HTML void elements need no closing tag and the common named HTML
//! entities are understood. Other named entities are kept verbatim as
//! `&name;` and written back unchanged, and a bare `<` or `&` in text is
//! read as a literal character.

use anyhow::{Context, Result};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::borrow::Cow;

/// Elements that never have children or a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track", "wbr",
];

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
    Comment(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub tag: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.push((name.into(), value.into()));
        self
    }

    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

impl Node {
    pub fn text(value: impl Into<String>) -> Self {
        Node::Text(value.into())
    }
}

fn is_void(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}

fn html_entity(name: &str) -> Option<&'static str> {
    Some(match name {
        "lt" => "<",
        "gt" => ">",
        "amp" => "&",
        "apos" => "'",
        "quot" => "\"",
        "nbsp" => "\u{a0}",
        "copy" => "\u{a9}",
        "reg" => "\u{ae}",
        "trade" => "\u{2122}",
        "mdash" => "\u{2014}",
        "ndash" => "\u{2013}",
        "hellip" => "\u{2026}",
        "lsquo" => "\u{2018}",
        "rsquo" => "\u{2019}",
        "ldquo" => "\u{201c}",
        "rdquo" => "\u{201d}",
        "laquo" => "\u{ab}",
        "raquo" => "\u{bb}",
        "middot" => "\u{b7}",
        "times" => "\u{d7}",
        "euro" => "\u{20ac}",
        _ => return None,
    })
}

/// Name of the entity reference at the start of `rest` (which begins after
/// the `&`), when `rest` holds a well-formed `name;` or `#digits;`.
fn entity_ref(rest: &str) -> Option<&str> {
    let end = rest.find(';')?;
    let name = &rest[..end];
    let valid = match name.strip_prefix('#') {
        Some(num) => match num.strip_prefix('x').or_else(|| num.strip_prefix('X')) {
            Some(hex) => !hex.is_empty() && hex.chars().all(|c| c.is_ascii_hexdigit()),
            None => !num.is_empty() && num.chars().all(|c| c.is_ascii_digit()),
        },
        None => {
            name.starts_with(|c: char| c.is_ascii_alphabetic())
                && name.chars().all(|c| c.is_ascii_alphanumeric())
        }
    };
    valid.then_some(name)
}

fn numeric_entity(name: &str) -> Option<char> {
    let num = name.strip_prefix('#')?;
    let code = match num.strip_prefix('x').or_else(|| num.strip_prefix('X')) {
        Some(hex) => u32::from_str_radix(hex, 16).ok()?,
        None => num.parse().ok()?,
    };
    char::from_u32(code)
}

/// Resolve entity references in raw markup text. Unknown named entities
/// stay as `&name;`; an `&` that starts no reference is literal.
fn decode_entities(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        rest = &rest[pos + 1..];
        let Some(name) = entity_ref(rest) else {
            out.push('&');
            continue;
        };
        if let Some(c) = numeric_entity(name) {
            out.push(c);
        } else if let Some(value) = html_entity(name) {
            out.push_str(value);
        } else {
            out.push('&');
            out.push_str(name);
            out.push(';');
        }
        rest = &rest[name.len() + 1..];
    }
    out.push_str(rest);
    out
}

/// Escape `<` that cannot open a tag, comment or declaration.
fn escape_stray_lt(source: &str) -> Cow<'_, str> {
    let opens_markup = |next: Option<char>| {
        next.is_some_and(|c| c.is_ascii_alphabetic() || matches!(c, '/' | '!' | '?'))
    };
    let stray = source
        .match_indices('<')
        .any(|(i, _)| !opens_markup(source[i + 1..].chars().next()));
    if !stray {
        return Cow::Borrowed(source);
    }
    let mut out = String::with_capacity(source.len() + 8);
    for (i, c) in source.char_indices() {
        if c == '<' && !opens_markup(source[i + 1..].chars().next()) {
            out.push_str("&lt;");
        } else {
            out.push(c);
        }
    }
    Cow::Owned(out)
}

/// Escape markup characters. An `&` that starts an unknown named entity is
/// written as-is so verbatim entities survive a round trip.
fn escape_markup(value: &str, out: &mut String, quote: bool) {
    for (i, c) in value.char_indices() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if quote => out.push_str("&quot;"),
            '&' => match entity_ref(&value[i + 1..]) {
                Some(name) if numeric_entity(name).is_none() && html_entity(name).is_none() => {
                    out.push('&')
                }
                _ => out.push_str("&amp;"),
            },
            _ => out.push(c),
        }
    }
}

fn start_element(e: &quick_xml::events::BytesStart<'_>) -> Result<Element> {
    let tag = String::from_utf8_lossy(e.name().as_ref()).to_lowercase();
    let mut element = Element::new(tag);
    for attr in e.html_attributes() {
        let attr = attr.context("Malformed attribute")?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
        let value = decode_entities(&String::from_utf8_lossy(&attr.value));
        element.attrs.push((key, value));
    }
    Ok(element)
}

/// Parse an (X)HTML fragment. Stray closing tags are ignored and unclosed
/// elements are closed at the end of input.
pub fn parse_fragment(source: &str) -> Result<Vec<Node>> {
    let source = escape_stray_lt(source);
    let mut reader = Reader::from_str(&source);
    reader.config_mut().check_end_names = false;

    // Open elements; the bottom entry collects the top-level nodes.
    let mut stack: Vec<Element> = vec![Element::new("#fragment")];

    loop {
        let event = reader
            .read_event()
            .with_context(|| format!("Malformed markup at byte {}", reader.buffer_position()))?;
        match event {
            Event::Start(e) => {
                let element = start_element(&e)?;
                if is_void(&element.tag) {
                    push_child(&mut stack, Node::Element(element));
                } else {
                    stack.push(element);
                }
            }
            Event::Empty(e) => {
                let element = start_element(&e)?;
                push_child(&mut stack, Node::Element(element));
            }
            Event::End(e) => {
                let tag = String::from_utf8_lossy(e.name().as_ref()).to_lowercase();
                if let Some(pos) = stack.iter().skip(1).rposition(|el| el.tag == tag) {
                    // `pos` is relative to the skipped fragment root
                    close_down_to(&mut stack, pos + 1);
                }
            }
            Event::Text(e) => {
                let text = decode_entities(&String::from_utf8_lossy(&e));
                if !text.is_empty() {
                    push_text(&mut stack, text);
                }
            }
            Event::CData(e) => {
                push_text(&mut stack, String::from_utf8_lossy(&e).to_string());
            }
            Event::Comment(e) => {
                push_child(
                    &mut stack,
                    Node::Comment(String::from_utf8_lossy(&e).to_string()),
                );
            }
            Event::Eof => break,
            _ => {}
        }
    }

    close_down_to(&mut stack, 1);
    Ok(stack.pop().map(|root| root.children).unwrap_or_default())
}

fn push_child(stack: &mut [Element], node: Node) {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(node);
    }
}

/// Append text, merging with a preceding text node.
fn push_text(stack: &mut [Element], text: String) {
    if let Some(parent) = stack.last_mut() {
        if let Some(Node::Text(prev)) = parent.children.last_mut() {
            prev.push_str(&text);
        } else {
            parent.children.push(Node::Text(text));
        }
    }
}

/// Pop elements until the stack has `len` entries, attaching each to its
/// parent.
fn close_down_to(stack: &mut Vec<Element>, len: usize) {
    while stack.len() > len.max(1) {
        if let Some(done) = stack.pop() {
            push_child(stack, Node::Element(done));
        }
    }
}

/// Serialize nodes back to markup.
pub fn render(nodes: &[Node]) -> String {
    let mut out = String::new();
    render_into(nodes, &mut out);
    out
}

fn render_into(nodes: &[Node], out: &mut String) {
    for node in nodes {
        match node {
            Node::Text(text) => escape_markup(text, out, false),
            Node::Comment(text) => {
                out.push_str("<!--");
                out.push_str(text);
                out.push_str("-->");
            }
            Node::Element(el) => {
                out.push('<');
                out.push_str(&el.tag);
                for (k, v) in &el.attrs {
                    out.push(' ');
                    out.push_str(k);
                    out.push_str("=\"");
                    escape_markup(v, out, true);
                    out.push('"');
                }
                if is_void(&el.tag) && el.children.is_empty() {
                    out.push_str("/>");
                    continue;
                }
                out.push('>');
                render_into(&el.children, out);
                out.push_str("</");
                out.push_str(&el.tag);
                out.push('>');
            }
        }
    }
}

/// Concatenated text of all nodes, ignoring comments.
pub fn text_content(nodes: &[Node]) -> String {
    let mut out = String::new();
    for node in nodes {
        match node {
            Node::Text(t) => out.push_str(t),
            Node::Element(el) => out.push_str(&text_content(&el.children)),
            Node::Comment(_) => {}
        }
    }
    out
}
