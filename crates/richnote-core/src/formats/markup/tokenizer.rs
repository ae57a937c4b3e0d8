// SPDX-License-Identifier: AGPL-3.0-or-later
//! Markup tokenizer and tree parser
//!
//! Scans arbitrarily malformed markup left to right and builds a transient
//! tree of [`ParsedElement`]s. Elements are matched with an explicit stack
//! of open tag names, so a nested element with the same tag name closes
//! itself rather than its ancestor. Parsing never fails:
//!
//! - a `<` that does not start a well-formed tag is literal text
//! - a closing tag with no open element of that name is dropped
//! - elements still open at the end of their parent (or of the input) are
//!   closed there, keeping their content
//! - once `max_depth` elements are open, further opening tags are skipped
//!   and their text flows into the innermost open element

use super::escape::unescape;
use crate::traits::ParseConfig;
use once_cell::sync::Lazy;
use regex::Regex;

/// Tags that never have content, with or without a trailing `/`
pub const VOID_TAGS: [&str; 4] = ["br", "hr", "img", "input"];

static ATTRIBUTE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"([A-Za-z_:][-A-Za-z0-9_:.]*)\s*=\s*(?:"([^"]*)"|'([^']*)')"#)
        .expect("attribute pattern is valid")
});

/// A node of the transient parse tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedElement {
    Element {
        /// Lowercased tag name
        tag: String,
        attrs: Vec<Attribute>,
        children: Vec<ParsedElement>,
    },
    /// Entity-decoded text, never empty
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Lowercased attribute name
    pub name: String,
    /// Entity-decoded value
    pub value: String,
}

impl ParsedElement {
    /// Value of the named attribute, if present
    pub fn attr(&self, name: &str) -> Option<&str> {
        match self {
            ParsedElement::Element { attrs, .. } => attrs
                .iter()
                .find(|a| a.name.eq_ignore_ascii_case(name))
                .map(|a| a.value.as_str()),
            ParsedElement::Text(_) => None,
        }
    }
}

/// Lexical token produced by the [`Cursor`] scan
#[derive(Debug, Clone, PartialEq, Eq)]
enum Token<'a> {
    Text(&'a str),
    Open {
        name: String,
        attrs: Vec<Attribute>,
        self_closing: bool,
    },
    Close {
        name: String,
    },
}

/// Byte cursor over the markup source
struct Cursor<'a> {
    s: &'a str,
    i: usize,
}

impl<'a> Cursor<'a> {
    fn new(s: &'a str) -> Self {
        Self { s, i: 0 }
    }

    fn eof(&self) -> bool {
        self.i >= self.s.len()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.s.as_bytes().get(self.i + offset).copied()
    }

    /// Index of the `>` ending the tag starting at the cursor, skipping
    /// quoted attribute values
    fn tag_end(&self) -> Option<usize> {
        let bytes = self.s.as_bytes();
        let mut quote = None;
        for (idx, &b) in bytes.iter().enumerate().skip(self.i + 1) {
            match (quote, b) {
                (Some(q), _) if b == q => quote = None,
                (Some(_), _) => {}
                (None, b'"' | b'\'') => quote = Some(b),
                (None, b'>') => return Some(idx),
                (None, b'<') => return None,
                _ => {}
            }
        }
        None
    }

    /// Next token, or `None` at end of input
    fn next_token(&mut self) -> Option<Token<'a>> {
        if self.eof() {
            return None;
        }

        if self.peek_at(0) == Some(b'<') {
            if let Some(token) = self.tag() {
                return Some(token);
            }
            // Not a tag: a literal `<`
            let start = self.i;
            self.i += 1;
            return Some(Token::Text(&self.s[start..self.i]));
        }

        let start = self.i;
        let end = self.s[start..]
            .find('<')
            .map_or(self.s.len(), |offset| start + offset);
        self.i = end;
        Some(Token::Text(&self.s[start..end]))
    }

    /// Consume a well-formed opening or closing tag at the cursor
    fn tag(&mut self) -> Option<Token<'a>> {
        let closing = self.peek_at(1) == Some(b'/');
        let name_start = if closing { 2 } else { 1 };
        if !self.peek_at(name_start).is_some_and(|b| b.is_ascii_alphabetic()) {
            return None;
        }

        let end = self.tag_end()?;
        let interior = &self.s[self.i + name_start..end];
        self.i = end + 1;

        let name_len = interior
            .find(|c: char| c.is_whitespace() || c == '/' || c == '>')
            .unwrap_or(interior.len());
        let name = interior[..name_len].to_ascii_lowercase();

        if closing {
            return Some(Token::Close { name });
        }

        let rest = &interior[name_len..];
        Some(Token::Open {
            name,
            attrs: parse_attributes(rest),
            self_closing: rest.trim_end().ends_with('/'),
        })
    }
}

impl<'a> Iterator for Cursor<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_token()
    }
}

/// Permissive `name="value"` / `name='value'` scan over a tag interior
fn parse_attributes(interior: &str) -> Vec<Attribute> {
    ATTRIBUTE
        .captures_iter(interior)
        .map(|caps| Attribute {
            name: caps[1].to_ascii_lowercase(),
            value: caps
                .get(2)
                .or_else(|| caps.get(3))
                .map_or_else(String::new, |m| unescape(m.as_str()).into_owned()),
        })
        .collect()
}

/// An element whose closing tag has not been seen yet
struct Frame {
    tag: String,
    attrs: Vec<Attribute>,
    children: Vec<ParsedElement>,
}

impl Frame {
    fn into_element(self) -> ParsedElement {
        ParsedElement::Element {
            tag: self.tag,
            attrs: self.attrs,
            children: self.children,
        }
    }
}

struct TreeBuilder {
    root: Vec<ParsedElement>,
    open: Vec<Frame>,
    /// Tag names skipped past the depth limit, awaiting their closing tags
    skipped: Vec<String>,
    max_depth: usize,
}

impl TreeBuilder {
    fn new(max_depth: usize) -> Self {
        Self {
            root: Vec::new(),
            open: Vec::new(),
            skipped: Vec::new(),
            max_depth,
        }
    }

    fn push_child(&mut self, node: ParsedElement) {
        let children = match self.open.last_mut() {
            Some(frame) => &mut frame.children,
            None => &mut self.root,
        };
        match (children.last_mut(), node) {
            (Some(ParsedElement::Text(prev)), ParsedElement::Text(text)) => prev.push_str(&text),
            (_, node) => children.push(node),
        }
    }

    fn text(&mut self, raw: &str) {
        if raw.is_empty() {
            return;
        }
        self.push_child(ParsedElement::Text(unescape(raw).into_owned()));
    }

    fn open(&mut self, name: String, attrs: Vec<Attribute>, self_closing: bool) {
        if self_closing || VOID_TAGS.contains(&name.as_str()) {
            self.push_child(ParsedElement::Element {
                tag: name,
                attrs,
                children: Vec::new(),
            });
        } else if self.open.len() >= self.max_depth {
            self.skipped.push(name);
        } else {
            self.open.push(Frame {
                tag: name,
                attrs,
                children: Vec::new(),
            });
        }
    }

    fn close(&mut self, name: &str) {
        if self.skipped.last().is_some_and(|skipped| skipped == name) {
            self.skipped.pop();
            return;
        }

        let Some(idx) = self.open.iter().rposition(|frame| frame.tag == name) else {
            return;
        };
        while self.open.len() > idx {
            self.close_innermost();
        }
    }

    fn close_innermost(&mut self) {
        if let Some(frame) = self.open.pop() {
            self.push_child(frame.into_element());
        }
    }

    fn finish(mut self) -> Vec<ParsedElement> {
        while !self.open.is_empty() {
            self.close_innermost();
        }
        self.root
    }
}

/// Parse markup into a tree of elements and text leaves
pub fn parse(input: &str, config: &ParseConfig) -> Vec<ParsedElement> {
    let mut builder = TreeBuilder::new(config.max_depth);
    for token in Cursor::new(input) {
        match token {
            Token::Text(raw) => builder.text(raw),
            Token::Open {
                name,
                attrs,
                self_closing,
            } => builder.open(name, attrs, self_closing),
            Token::Close { name } => builder.close(&name),
        }
    }
    builder.finish()
}
